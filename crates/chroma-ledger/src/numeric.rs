//! Saturating float-to-integer conversions shared by ledgers and formulas.

/// Floor a float into `u64`, saturating at both ends.
///
/// NaN and anything at or below zero map to 0. Values at or beyond
/// `u64::MAX`, including positive infinity, map to `u64::MAX`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn floor_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= u64::MAX as f64 {
        u64::MAX
    } else {
        value.floor() as u64
    }
}

/// Ceil a float into `u64`, saturating like [`floor_u64`].
#[must_use]
pub fn ceil_u64(value: f64) -> u64 {
    floor_u64(value.ceil())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_saturates_at_both_ends() {
        assert_eq!(floor_u64(f64::NAN), 0);
        assert_eq!(floor_u64(-3.0), 0);
        assert_eq!(floor_u64(f64::NEG_INFINITY), 0);
        assert_eq!(floor_u64(f64::INFINITY), u64::MAX);
        assert_eq!(floor_u64(1e30), u64::MAX);
        assert_eq!(floor_u64(2.99), 2);
    }

    #[test]
    fn ceil_rounds_up_and_saturates() {
        assert_eq!(ceil_u64(1.01), 2);
        assert_eq!(ceil_u64(0.0), 0);
        assert_eq!(ceil_u64(f64::INFINITY), u64::MAX);
    }
}
