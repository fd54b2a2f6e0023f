//! Production systems registered with the scheduler.
//!
//! Each system drives one slice of [`GameSession`] production. The engine
//! registers them in the order of [`default_systems`]: pixels first so that
//! converters see this cycle's pixels, lumen after converters so it reads
//! the white balance they produced, lux after lumen.

use tracing::trace;

use crate::scheduler::{SystemFault, TickSystem};
use crate::session::GameSession;

/// Pixel generators.
#[derive(Debug, Default)]
pub struct GeneratorSystem;

impl TickSystem<GameSession> for GeneratorSystem {
    fn name(&self) -> &'static str {
        "generators"
    }

    fn tick(&mut self, world: &mut GameSession, dt: f64) -> Result<(), SystemFault> {
        let credited = world.produce_pixels(dt);
        if credited.total() > 0 {
            trace!(
                red = credited.red,
                green = credited.green,
                blue = credited.blue,
                "Pixels produced"
            );
        }
        Ok(())
    }
}

/// Auto-converters.
#[derive(Debug, Default)]
pub struct ConverterSystem;

impl TickSystem<GameSession> for ConverterSystem {
    fn name(&self) -> &'static str {
        "converters"
    }

    fn tick(&mut self, world: &mut GameSession, dt: f64) -> Result<(), SystemFault> {
        for output in world.run_converters(dt) {
            trace!(converter = ?output.id, processed = output.processed, "Converter ran");
        }
        Ok(())
    }
}

/// Lumen from white pixels.
#[derive(Debug, Default)]
pub struct LumenSystem;

impl TickSystem<GameSession> for LumenSystem {
    fn name(&self) -> &'static str {
        "lumen"
    }

    fn tick(&mut self, world: &mut GameSession, dt: f64) -> Result<(), SystemFault> {
        world.produce_lumen(dt)?;
        Ok(())
    }
}

/// Lux from lux generators.
#[derive(Debug, Default)]
pub struct LuxSystem;

impl TickSystem<GameSession> for LuxSystem {
    fn name(&self) -> &'static str {
        "lux"
    }

    fn tick(&mut self, world: &mut GameSession, dt: f64) -> Result<(), SystemFault> {
        world.produce_lux(dt)?;
        Ok(())
    }
}

/// Playtime counter.
#[derive(Debug, Default)]
pub struct PlaytimeSystem;

impl TickSystem<GameSession> for PlaytimeSystem {
    fn name(&self) -> &'static str {
        "playtime"
    }

    fn tick(&mut self, world: &mut GameSession, dt: f64) -> Result<(), SystemFault> {
        world.add_playtime(dt);
        Ok(())
    }
}

/// Every production system in registration order.
pub fn default_systems() -> Vec<Box<dyn TickSystem<GameSession>>> {
    vec![
        Box::new(GeneratorSystem),
        Box::new(ConverterSystem),
        Box::new(LumenSystem),
        Box::new(LuxSystem),
        Box::new(PlaytimeSystem),
    ]
}
