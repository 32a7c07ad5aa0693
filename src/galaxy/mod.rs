use bevy::prelude::*;

mod galaxy_config;
mod generator;
mod sample_particles;

pub use galaxy_config::{GalaxyParameters, JitterMode};
pub use generator::{GalaxyGenerator, GalaxyStats, GeneratorState, RegenerateGalaxy};
pub use sample_particles::GalaxyGeometry;

pub struct GalaxyPlugin;

impl Plugin for GalaxyPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            galaxy_config::GalaxyConfigPlugin,
            generator::GalaxyGeneratorPlugin,
        ));
    }
}
