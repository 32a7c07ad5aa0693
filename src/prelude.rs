pub use crate::galaxy::{
    GalaxyGenerator, GalaxyGeometry, GalaxyParameters, GalaxyStats, GeneratorState, JitterMode,
    RegenerateGalaxy,
};
