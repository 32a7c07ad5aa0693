use super::{GalaxyParameters, JitterMode};
use bevy::color::Mix;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::f32::consts::TAU;

/// Particles sampled per rayon task, each task with its own seeded rng
pub const CHUNK_SIZE: usize = 4096;

/// Positions and colors of one generated galaxy, index-aligned.
///
/// Always rebuilt from scratch, never patched in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GalaxyGeometry {
    pub positions: Vec<[f32; 3]>,
    /// Linear RGB
    pub colors: Vec<[f32; 3]>,
}

impl GalaxyGeometry {
    /// Samples `params.count` particles.
    ///
    /// The same parameters and seed always give the same geometry, regardless
    /// of how rayon splits the work.
    pub fn generate(params: &GalaxyParameters, seed: u64) -> Self {
        let count = params.count as usize;
        let mut positions = vec![[0.0; 3]; count];
        let mut colors = vec![[0.0; 3]; count];

        positions
            .par_chunks_mut(CHUNK_SIZE)
            .zip(colors.par_chunks_mut(CHUNK_SIZE))
            .enumerate()
            .for_each(|(chunk_index, (positions, colors))| {
                let mut rng = chunk_rng(seed, chunk_index);
                let first = (chunk_index * CHUNK_SIZE) as u32;

                for (offset, (position, color)) in
                    positions.iter_mut().zip(colors.iter_mut()).enumerate()
                {
                    let sample = ParticleSample::draw(params, &mut rng);
                    *position = sample.position(first + offset as u32, params).to_array();

                    let mixed = radial_color(params, sample.radius);
                    *color = [mixed.red, mixed.green, mixed.blue];
                }
            });

        Self { positions, colors }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Fresh seed for a regeneration
pub fn random_seed() -> u64 {
    rand::rng().random()
}

/// Golden-ratio multiplier that spreads chunk indices across the seed space
const CHUNK_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Independent stream for one chunk; neighbouring seeds do not share chunks
pub fn chunk_rng(seed: u64, chunk_index: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (chunk_index as u64).wrapping_mul(CHUNK_SEED_MIX))
}

/// The random draws behind one particle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSample {
    /// Distance from the core, in `[0, params.radius)`
    pub radius: f32,
    pub offset: Vec3,
}

impl ParticleSample {
    pub fn draw<R: Rng>(params: &GalaxyParameters, rng: &mut R) -> Self {
        let radius = rng.random::<f32>() * params.radius;

        let power = params.randomness_power;
        let mut offset = vec3(
            signed_jitter(power, rng),
            signed_jitter(power, rng),
            signed_jitter(power, rng),
        );
        if params.jitter_mode == JitterMode::Scaled {
            offset *= params.randomness;
        }

        Self { radius, offset }
    }

    /// Places the sample on its arm and applies the jitter
    pub fn position(&self, index: u32, params: &GalaxyParameters) -> Vec3 {
        let angle = branch_angle(index, params.arm_count()) + self.radius * params.spin;

        vec3(
            angle.cos() * self.radius,
            0.0,
            angle.sin() * self.radius,
        ) + self.offset
    }
}

/// `uniform^power`, negated half the time
fn signed_jitter<R: Rng>(power: f32, rng: &mut R) -> f32 {
    let magnitude = rng.random::<f32>().powf(power);
    if rng.random_bool(0.5) {
        -magnitude
    } else {
        magnitude
    }
}

/// Arm angle for particle `index`; arms are assigned round-robin
pub fn branch_angle(index: u32, branches: u32) -> f32 {
    let branches = branches.max(1);
    (index % branches) as f32 / branches as f32 * TAU
}

/// Inside color at the core, outside color at `params.radius`
pub fn radial_color(params: &GalaxyParameters, radius: f32) -> LinearRgba {
    let factor = if params.radius > 0.0 {
        radius / params.radius
    } else {
        0.0
    };

    LinearRgba::from(params.inside_color).mix(&LinearRgba::from(params.outside_color), factor)
}
