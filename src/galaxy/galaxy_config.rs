use bevy::prelude::*;

/// Everything the generator reads when it rebuilds the galaxy.
///
/// Edited through the parameter panel; any change to the resource triggers a
/// full regeneration.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct GalaxyParameters {
    pub count: u32,
    /// Point size, attenuated with distance
    pub size: f32,
    pub radius: f32,
    pub branches: u32,
    /// Radians of twist per unit of radius
    pub spin: f32,
    pub randomness: f32,
    /// Higher values pull the jitter towards zero
    pub randomness_power: f32,
    pub inside_color: Srgba,
    pub outside_color: Srgba,
    pub jitter_mode: JitterMode,
}

/// How the per-axis jitter is scaled.
///
/// `AsBuilt` leaves `randomness` out of the offset entirely; only the power
/// shapes it. `Scaled` multiplies the offset by `randomness`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterMode {
    #[default]
    AsBuilt,
    Scaled,
}

impl Default for GalaxyParameters {
    fn default() -> Self {
        Self {
            count: 100_000,
            size: 0.01,
            radius: 5.0,
            branches: 5,
            spin: 0.7,
            randomness: 0.2,
            randomness_power: 3.0,
            inside_color: Srgba::rgb_u8(0xff, 0x60, 0x30),
            outside_color: Srgba::rgb_u8(0x1b, 0x39, 0x84),
            jitter_mode: JitterMode::AsBuilt,
        }
    }
}

impl GalaxyParameters {
    pub const MIN: Self = Self {
        count: 100,
        size: 0.001,
        radius: 0.01,
        branches: 2,
        spin: -5.0,
        randomness: 0.0,
        randomness_power: 1.0,
        inside_color: Srgba::BLACK,
        outside_color: Srgba::BLACK,
        jitter_mode: JitterMode::AsBuilt,
    };
    pub const MAX: Self = Self {
        count: 500_000,
        size: 0.1,
        radius: 20.0,
        branches: 20,
        spin: 5.0,
        randomness: 2.0,
        randomness_power: 10.0,
        inside_color: Srgba::WHITE,
        outside_color: Srgba::WHITE,
        jitter_mode: JitterMode::Scaled,
    };
    /// Panel step granularity. Colors and jitter mode have no step.
    pub const STEP: Self = Self {
        count: 100,
        size: 0.001,
        radius: 0.01,
        branches: 1,
        spin: 0.001,
        randomness: 0.001,
        randomness_power: 0.001,
        inside_color: Srgba::NONE,
        outside_color: Srgba::NONE,
        jitter_mode: JitterMode::AsBuilt,
    };

    /// Number of spiral arms, never zero so arm assignment stays defined
    pub fn arm_count(&self) -> u32 {
        self.branches.max(1)
    }
}

pub struct GalaxyConfigPlugin;

impl Plugin for GalaxyConfigPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GalaxyParameters::default())
            .add_systems(Update, log_parameter_updates);
    }
}

fn log_parameter_updates(params: Res<GalaxyParameters>) {
    if params.is_changed() {
        debug!(
            "Galaxy parameters: count={} size={} radius={} branches={} spin={} randomness={} power={} jitter={:?}",
            params.count,
            params.size,
            params.radius,
            params.branches,
            params.spin,
            params.randomness,
            params.randomness_power,
            params.jitter_mode,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sit_inside_panel_ranges() {
        let params = GalaxyParameters::default();
        let (min, max) = (GalaxyParameters::MIN, GalaxyParameters::MAX);

        assert!((min.count..=max.count).contains(&params.count));
        assert!((min.size..=max.size).contains(&params.size));
        assert!((min.radius..=max.radius).contains(&params.radius));
        assert!((min.branches..=max.branches).contains(&params.branches));
        assert!((min.spin..=max.spin).contains(&params.spin));
        assert!((min.randomness..=max.randomness).contains(&params.randomness));
        assert!((min.randomness_power..=max.randomness_power).contains(&params.randomness_power));
        assert_eq!(params.jitter_mode, JitterMode::AsBuilt);
    }

    #[test]
    fn default_colors_match_hex() {
        let params = GalaxyParameters::default();
        assert_eq!(params.inside_color, Srgba::hex("#ff6030").unwrap());
        assert_eq!(params.outside_color, Srgba::hex("#1b3984").unwrap());
    }

    #[test]
    fn arm_count_is_never_zero() {
        let params = GalaxyParameters {
            branches: 0,
            ..default()
        };
        assert_eq!(params.arm_count(), 1);
        assert_eq!(GalaxyParameters::default().arm_count(), 5);
    }
}
