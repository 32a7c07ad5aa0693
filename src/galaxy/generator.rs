use super::sample_particles::{random_seed, GalaxyGeometry};
use super::GalaxyParameters;
use crate::graphics::{point_mesh, GalaxyPointsMaterial};
use bevy::pbr::NotShadowCaster;
use bevy::platform::time::Instant;
use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;
use std::time::Duration;

pub struct GalaxyGeneratorPlugin;

impl Plugin for GalaxyGeneratorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GalaxyGenerator>()
            .init_resource::<GalaxyStats>()
            .add_event::<RegenerateGalaxy>()
            .add_systems(Update, regenerate_galaxy);
    }
}

/// Rebuild with the current parameters and a fresh seed
#[derive(Event, Default, Clone, Copy, Debug)]
pub struct RegenerateGalaxy;

/// Marks the entity drawing the galaxy points
#[derive(Component)]
pub struct GalaxyPoints;

/// The galaxy currently attached to the scene and the assets it owns
#[derive(Clone, Debug)]
pub struct RenderedGalaxy {
    pub entity: Entity,
    pub mesh: Handle<Mesh>,
    pub material: Handle<GalaxyPointsMaterial>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorState {
    Empty,
    Populated,
}

/// Owns the single rendered galaxy slot.
///
/// The previous galaxy's mesh and material are released and its entity
/// despawned before a replacement is attached.
#[derive(Resource, Default)]
pub struct GalaxyGenerator {
    current: Option<RenderedGalaxy>,
}

impl GalaxyGenerator {
    pub fn state(&self) -> GeneratorState {
        match self.current() {
            Some(_) => GeneratorState::Populated,
            None => GeneratorState::Empty,
        }
    }

    pub fn current(&self) -> Option<&RenderedGalaxy> {
        self.current.as_ref()
    }

    /// Swaps in a galaxy built from `geometry`
    pub fn replace(
        &mut self,
        commands: &mut Commands,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<GalaxyPointsMaterial>,
        params: &GalaxyParameters,
        geometry: &GalaxyGeometry,
    ) -> &RenderedGalaxy {
        self.dispose(commands, meshes, materials);

        let mesh = meshes.add(point_mesh(geometry));
        let material = materials.add(GalaxyPointsMaterial::new(params));
        let entity = commands
            .spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::IDENTITY,
                Visibility::Inherited,
                GalaxyPoints,
                NotShadowCaster,
                NoFrustumCulling,
            ))
            .id();

        self.current.insert(RenderedGalaxy {
            entity,
            mesh,
            material,
        })
    }

    fn dispose(
        &mut self,
        commands: &mut Commands,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<GalaxyPointsMaterial>,
    ) {
        let Some(old) = self.current.take() else {
            return;
        };
        meshes.remove(&old.mesh);
        materials.remove(&old.material);
        commands.entity(old.entity).despawn();
    }
}

/// What the last regeneration produced, for the stats overlay
#[derive(Resource, Default, Clone, Debug)]
pub struct GalaxyStats {
    pub particles: usize,
    pub last_duration: Duration,
    pub regenerations: u64,
}

/// Rebuilds the galaxy whenever the parameters change or a rebuild is requested.
/// Runs to completion in one frame; large counts stall that frame.
fn regenerate_galaxy(
    mut commands: Commands,
    params: Res<GalaxyParameters>,
    mut requests: EventReader<RegenerateGalaxy>,
    mut generator: ResMut<GalaxyGenerator>,
    mut stats: ResMut<GalaxyStats>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<GalaxyPointsMaterial>>,
) {
    let requested = requests.read().count() > 0;
    if !params.is_changed() && !requested {
        return;
    }

    let start = Instant::now();
    let geometry = GalaxyGeometry::generate(&params, random_seed());
    generator.replace(
        &mut commands,
        &mut meshes,
        &mut materials,
        &params,
        &geometry,
    );

    stats.particles = geometry.len();
    stats.last_duration = start.elapsed();
    stats.regenerations += 1;

    info!(
        "Galaxy regenerated: {} particles in {:.1} ms",
        stats.particles,
        stats.last_duration.as_secs_f64() * 1000.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app(count: u32) -> App {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<GalaxyPointsMaterial>>()
            .insert_resource(GalaxyParameters {
                count,
                ..default()
            })
            .add_plugins(GalaxyGeneratorPlugin);
        app
    }

    fn attached_count(app: &mut App) -> usize {
        let mut query = app
            .world_mut()
            .query_filtered::<Entity, With<GalaxyPoints>>();
        query.iter(app.world()).count()
    }

    #[test]
    fn starts_empty() {
        let app = test_app(100);
        let generator = app.world().resource::<GalaxyGenerator>();
        assert_eq!(generator.state(), GeneratorState::Empty);
        assert!(generator.current().is_none());
    }

    #[test]
    fn first_update_populates() {
        let mut app = test_app(1000);
        app.update();

        let generator = app.world().resource::<GalaxyGenerator>();
        assert_eq!(generator.state(), GeneratorState::Populated);
        let current = generator.current().unwrap().clone();

        let mesh = app.world().resource::<Assets<Mesh>>().get(&current.mesh).unwrap();
        assert_eq!(mesh.count_vertices(), 1000 * 4);
        assert_eq!(attached_count(&mut app), 1);

        let stats = app.world().resource::<GalaxyStats>();
        assert_eq!(stats.particles, 1000);
        assert_eq!(stats.regenerations, 1);
    }

    #[test]
    fn regenerating_releases_the_previous_galaxy() {
        let mut app = test_app(500);
        app.update();
        let first = app
            .world()
            .resource::<GalaxyGenerator>()
            .current()
            .unwrap()
            .clone();

        for count in [800, 200, 300] {
            app.world_mut().resource_mut::<GalaxyParameters>().count = count;
            app.update();

            assert_eq!(attached_count(&mut app), 1);
            assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 1);
            assert_eq!(
                app.world().resource::<Assets<GalaxyPointsMaterial>>().len(),
                1
            );
        }

        let world = app.world();
        assert!(world.resource::<Assets<Mesh>>().get(&first.mesh).is_none());
        assert!(world
            .resource::<Assets<GalaxyPointsMaterial>>()
            .get(&first.material)
            .is_none());
        assert!(world.get::<GalaxyPoints>(first.entity).is_none());

        let current = world.resource::<GalaxyGenerator>().current().unwrap();
        let mesh = world.resource::<Assets<Mesh>>().get(&current.mesh).unwrap();
        assert_eq!(mesh.count_vertices(), 300 * 4);
        assert_eq!(world.resource::<GalaxyStats>().regenerations, 4);
    }

    #[test]
    fn each_regeneration_records_its_duration() {
        let mut app = test_app(100);
        app.update();

        let stale = Duration::from_secs(3600);
        app.world_mut().resource_mut::<GalaxyStats>().last_duration = stale;
        app.world_mut().send_event(RegenerateGalaxy);
        app.update();

        let stats = app.world().resource::<GalaxyStats>();
        assert_eq!(stats.regenerations, 2);
        assert!(stats.last_duration < stale);
    }

    #[test]
    fn unchanged_parameters_do_not_regenerate() {
        let mut app = test_app(100);
        app.update();
        app.update();
        app.update();
        assert_eq!(app.world().resource::<GalaxyStats>().regenerations, 1);
    }

    #[test]
    fn regenerate_request_rebuilds_with_same_parameters() {
        let mut app = test_app(100);
        app.update();
        let first = app
            .world()
            .resource::<GalaxyGenerator>()
            .current()
            .unwrap()
            .clone();

        app.world_mut().send_event(RegenerateGalaxy);
        app.update();

        let world = app.world();
        let current = world.resource::<GalaxyGenerator>().current().unwrap();
        assert_ne!(current.entity, first.entity);
        assert_eq!(world.resource::<GalaxyStats>().regenerations, 2);
        assert_eq!(world.resource::<GalaxyStats>().particles, 100);
        assert_eq!(attached_count(&mut app), 1);
    }

    #[test]
    fn material_follows_parameters() {
        let mut app = test_app(100);
        app.world_mut().resource_mut::<GalaxyParameters>().size = 0.05;
        app.update();

        let world = app.world();
        let current = world.resource::<GalaxyGenerator>().current().unwrap();
        let material = world
            .resource::<Assets<GalaxyPointsMaterial>>()
            .get(&current.material)
            .unwrap();
        assert_eq!(material.params.size, 0.05);
    }
}
