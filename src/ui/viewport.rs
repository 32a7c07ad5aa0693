use super::camera::OrbitCamera;
use bevy::{prelude::*, window::WindowResized};

/// Highest UI scale factor the window is allowed to use. The swap chain keeps
/// the physical resolution; only logical sizing is capped.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

pub struct ViewportPlugin;

impl Plugin for ViewportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Viewport>()
            .add_systems(Update, handle_window_resize);
    }
}

/// Size of the drawing surface in logical pixels
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        self.width = width;
        self.height = height;
        self.pixel_ratio = clamp_pixel_ratio(device_pixel_ratio);
    }
}

pub fn clamp_pixel_ratio(device_pixel_ratio: f32) -> f32 {
    device_pixel_ratio.min(MAX_PIXEL_RATIO)
}

/// Resizes the viewport and camera; never touches the galaxy
fn handle_window_resize(
    mut resize_events: EventReader<WindowResized>,
    mut windows: Query<&mut Window>,
    mut projections: Query<&mut Projection, With<OrbitCamera>>,
    mut viewport: ResMut<Viewport>,
) {
    let Some(event) = resize_events.read().last() else {
        return;
    };
    let Ok(mut window) = windows.get_mut(event.window) else {
        return;
    };

    let device_pixel_ratio = window.resolution.base_scale_factor();
    viewport.resize(event.width, event.height, device_pixel_ratio);

    // Caps the logical scale on dense displays so the panel and overlay do not
    // grow past 2x
    let pixel_ratio_override =
        (viewport.pixel_ratio < device_pixel_ratio).then_some(viewport.pixel_ratio);
    if window.resolution.scale_factor_override() != pixel_ratio_override {
        window
            .resolution
            .set_scale_factor_override(pixel_ratio_override);
    }

    for mut projection in &mut projections {
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.aspect_ratio = viewport.aspect_ratio();
        }
    }

    debug!(
        "Viewport resized to {}x{} at pixel ratio {}",
        viewport.width, viewport.height, viewport.pixel_ratio
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::GalaxyPlugin;
    use crate::graphics::GalaxyPointsMaterial;
    use crate::prelude::*;

    #[test]
    fn pixel_ratio_is_clamped_to_two() {
        assert_eq!(clamp_pixel_ratio(1.0), 1.0);
        assert_eq!(clamp_pixel_ratio(1.5), 1.5);
        assert_eq!(clamp_pixel_ratio(3.0), MAX_PIXEL_RATIO);
    }

    #[test]
    fn resize_updates_dimensions() {
        let mut viewport = Viewport::default();
        viewport.resize(800.0, 400.0, 3.0);

        assert_eq!(viewport.width, 800.0);
        assert_eq!(viewport.height, 400.0);
        assert_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!(viewport.aspect_ratio(), 2.0);
    }

    #[test]
    fn zero_height_keeps_a_usable_aspect() {
        let mut viewport = Viewport::default();
        viewport.resize(800.0, 0.0, 1.0);
        assert_eq!(viewport.aspect_ratio(), 1.0);
    }

    fn resize_app() -> App {
        let mut app = App::new();
        app.add_event::<WindowResized>().add_plugins(ViewportPlugin);
        app
    }

    fn resize(app: &mut App, window: Entity) {
        app.world_mut().send_event(WindowResized {
            window,
            width: 640.0,
            height: 480.0,
        });
        app.update();
    }

    #[test]
    fn dense_display_scale_is_capped_at_two() {
        let mut app = resize_app();
        let mut window = Window::default();
        window.resolution.set_scale_factor(3.0);
        let window = app.world_mut().spawn(window).id();

        resize(&mut app, window);

        let resolution = &app.world().get::<Window>(window).unwrap().resolution;
        assert_eq!(resolution.scale_factor_override(), Some(MAX_PIXEL_RATIO));
        assert_eq!(resolution.scale_factor(), MAX_PIXEL_RATIO);
        assert_eq!(app.world().resource::<Viewport>().pixel_ratio, MAX_PIXEL_RATIO);
    }

    #[test]
    fn moderate_display_scale_is_left_alone() {
        let mut app = resize_app();
        let mut window = Window::default();
        window.resolution.set_scale_factor(1.5);
        let window = app.world_mut().spawn(window).id();

        resize(&mut app, window);

        let resolution = &app.world().get::<Window>(window).unwrap().resolution;
        assert_eq!(resolution.scale_factor_override(), None);
        assert_eq!(app.world().resource::<Viewport>().pixel_ratio, 1.5);
    }

    #[test]
    fn resize_event_updates_camera_without_regenerating() {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<GalaxyPointsMaterial>>()
            .add_event::<WindowResized>()
            .add_plugins((GalaxyPlugin, ViewportPlugin))
            .insert_resource(GalaxyParameters {
                count: 1000,
                ..default()
            });

        let window = app.world_mut().spawn(Window::default()).id();
        let camera = app
            .world_mut()
            .spawn((
                Projection::Perspective(PerspectiveProjection::default()),
                OrbitCamera::looking_from(Vec3::splat(3.0), Vec3::ZERO),
            ))
            .id();

        app.update();
        assert_eq!(app.world().resource::<GalaxyStats>().regenerations, 1);

        app.world_mut().send_event(WindowResized {
            window,
            width: 1000.0,
            height: 500.0,
        });
        app.update();

        let world = app.world();
        let viewport = world.resource::<Viewport>();
        assert_eq!((viewport.width, viewport.height), (1000.0, 500.0));

        let Some(Projection::Perspective(perspective)) = world.get::<Projection>(camera) else {
            panic!("camera lost its perspective projection");
        };
        assert_eq!(perspective.aspect_ratio, 2.0);

        assert_eq!(world.resource::<GalaxyStats>().regenerations, 1);
        assert_eq!(
            world.resource::<GalaxyGenerator>().state(),
            GeneratorState::Populated
        );
    }
}
