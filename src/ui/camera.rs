use bevy::{
    core_pipeline::tonemapping::Tonemapping,
    input::mouse::{AccumulatedMouseMotion, MouseScrollUnit, MouseWheel},
    prelude::*,
    transform::TransformSystem,
    window::PrimaryWindow,
};
use bevy_egui::EguiContexts;
use std::f32::consts::{FRAC_PI_2, TAU};

const FOV_DEGREES: f32 = 75.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;
const START_POSITION: Vec3 = Vec3::splat(3.0);

/// Share of the pending rotation applied each frame; the rest carries over as inertia
const DAMPING_FACTOR: f32 = 0.05;
const MAX_PITCH: f32 = FRAC_PI_2 - 0.01;
const MIN_DISTANCE: f32 = 0.2;
const MAX_DISTANCE: f32 = 60.0;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera).add_systems(
            PostUpdate,
            camera_control_system.before(TransformSystem::TransformPropagate),
        );
    }
}

fn spawn_camera(mut commands: Commands, mut clearcolor: ResMut<ClearColor>) {
    *clearcolor = ClearColor(Color::BLACK);

    let orbit = OrbitCamera::looking_from(START_POSITION, Vec3::ZERO);
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: FOV_DEGREES.to_radians(),
            near: NEAR,
            far: FAR,
            ..default()
        }),
        // vertex colors go to the screen untouched
        Tonemapping::None,
        Transform::from_translation(orbit.translation()).looking_at(orbit.target, Vec3::Y),
        orbit,
    ));
}

/// Damped orbit around a target point.
///
/// Drags queue rotation that is applied a fraction at a time, so the camera
/// keeps drifting briefly after the mouse stops.
#[derive(Component, Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    smooth_zoom_buffer: f32,
}

impl OrbitCamera {
    pub fn looking_from(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length().max(MIN_DISTANCE);

        Self {
            target,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            smooth_zoom_buffer: 0.0,
        }
    }

    pub fn translation(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();

        self.target + Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    /// Queues rotation for a drag of `delta` pixels; a drag the height of the
    /// viewport is one full turn.
    pub fn drag(&mut self, delta: Vec2, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        self.pending_yaw -= TAU * delta.x / viewport_height;
        self.pending_pitch += TAU * delta.y / viewport_height;
    }

    /// Positive zooms in
    pub fn zoom(&mut self, amount: f32) {
        self.smooth_zoom_buffer += amount;
    }

    /// Advances the damped motion by one frame
    pub fn step(&mut self) {
        self.yaw += self.pending_yaw * DAMPING_FACTOR;
        self.pitch = (self.pitch + self.pending_pitch * DAMPING_FACTOR).clamp(-MAX_PITCH, MAX_PITCH);
        self.pending_yaw *= 1.0 - DAMPING_FACTOR;
        self.pending_pitch *= 1.0 - DAMPING_FACTOR;

        // scroll is cached to a buffer, drained into the distance over a few frames
        let smooth_zoom_min = 0.001f32;
        let smooth_zoom_factor = 0.2f32;

        let smooth_zoom_amount = if self.smooth_zoom_buffer < 0.0 {
            f32::min(
                self.smooth_zoom_buffer * smooth_zoom_factor,
                (-smooth_zoom_min).max(self.smooth_zoom_buffer),
            )
        } else {
            f32::max(
                self.smooth_zoom_buffer * smooth_zoom_factor,
                smooth_zoom_min.min(self.smooth_zoom_buffer),
            )
        };
        self.smooth_zoom_buffer -= smooth_zoom_amount;
        self.distance =
            (self.distance * (1.0 - smooth_zoom_amount)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

pub fn camera_control_system(
    mut query: Query<(&mut Transform, &mut OrbitCamera)>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
    mut contexts: EguiContexts,
) {
    let Ok((mut transform, mut orbit)) = query.single_mut() else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };

    let ctx = contexts.ctx_mut();
    let pointer_on_panel = ctx.wants_pointer_input() || ctx.is_pointer_over_area();

    if pointer_on_panel {
        scroll_evr.clear();
    } else {
        if mouse_buttons.pressed(MouseButton::Left) {
            orbit.drag(mouse_motion.delta, window.height());
        }
        for ev in scroll_evr.read() {
            match ev.unit {
                MouseScrollUnit::Line => orbit.zoom(ev.y * 0.05),
                MouseScrollUnit::Pixel => orbit.zoom(ev.y * 0.002),
            }
        }
    }

    orbit.step();

    transform.translation = orbit.translation();
    transform.look_at(orbit.target, Vec3::Y);
}
