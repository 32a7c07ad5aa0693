use crate::prelude::*;
use bevy::diagnostic::DiagnosticsStore;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;

pub struct StatsWidgetPlugin;

impl Plugin for StatsWidgetPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_widget)
            .add_systems(Update, (update_fps_system, update_galaxy_system))
            .add_plugins(FrameTimeDiagnosticsPlugin::default());
    }
}

#[derive(Component)]
struct FpsText;

#[derive(Component)]
struct GalaxyText;

fn setup_widget(mut commands: Commands) {
    let font = TextFont {
        font_size: 16.0,
        ..default()
    };

    commands
        .spawn((
            Node {
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::FlexStart,
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::FlexStart,
                width: Val::Px(260.),
                right: Val::Percent(1.),
                top: Val::Percent(1.),
                bottom: Val::Auto,
                left: Val::Auto,
                padding: UiRect::all(Val::Px(4.0)),
                ..default()
            },
            BackgroundColor(Color::linear_rgba(0.0, 0.03, 0.08, 0.5)),
            GlobalZIndex(i32::MAX - 1),
        ))
        .with_children(|parent| {
            parent.spawn((FpsText, Text("FPS: N/A".to_string()), font.clone()));
            parent.spawn((GalaxyText, Text("Galaxy: empty".to_string()), font));
        });
}

fn update_fps_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
        .unwrap_or(0.0);
    let frame_time = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
        .and_then(|frame_time| frame_time.smoothed())
        .unwrap_or(0.0);

    for mut text in &mut query {
        text.0 = format!("FPS: {fps:.1} ({frame_time:.2} ms)");
    }
}

fn update_galaxy_system(
    generator: Res<GalaxyGenerator>,
    stats: Res<GalaxyStats>,
    mut query: Query<&mut Text, With<GalaxyText>>,
) {
    if !stats.is_changed() {
        return;
    }

    let label = match generator.state() {
        GeneratorState::Empty => "Galaxy: empty".to_string(),
        GeneratorState::Populated => format!(
            "Galaxy: {} particles ({:.1} ms)",
            stats.particles,
            stats.last_duration.as_secs_f64() * 1000.0
        ),
    };
    for mut text in &mut query {
        text.0 = label.clone();
    }
}
