use bevy::prelude::*;

mod camera;
mod panel;
mod stats_widget;
mod viewport;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            camera::CameraPlugin,
            viewport::ViewportPlugin,
            panel::PanelPlugin,
            stats_widget::StatsWidgetPlugin,
        ));
    }
}
