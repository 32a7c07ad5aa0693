use crate::prelude::*;
use bevy::color::ColorToPacked;
use bevy::ecs::change_detection::DetectChangesMut;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

const PANEL_WIDTH: f32 = 360.0;

pub struct PanelPlugin;

impl Plugin for PanelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ParameterDraft>()
            .add_systems(Startup, configure_visuals_system)
            .add_systems(Update, (ui_system, commit_finished_edits).chain());
    }
}

/// Values being edited in the panel, not yet seen by the generator
#[derive(Resource, Default)]
pub struct ParameterDraft {
    pub params: GalaxyParameters,
    finished: bool,
}

impl ParameterDraft {
    /// Marks the current draft as a completed edit
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Consumes a completed edit once the pointer is released
    pub fn take_finished(&mut self, pointer_down: bool) -> bool {
        if !self.finished || pointer_down {
            return false;
        }
        self.finished = false;
        true
    }
}

/// Drag release, focus loss or a value applied outside keyboard focus.
/// Keyboard nudges on a focused slider wait for the focus to leave.
fn finishes_edit(response: &egui::Response, pointer_down: bool) -> bool {
    response.drag_stopped()
        || response.lost_focus()
        || (response.changed() && (pointer_down || !response.has_focus()))
}

fn configure_visuals_system(mut contexts: EguiContexts) {
    contexts.ctx_mut().set_visuals(egui::Visuals {
        window_corner_radius: 0.0.into(),
        ..Default::default()
    });
}

/// Returns whether the slider finished an edit this frame
fn slider_row(ui: &mut egui::Ui, pointer_down: bool, slider: egui::Slider<'_>) -> bool {
    let response = ui.add(slider.update_while_editing(false));
    finishes_edit(&response, pointer_down)
}

/// Returns whether the color changed
fn color_row(label: &str, color: &mut Srgba, ui: &mut egui::Ui) -> bool {
    ui.horizontal(|ui| {
        let mut rgb = color.to_u8_array_no_alpha();
        let changed = ui.color_edit_button_srgb(&mut rgb).changed();
        if changed {
            *color = Srgba::rgb_u8(rgb[0], rgb[1], rgb[2]);
        }
        ui.label(label);
        changed
    })
    .inner
}

fn ui_system(
    mut contexts: EguiContexts,
    mut draft: ResMut<ParameterDraft>,
    mut regenerate: EventWriter<RegenerateGalaxy>,
) {
    let ctx = contexts.ctx_mut();
    let (min, max, step) = (
        GalaxyParameters::MIN,
        GalaxyParameters::MAX,
        GalaxyParameters::STEP,
    );

    let pointer_down = ctx.input(|input| input.pointer.any_down());
    let mut finished = false;

    egui::SidePanel::left("galaxy_panel")
        .default_width(PANEL_WIDTH)
        .show(ctx, |ui| {
            ui.heading("Galaxy");
            let params = &mut draft.params;
            finished |= slider_row(
                ui,
                pointer_down,
                egui::Slider::new(&mut params.count, min.count..=max.count)
                    .step_by(step.count as f64)
                    .text("count"),
            );
            finished |= slider_row(
                ui,
                pointer_down,
                egui::Slider::new(&mut params.size, min.size..=max.size)
                    .step_by(step.size as f64)
                    .text("size"),
            );
            finished |= slider_row(
                ui,
                pointer_down,
                egui::Slider::new(&mut params.radius, min.radius..=max.radius)
                    .step_by(step.radius as f64)
                    .text("radius"),
            );
            finished |= slider_row(
                ui,
                pointer_down,
                egui::Slider::new(&mut params.branches, min.branches..=max.branches)
                    .step_by(step.branches as f64)
                    .text("branches"),
            );
            finished |= slider_row(
                ui,
                pointer_down,
                egui::Slider::new(&mut params.spin, min.spin..=max.spin)
                    .step_by(step.spin as f64)
                    .text("spin"),
            );
            finished |= slider_row(
                ui,
                pointer_down,
                egui::Slider::new(&mut params.randomness, min.randomness..=max.randomness)
                    .step_by(step.randomness as f64)
                    .text("randomness"),
            );
            finished |= slider_row(
                ui,
                pointer_down,
                egui::Slider::new(
                    &mut params.randomness_power,
                    min.randomness_power..=max.randomness_power,
                )
                .step_by(step.randomness_power as f64)
                .text("randomness power"),
            );

            finished |= color_row("inside color", &mut params.inside_color, ui);
            finished |= color_row("outside color", &mut params.outside_color, ui);

            let mut scaled = params.jitter_mode == JitterMode::Scaled;
            if ui
                .checkbox(&mut scaled, "Scale jitter by randomness")
                .changed()
            {
                params.jitter_mode = if scaled {
                    JitterMode::Scaled
                } else {
                    JitterMode::AsBuilt
                };
                finished = true;
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Regenerate").clicked() {
                    regenerate.write(RegenerateGalaxy);
                }
                if ui.button("Reset").clicked() {
                    *params = GalaxyParameters::default();
                    finished = true;
                }
            });
        });

    if finished {
        draft.finish();
    }
}

/// Publishes the draft only for completed edits, so a slider drag or a typed
/// value regenerates once at the end instead of on every intermediate value
fn commit_finished_edits(
    mut contexts: EguiContexts,
    mut draft: ResMut<ParameterDraft>,
    mut params: ResMut<GalaxyParameters>,
) {
    let pointer_down = contexts
        .ctx_mut()
        .input(|input| input.pointer.any_down());
    let finished = draft.bypass_change_detection().take_finished(pointer_down);
    commit_draft(&draft.params, &mut params, finished);
}

/// Returns whether the live parameters changed
fn commit_draft<P>(draft: &GalaxyParameters, live: &mut P, finished: bool) -> bool
where
    P: DetectChangesMut<Inner = GalaxyParameters>,
{
    if !finished {
        return false;
    }
    live.set_if_neq(draft.clone())
}
