use egui::Context as EguiContext;
use spiderscene_common::Rgb;
use spiderscene_kernel::Stage;
use spiderscene_tools::BindingKind;

/// Loading indicator and, once the stage is interactive, the tweak panel.
pub fn draw(ctx: &EguiContext, stage: &mut Stage, now: f64) {
    if stage.indicator_visible(now) {
        loading_indicator(ctx, stage);
    }
    tweak_panel(ctx, stage);
}

fn loading_indicator(ctx: &EguiContext, stage: &Stage) {
    let ratio = stage.progress().map_or(0.0, |p| p.ratio());
    egui::Area::new(egui::Id::new("loading"))
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .interactable(false)
        .show(ctx, |ui| {
            ui.set_width(240.0);
            ui.vertical_centered(|ui| {
                ui.label("Loading...");
                ui.add(egui::ProgressBar::new(ratio).show_percentage());
            });
        });
}

fn tweak_panel(ctx: &EguiContext, stage: &mut Stage) {
    let Some((panel, materials)) = stage.panel_mut() else {
        return;
    };
    let folders = panel.folders().to_vec();

    egui::Window::new("Tweaks")
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-8.0, 8.0))
        .resizable(false)
        .show(ctx, |ui| {
            for folder in &folders {
                egui::CollapsingHeader::new(&folder.title)
                    .default_open(true)
                    .show(ui, |ui| {
                        for binding in &folder.bindings {
                            match binding.kind {
                                BindingKind::Color(slot) => {
                                    let Some(current) = panel.color(folder.material, slot) else {
                                        continue;
                                    };
                                    let mut srgb = current.to_srgb8();
                                    let changed = ui
                                        .horizontal(|ui| {
                                            ui.label(binding.label);
                                            ui.color_edit_button_srgb(&mut srgb).changed()
                                        })
                                        .inner;
                                    if changed {
                                        let [r, g, b] = srgb.map(|c| c as f32 / 255.0);
                                        if let Err(e) = panel.set_color(
                                            folder.material,
                                            slot,
                                            Rgb::new(r, g, b),
                                            materials,
                                        ) {
                                            tracing::error!(error = %e, "color edit rejected");
                                        }
                                    }
                                }
                                BindingKind::Repetitions(slot, range) => {
                                    let Some(material) = materials.get(folder.material) else {
                                        continue;
                                    };
                                    let mut value = material.uniforms.repetitions(slot);
                                    let slider = egui::Slider::new(
                                        &mut value,
                                        range.min as u32..=range.max as u32,
                                    )
                                    .step_by(range.step)
                                    .text(binding.label);
                                    if ui.add(slider).changed() {
                                        if let Err(e) = panel.set_repetitions(
                                            folder.material,
                                            slot,
                                            value as f64,
                                            materials,
                                        ) {
                                            tracing::error!(error = %e, "repetition edit rejected");
                                        }
                                    }
                                }
                            }
                        }
                    });
            }
        });
}
