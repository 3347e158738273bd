use spiderscene_common::{MaterialId, Rgb};
use spiderscene_render::{
    ColorSlot, MAX_REPETITIONS, MIN_REPETITIONS, MaterialSet, RepetitionSlot,
};

/// Bounds and step of a numeric control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl NumericRange {
    /// Snap to the nearest step, then clamp into `[min, max]`.
    pub fn apply(&self, value: f64) -> f64 {
        let snapped = if self.step > 0.0 {
            (value / self.step).round() * self.step
        } else {
            value
        };
        if snapped.is_nan() {
            return self.min;
        }
        snapped.clamp(self.min, self.max)
    }
}

/// Range of both repetition-count controls.
pub const REPETITION_RANGE: NumericRange = NumericRange {
    min: MIN_REPETITIONS as f64,
    max: MAX_REPETITIONS as f64,
    step: 1.0,
};

/// Errors from panel edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    #[error("no panel folder for material {0:?}")]
    UnknownMaterial(MaterialId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindingKind {
    /// Edited through the panel's own value, pushed to the uniform on change.
    Color(ColorSlot),
    /// Bound straight to the uniform value.
    Repetitions(RepetitionSlot, NumericRange),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub label: &'static str,
    pub kind: BindingKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColorParams {
    base: Rgb,
    shadow: Rgb,
    light: Rgb,
}

impl ColorParams {
    fn slot_mut(&mut self, slot: ColorSlot) -> &mut Rgb {
        match slot {
            ColorSlot::Base => &mut self.base,
            ColorSlot::Shadow => &mut self.shadow,
            ColorSlot::Light => &mut self.light,
        }
    }

    fn slot(&self, slot: ColorSlot) -> Rgb {
        match slot {
            ColorSlot::Base => self.base,
            ColorSlot::Shadow => self.shadow,
            ColorSlot::Light => self.light,
        }
    }
}

/// One group of controls, bound to one material.
#[derive(Debug, Clone)]
pub struct TweakFolder {
    pub title: String,
    pub material: MaterialId,
    pub bindings: Vec<Binding>,
    colors: ColorParams,
}

/// Runtime control panel for the spider materials.
///
/// Color values live here and are pushed into the matching uniform by the
/// edit call; repetition counts are read and written on the uniforms
/// directly.
#[derive(Debug, Clone)]
pub struct TweakPanel {
    folders: Vec<TweakFolder>,
}

impl TweakPanel {
    pub fn build(materials: &MaterialSet) -> Self {
        let folders: Vec<TweakFolder> = materials
            .iter()
            .enumerate()
            .map(|(i, (id, material))| TweakFolder {
                title: format!("Spider {}", i + 1),
                material: id,
                bindings: folder_bindings(),
                colors: ColorParams {
                    base: material.uniforms.color,
                    shadow: material.uniforms.shadow_color,
                    light: material.uniforms.light_color,
                },
            })
            .collect();
        tracing::info!(folders = folders.len(), "tweak panel built");
        Self { folders }
    }

    pub fn folders(&self) -> &[TweakFolder] {
        &self.folders
    }

    /// Panel-side value of a color control.
    pub fn color(&self, material: MaterialId, slot: ColorSlot) -> Option<Rgb> {
        self.folder(material).map(|f| f.colors.slot(slot))
    }

    /// Edit a color control and push it into the material's uniform.
    pub fn set_color(
        &mut self,
        material: MaterialId,
        slot: ColorSlot,
        value: Rgb,
        materials: &mut MaterialSet,
    ) -> Result<(), PanelError> {
        let folder = self
            .folders
            .iter_mut()
            .find(|f| f.material == material)
            .ok_or(PanelError::UnknownMaterial(material))?;
        *folder.colors.slot_mut(slot) = value;

        let target = materials
            .get_mut(material)
            .ok_or(PanelError::UnknownMaterial(material))?;
        *target.uniforms.color_mut(slot) = value;
        tracing::debug!(material = %target.name, ?slot, color = %value, "color uniform updated");
        Ok(())
    }

    /// Edit a repetition count. The value is snapped and clamped to
    /// [`REPETITION_RANGE`]; the stored count is returned.
    pub fn set_repetitions(
        &self,
        material: MaterialId,
        slot: RepetitionSlot,
        value: f64,
        materials: &mut MaterialSet,
    ) -> Result<u32, PanelError> {
        self.folder(material)
            .ok_or(PanelError::UnknownMaterial(material))?;
        let target = materials
            .get_mut(material)
            .ok_or(PanelError::UnknownMaterial(material))?;
        let count = REPETITION_RANGE.apply(value) as u32;
        *target.uniforms.repetitions_mut(slot) = count;
        Ok(count)
    }

    fn folder(&self, material: MaterialId) -> Option<&TweakFolder> {
        self.folders.iter().find(|f| f.material == material)
    }
}

fn folder_bindings() -> Vec<Binding> {
    vec![
        Binding {
            label: "Color",
            kind: BindingKind::Color(ColorSlot::Base),
        },
        Binding {
            label: "Shadow Color",
            kind: BindingKind::Color(ColorSlot::Shadow),
        },
        Binding {
            label: "ShadowRepetitions",
            kind: BindingKind::Repetitions(RepetitionSlot::Shadow, REPETITION_RANGE),
        },
        Binding {
            label: "Light Color",
            kind: BindingKind::Color(ColorSlot::Light),
        },
        Binding {
            label: "LightRepetitions",
            kind: BindingKind::Repetitions(RepetitionSlot::Light, REPETITION_RANGE),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiderscene_common::Viewport;
    use spiderscene_render::MaterialSpec;

    fn materials() -> MaterialSet {
        MaterialSet::new(&MaterialSpec::defaults(), &Viewport::default())
    }

    #[test]
    fn one_folder_per_material_with_five_bindings() {
        let panel = TweakPanel::build(&materials());
        let titles: Vec<&str> = panel.folders().iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Spider 1", "Spider 2", "Spider 3"]);

        let labels: Vec<&str> = panel.folders()[0].bindings.iter().map(|b| b.label).collect();
        assert_eq!(
            labels,
            vec!["Color", "Shadow Color", "ShadowRepetitions", "Light Color", "LightRepetitions"]
        );
    }

    #[test]
    fn panel_colors_start_from_uniforms() {
        let set = materials();
        let panel = TweakPanel::build(&set);
        assert_eq!(
            panel.color(MaterialId(1), ColorSlot::Shadow),
            Some(set.get(MaterialId(1)).unwrap().uniforms.shadow_color)
        );
    }

    #[test]
    fn color_edit_touches_only_the_matching_uniform() {
        let mut set = materials();
        let before = set.clone();
        let mut panel = TweakPanel::build(&set);
        let teal = Rgb::from_hex("#00ffcc").unwrap();

        panel
            .set_color(MaterialId(1), ColorSlot::Shadow, teal, &mut set)
            .unwrap();

        for (id, material) in set.iter() {
            let old = &before.get(id).unwrap().uniforms;
            for slot in [ColorSlot::Base, ColorSlot::Shadow, ColorSlot::Light] {
                let expected = if id == MaterialId(1) && slot == ColorSlot::Shadow {
                    teal
                } else {
                    old.color(slot)
                };
                assert_eq!(material.uniforms.color(slot), expected, "{id:?} {slot:?}");
            }
        }
        assert_eq!(panel.color(MaterialId(1), ColorSlot::Shadow), Some(teal));
        assert_eq!(
            panel.color(MaterialId(0), ColorSlot::Shadow),
            Some(before.get(MaterialId(0)).unwrap().uniforms.shadow_color)
        );
    }

    #[test]
    fn repetitions_are_rounded_and_clamped() {
        let mut set = materials();
        let panel = TweakPanel::build(&set);
        let cases = [
            (0.0, 1),
            (-40.0, 1),
            (1.4, 1),
            (42.5, 43),
            (99.49, 99),
            (300.0, 300),
            (301.0, 300),
            (1e9, 300),
            (f64::NAN, 1),
        ];
        for (input, expected) in cases {
            let stored = panel
                .set_repetitions(MaterialId(2), RepetitionSlot::Light, input, &mut set)
                .unwrap();
            assert_eq!(stored, expected, "input {input}");
            assert_eq!(
                set.get(MaterialId(2)).unwrap().uniforms.light_repetitions,
                expected
            );
        }
        // The other slot is untouched
        assert_eq!(
            set.get(MaterialId(2)).unwrap().uniforms.shadow_repetitions,
            150
        );
    }

    #[test]
    fn unknown_material_is_rejected() {
        let mut set = materials();
        let mut panel = TweakPanel::build(&set);
        assert_eq!(
            panel.set_color(MaterialId(9), ColorSlot::Base, Rgb::WHITE, &mut set),
            Err(PanelError::UnknownMaterial(MaterialId(9)))
        );
        assert_eq!(
            panel.set_repetitions(MaterialId(9), RepetitionSlot::Shadow, 5.0, &mut set),
            Err(PanelError::UnknownMaterial(MaterialId(9)))
        );
    }

    #[test]
    fn resolution_is_not_a_panel_control() {
        let mut set = materials();
        let mut panel = TweakPanel::build(&set);
        let resolution = set.get(MaterialId(0)).unwrap().uniforms.resolution;
        panel
            .set_color(MaterialId(0), ColorSlot::Base, Rgb::WHITE, &mut set)
            .unwrap();
        assert_eq!(set.get(MaterialId(0)).unwrap().uniforms.resolution, resolution);
        assert_eq!(resolution, glam::Vec2::new(1280.0, 720.0));
    }
}
