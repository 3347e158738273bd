use glam::Vec2;
use serde::{Deserialize, Serialize};
use spiderscene_common::{MaterialId, Rgb, Viewport};

/// Shader program a spider material is compiled from. Several materials may
/// share one program with different uniform values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderProgram {
    Spider1,
    Spider2,
}

/// Which of the three color uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    Base,
    Shadow,
    Light,
}

/// Which of the two repetition-count uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepetitionSlot {
    Shadow,
    Light,
}

/// Smallest repetition count a material accepts.
pub const MIN_REPETITIONS: u32 = 1;
/// Largest repetition count a material accepts.
pub const MAX_REPETITIONS: u32 = 300;

fn clamp_repetitions(name: &str, field: &'static str, value: u32) -> u32 {
    let clamped = value.clamp(MIN_REPETITIONS, MAX_REPETITIONS);
    if clamped != value {
        tracing::warn!(material = name, field, value, clamped, "repetition count out of range");
    }
    clamped
}

/// Definition of one spider material, as read from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub program: ShaderProgram,
    pub color: Rgb,
    pub shadow_color: Rgb,
    pub light_color: Rgb,
    pub shadow_repetitions: u32,
    pub light_repetitions: u32,
}

impl MaterialSpec {
    /// The three palettes the scene ships with.
    pub fn defaults() -> Vec<MaterialSpec> {
        vec![
            MaterialSpec {
                program: ShaderProgram::Spider1,
                color: Rgb::BLACK,
                shadow_color: Rgb::new(1.0, 0.0, 0.0),
                light_color: hex(0x00, 0x05, 0x99),
                shadow_repetitions: 55,
                light_repetitions: 102,
            },
            MaterialSpec {
                program: ShaderProgram::Spider2,
                color: Rgb::WHITE,
                shadow_color: hex(0xf1, 0x2e, 0xff),
                light_color: hex(0x05, 0x50, 0xff),
                shadow_repetitions: 30,
                light_repetitions: 55,
            },
            MaterialSpec {
                program: ShaderProgram::Spider2,
                color: hex(0xef, 0xff, 0x14),
                shadow_color: hex(0x00, 0xbf, 0xff),
                light_color: hex(0x00, 0xff, 0x1e),
                shadow_repetitions: 150,
                light_repetitions: 200,
            },
        ]
    }
}

fn hex(r: u8, g: u8, b: u8) -> Rgb {
    Rgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

/// Uniform values of one spider material.
///
/// Field order matches the `SpiderMaterial` struct in the WGSL source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiderUniforms {
    pub color: Rgb,
    pub shadow_color: Rgb,
    pub light_color: Rgb,
    pub resolution: Vec2,
    pub shadow_repetitions: u32,
    pub light_repetitions: u32,
}

impl SpiderUniforms {
    pub fn color(&self, slot: ColorSlot) -> Rgb {
        match slot {
            ColorSlot::Base => self.color,
            ColorSlot::Shadow => self.shadow_color,
            ColorSlot::Light => self.light_color,
        }
    }

    pub fn color_mut(&mut self, slot: ColorSlot) -> &mut Rgb {
        match slot {
            ColorSlot::Base => &mut self.color,
            ColorSlot::Shadow => &mut self.shadow_color,
            ColorSlot::Light => &mut self.light_color,
        }
    }

    pub fn repetitions(&self, slot: RepetitionSlot) -> u32 {
        match slot {
            RepetitionSlot::Shadow => self.shadow_repetitions,
            RepetitionSlot::Light => self.light_repetitions,
        }
    }

    pub fn repetitions_mut(&mut self, slot: RepetitionSlot) -> &mut u32 {
        match slot {
            RepetitionSlot::Shadow => &mut self.shadow_repetitions,
            RepetitionSlot::Light => &mut self.light_repetitions,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpiderMaterial {
    pub name: String,
    pub program: ShaderProgram,
    pub uniforms: SpiderUniforms,
}

/// All spider materials, indexed by [`MaterialId`].
#[derive(Debug, Clone, Default)]
pub struct MaterialSet {
    materials: Vec<SpiderMaterial>,
}

impl MaterialSet {
    /// Build one material per `MaterialSpec`, named `spider1`, `spider2`, ...
    ///
    /// Repetition counts are clamped to `[MIN_REPETITIONS, MAX_REPETITIONS]`.
    pub fn new(specs: &[MaterialSpec], viewport: &Viewport) -> Self {
        let resolution = viewport.resolution();
        let materials = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let name = format!("spider{}", i + 1);
                let uniforms = SpiderUniforms {
                    color: spec.color,
                    shadow_color: spec.shadow_color,
                    light_color: spec.light_color,
                    resolution,
                    shadow_repetitions: clamp_repetitions(
                        &name,
                        "shadow_repetitions",
                        spec.shadow_repetitions,
                    ),
                    light_repetitions: clamp_repetitions(
                        &name,
                        "light_repetitions",
                        spec.light_repetitions,
                    ),
                };
                SpiderMaterial {
                    name,
                    program: spec.program,
                    uniforms,
                }
            })
            .collect();
        Self { materials }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn get(&self, id: MaterialId) -> Option<&SpiderMaterial> {
        self.materials.get(id.0)
    }

    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut SpiderMaterial> {
        self.materials.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &SpiderMaterial)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i), m))
    }

    /// Push the viewport's drawing-buffer size into every material at once.
    pub fn sync_resolution(&mut self, viewport: &Viewport) {
        let resolution = viewport.resolution();
        for material in &mut self.materials {
            material.uniforms.resolution = resolution;
        }
        tracing::debug!(x = resolution.x, y = resolution.y, "resolution uniforms updated");
    }
}
