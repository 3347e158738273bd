use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use spiderscene_assets::MeshData;
use spiderscene_render::{RenderView, SpiderUniforms};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl From<&RenderView> for CameraUniform {
    fn from(view: &RenderView) -> Self {
        Self {
            view_proj: view.view_projection().to_cols_array_2d(),
        }
    }
}

/// GPU copy of [`SpiderUniforms`]. Layout matches `SpiderMaterial` in the
/// WGSL source: three vec4 colors, then resolution and the two counts.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub shadow_color: [f32; 4],
    pub light_color: [f32; 4],
    pub resolution: [f32; 2],
    pub shadow_repetitions: f32,
    pub light_repetitions: f32,
}

impl From<&SpiderUniforms> for MaterialUniform {
    fn from(u: &SpiderUniforms) -> Self {
        let rgba = |c: [f32; 3]| [c[0], c[1], c[2], 1.0];
        Self {
            color: rgba(u.color.to_linear()),
            shadow_color: rgba(u.shadow_color.to_linear()),
            light_color: rgba(u.light_color.to_linear()),
            resolution: u.resolution.to_array(),
            shadow_repetitions: u.shadow_repetitions as f32,
            light_repetitions: u.light_repetitions as f32,
        }
    }
}

impl MaterialUniform {
    /// Uniforms for a mesh drawn in its own linear base color.
    pub fn flat(base_color: [f32; 4]) -> Self {
        Self {
            color: base_color,
            shadow_color: [0.0; 4],
            light_color: [0.0; 4],
            resolution: [1.0, 1.0],
            shadow_repetitions: 1.0,
            light_repetitions: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct OverlayUniform {
    pub alpha: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Per-draw model matrix, fed as instance attributes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
}

impl From<Mat4> for InstanceData {
    fn from(model: Mat4) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
        }
    }
}

pub(crate) fn vertices(mesh: &MeshData) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, position)| Vertex {
            position: *position,
            normal: mesh.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
        })
        .collect()
}
