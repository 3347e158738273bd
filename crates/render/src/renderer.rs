use glam::{Mat4, Vec3};
use spiderscene_scene::Scene;
use std::fmt::Write;

use crate::material::MaterialSet;
use crate::overlay::OverlayMaterial;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Width over height of the viewport the camera was last resized to.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl RenderView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(4.0, 1.0, 6.0),
            target: Vec3::ZERO,
            fov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Everything a renderer reads to produce one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub materials: &'a MaterialSet,
    pub overlay: &'a OverlayMaterial,
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads scene state and a view configuration, then produces
/// output. It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene state and view.
    fn render(&self, frame: &Frame<'_>, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable description of the frame. Used by the CLI and
/// by tests of the render loop.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &Frame<'_>, view: &RenderView) -> String {
        let mut out = String::new();
        let drawables = frame.scene.drawables();
        let _ = writeln!(
            out,
            "=== Frame (nodes={}, meshes={}, overlay={:.3}) ===",
            frame.scene.node_count(),
            drawables.len(),
            frame.overlay.alpha()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z,
            view.fov_degrees, view.aspect
        );

        for (id, node, _) in drawables {
            let material = node
                .material
                .and_then(|m| frame.materials.get(m))
                .map(|m| m.name.as_str())
                .unwrap_or("none");
            let _ = writeln!(
                out,
                "  [{}] {} rot.y={:.3} material={}",
                id.short(),
                node.name,
                node.transform.rotation.y,
                material
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialSpec;
    use spiderscene_assets::{AssetId, MeshData, ModelAsset, ModelNode};
    use spiderscene_common::{MaterialId, Transform, Viewport};
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::new();
        let materials = MaterialSet::default();
        let overlay = OverlayMaterial::new();
        let frame = Frame {
            scene: &scene,
            materials: &materials,
            overlay: &overlay,
        };
        let output = DebugTextRenderer::new().render(&frame, &RenderView::default());

        assert!(output.contains("meshes=0"));
        assert!(output.contains("overlay=1.000"));
    }

    #[test]
    fn debug_renderer_lists_meshes_with_materials() {
        let mut scene = Scene::new();
        let model = ModelAsset {
            id: AssetId(0),
            source: PathBuf::from("spider.glb"),
            nodes: vec![ModelNode {
                name: "Spider1".into(),
                transform: Transform::default(),
                mesh: Some(Arc::new(MeshData::default())),
                children: Vec::new(),
            }],
        };
        let root = scene.attach_model(&model, "spiders", Transform::default());
        let spider = scene.find_child(root, "Spider1").unwrap();
        scene.set_material(spider, MaterialId(0)).unwrap();

        let materials = MaterialSet::new(&MaterialSpec::defaults(), &Viewport::default());
        let overlay = OverlayMaterial::new();
        let frame = Frame {
            scene: &scene,
            materials: &materials,
            overlay: &overlay,
        };
        let output = DebugTextRenderer::new().render(&frame, &RenderView::default());

        assert!(output.contains("meshes=1"));
        assert!(output.contains("Spider1"));
        assert!(output.contains("material=spider1"));
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 75.0);
        assert_eq!(view.eye, Vec3::new(4.0, 1.0, 6.0));
    }

    #[test]
    fn target_projects_to_the_center() {
        let view = RenderView::default();
        let clip = view.view_projection() * view.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..1.0).contains(&ndc.z));
    }

    #[test]
    fn projection_follows_aspect() {
        let wide = RenderView {
            aspect: 2.0,
            ..RenderView::default()
        };
        let square = RenderView {
            aspect: 1.0,
            ..RenderView::default()
        };
        let x_scale = |v: &RenderView| v.projection_matrix().col(0).x;
        assert!((x_scale(&square) / x_scale(&wide) - 2.0).abs() < 1e-5);
    }
}
