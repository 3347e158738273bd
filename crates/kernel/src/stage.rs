use glam::Vec3;
use spiderscene_assets::{AssetLoader, LoadEvent, ModelAsset, Progress, TextureAsset};
use spiderscene_common::{MaterialId, NodeId, Rgb, Transform, Viewport};
use spiderscene_input::{CameraAction, OrbitControls};
use spiderscene_render::{Frame, MaterialSet, OverlayMaterial, RenderView, Renderer};
use spiderscene_scene::Scene;
use spiderscene_tools::TweakPanel;

use crate::config::SceneConfig;
use crate::lifecycle::{Lifecycle, Phase, Transition};

/// Name of the node the model is attached under.
const MODEL_ROOT: &str = "Model";

/// The application context. Owns every piece of mutable scene state and is
/// driven from a single control flow.
///
/// Times passed in are seconds since start on the caller's clock. The same
/// clock must drive [`handle`](Self::handle) and [`tick`](Self::tick).
pub struct Stage {
    config: SceneConfig,
    viewport: Viewport,
    scene: Scene,
    materials: MaterialSet,
    overlay: OverlayMaterial,
    controls: OrbitControls,
    lifecycle: Lifecycle,
    panel: Option<TweakPanel>,
    model_root: Option<NodeId>,
    /// One slot per configured spider; `None` until (or unless) found.
    spiders: Vec<Option<NodeId>>,
    textures: Vec<TextureAsset>,
    progress: Option<Progress>,
    failures: Vec<String>,
    view: RenderView,
}

impl Stage {
    pub fn new(config: SceneConfig, viewport: Viewport) -> Self {
        let materials = MaterialSet::new(&config.materials(), &viewport);
        let controls = OrbitControls::new(config.camera.clone(), &viewport);
        let view = controls.view();
        Self {
            viewport,
            scene: Scene::new(),
            materials,
            overlay: OverlayMaterial::new(),
            controls,
            lifecycle: Lifecycle::new(config.reveal),
            panel: None,
            model_root: None,
            spiders: vec![None; config.spiders.len()],
            textures: Vec::new(),
            progress: None,
            failures: Vec::new(),
            view,
            config,
        }
    }

    /// Issue every fetch the scene needs.
    pub fn start_loading(&self, loader: &mut AssetLoader) {
        loader.load_model(&self.config.model_path);
        for texture in &self.config.textures {
            loader.load_texture(texture);
        }
    }

    /// Apply one loader event. Returns the phase change it caused, if any.
    pub fn handle(&mut self, event: LoadEvent, now: f64) -> Option<Transition> {
        match event {
            LoadEvent::Progress(progress) => {
                tracing::debug!(
                    url = %progress.url,
                    loaded = progress.loaded,
                    total = progress.total,
                    "load progress"
                );
                self.progress = Some(progress);
                None
            }
            LoadEvent::Model(model) => {
                self.attach_model(&model);
                None
            }
            LoadEvent::Texture(texture) => {
                tracing::debug!(
                    source = %texture.source.display(),
                    width = texture.width,
                    height = texture.height,
                    "texture loaded"
                );
                self.textures.push(texture);
                None
            }
            // Already logged by the loading manager.
            LoadEvent::Failed { url, .. } => {
                self.failures.push(url);
                None
            }
            LoadEvent::AllLoaded => self.lifecycle.mark_loaded(now),
        }
    }

    /// Attach the model under a scaled, rotated root and bind the configured
    /// spiders to its direct children by name.
    pub fn attach_model(&mut self, model: &ModelAsset) {
        if self.model_root.is_some() {
            tracing::warn!(source = %model.source.display(), "model already attached, ignoring");
            return;
        }
        let transform = Transform {
            position: Vec3::ZERO,
            rotation: self.config.model_rotation,
            scale: Vec3::splat(self.config.model_scale),
        };
        let root = self.scene.attach_model(model, MODEL_ROOT, transform);
        self.model_root = Some(root);

        for (i, spider) in self.config.spiders.iter().enumerate() {
            let Some(node) = self.scene.find_child(root, &spider.node) else {
                tracing::warn!(node = %spider.node, "spider node not found in model");
                continue;
            };
            if let Err(e) = self.scene.set_material(node, MaterialId(i)) {
                tracing::warn!(node = %spider.node, error = %e, "could not bind material");
                continue;
            }
            self.spiders[i] = Some(node);
        }
        tracing::info!(
            found = self.spiders.iter().flatten().count(),
            expected = self.spiders.len(),
            "spiders bound"
        );
    }

    /// New window size: camera aspect and every material's resolution
    /// follow together.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.controls.set_viewport(&viewport);
        self.view = self.controls.view();
        self.materials.sync_resolution(&viewport);
    }

    pub fn camera(&mut self, action: CameraAction) {
        self.controls.apply(action);
    }

    /// Advance everything time-driven to `elapsed`.
    pub fn tick(&mut self, elapsed: f64) -> Option<Transition> {
        let transition = self.lifecycle.advance(elapsed);
        if let Some(Transition::Interactive { .. }) = transition {
            self.panel = Some(TweakPanel::build(&self.materials));
        }

        self.overlay.fade_to(self.lifecycle.overlay_alpha(elapsed));

        for (slot, spider) in self.spiders.iter().zip(&self.config.spiders) {
            let Some(id) = slot else { continue };
            if let Some(node) = self.scene.get_mut(*id) {
                node.transform.rotation.y = elapsed as f32 * spider.rotation_rate;
            }
        }

        self.view = self.controls.update();
        transition
    }

    /// One iteration of the render loop: tick, then draw once.
    pub fn frame<R: Renderer>(&mut self, elapsed: f64, renderer: &R) -> R::Output {
        self.tick(elapsed);
        renderer.render(&self.render_input(), &self.view)
    }

    pub fn render_input(&self) -> Frame<'_> {
        Frame {
            scene: &self.scene,
            materials: &self.materials,
            overlay: &self.overlay,
        }
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn clear_color(&self) -> Rgb {
        self.config.clear_color
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn materials(&self) -> &MaterialSet {
        &self.materials
    }

    pub fn overlay(&self) -> &OverlayMaterial {
        &self.overlay
    }

    pub fn view(&self) -> &RenderView {
        &self.view
    }

    pub fn panel(&self) -> Option<&TweakPanel> {
        self.panel.as_ref()
    }

    /// The panel together with the materials it edits.
    pub fn panel_mut(&mut self) -> Option<(&mut TweakPanel, &mut MaterialSet)> {
        let panel = self.panel.as_mut()?;
        Some((panel, &mut self.materials))
    }

    pub fn model_root(&self) -> Option<NodeId> {
        self.model_root
    }

    pub fn spider(&self, index: usize) -> Option<NodeId> {
        self.spiders.get(index).copied().flatten()
    }

    pub fn textures(&self) -> &[TextureAsset] {
        &self.textures
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn indicator_visible(&self, now: f64) -> bool {
        self.lifecycle.indicator_visible(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiderscene_assets::{AssetId, MeshData, ModelNode};
    use spiderscene_render::{ColorSlot, DebugTextRenderer, RepetitionSlot};
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    fn model(names: &[&str]) -> ModelAsset {
        ModelAsset {
            id: AssetId(7),
            source: PathBuf::from("Model/spider.glb"),
            nodes: names
                .iter()
                .map(|name| ModelNode {
                    name: name.to_string(),
                    transform: Transform::default(),
                    mesh: Some(Arc::new(MeshData::default())),
                    children: Vec::new(),
                })
                .collect(),
        }
    }

    fn stage() -> Stage {
        Stage::new(SceneConfig::default(), Viewport::new(800.0, 600.0, 1.0))
    }

    fn loaded_stage(names: &[&str]) -> Stage {
        let mut stage = stage();
        stage.handle(LoadEvent::Model(model(names)), 0.0);
        stage.handle(LoadEvent::AllLoaded, 0.0);
        stage
    }

    fn rotation_y(stage: &Stage, index: usize) -> Option<f32> {
        let id = stage.spider(index)?;
        Some(stage.scene().get(id)?.transform.rotation.y)
    }

    #[test]
    fn model_root_carries_configured_transform() {
        let stage = loaded_stage(&["Spider1", "Spider2", "Spider3"]);
        let root = stage.scene().get(stage.model_root().unwrap()).unwrap();
        assert_eq!(root.transform.rotation, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(root.transform.scale, Vec3::ONE);
    }

    #[test]
    fn spiders_get_their_materials() {
        let stage = loaded_stage(&["Spider1", "Spider2", "Spider3", "Floor"]);
        for i in 0..3 {
            let node = stage.scene().get(stage.spider(i).unwrap()).unwrap();
            assert_eq!(node.material, Some(MaterialId(i)));
        }
    }

    #[test]
    fn rotations_after_ten_seconds() {
        let mut stage = loaded_stage(&["Spider1", "Spider2", "Spider3"]);
        stage.tick(10.0);
        let expected = [4.0, 3.0, 2.0];
        for (i, want) in expected.into_iter().enumerate() {
            let got = rotation_y(&stage, i).unwrap();
            assert!((got - want).abs() < 1e-5, "spider {i}: {got}");
        }
    }

    #[test]
    fn missing_spiders_are_skipped() {
        let mut stage = loaded_stage(&["Spider1", "Spider3"]);
        assert!(stage.spider(0).is_some());
        assert_eq!(stage.spider(1), None);
        assert!(stage.spider(2).is_some());

        stage.tick(10.0);
        assert!((rotation_y(&stage, 0).unwrap() - 4.0).abs() < 1e-5);
        assert!((rotation_y(&stage, 2).unwrap() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn ticks_before_the_model_arrives_do_not_panic() {
        let mut stage = stage();
        for step in 0..100 {
            stage.tick(step as f64 / 60.0);
        }
        assert_eq!(stage.phase(), Phase::Loading);
        assert_eq!(stage.overlay().alpha(), 1.0);
        assert!(stage.spider(0).is_none());
    }

    #[test]
    fn nested_names_do_not_match() {
        let mut tree = model(&["Armature"]);
        tree.nodes[0].children.push(ModelNode {
            name: "Spider1".into(),
            transform: Transform::default(),
            mesh: None,
            children: Vec::new(),
        });
        let mut stage = stage();
        stage.attach_model(&tree);
        assert_eq!(stage.spider(0), None);
    }

    #[test]
    fn reveal_timeline() {
        let mut stage = stage();
        stage.handle(LoadEvent::Model(model(&["Spider1", "Spider2", "Spider3"])), 0.0);

        // Loading: opaque, no matter how long it takes.
        stage.tick(0.0);
        assert_eq!(stage.overlay().alpha(), 1.0);

        assert_eq!(
            stage.handle(LoadEvent::AllLoaded, 0.0),
            Some(Transition::Revealed { at: 0.0 })
        );

        let mut last = stage.overlay().alpha();
        let mut t = 0.0;
        while t < 6.0 {
            let transition = stage.tick(t);
            let alpha = stage.overlay().alpha();
            assert!(alpha <= last);
            last = alpha;

            if t >= 2.0 {
                assert_eq!(alpha, 0.0, "t = {t}");
            }
            if t < 5.0 {
                assert!(stage.panel().is_none(), "panel early at t = {t}");
            }
            if transition.is_some() {
                assert!(t >= 5.0);
            }
            t += 0.25;
        }
        assert_eq!(stage.phase(), Phase::Interactive);
        assert!(stage.panel().is_some());
    }

    #[test]
    fn panel_built_at_exactly_five_seconds() {
        let mut stage = loaded_stage(&["Spider1", "Spider2", "Spider3"]);
        stage.tick(4.999);
        assert!(stage.panel().is_none());
        assert!(matches!(
            stage.tick(5.0),
            Some(Transition::Interactive { .. })
        ));
        assert_eq!(stage.panel().unwrap().folders().len(), 3);
        assert!(stage.tick(6.0).is_none());
    }

    #[test]
    fn panel_edits_reach_the_uniforms() {
        let mut stage = loaded_stage(&["Spider1", "Spider2", "Spider3"]);
        stage.tick(5.0);
        let (panel, materials) = stage.panel_mut().unwrap();
        panel
            .set_color(MaterialId(2), ColorSlot::Light, Rgb::WHITE, materials)
            .unwrap();
        panel
            .set_repetitions(MaterialId(0), RepetitionSlot::Shadow, 500.0, materials)
            .unwrap();

        let uniforms = &stage.materials().get(MaterialId(2)).unwrap().uniforms;
        assert_eq!(uniforms.light_color, Rgb::WHITE);
        let uniforms = &stage.materials().get(MaterialId(0)).unwrap().uniforms;
        assert_eq!(uniforms.shadow_repetitions, 300);
    }

    #[test]
    fn resize_reaches_every_material_and_the_camera() {
        let mut stage = stage();
        stage.resize(Viewport::new(1024.0, 512.0, 3.0));
        for (_, material) in stage.materials().iter() {
            assert_eq!(material.uniforms.resolution, glam::Vec2::new(2048.0, 1024.0));
        }
        assert_eq!(stage.view().aspect, 2.0);
        stage.tick(0.0);
        assert_eq!(stage.view().aspect, 2.0);
        assert_eq!(stage.viewport().pixel_ratio, 2.0);
    }

    #[test]
    fn configured_repetitions_are_clamped_on_startup() {
        let config = SceneConfig::from_yaml(
            r##"
spiders:
  - node: Spider1
    rotation_rate: 0.4
    program: Spider1
    color: "#000000"
    shadow_color: "#ff0000"
    light_color: "#000599"
    shadow_repetitions: 0
    light_repetitions: 5000
"##,
        )
        .unwrap();
        let stage = Stage::new(config, Viewport::default());
        let uniforms = &stage.materials().get(MaterialId(0)).unwrap().uniforms;
        assert_eq!(uniforms.shadow_repetitions, 1);
        assert_eq!(uniforms.light_repetitions, 300);
    }

    #[test]
    fn indicator_hides_one_second_after_load() {
        let stage = loaded_stage(&[]);
        assert!(stage.indicator_visible(0.5));
        assert!(!stage.indicator_visible(1.0));
    }

    #[test]
    fn failures_are_recorded_and_do_not_block_the_reveal() {
        let mut stage = stage();
        stage.handle(
            LoadEvent::Failed {
                url: "Model/spider.glb".into(),
                reason: "not found".into(),
            },
            0.0,
        );
        stage.handle(LoadEvent::AllLoaded, 0.0);
        stage.tick(5.0);
        assert_eq!(stage.failures(), ["Model/spider.glb".to_string()]);
        assert_eq!(stage.phase(), Phase::Interactive);
        assert_eq!(stage.spider(0), None);
    }

    #[test]
    fn frame_renders_once_per_call() {
        let mut stage = loaded_stage(&["Spider1", "Spider2", "Spider3"]);
        let renderer = DebugTextRenderer::new();
        let out = stage.frame(10.0, &renderer);
        assert!(out.contains("Spider1"));
        assert!(out.contains("rot.y=4.000"));
        assert!(out.contains("material=spider3"));
    }

    #[test]
    fn loads_from_disk_through_the_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spider.gltf");
        std::fs::write(
            &path,
            r#"{
  "asset": {"version": "2.0"},
  "scene": 0,
  "scenes": [{"nodes": [0, 1, 2]}],
  "nodes": [{"name": "Spider1"}, {"name": "Spider2"}, {"name": "Spider3"}]
}"#,
        )
        .unwrap();

        let config = SceneConfig {
            model_path: path,
            ..SceneConfig::default()
        };
        let mut stage = Stage::new(config, Viewport::default());
        let mut loader = AssetLoader::new(stage.config().decoder_path.clone());
        stage.start_loading(&mut loader);

        let mut revealed = false;
        for _ in 0..200 {
            for event in loader.poll_wait(Duration::from_millis(50)) {
                revealed |= stage.handle(event, 0.0).is_some();
            }
            if revealed {
                break;
            }
        }
        assert!(revealed);
        assert_eq!(stage.phase(), Phase::Revealing);
        assert!((0..3).all(|i| stage.spider(i).is_some()));
        assert_eq!(stage.progress().map(|p| (p.loaded, p.total)), Some((1, 1)));
    }
}
