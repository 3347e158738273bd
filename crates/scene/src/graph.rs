use glam::Mat4;
use spiderscene_assets::{MeshData, ModelAsset, ModelNode};
use spiderscene_common::{MaterialId, NodeId, Transform};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Errors from scene graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
}

/// Per-node data stored in the scene.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub mesh: Option<Arc<MeshData>>,
    /// Material used to shade `mesh`. A reference into the material set,
    /// not an owned copy.
    pub material: Option<MaterialId>,
}

impl SceneNode {
    fn new(name: impl Into<String>, transform: Transform, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            transform,
            parent,
            children: Vec::new(),
            mesh: None,
            material: None,
        }
    }
}

/// A node tree. Nodes are owned by the scene; callers hold [`NodeId`]s.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Top-level nodes in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    /// Attach a loaded model under a new root node carrying `transform`.
    /// The model's top-level nodes become the root's direct children.
    pub fn attach_model(&mut self, model: &ModelAsset, name: &str, transform: Transform) -> NodeId {
        let root = NodeId::new();
        self.roots.push(root);
        self.nodes.insert(root, SceneNode::new(name, transform, None));
        for node in &model.nodes {
            self.insert_subtree(root, node);
        }
        tracing::debug!(
            root = %root.short(),
            nodes = self.nodes.len(),
            source = %model.source.display(),
            "attached model"
        );
        root
    }

    /// Direct child of `parent` whose name matches exactly.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes.get(&parent)?.children.iter().copied().find(|c| {
            self.nodes
                .get(c)
                .is_some_and(|node| node.name == name)
        })
    }

    pub fn set_material(&mut self, id: NodeId, material: MaterialId) -> Result<(), SceneError> {
        self.nodes
            .get_mut(&id)
            .ok_or(SceneError::NodeNotFound(id))?
            .material = Some(material);
        Ok(())
    }

    /// Every node carrying a mesh, with its world matrix, in depth-first order.
    pub fn drawables(&self) -> Vec<(NodeId, &SceneNode, Mat4)> {
        let mut out = Vec::new();
        for root in &self.roots {
            self.collect_drawables(*root, Mat4::IDENTITY, &mut out);
        }
        out
    }

    fn collect_drawables<'a>(
        &'a self,
        id: NodeId,
        parent_matrix: Mat4,
        out: &mut Vec<(NodeId, &'a SceneNode, Mat4)>,
    ) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let matrix = parent_matrix * node.transform.matrix();
        if node.mesh.is_some() {
            out.push((id, node, matrix));
        }
        for child in &node.children {
            self.collect_drawables(*child, matrix, out);
        }
    }

    fn insert_subtree(&mut self, parent: NodeId, model_node: &ModelNode) -> NodeId {
        let id = NodeId::new();
        let mut node = SceneNode::new(model_node.name.clone(), model_node.transform, Some(parent));
        node.mesh = model_node.mesh.clone();
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        for child in &model_node.children {
            self.insert_subtree(id, child);
        }
        id
    }
}
