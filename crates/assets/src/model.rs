use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{Quat, Vec3};
use spiderscene_common::Transform;

use crate::{AssetError, AssetId};

/// glTF extension for Draco-compressed geometry.
pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Triangle mesh data merged from all primitives of one glTF mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    /// Linear RGBA base color of the first primitive's own material. Used
    /// when no spider material replaces it.
    pub base_color: [f32; 4],
}

impl Default for MeshData {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            base_color: [1.0; 4],
        }
    }
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Fill `normals` with area-weighted vertex normals when the source had none.
    fn ensure_normals(&mut self) {
        if self.normals.len() == self.positions.len() {
            return;
        }
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= acc.len() || b >= acc.len() || c >= acc.len() {
                continue;
            }
            let pa = Vec3::from(self.positions[a]);
            let pb = Vec3::from(self.positions[b]);
            let pc = Vec3::from(self.positions[c]);
            let n = (pb - pa).cross(pc - pa);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
        self.normals = acc
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }
}

/// One node of a loaded model, with its subtree.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Arc<MeshData>>,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    /// Number of nodes in this subtree, including itself.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(ModelNode::subtree_len).sum::<usize>()
    }
}

/// A decoded model: the top-level nodes of its default scene.
#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub id: AssetId,
    pub source: PathBuf,
    pub nodes: Vec<ModelNode>,
}

impl ModelAsset {
    /// Read and decode a `.glb` or `.gltf` file.
    ///
    /// Models that need a Draco decoder are rejected; `decoder_path` is only
    /// reported in the error.
    pub fn open(path: impl AsRef<Path>, decoder_path: &Path) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes, path.parent(), decoder_path, path.to_path_buf())
    }

    /// Decode model bytes. External buffers resolve relative to `base`.
    pub fn from_slice(
        bytes: &[u8],
        base: Option<&Path>,
        decoder_path: &Path,
        source: PathBuf,
    ) -> Result<Self, AssetError> {
        let raw = gltf::Gltf::from_slice_without_validation(bytes)?;
        let needs_draco = raw
            .extensions_used()
            .chain(raw.extensions_required())
            .any(|ext| ext == DRACO_EXTENSION);
        if needs_draco {
            return Err(AssetError::CompressedGeometry {
                path: source,
                decoder: decoder_path.to_path_buf(),
            });
        }

        let gltf = gltf::Gltf::from_slice(bytes)?;
        let buffers = gltf::import_buffers(&gltf.document, base, gltf.blob.clone())?;

        let scene = gltf
            .document
            .default_scene()
            .or_else(|| gltf.document.scenes().next())
            .ok_or_else(|| AssetError::EmptyModel(source.clone()))?;

        let nodes: Vec<ModelNode> = scene
            .nodes()
            .map(|node| convert_node(&node, &buffers))
            .collect();

        tracing::debug!(
            path = %source.display(),
            top_level = nodes.len(),
            total = nodes.iter().map(ModelNode::subtree_len).sum::<usize>(),
            "decoded model"
        );

        Ok(Self {
            id: AssetId::of_bytes(bytes),
            source,
            nodes,
        })
    }

    /// Top-level node with the exact given name.
    pub fn find(&self, name: &str) -> Option<&ModelNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

fn convert_node(node: &gltf::Node<'_>, buffers: &[gltf::buffer::Data]) -> ModelNode {
    let (t, r, s) = node.transform().decomposed();
    let transform = Transform::from_trs(
        Vec3::from(t),
        Quat::from_xyzw(r[0], r[1], r[2], r[3]),
        Vec3::from(s),
    );
    let mesh = node
        .mesh()
        .map(|mesh| read_mesh(&mesh, buffers))
        .filter(|data| !data.positions.is_empty())
        .map(Arc::new);

    ModelNode {
        name: node.name().unwrap_or_default().to_string(),
        transform,
        mesh,
        children: node
            .children()
            .map(|child| convert_node(&child, buffers))
            .collect(),
    }
}

fn read_mesh(mesh: &gltf::Mesh<'_>, buffers: &[gltf::buffer::Data]) -> MeshData {
    let mut out = MeshData::default();
    let mut with_normals = true;
    let mut colored = false;

    for prim in mesh.primitives() {
        if prim.mode() != gltf::mesh::Mode::Triangles {
            tracing::warn!(mode = ?prim.mode(), "skipping non-triangle primitive");
            continue;
        }
        if !colored {
            out.base_color = prim.material().pbr_metallic_roughness().base_color_factor();
            colored = true;
        }
        let reader = prim.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };

        let base = out.positions.len() as u32;
        out.positions.extend(positions);
        let added = out.positions.len() as u32 - base;

        match reader.read_normals() {
            Some(normals) if with_normals => out.normals.extend(normals),
            _ => with_normals = false,
        }

        match reader.read_indices() {
            Some(indices) => out.indices.extend(indices.into_u32().map(|i| i + base)),
            // Non-indexed: vertices are already a triangle list
            None => out.indices.extend(base..base + added - added % 3),
        }
    }

    if !with_normals {
        out.normals.clear();
    }
    out.ensure_normals();
    out
}
