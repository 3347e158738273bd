use glam::Mat4;
use spiderscene_assets::MeshData;
use spiderscene_common::{MaterialId, NodeId};
use spiderscene_render::{Frame, ShaderProgram};
use spiderscene_scene::Scene;

/// How one mesh is shaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Shading {
    Spider {
        material: MaterialId,
        program: ShaderProgram,
    },
    /// The mesh's own base color, for nodes no spider material replaced.
    Flat,
}

#[derive(Debug, Clone)]
pub(crate) struct Draw<'a> {
    pub node: NodeId,
    pub name: &'a str,
    pub mesh: &'a MeshData,
    pub world: Mat4,
    pub shading: Shading,
}

/// Every drawable mesh of the frame in scene order, at most `max` of them.
pub(crate) fn plan<'a>(frame: &Frame<'a>, max: usize) -> Vec<Draw<'a>> {
    let scene: &'a Scene = frame.scene;
    let mut draws = Vec::new();
    for (id, node, world) in scene.drawables() {
        let Some(mesh) = node.mesh.as_deref() else {
            continue;
        };
        if mesh.indices.is_empty() || mesh.positions.is_empty() {
            continue;
        }
        if draws.len() >= max {
            tracing::warn!(max, "instance buffer full, skipping draws");
            break;
        }
        let shading = node
            .material
            .and_then(|id| {
                frame.materials.get(id).map(|m| Shading::Spider {
                    material: id,
                    program: m.program,
                })
            })
            .unwrap_or(Shading::Flat);
        draws.push(Draw {
            node: id,
            name: &node.name,
            mesh,
            world,
            shading,
        });
    }
    draws
}
