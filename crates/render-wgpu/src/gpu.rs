use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

use spiderscene_common::{NodeId, Rgb};
use spiderscene_render::{Frame, MaterialSet, RenderView, ShaderProgram};

use crate::draws::{self, Shading};
use crate::shaders;
use crate::uniforms::{self, CameraUniform, InstanceData, MaterialUniform, OverlayUniform, Vertex};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Preferred multisample count of the color and depth targets.
const PREFERRED_SAMPLES: u32 = 4;

/// Pick the multisample count for a surface format: 4 when supported,
/// else the largest supported count below it, else 1. Formats that cannot
/// resolve multisampled images get 1.
pub fn sample_count(supported: &[u32], can_resolve: bool) -> u32 {
    if !can_resolve {
        return 1;
    }
    supported
        .iter()
        .copied()
        .filter(|&count| count <= PREFERRED_SAMPLES)
        .max()
        .unwrap_or(1)
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// The mesh's own color, used when no spider material is bound.
    flat: GpuMaterial,
}

struct GpuMaterial {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// wgpu backend: the spider pipelines, a flat pipeline for every other
/// mesh, the overlay, and multisampled color and depth targets.
///
/// Meshes are uploaded the first time their node is drawn and kept for the
/// node's lifetime. Uniforms are rewritten every frame.
pub struct WgpuRenderer {
    dots_pipeline: wgpu::RenderPipeline,
    lines_pipeline: wgpu::RenderPipeline,
    flat_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    materials: Vec<GpuMaterial>,
    overlay_buffer: wgpu::Buffer,
    overlay_bind_group: wgpu::BindGroup,
    meshes: BTreeMap<NodeId, GpuMesh>,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    depth_texture: wgpu::TextureView,
    /// `None` when rendering single-sampled straight into the target.
    msaa_target: Option<wgpu::TextureView>,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let sample_count = sample_count.max(1);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::from(&RenderView {
                aspect: width.max(1) as f32 / height.max(1) as f32,
                ..RenderView::default()
            })),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_layout = uniform_layout(
            device,
            "camera_bind_group_layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let material_layout =
            uniform_layout(device, "material_bind_group_layout", wgpu::ShaderStages::FRAGMENT);

        let spider_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("spider_pipeline_layout"),
            bind_group_layouts: &[&camera_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let spider_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("spider_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SPIDER_SHADER.into()),
        });
        let dots_pipeline = spider_pipeline(
            device,
            &spider_layout,
            &spider_shader,
            shaders::fragment_entry(ShaderProgram::Spider1),
            surface_format,
            sample_count,
        );
        let lines_pipeline = spider_pipeline(
            device,
            &spider_layout,
            &spider_shader,
            shaders::fragment_entry(ShaderProgram::Spider2),
            surface_format,
            sample_count,
        );
        let flat_pipeline = spider_pipeline(
            device,
            &spider_layout,
            &spider_shader,
            shaders::FLAT_ENTRY,
            surface_format,
            sample_count,
        );

        // Overlay
        let overlay_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay_buffer"),
            contents: bytemuck::bytes_of(&OverlayUniform {
                alpha: 1.0,
                _pad: [0.0; 3],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let overlay_layout =
            uniform_layout(device, "overlay_bind_group_layout", wgpu::ShaderStages::FRAGMENT);
        let overlay_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay_bind_group"),
            layout: &overlay_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: overlay_buffer.as_entire_binding(),
            }],
        });
        let overlay_pipeline =
            overlay_pipeline(device, &overlay_layout, surface_format, sample_count);

        let max_instances = 1024u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (max_instances as u64) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture =
            create_target(device, "depth_texture", DEPTH_FORMAT, width, height, sample_count);
        let msaa_target = msaa_target(device, surface_format, width, height, sample_count);
        tracing::info!(sample_count, "render targets created");

        Self {
            dots_pipeline,
            lines_pipeline,
            flat_pipeline,
            overlay_pipeline,
            camera_buffer,
            camera_bind_group,
            material_layout,
            materials: Vec::new(),
            overlay_buffer,
            overlay_bind_group,
            meshes: BTreeMap::new(),
            instance_buffer,
            max_instances,
            depth_texture,
            msaa_target,
            surface_format,
            sample_count,
        }
    }

    /// Recreate the size-dependent targets. The camera aspect arrives with
    /// the next frame's [`RenderView`].
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture =
            create_target(device, "depth_texture", DEPTH_FORMAT, width, height, self.sample_count);
        self.msaa_target =
            msaa_target(device, self.surface_format, width, height, self.sample_count);
    }

    /// Render one frame: every drawable mesh, spiders with their material and
    /// the rest in their own color, then the overlay on top while it is not
    /// fully clear. `target` receives the resolved image.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        frame: &Frame<'_>,
        view: &RenderView,
        clear_color: Rgb,
    ) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::from(view)),
        );
        self.sync_materials(device, queue, frame.materials);
        queue.write_buffer(
            &self.overlay_buffer,
            0,
            bytemuck::bytes_of(&OverlayUniform {
                alpha: frame.overlay.alpha(),
                _pad: [0.0; 3],
            }),
        );

        // Draw i uses instance slot i
        let draws = draws::plan(frame, self.max_instances as usize);
        for draw in &draws {
            if !self.meshes.contains_key(&draw.node) {
                tracing::debug!(
                    node = draw.name,
                    vertices = draw.mesh.vertex_count(),
                    "uploading mesh"
                );
                let mesh = upload_mesh(device, &self.material_layout, draw.mesh);
                self.meshes.insert(draw.node, mesh);
            }
        }
        let instances: Vec<InstanceData> = draws.iter().map(|d| InstanceData::from(d.world)).collect();
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let [r, g, b] = clear_color.to_linear();
        let (color_view, resolve_target, color_store) = match &self.msaa_target {
            Some(msaa) => (msaa, Some(target), wgpu::StoreOp::Discard),
            None => (target, None, wgpu::StoreOp::Store),
        };
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: color_store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (slot, draw) in draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(&draw.node) else {
                    continue;
                };
                let (pipeline, material) = match draw.shading {
                    Shading::Spider { material, program } => {
                        let Some(gpu_material) = self.materials.get(material.0) else {
                            continue;
                        };
                        let pipeline = match program {
                            ShaderProgram::Spider1 => &self.dots_pipeline,
                            ShaderProgram::Spider2 => &self.lines_pipeline,
                        };
                        (pipeline, gpu_material)
                    }
                    Shading::Flat => (&self.flat_pipeline, &mesh.flat),
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &material.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                let slot = slot as u32;
                pass.draw_indexed(0..mesh.index_count, 0, slot..slot + 1);
            }

            if !frame.overlay.is_clear() {
                pass.set_pipeline(&self.overlay_pipeline);
                pass.set_bind_group(0, &self.overlay_bind_group, &[]);
                pass.draw(0..6, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Rewrite every material's uniform buffer, creating buffers for
    /// materials seen for the first time.
    fn sync_materials(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, set: &MaterialSet) {
        for (id, material) in set.iter() {
            let data = MaterialUniform::from(&material.uniforms);
            match self.materials.get(id.0) {
                Some(gpu) => queue.write_buffer(&gpu.buffer, 0, bytemuck::bytes_of(&data)),
                None => {
                    let gpu = GpuMaterial::new(device, &self.material_layout, &material.name, &data);
                    self.materials.push(gpu);
                }
            }
        }
    }
}

impl GpuMaterial {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        data: &MaterialUniform,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(data),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

fn msaa_target(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    (sample_count > 1)
        .then(|| create_target(device, "msaa_target", format, width, height, sample_count))
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn multisample(count: u32) -> wgpu::MultisampleState {
    wgpu::MultisampleState {
        count,
        mask: !0,
        alpha_to_coverage_enabled: false,
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn spider_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &'static str,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        2 => Float32x4,
                        3 => Float32x4,
                        4 => Float32x4,
                        5 => Float32x4,
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: multisample(sample_count),
        multiview: None,
        cache: None,
    })
}

fn overlay_pipeline(
    device: &wgpu::Device,
    overlay_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("overlay_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::OVERLAY_SHADER.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("overlay_pipeline_layout"),
        bind_group_layouts: &[overlay_layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("overlay_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_overlay"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_overlay"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        // Drawn over everything; shares the pass's depth attachment.
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: multisample(sample_count),
        multiview: None,
        cache: None,
    })
}

fn upload_mesh(
    device: &wgpu::Device,
    material_layout: &wgpu::BindGroupLayout,
    mesh: &spiderscene_assets::MeshData,
) -> GpuMesh {
    let vertices = uniforms::vertices(mesh);
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("mesh_vertex_buffer"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("mesh_index_buffer"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    let flat = GpuMaterial::new(
        device,
        material_layout,
        "mesh_flat_material",
        &MaterialUniform::flat(mesh.base_color),
    );
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
        flat,
    }
}
