use std::num::NonZeroU64;

use crate::scene::{DrawTarget, FramePlan, SceneComposer};

use super::gpu_mesh::{draw_object, draw_outline, MeshBindings, ObjectGpu};
use super::targets::{FrameTargets, DEPTH_STENCIL_FORMAT, SCENE_COLOR_FORMAT};
use super::texture::TextureGpu;
use super::uniforms::{alpha_blend, Globals, InstanceRaw, OutlineRaw, Vertex};
use super::RenderCtx;

/// Draws a [`FramePlan`] into the offscreen targets.
///
/// Three pipelines share `shaders/scene.wgsl`:
/// - `opaque`: depth test + write, stencil replaced with the draw's reference
/// - `transparent`: same, without depth writes (draws arrive back-to-front)
/// - `outline`: flat colour where the stencil differs from the reference,
///   drawn over everything
#[derive(Default)]
pub(super) struct ScenePass {
    globals_layout: Option<wgpu::BindGroupLayout>,
    material_layout: Option<wgpu::BindGroupLayout>,

    opaque: Option<wgpu::RenderPipeline>,
    transparent: Option<wgpu::RenderPipeline>,
    outline: Option<wgpu::RenderPipeline>,

    globals_ubo: Option<wgpu::Buffer>,
    globals_bind_group: Option<wgpu::BindGroup>,

    white: Option<TextureGpu>,

    outline_vbo: Option<wgpu::Buffer>,
    outline_capacity: usize,
}

impl ScenePass {
    pub(super) fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        targets: &FrameTargets,
        composer: &mut SceneComposer,
        plan: &FramePlan,
    ) {
        self.ensure_layouts(ctx);
        self.ensure_pipelines(ctx);
        self.ensure_bindings(ctx);

        // Mutating work (uploads, buffer growth) before the pass borrows.
        self.prepare_meshes(ctx, composer);
        self.write_globals(ctx, plan);
        self.write_outlines(ctx, plan);

        let composer: &SceneComposer = composer;

        let Some(color_view) = targets.color_view() else { return };
        let Some(depth_view) = targets.depth_view() else { return };
        let Some(opaque) = self.opaque.as_ref() else { return };
        let Some(transparent) = self.transparent.as_ref() else { return };
        let Some(outline) = self.outline.as_ref() else { return };
        let Some(globals) = self.globals_bind_group.as_ref() else { return };

        let [r, g, b] = plan.clear_color.to_f32();

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for draw in &plan.draws {
            let object = match draw.target {
                DrawTarget::Marker(slot) => composer.light(slot as isize).and_then(|l| l.marker()),
                DrawTarget::Object(id) => composer.try_object(id).ok(),
            };
            let Some(object) = object else { continue };

            rpass.set_pipeline(if draw.transparent { transparent } else { opaque });
            rpass.set_bind_group(0, globals, &[]);
            rpass.set_stencil_reference(draw.stencil_ref);
            draw_object(&mut rpass, object, draw.instances.range());

            let Some(range) = draw.outline.clone() else { continue };
            let Some(outline_vbo) = self.outline_vbo.as_ref() else { continue };
            if range.is_empty() {
                continue;
            }

            rpass.set_pipeline(outline);
            rpass.set_bind_group(0, globals, &[]);
            rpass.set_vertex_buffer(1, outline_vbo.slice(..));
            draw_outline(&mut rpass, object, range);
        }
    }

    fn prepare_meshes(&mut self, ctx: &RenderCtx<'_>, composer: &mut SceneComposer) {
        let Some(layout) = self.material_layout.as_ref() else { return };
        let white = self.white.get_or_insert_with(|| TextureGpu::white(ctx));
        let bindings = MeshBindings { layout, white };

        for light in composer.lights_mut().iter_mut().flatten() {
            if let Some(marker) = light.marker_mut() {
                ObjectGpu::prepare(ctx, marker, &bindings);
            }
        }
        for object in composer.objects_mut() {
            ObjectGpu::prepare(ctx, object, &bindings);
        }
    }

    fn write_globals(&self, ctx: &RenderCtx<'_>, plan: &FramePlan) {
        let Some(ubo) = self.globals_ubo.as_ref() else { return };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&Globals::new(plan)));
    }

    fn write_outlines(&mut self, ctx: &RenderCtx<'_>, plan: &FramePlan) {
        if plan.outlines.is_empty() {
            return;
        }
        self.ensure_outline_capacity(ctx, plan.outlines.len());
        let Some(vbo) = self.outline_vbo.as_ref() else { return };

        let raw: Vec<OutlineRaw> = plan.outlines.iter().map(OutlineRaw::new).collect();
        ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&raw));
    }

    fn ensure_outline_capacity(&mut self, ctx: &RenderCtx<'_>, needed: usize) {
        if self.outline_vbo.is_some() && self.outline_capacity >= needed {
            return;
        }

        let new_cap = needed.next_power_of_two().max(64);
        if let Some(old) = self.outline_vbo.take() {
            old.destroy();
        }
        self.outline_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen outline instance vbo"),
            size: (new_cap * std::mem::size_of::<OutlineRaw>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.outline_capacity = new_cap;
        log::debug!("outline buffer grown to {new_cap} instances");
    }

    // ── lazy GPU state ────────────────────────────────────────────────────

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        if self.globals_layout.is_some() && self.material_layout.is_some() {
            return;
        }

        let uniform = |binding: u32, size: usize, visibility: wgpu::ShaderStages| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(size as u64),
            },
            count: None,
        };
        let texture = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let globals_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen globals bgl"),
            entries: &[uniform(
                0,
                std::mem::size_of::<Globals>(),
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });

        let material_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen material bgl"),
            entries: &[
                uniform(
                    0,
                    std::mem::size_of::<super::uniforms::MaterialUniform>(),
                    wgpu::ShaderStages::FRAGMENT,
                ),
                texture(1),
                texture(2),
                texture(3),
                sampler(4),
                sampler(5),
                sampler(6),
            ],
        });

        self.globals_layout = Some(globals_layout);
        self.material_layout = Some(material_layout);
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.opaque.is_some() && self.transparent.is_some() && self.outline.is_some() {
            return;
        }
        let Some(globals_layout) = self.globals_layout.as_ref() else { return };
        let Some(material_layout) = self.material_layout.as_ref() else { return };

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lumen scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let object_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen object pipeline layout"),
            bind_group_layouts: &[globals_layout, material_layout],
            immediate_size: 0,
        });
        let outline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen outline pipeline layout"),
            bind_group_layouts: &[globals_layout],
            immediate_size: 0,
        });

        let object_stencil = wgpu::StencilFaceState {
            compare: wgpu::CompareFunction::Always,
            fail_op: wgpu::StencilOperation::Keep,
            depth_fail_op: wgpu::StencilOperation::Keep,
            pass_op: wgpu::StencilOperation::Replace,
        };
        let outline_stencil = wgpu::StencilFaceState {
            compare: wgpu::CompareFunction::NotEqual,
            fail_op: wgpu::StencilOperation::Keep,
            depth_fail_op: wgpu::StencilOperation::Keep,
            pass_op: wgpu::StencilOperation::Keep,
        };

        let pipeline = |label: &str,
                        layout: &wgpu::PipelineLayout,
                        entry: (&str, &str),
                        instance: wgpu::VertexBufferLayout<'static>,
                        depth_write: bool,
                        depth_compare: wgpu::CompareFunction,
                        stencil: wgpu::StencilState,
                        cull_mode: Option<wgpu::Face>| {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),

                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(entry.0),
                    compilation_options: Default::default(),
                    buffers: &[Vertex::layout(), instance],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry.1),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: SCENE_COLOR_FORMAT,
                        blend: Some(alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_STENCIL_FORMAT,
                    depth_write_enabled: depth_write,
                    depth_compare,
                    stencil,
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let write_stencil = wgpu::StencilState {
            front: object_stencil,
            back: object_stencil,
            read_mask: 0xff,
            write_mask: 0xff,
        };
        let test_stencil = wgpu::StencilState {
            front: outline_stencil,
            back: outline_stencil,
            read_mask: 0xff,
            write_mask: 0x00,
        };

        self.opaque = Some(pipeline(
            "lumen opaque pipeline",
            &object_layout,
            ("vs_main", "fs_main"),
            InstanceRaw::layout(),
            true,
            wgpu::CompareFunction::Less,
            write_stencil.clone(),
            Some(wgpu::Face::Back),
        ));
        self.transparent = Some(pipeline(
            "lumen transparent pipeline",
            &object_layout,
            ("vs_main", "fs_main"),
            InstanceRaw::layout(),
            false,
            wgpu::CompareFunction::Less,
            write_stencil,
            Some(wgpu::Face::Back),
        ));
        self.outline = Some(pipeline(
            "lumen outline pipeline",
            &outline_layout,
            ("vs_outline", "fs_outline"),
            OutlineRaw::layout(),
            false,
            wgpu::CompareFunction::Always,
            test_stencil,
            None,
        ));

        log::debug!("scene pipelines created");
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.globals_bind_group.is_some() && self.globals_ubo.is_some() {
            return;
        }
        let Some(layout) = self.globals_layout.as_ref() else { return };

        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen globals ubo"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen globals bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        self.globals_ubo = Some(ubo);
        self.globals_bind_group = Some(bind_group);
    }
}
