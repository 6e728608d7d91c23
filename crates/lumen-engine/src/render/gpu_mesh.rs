//! GPU mirrors of [`Polygon`] and [`GraphObject`].
//!
//! A mirror lives inside its owner, is created on the first frame that draws
//! the owner and is rewritten whenever the owner's revision moves past the
//! one it was built from. Dropping the owner drops the mirror, which
//! destroys the buffers immediately instead of waiting for wgpu's deferred
//! cleanup.

use std::ops::Range;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::geometry::{GraphObject, Polygon};

use super::texture::TextureGpu;
use super::uniforms::{InstanceRaw, MaterialUniform, Vertex};
use super::{RenderCtx, Texture};

/// Shared state needed to (re)build polygon bind groups.
pub(super) struct MeshBindings<'a> {
    pub layout: &'a wgpu::BindGroupLayout,
    /// Bound where a polygon has no map.
    pub white: &'a TextureGpu,
}

fn texture_or<'a>(ctx: &RenderCtx<'_>, texture: &'a Option<Arc<Texture>>, white: &'a TextureGpu) -> &'a TextureGpu {
    match texture {
        Some(t) => t.gpu(ctx),
        None => white,
    }
}

// ── polygon ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct PolygonGpu {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    material: wgpu::Buffer,
    vertex_count: u32,
    index_count: u32,
    bind_group: Option<wgpu::BindGroup>,
    revision: u64,
}

impl PolygonGpu {
    fn create(ctx: &RenderCtx<'_>, polygon: &Polygon) -> Self {
        let vertices = Vertex::from_polygon(polygon);
        let indices = polygon.indices();
        let material = MaterialUniform::new(polygon.material(), polygon.textures().flags());

        let vertex_usage = wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC;

        Self {
            vertices: ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen polygon vbo"),
                contents: bytemuck::cast_slice(&vertices),
                usage: vertex_usage,
            }),
            indices: ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen polygon ibo"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
            }),
            material: ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen material ubo"),
                contents: bytemuck::bytes_of(&material),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
            }),
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
            bind_group: None,
            revision: polygon.revision(),
        }
    }

    fn write(&self, ctx: &RenderCtx<'_>, polygon: &Polygon) {
        let vertices = Vertex::from_polygon(polygon);
        let material = MaterialUniform::new(polygon.material(), polygon.textures().flags());
        ctx.queue.write_buffer(&self.vertices, 0, bytemuck::cast_slice(&vertices));
        ctx.queue.write_buffer(&self.material, 0, bytemuck::bytes_of(&material));
    }

    fn build_bind_group(&self, ctx: &RenderCtx<'_>, polygon: &Polygon, bindings: &MeshBindings<'_>) -> wgpu::BindGroup {
        let textures = polygon.textures();
        let diffuse = texture_or(ctx, &textures.diffuse, bindings.white);
        let specular = texture_or(ctx, &textures.specular, bindings.white);
        let emission = texture_or(ctx, &textures.emission, bindings.white);

        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen material bind group"),
            layout: bindings.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.material.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&emission.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&specular.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::Sampler(&emission.sampler),
                },
            ],
        })
    }

    /// Brings `polygon.gpu` up to date with the polygon.
    pub(super) fn prepare(ctx: &RenderCtx<'_>, polygon: &mut Polygon, bindings: &MeshBindings<'_>) {
        let revision = polygon.revision();

        let mut gpu = match polygon.gpu.take() {
            Some(gpu) if gpu.vertex_count as usize == polygon.count_points() => gpu,
            _ => PolygonGpu::create(ctx, polygon),
        };

        let stale = gpu.revision != revision;
        if stale {
            gpu.write(ctx, polygon);
            gpu.revision = revision;
        }
        if stale || gpu.bind_group.is_none() {
            gpu.bind_group = Some(gpu.build_bind_group(ctx, polygon, bindings));
        }

        polygon.gpu = Some(gpu);
    }

    /// Copies every buffer on the GPU; the bind group is rebuilt on next use.
    pub(crate) fn duplicate(&self, ctx: &RenderCtx<'_>) -> Self {
        let copy = |src: &wgpu::Buffer, label: &str| -> wgpu::Buffer {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: src.size(),
                usage: src.usage(),
                mapped_at_creation: false,
            })
        };

        let vertices = copy(&self.vertices, "lumen polygon vbo (copy)");
        let indices = copy(&self.indices, "lumen polygon ibo (copy)");
        let material = copy(&self.material, "lumen material ubo (copy)");

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lumen polygon duplicate"),
        });
        encoder.copy_buffer_to_buffer(&self.vertices, 0, &vertices, 0, self.vertices.size());
        encoder.copy_buffer_to_buffer(&self.indices, 0, &indices, 0, self.indices.size());
        encoder.copy_buffer_to_buffer(&self.material, 0, &material, 0, self.material.size());
        ctx.queue.submit(std::iter::once(encoder.finish()));

        Self {
            vertices,
            indices,
            material,
            vertex_count: self.vertex_count,
            index_count: self.index_count,
            bind_group: None,
            revision: self.revision,
        }
    }

    /// Binds this polygon's buffers and material and issues one draw.
    pub(super) fn draw(&self, rpass: &mut wgpu::RenderPass<'_>, instances: Range<u32>, with_material: bool) {
        if with_material {
            let Some(bind_group) = self.bind_group.as_ref() else { return };
            rpass.set_bind_group(1, bind_group, &[]);
        }
        rpass.set_vertex_buffer(0, self.vertices.slice(..));
        rpass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..self.index_count, 0, instances);
    }
}

impl Drop for PolygonGpu {
    fn drop(&mut self) {
        self.vertices.destroy();
        self.indices.destroy();
        self.material.destroy();
    }
}

// ── object ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ObjectGpu {
    instances: wgpu::Buffer,
    /// Slots in `instances`; the object's `max_instances`, at least 1.
    capacity: usize,
    revision: u64,
}

impl ObjectGpu {
    fn create(ctx: &RenderCtx<'_>, capacity: usize) -> Self {
        let instances = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen instance vbo"),
            size: (capacity * std::mem::size_of::<InstanceRaw>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        log::debug!("instance buffer created ({capacity} slots)");

        Self {
            instances,
            capacity,
            revision: u64::MAX,
        }
    }

    /// Brings the object's instance buffer and every polygon mirror up to date.
    pub(super) fn prepare(ctx: &RenderCtx<'_>, object: &mut GraphObject, bindings: &MeshBindings<'_>) {
        let capacity = object.max_instances().max(1);
        let revision = object.revision();

        let mut gpu = match object.gpu.take() {
            Some(gpu) if gpu.capacity == capacity => gpu,
            _ => ObjectGpu::create(ctx, capacity),
        };

        if gpu.revision != revision {
            let raw: Vec<InstanceRaw> = object.models().iter().take(capacity).map(InstanceRaw::new).collect();
            if !raw.is_empty() {
                ctx.queue.write_buffer(&gpu.instances, 0, bytemuck::cast_slice(&raw));
            }
            gpu.revision = revision;
        }
        object.gpu = Some(gpu);

        for polygon in object.polygons_mut() {
            PolygonGpu::prepare(ctx, polygon, bindings);
        }
    }

    pub(crate) fn duplicate(&self, ctx: &RenderCtx<'_>) -> Self {
        let mut copy = Self::create(ctx, self.capacity);

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lumen instance duplicate"),
        });
        encoder.copy_buffer_to_buffer(&self.instances, 0, &copy.instances, 0, self.instances.size());
        ctx.queue.submit(std::iter::once(encoder.finish()));

        copy.revision = self.revision;
        copy
    }

    #[inline]
    pub(super) fn instances(&self) -> &wgpu::Buffer {
        &self.instances
    }
}

impl Drop for ObjectGpu {
    fn drop(&mut self) {
        self.instances.destroy();
    }
}

/// Draws `instances` of every polygon of `object` with the object pipeline.
/// Objects or polygons not yet prepared are skipped.
pub(super) fn draw_object(rpass: &mut wgpu::RenderPass<'_>, object: &GraphObject, instances: Range<u32>) {
    let Some(gpu) = object.gpu.as_ref() else { return };
    rpass.set_vertex_buffer(1, gpu.instances().slice(..));

    for polygon in object.polygons() {
        let Some(pgpu) = polygon.gpu.as_ref() else { continue };
        pgpu.draw(rpass, instances.clone(), true);
    }
}

/// Draws the polygons of `object` against an already bound outline
/// instance buffer.
pub(super) fn draw_outline(rpass: &mut wgpu::RenderPass<'_>, object: &GraphObject, instances: Range<u32>) {
    for polygon in object.polygons() {
        let Some(pgpu) = polygon.gpu.as_ref() else { continue };
        pgpu.draw(rpass, instances.clone(), false);
    }
}
