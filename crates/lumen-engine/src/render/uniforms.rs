//! CPU mirrors of the WGSL structs in `shaders/scene.wgsl` and
//! `shaders/post.wgsl`, plus conversions from the f64 scene types.

use bytemuck::{Pod, Zeroable};

use crate::config::MAX_LIGHT_SLOTS;
use crate::geometry::{Material, Polygon};
use crate::math::{Matrix, Vect3};
use crate::scene::{FramePlan, LightState, OutlineInstance, PostSettings};

#[inline]
fn vec4(v: Vect3, w: f32) -> [f32; 4] {
    let [x, y, z] = v.to_f32();
    [x, y, z, w]
}

// ── blend ─────────────────────────────────────────────────────────────────

/// Straight (non-premultiplied) alpha: material alpha and texture alpha are
/// both straight.
pub(super) fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState::ALPHA_BLENDING
}

// ── per-vertex ────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    /// Baked (object-space) vertices of `polygon`.
    pub(super) fn from_polygon(polygon: &Polygon) -> Vec<Vertex> {
        polygon
            .positions()
            .iter()
            .zip(polygon.normals())
            .zip(polygon.tex_coords())
            .map(|((p, n), uv)| Vertex {
                position: p.to_f32(),
                normal: n.to_f32(),
                uv: [uv[0] as f32, uv[1] as f32],
            })
            .collect()
    }
}

// ── per-instance ──────────────────────────────────────────────────────────

/// Model matrix plus the matching normal matrix (inverse transpose).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl InstanceRaw {
    const ATTRS: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }

    pub(super) fn new(model: &Matrix) -> Self {
        Self {
            model: model.to_mat4_f32(),
            normal: model.inverse().transposed().to_mat4_f32(),
        }
    }
}

/// Outline instance: scaled-up model and flat colour.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct OutlineRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl OutlineRaw {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OutlineRaw>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }

    pub(super) fn new(outline: &OutlineInstance) -> Self {
        Self {
            model: outline.model.to_mat4_f32(),
            color: vec4(outline.color, 1.0),
        }
    }
}

// ── material ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct MaterialUniform {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emission: [f32; 4],
    pub shininess: f32,
    pub alpha: f32,
    /// Non-zero: emissive marker surface, lighting skipped.
    pub light: u32,
    /// [`TextureSet::flags`](crate::geometry::TextureSet::flags) bits.
    pub maps: u32,
}

impl MaterialUniform {
    pub(super) fn new(material: &Material, maps: u32) -> Self {
        Self {
            ambient: vec4(material.ambient, 1.0),
            diffuse: vec4(material.diffuse, 1.0),
            specular: vec4(material.specular, 1.0),
            emission: vec4(material.emission, 1.0),
            shininess: material.shininess as f32,
            alpha: material.alpha as f32,
            light: material.light as u32,
            maps,
        }
    }
}

// ── lights + globals ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct LightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// constant, linear, quadratic.
    pub attenuation: [f32; 4],
    /// cos(cut_in), cos(cut_out).
    pub cutoff: [f32; 4],
    /// x: 0 directional, 1 point, 2 spot.
    pub kind: [u32; 4],
}

impl From<&LightState> for LightUniform {
    fn from(s: &LightState) -> Self {
        Self {
            position: vec4(s.position, 1.0),
            direction: vec4(s.direction, 0.0),
            ambient: vec4(s.ambient, 1.0),
            diffuse: vec4(s.diffuse, 1.0),
            specular: vec4(s.specular, 1.0),
            attenuation: [
                s.attenuation.constant as f32,
                s.attenuation.linear as f32,
                s.attenuation.quadratic as f32,
                0.0,
            ],
            cutoff: [s.cos_cut_in as f32, s.cos_cut_out as f32, 0.0, 0.0],
            kind: [s.code, 0, 0, 0],
        }
    }
}

/// Group 0 of the scene shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct Globals {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// xyz camera position, w gamma.
    pub view_pos: [f32; 4],
    /// x: number of live entries in `lights`.
    pub light_count: [u32; 4],
    pub lights: [LightUniform; MAX_LIGHT_SLOTS],
}

impl Globals {
    pub(super) fn new(plan: &FramePlan) -> Self {
        let mut lights = [LightUniform::zeroed(); MAX_LIGHT_SLOTS];
        for (dst, src) in lights.iter_mut().zip(&plan.lights) {
            *dst = src.into();
        }

        Self {
            view: plan.view.to_mat4_f32(),
            projection: plan.projection.to_mat4_f32(),
            view_pos: vec4(plan.view_pos, plan.gamma as f32),
            light_count: [plan.lights.len().min(MAX_LIGHT_SLOTS) as u32, 0, 0, 0],
            lights,
        }
    }
}

// ── post ──────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct PostParams {
    /// Rows of the 3×3 kernel, top row first; w unused.
    pub kernel: [[f32; 4]; 3],
    pub offset: f32,
    pub grayscale: u32,
    pub _pad: [f32; 2],
}

impl PostParams {
    pub(super) fn new(post: &PostSettings) -> Self {
        let mut kernel = [[0.0f32; 4]; 3];
        for (dst, row) in kernel.iter_mut().zip(post.kernel.weights()) {
            for (d, w) in dst.iter_mut().zip(row) {
                *d = *w as f32;
            }
        }

        Self {
            kernel,
            offset: post.offset as f32,
            grayscale: post.grayscale as u32,
            _pad: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ScreenVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
}

impl ScreenVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ScreenVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Full-screen quad as two triangles. Texture v runs top-down in wgpu, so
/// NDC y = 1 maps to v = 0.
pub(super) const SCREEN_QUAD: [ScreenVertex; 6] = [
    ScreenVertex { pos: [-1.0, 1.0], uv: [0.0, 0.0] },
    ScreenVertex { pos: [-1.0, -1.0], uv: [0.0, 1.0] },
    ScreenVertex { pos: [1.0, -1.0], uv: [1.0, 1.0] },
    ScreenVertex { pos: [-1.0, 1.0], uv: [0.0, 0.0] },
    ScreenVertex { pos: [1.0, -1.0], uv: [1.0, 1.0] },
    ScreenVertex { pos: [1.0, 1.0], uv: [1.0, 0.0] },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::math::transform;
    use crate::scene::{Kernel, Light, SceneComposer};

    // ── layouts ───────────────────────────────────────────────────────────

    #[test]
    fn struct_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 128);
        assert_eq!(std::mem::size_of::<OutlineRaw>(), 80);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 80);
        assert_eq!(std::mem::size_of::<LightUniform>(), 128);
        assert_eq!(std::mem::size_of::<Globals>(), 64 + 64 + 16 + 16 + 128 * MAX_LIGHT_SLOTS);
        assert_eq!(std::mem::size_of::<PostParams>(), 64);
    }

    // ── conversions ───────────────────────────────────────────────────────

    #[test]
    fn translation_leaves_normals_untouched() {
        let raw = InstanceRaw::new(&transform::translation(Vect3::new(3.0, -2.0, 7.0)));
        assert_eq!(raw.model[3], [3.0, -2.0, 7.0, 1.0]);
        for (i, col) in raw.normal.iter().take(3).enumerate() {
            for (j, v) in col.iter().take(3).enumerate() {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert!((v - expect).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn nonuniform_scale_inverts_in_normal_matrix() {
        let raw = InstanceRaw::new(&transform::scale(Vect3::new(2.0, 4.0, 1.0)));
        assert!((raw.normal[0][0] - 0.5).abs() < 1e-5);
        assert!((raw.normal[1][1] - 0.25).abs() < 1e-5);
    }

    #[test]
    fn polygon_vertices_carry_normals_and_uvs() {
        let quad = Polygon::unit_quad();
        let verts = Vertex::from_polygon(&quad);
        assert_eq!(verts.len(), 4);
        assert_eq!(verts[2].uv, [1.0, 1.0]);
        assert_eq!(verts[0].normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn globals_pack_lights_and_gamma() {
        let mut s = SceneComposer::new(&EngineConfig::default(), 1.0);
        s.set_light(1, Some(Light::point(Vect3::new(1.0, 2.0, 3.0))));
        let g = Globals::new(&s.compose());

        assert_eq!(g.light_count[0], 8);
        assert_eq!(g.view_pos[3], 2.2);
        assert_eq!(g.lights[1].kind[0], 1);
        assert_eq!(g.lights[1].position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(g.lights[0].diffuse, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn post_params_keep_row_order() {
        let post = PostSettings {
            kernel: Kernel::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]),
            offset: 0.5,
            grayscale: true,
        };
        let p = PostParams::new(&post);
        assert_eq!(p.kernel[0], [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(p.kernel[2], [7.0, 8.0, 9.0, 0.0]);
        assert_eq!(p.grayscale, 1);
    }

    #[test]
    fn material_flags() {
        let m = MaterialUniform::new(&Material::emissive(Vect3::new(1.0, 1.0, 1.0)), 5);
        assert_eq!(m.light, 1);
        assert_eq!(m.maps, 5);
        assert_eq!(m.alpha, 1.0);
    }
}
