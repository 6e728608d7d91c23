use crate::error::{Dims, EngineError, Result};
use crate::math::{transform, Matrix, Vect3};
use crate::render::{PolygonGpu, RenderCtx};

use super::{Material, TextureSet};

/// Id of a polygon, unique within its [`GraphObject`](super::GraphObject).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PolygonId(pub(crate) u32);

impl PolygonId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Planar convex n-gon, fan-triangulated from vertex 0.
///
/// Local positions are never modified by transforms: world positions are
/// rebuilt as `matrix * local` every time the cumulative matrix changes.
///
/// `Clone` copies CPU state only; the copy uploads its own GPU buffers on
/// first draw. [`Polygon::clone_gpu_state`] duplicates them eagerly.
#[derive(Debug)]
pub struct Polygon {
    id: Option<PolygonId>,

    local: Vec<Vect3>,
    world: Vec<Vect3>,
    normals: Vec<Vect3>,
    tex_coords: Vec<[f64; 2]>,

    /// Composition of every transform applied so far (latest on the left).
    matrix: Matrix,
    local_center: Vect3,
    /// Normals follow the baked face instead of caller-provided values.
    auto_normals: bool,

    material: Material,
    textures: TextureSet,

    revision: u64,
    pub(crate) gpu: Option<PolygonGpu>,
}

impl Polygon {
    /// Builds a polygon from at least three local-space points.
    pub fn new(points: impl Into<Vec<Vect3>>) -> Result<Self> {
        let points = points.into();
        if points.len() < 3 {
            return Err(EngineError::dims(
                "polygon vertex count",
                Dims::new(points.len(), 3),
                Dims::new(3, 3),
            ));
        }
        Ok(Self::from_points(points))
    }

    /// Axis-aligned unit square in the `z = 0` plane facing -z (towards a
    /// default camera), with texture coordinates spanning the face.
    pub fn unit_quad() -> Self {
        let mut quad = Self::from_points(vec![
            Vect3::new(-0.5, 0.5, 0.0),
            Vect3::new(-0.5, -0.5, 0.0),
            Vect3::new(0.5, -0.5, 0.0),
            Vect3::new(0.5, 0.5, 0.0),
        ]);
        quad.tex_coords = vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        quad
    }

    /// `points.len() >= 3` is the caller's responsibility.
    fn from_points(points: Vec<Vect3>) -> Self {
        let n = points.len();
        let mut poly = Self {
            id: None,
            local: points,
            world: vec![Vect3::zero(); n],
            normals: vec![Vect3::zero(); n],
            tex_coords: vec![[0.0; 2]; n],
            matrix: transform::identity(4),
            local_center: Vect3::zero(),
            auto_normals: true,
            material: Material::default(),
            textures: TextureSet::default(),
            revision: 0,
            gpu: None,
        };
        poly.rebuild_center();
        poly.bake();
        poly
    }

    // ── identity ──────────────────────────────────────────────────────────

    /// `None` until the polygon is added to an object; lookups that fail
    /// hand out a placeholder whose id is `None`.
    #[inline]
    pub fn id(&self) -> Option<PolygonId> {
        self.id
    }

    #[inline]
    pub(crate) fn set_id(&mut self, id: PolygonId) {
        self.id = Some(id);
    }

    #[inline]
    pub fn count_points(&self) -> usize {
        self.local.len()
    }

    // ── geometry ──────────────────────────────────────────────────────────

    /// Replaces the local positions (same vertex count).
    ///
    /// The local centroid is recomputed; with `recompute_normals` the flat
    /// face normal is rebuilt from the first three baked vertices and
    /// applied to every vertex.
    pub fn set_positions(&mut self, points: &[Vect3], recompute_normals: bool) -> Result<()> {
        self.check_len("polygon positions", points.len())?;
        self.local.copy_from_slice(points);
        if recompute_normals {
            self.auto_normals = true;
        }
        self.rebuild_center();
        self.bake();
        Ok(())
    }

    /// Per-vertex world-space normals. They stay as given until the next
    /// `set_positions(.., true)`.
    pub fn set_normals(&mut self, normals: &[Vect3]) -> Result<()> {
        self.check_len("polygon normals", normals.len())?;
        self.normals.copy_from_slice(normals);
        self.auto_normals = false;
        self.touch();
        Ok(())
    }

    pub fn set_tex_coords(&mut self, tex_coords: &[[f64; 2]]) -> Result<()> {
        self.check_len("polygon texture coordinates", tex_coords.len())?;
        self.tex_coords.copy_from_slice(tex_coords);
        self.touch();
        Ok(())
    }

    /// Left-composes `t` onto the cumulative matrix and re-bakes.
    ///
    /// A non-4×4 `t` is reported and ignored.
    pub fn change_matrix(&mut self, t: &Matrix) {
        if !t.is_transform() {
            EngineError::dims("polygon transform", t.dims(), Dims::new(4, 4)).report();
            return;
        }
        match t.checked_mul(&self.matrix) {
            Ok(m) => {
                self.matrix = m;
                self.bake();
            }
            Err(e) => {
                e.report();
            }
        }
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Baked world-space positions.
    #[inline]
    pub fn positions(&self) -> &[Vect3] {
        &self.world
    }

    #[inline]
    pub fn local_positions(&self) -> &[Vect3] {
        &self.local
    }

    #[inline]
    pub fn normals(&self) -> &[Vect3] {
        &self.normals
    }

    #[inline]
    pub fn tex_coords(&self) -> &[[f64; 2]] {
        &self.tex_coords
    }

    /// World-space centroid (`matrix * local centroid`).
    pub fn center(&self) -> Vect3 {
        &self.matrix * self.local_center
    }

    #[inline]
    pub fn local_center(&self) -> Vect3 {
        self.local_center
    }

    /// Fan triangulation: triangle `i` is `(0, i + 1, i + 2)`.
    pub fn indices(&self) -> Vec<u32> {
        let n = self.local.len() as u32;
        (0..n.saturating_sub(2))
            .flat_map(|i| [0, i + 1, i + 2])
            .collect()
    }

    // ── surface ───────────────────────────────────────────────────────────

    #[inline]
    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        self.touch();
        &mut self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
        self.touch();
    }

    #[inline]
    pub fn textures(&self) -> &TextureSet {
        &self.textures
    }

    pub fn set_textures(&mut self, textures: TextureSet) {
        self.textures = textures;
        self.touch();
    }

    // ── GPU state ─────────────────────────────────────────────────────────

    /// Bumped on every change the GPU mirror has to pick up.
    #[inline]
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    /// Copies the polygon together with its GPU buffers.
    ///
    /// Falls back to a plain [`Clone`] when nothing was uploaded yet.
    pub fn clone_gpu_state(&self, ctx: &RenderCtx<'_>) -> Self {
        let mut copy = self.clone();
        copy.gpu = self.gpu.as_ref().map(|gpu| gpu.duplicate(ctx));
        copy
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn check_len(&self, op: &'static str, len: usize) -> Result<()> {
        if len != self.local.len() {
            return Err(EngineError::dims(op, Dims::new(len, 1), Dims::new(self.local.len(), 1)));
        }
        Ok(())
    }

    fn rebuild_center(&mut self) {
        let sum = self.local.iter().fold(Vect3::zero(), |acc, &p| acc + p);
        self.local_center = sum * (1.0 / self.local.len() as f64);
    }

    fn bake(&mut self) {
        for (w, &l) in self.world.iter_mut().zip(&self.local) {
            *w = &self.matrix * l;
        }

        if self.auto_normals {
            let (p0, p1, p2) = (self.world[0], self.world[1], self.world[2]);
            let mut normal = (p2 - p0).cross(p1 - p0);
            if normal.length_sqr() > 0.0 {
                normal = normal.normalize();
            }
            self.normals.fill(normal);
        }

        self.touch();
    }

    #[inline]
    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl Clone for Polygon {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            local: self.local.clone(),
            world: self.world.clone(),
            normals: self.normals.clone(),
            tex_coords: self.tex_coords.clone(),
            matrix: self.matrix.clone(),
            local_center: self.local_center,
            auto_normals: self.auto_normals,
            material: self.material.clone(),
            textures: self.textures.clone(),
            revision: self.revision,
            gpu: None,
        }
    }
}

/// Degenerate triangle at the origin, used as the failed-lookup placeholder.
impl Default for Polygon {
    fn default() -> Self {
        Self::from_points(vec![Vect3::zero(); 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn square() -> Vec<Vect3> {
        vec![
            Vect3::new(0.0, 0.0, 0.0),
            Vect3::new(0.0, 2.0, 0.0),
            Vect3::new(2.0, 2.0, 0.0),
            Vect3::new(2.0, 0.0, 0.0),
        ]
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn needs_three_points() {
        let r = Polygon::new(vec![Vect3::zero(); 2]);
        assert!(matches!(r, Err(EngineError::DimensionMismatch { .. })));
    }

    #[test]
    fn fan_indices() {
        let p = Polygon::new(square()).unwrap();
        assert_eq!(p.indices(), vec![0, 1, 2, 0, 2, 3]);
        assert!(p.id().is_none());
    }

    // ── centroid ──────────────────────────────────────────────────────────

    #[test]
    fn center_is_mean_of_points() {
        let mut p = Polygon::new(square()).unwrap();
        p.set_positions(&square(), true).unwrap();
        assert!(p.center().approx_eq(Vect3::new(1.0, 1.0, 0.0), 1e-12));
    }

    #[test]
    fn center_follows_cumulative_transform() {
        let mut p = Polygon::new(square()).unwrap();
        p.change_matrix(&transform::translation(Vect3::new(0.0, 0.0, 5.0)));
        p.change_matrix(&transform::rotation(Vect3::new(0.0, 0.0, 1.0), FRAC_PI_2));

        let moved: Vec<Vect3> = square().iter().map(|&v| v + Vect3::new(1.0, 1.0, 0.0)).collect();
        p.set_positions(&moved, true).unwrap();

        let mean = Vect3::new(2.0, 2.0, 0.0);
        let expected = p.matrix() * mean;
        assert!(p.center().approx_eq(expected, 1e-9));
        assert!(p.local_center().approx_eq(mean, 1e-12));
    }

    // ── baking ────────────────────────────────────────────────────────────

    #[test]
    fn change_matrix_rebakes_from_local_values() {
        let mut p = Polygon::new(square()).unwrap();
        let r = transform::rotation(Vect3::new(1.0, 1.0, 0.0), 0.3);
        for _ in 0..50 {
            p.change_matrix(&r);
        }
        let total = transform::rotation(Vect3::new(1.0, 1.0, 0.0), 15.0);
        for (w, &l) in p.positions().iter().zip(p.local_positions()) {
            assert!(w.approx_eq(&total * l, 1e-9));
        }
        assert_eq!(p.local_positions(), square().as_slice());
    }

    #[test]
    fn transforms_compose_latest_on_the_left() {
        let mut p = Polygon::new(square()).unwrap();
        let t = transform::translation(Vect3::new(1.0, 0.0, 0.0));
        let s = transform::uniform_scale(2.0);
        p.change_matrix(&t);
        p.change_matrix(&s);
        assert!(p.matrix().approx_eq(&(&s * &t), 1e-12));
        assert!(p.positions()[0].approx_eq(Vect3::new(2.0, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn non_4x4_transform_is_ignored() {
        let mut p = Polygon::new(square()).unwrap();
        p.change_matrix(&Matrix::zeros(3, 3));
        assert!(p.matrix().approx_eq(&transform::identity(4), 0.0));
    }

    #[test]
    fn tall_transform_keeps_positions() {
        let mut p = Polygon::new(square()).unwrap();
        p.change_matrix(&transform::translation(Vect3::new(1.0, 0.0, 0.0)));
        let before = p.positions().to_vec();

        p.change_matrix(&Matrix::filled(5, 4, 1.0));

        assert_eq!(p.matrix().dims(), Dims::new(4, 4));
        assert_eq!(p.positions(), &before[..]);
        assert!(p.center().approx_eq(Vect3::new(2.0, 1.0, 0.0), 1e-12));
    }

    // ── normals ───────────────────────────────────────────────────────────

    #[test]
    fn flat_normal_broadcast_to_all_vertices() {
        // (p2 - p0) x (p1 - p0): clockwise on screen means facing away (+z).
        let p = Polygon::new(square()).unwrap();
        for n in p.normals() {
            assert!(n.approx_eq(Vect3::new(0.0, 0.0, 1.0), 1e-12));
        }
    }

    #[test]
    fn normals_follow_rotation() {
        let mut p = Polygon::new(square()).unwrap();
        p.change_matrix(&transform::rotation(Vect3::new(0.0, 1.0, 0.0), FRAC_PI_2));
        assert!(p.normals()[3].approx_eq(Vect3::new(1.0, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn explicit_normals_survive_until_recomputed() {
        let mut p = Polygon::new(square()).unwrap();
        let up = vec![Vect3::new(0.0, 1.0, 0.0); 4];
        p.set_normals(&up).unwrap();
        p.change_matrix(&transform::uniform_scale(3.0));
        assert_eq!(p.normals(), up.as_slice());

        p.set_positions(&square(), true).unwrap();
        assert!(p.normals()[0].approx_eq(Vect3::new(0.0, 0.0, 1.0), 1e-12));
    }

    #[test]
    fn attribute_lengths_are_checked() {
        let mut p = Polygon::new(square()).unwrap();
        assert!(p.set_positions(&square()[..3], true).is_err());
        assert!(p.set_normals(&[Vect3::zero()]).is_err());
        assert!(p.set_tex_coords(&[[0.0, 0.0]; 5]).is_err());
        assert!(p.set_tex_coords(&[[0.0, 1.0]; 4]).is_ok());
    }

    // ── revisions / clone ─────────────────────────────────────────────────

    #[test]
    fn mutations_bump_revision() {
        let mut p = Polygon::new(square()).unwrap();
        let r0 = p.revision();
        p.material_mut().alpha = 0.5;
        let r1 = p.revision();
        p.change_matrix(&transform::uniform_scale(2.0));
        assert!(r1 != r0 && p.revision() != r1);
    }

    #[test]
    fn clone_keeps_cpu_state() {
        let mut p = Polygon::new(square()).unwrap();
        p.change_matrix(&transform::translation(Vect3::new(0.0, 0.0, 1.0)));
        let q = p.clone();
        assert_eq!(q.positions(), p.positions());
        assert!(q.gpu.is_none());
    }

    #[test]
    fn unit_quad_faces_negative_z() {
        let q = Polygon::unit_quad();
        assert_eq!(q.count_points(), 4);
        assert!(q.normals()[0].approx_eq(Vect3::new(0.0, 0.0, -1.0), 1e-12));
        assert!(q.center().approx_eq(Vect3::zero(), 1e-12));
    }
}
