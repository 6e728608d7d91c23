use crate::error::{Dims, EngineError, LookupKind, Result};
use crate::math::{transform, Matrix, Vect3};
use crate::render::{ObjectGpu, RenderCtx};

use super::{Polygon, PolygonId};

/// Id of an object inside a [`SceneComposer`](crate::scene::SceneComposer).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

pub const DEFAULT_BORDER_WIDTH: f64 = 0.003;

/// Polygons sharing a bounded list of instance transforms ("models").
///
/// Every instance draws the whole polygon set under its own 4×4 world
/// matrix. The object centroid is the vertex-count-weighted mean of the
/// polygon centroids; adding or editing polygons through this type keeps it
/// current, mutation through [`GraphObject::polygon_mut`] requires a manual
/// [`GraphObject::set_center`].
#[derive(Debug)]
pub struct GraphObject {
    id: Option<ObjectId>,

    polygons: Vec<Polygon>,
    next_polygon_id: u32,
    count_points: usize,
    center: Vect3,

    models: Vec<Matrix>,
    max_models: usize,

    /// Blended back-to-front, one instance per draw.
    pub transparent: bool,
    /// Stencil-masked outline drawn after each instance.
    pub border: bool,
    /// Outline growth per unit of camera distance.
    pub border_width: f64,
    pub border_color: Vect3,

    revision: u64,
    placeholder: Polygon,
    pub(crate) gpu: Option<ObjectGpu>,
}

impl GraphObject {
    /// Empty object holding up to `max_instances` models.
    ///
    /// Instance 0 starts as identity; with `max_instances == 0` the object
    /// has no instances and never draws.
    pub fn new(max_instances: usize) -> Self {
        let models = if max_instances > 0 {
            vec![transform::identity(4)]
        } else {
            Vec::new()
        };

        Self {
            id: None,
            polygons: Vec::new(),
            next_polygon_id: 0,
            count_points: 0,
            center: Vect3::zero(),
            models,
            max_models: max_instances,
            transparent: false,
            border: false,
            border_width: DEFAULT_BORDER_WIDTH,
            border_color: Vect3::new(1.0, 0.0, 0.0),
            revision: 0,
            placeholder: Polygon::default(),
            gpu: None,
        }
    }

    #[inline]
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    #[inline]
    pub(crate) fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    // ── polygons ──────────────────────────────────────────────────────────

    /// Appends `polygon` under a fresh id and refreshes the centroid.
    pub fn add_polygon(&mut self, mut polygon: Polygon) -> PolygonId {
        let id = PolygonId(self.next_polygon_id);
        self.next_polygon_id += 1;

        polygon.set_id(id);
        self.count_points += polygon.count_points();
        self.polygons.push(polygon);
        self.set_center();
        id
    }

    pub fn try_polygon(&self, id: PolygonId) -> Result<&Polygon> {
        self.polygons
            .iter()
            .find(|p| p.id() == Some(id))
            .ok_or(EngineError::NotFound {
                kind: LookupKind::Polygon,
                id: id.get(),
            })
    }

    /// Looks up a polygon; a miss is reported and yields a placeholder whose
    /// `id()` is `None`.
    pub fn polygon(&self, id: PolygonId) -> &Polygon {
        match self.try_polygon(id) {
            Ok(p) => p,
            Err(e) => {
                e.report();
                &self.placeholder
            }
        }
    }

    /// Mutable lookup with the same placeholder fallback as [`GraphObject::polygon`].
    ///
    /// Geometry edits made here leave the centroid stale until
    /// [`GraphObject::set_center`]; prefer [`GraphObject::edit_polygon`].
    pub fn polygon_mut(&mut self, id: PolygonId) -> &mut Polygon {
        match self.polygons.iter().position(|p| p.id() == Some(id)) {
            Some(i) => &mut self.polygons[i],
            None => {
                EngineError::NotFound {
                    kind: LookupKind::Polygon,
                    id: id.get(),
                }
                .report();
                self.placeholder = Polygon::default();
                &mut self.placeholder
            }
        }
    }

    /// Runs `f` on the polygon and recomputes the centroid afterwards.
    pub fn edit_polygon<R>(&mut self, id: PolygonId, f: impl FnOnce(&mut Polygon) -> R) -> Result<R> {
        let i = self
            .polygons
            .iter()
            .position(|p| p.id() == Some(id))
            .ok_or(EngineError::NotFound {
                kind: LookupKind::Polygon,
                id: id.get(),
            })?;

        let before = self.polygons[i].count_points();
        let out = f(&mut self.polygons[i]);
        self.count_points = self.count_points - before + self.polygons[i].count_points();
        self.set_center();
        Ok(out)
    }

    /// Applies `t` to every polygon's cumulative matrix.
    pub fn transform_polygons(&mut self, t: &Matrix) {
        for p in &mut self.polygons {
            p.change_matrix(t);
        }
        self.set_center();
    }

    #[inline]
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    #[inline]
    pub(crate) fn polygons_mut(&mut self) -> &mut [Polygon] {
        &mut self.polygons
    }

    #[inline]
    pub fn count_points(&self) -> usize {
        self.count_points
    }

    // ── centroid ──────────────────────────────────────────────────────────

    /// Recomputes the object centroid from the current polygon centroids.
    pub fn set_center(&mut self) {
        if self.count_points == 0 {
            self.center = Vect3::zero();
            return;
        }

        let sum = self
            .polygons
            .iter()
            .fold(Vect3::zero(), |acc, p| acc + p.center() * p.count_points() as f64);
        self.center = sum / self.count_points as f64;
    }

    #[inline]
    pub fn center(&self) -> Vect3 {
        self.center
    }

    // ── instances ─────────────────────────────────────────────────────────

    /// Appends an instance transform and returns its index.
    ///
    /// A full instance list is reported as `CapacityExceeded` and left
    /// unchanged.
    pub fn add_matrix(&mut self, model: Matrix) -> Result<usize> {
        if self.models.len() >= self.max_models {
            return Err(EngineError::CapacityExceeded {
                capacity: self.max_models,
            }
            .report());
        }
        if !model.is_transform() {
            return Err(EngineError::dims("instance matrix", model.dims(), Dims::new(4, 4)).report());
        }

        self.models.push(model);
        self.touch();
        Ok(self.models.len() - 1)
    }

    /// Left-composes `t` onto one instance.
    ///
    /// `index` wraps modulo the instance count (negative values count from
    /// the end). No-op without instances.
    pub fn change_matrix(&mut self, t: &Matrix, index: isize) {
        let len = self.models.len();
        if len == 0 {
            return;
        }

        if !t.is_transform() {
            EngineError::dims("instance transform", t.dims(), Dims::new(4, 4)).report();
            return;
        }

        let i = index.rem_euclid(len as isize) as usize;
        match t.checked_mul(&self.models[i]) {
            Ok(m) => {
                self.models[i] = m;
                self.touch();
            }
            Err(e) => {
                e.report();
            }
        }
    }

    /// Left-composes `t` onto every instance.
    pub fn change_all_matrices(&mut self, t: &Matrix) {
        for i in 0..self.models.len() {
            self.change_matrix(t, i as isize);
        }
    }

    #[inline]
    pub fn models(&self) -> &[Matrix] {
        &self.models
    }

    #[inline]
    pub fn instance_count(&self) -> usize {
        self.models.len()
    }

    #[inline]
    pub fn max_instances(&self) -> usize {
        self.max_models
    }

    /// World-space centroid of every instance, paired with its index.
    ///
    /// This is the transparency-sorting feed.
    pub fn instance_centers(&self) -> Vec<(Vect3, usize)> {
        self.models
            .iter()
            .enumerate()
            .map(|(i, m)| (m * self.center, i))
            .collect()
    }

    /// Outline transform of instance `i`: the model scaled up around the
    /// object origin in proportion to its distance from `view_pos`.
    pub fn border_model(&self, i: usize, view_pos: Vect3) -> Matrix {
        let model = &self.models[i];
        let distance = (view_pos - model * self.center).length();
        model * &transform::uniform_scale(1.0 + self.border_width * distance)
    }

    // ── GPU state ─────────────────────────────────────────────────────────

    #[inline]
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    /// Copies the object with its instance buffer and every polygon's
    /// vertex buffers duplicated on the GPU.
    pub fn clone_gpu_state(&self, ctx: &RenderCtx<'_>) -> Self {
        let mut copy = self.clone();
        copy.polygons = self.polygons.iter().map(|p| p.clone_gpu_state(ctx)).collect();
        copy.gpu = self.gpu.as_ref().map(|gpu| gpu.duplicate(ctx));
        copy
    }

    #[inline]
    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl Clone for GraphObject {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            polygons: self.polygons.clone(),
            next_polygon_id: self.next_polygon_id,
            count_points: self.count_points,
            center: self.center,
            models: self.models.clone(),
            max_models: self.max_models,
            transparent: self.transparent,
            border: self.border,
            border_width: self.border_width,
            border_color: self.border_color,
            revision: self.revision,
            placeholder: Polygon::default(),
            gpu: None,
        }
    }
}

/// Instance-less object without id, used as the failed-lookup placeholder.
impl Default for GraphObject {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(offset: Vect3) -> Polygon {
        Polygon::new(vec![
            Vect3::new(0.0, 0.0, 0.0) + offset,
            Vect3::new(0.0, 3.0, 0.0) + offset,
            Vect3::new(3.0, 0.0, 0.0) + offset,
        ])
        .unwrap()
    }

    fn quad(offset: Vect3) -> Polygon {
        let mut q = Polygon::unit_quad();
        q.change_matrix(&transform::translation(offset));
        q
    }

    // ── polygons ──────────────────────────────────────────────────────────

    #[test]
    fn polygon_ids_are_sequential() {
        let mut obj = GraphObject::new(1);
        let a = obj.add_polygon(tri(Vect3::zero()));
        let b = obj.add_polygon(tri(Vect3::zero()));
        assert_eq!((a.get(), b.get()), (0, 1));
        assert_eq!(obj.polygon(b).id(), Some(b));
        assert_eq!(obj.count_points(), 6);
    }

    #[test]
    fn missing_polygon_yields_placeholder() {
        let mut obj = GraphObject::new(1);
        obj.add_polygon(tri(Vect3::zero()));
        let ghost = PolygonId(42);
        assert!(matches!(obj.try_polygon(ghost), Err(EngineError::NotFound { id: 42, .. })));
        assert!(obj.polygon(ghost).id().is_none());
        assert!(obj.polygon_mut(ghost).id().is_none());
        assert!(obj.edit_polygon(ghost, |_| ()).is_err());
    }

    // ── centroid ──────────────────────────────────────────────────────────

    #[test]
    fn center_is_weighted_by_point_count() {
        let mut obj = GraphObject::new(1);
        obj.add_polygon(tri(Vect3::zero())); // centroid (1, 1, 0), 3 points
        obj.add_polygon(quad(Vect3::new(10.0, 0.0, 0.0))); // centroid (10, 0, 0), 4 points
        let expected = (Vect3::new(1.0, 1.0, 0.0) * 3.0 + Vect3::new(10.0, 0.0, 0.0) * 4.0) / 7.0;
        assert!(obj.center().approx_eq(expected, 1e-12));
    }

    #[test]
    fn polygon_mut_leaves_center_stale_until_set_center() {
        let mut obj = GraphObject::new(1);
        let id = obj.add_polygon(quad(Vect3::zero()));
        obj.polygon_mut(id).change_matrix(&transform::translation(Vect3::new(0.0, 0.0, 4.0)));
        assert!(obj.center().approx_eq(Vect3::zero(), 1e-12));
        obj.set_center();
        assert!(obj.center().approx_eq(Vect3::new(0.0, 0.0, 4.0), 1e-12));
    }

    #[test]
    fn edit_polygon_refreshes_center() {
        let mut obj = GraphObject::new(1);
        let id = obj.add_polygon(quad(Vect3::zero()));
        obj.edit_polygon(id, |p| p.change_matrix(&transform::translation(Vect3::new(2.0, 0.0, 0.0))))
            .unwrap();
        assert!(obj.center().approx_eq(Vect3::new(2.0, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn empty_object_center_is_origin() {
        let mut obj = GraphObject::new(1);
        obj.set_center();
        assert_eq!(obj.center(), Vect3::zero());
    }

    // ── instances ─────────────────────────────────────────────────────────

    #[test]
    fn starts_with_identity_instance() {
        let obj = GraphObject::new(4);
        assert_eq!(obj.instance_count(), 1);
        assert!(obj.models()[0].approx_eq(&transform::identity(4), 0.0));
        assert_eq!(GraphObject::new(0).instance_count(), 0);
    }

    #[test]
    fn add_matrix_stops_at_capacity() {
        let n = 3;
        let mut obj = GraphObject::new(n);
        assert_eq!(obj.add_matrix(transform::identity(4)).unwrap(), 1);
        assert_eq!(obj.add_matrix(transform::identity(4)).unwrap(), 2);
        let err = obj.add_matrix(transform::identity(4)).unwrap_err();
        assert!(matches!(err, EngineError::CapacityExceeded { capacity: 3 }));
        assert_eq!(obj.instance_count(), n);
    }

    #[test]
    fn add_matrix_rejects_non_4x4() {
        let mut obj = GraphObject::new(3);
        assert!(obj.add_matrix(transform::identity(3)).is_err());
        assert_eq!(obj.instance_count(), 1);
    }

    #[test]
    fn change_matrix_index_wraps() {
        let n = 10;
        let mut obj = GraphObject::new(n);
        obj.add_matrix(transform::identity(4)).unwrap();
        obj.add_matrix(transform::identity(4)).unwrap();

        let t = transform::translation(Vect3::new(1.0, 0.0, 0.0));
        obj.change_matrix(&t, (n + 5) as isize); // 15 mod 3 == 0
        obj.change_matrix(&t, -1); // -1 mod 3 == 2

        assert_eq!(obj.models()[0][(0, 3)], 1.0);
        assert_eq!(obj.models()[1][(0, 3)], 0.0);
        assert_eq!(obj.models()[2][(0, 3)], 1.0);
    }

    #[test]
    fn tall_instance_transform_is_ignored() {
        let mut obj = GraphObject::new(2);
        obj.add_polygon(quad(Vect3::new(0.0, 0.0, 3.0)));
        let before = obj.instance_centers();

        obj.change_matrix(&Matrix::filled(5, 4, 1.0), 0);
        obj.change_all_matrices(&Matrix::filled(5, 4, 1.0));

        assert!(obj.models()[0].approx_eq(&transform::identity(4), 0.0));
        assert_eq!(obj.instance_centers(), before);
        assert!(obj.add_matrix(Matrix::filled(5, 4, 1.0)).is_err());
    }

    #[test]
    fn change_matrix_without_instances_is_a_no_op() {
        let mut obj = GraphObject::new(0);
        obj.change_matrix(&transform::uniform_scale(2.0), 3);
        assert_eq!(obj.instance_count(), 0);
    }

    #[test]
    fn instance_centers_apply_each_model() {
        let mut obj = GraphObject::new(3);
        obj.add_polygon(quad(Vect3::new(0.0, 0.0, 1.0)));
        obj.add_matrix(transform::translation(Vect3::new(5.0, 0.0, 0.0))).unwrap();

        let centers = obj.instance_centers();
        assert_eq!(centers.len(), 2);
        assert!(centers[0].0.approx_eq(Vect3::new(0.0, 0.0, 1.0), 1e-12));
        assert!(centers[1].0.approx_eq(Vect3::new(5.0, 0.0, 1.0), 1e-12));
        assert_eq!(centers[1].1, 1);
    }

    // ── border ────────────────────────────────────────────────────────────

    #[test]
    fn border_model_grows_with_distance() {
        let mut obj = GraphObject::new(1);
        obj.add_polygon(quad(Vect3::new(0.0, 0.0, 10.0)));
        let m = obj.border_model(0, Vect3::zero());
        let s = 1.0 + DEFAULT_BORDER_WIDTH * 10.0;
        assert!((m[(0, 0)] - s).abs() < 1e-12);
        assert!((m[(2, 2)] - s).abs() < 1e-12);
    }

    // ── clone ─────────────────────────────────────────────────────────────

    #[test]
    fn clone_drops_gpu_state_and_keeps_flags() {
        let mut obj = GraphObject::new(2);
        obj.transparent = true;
        obj.add_polygon(tri(Vect3::zero()));
        let copy = obj.clone();
        assert!(copy.transparent);
        assert!(copy.gpu.is_none());
        assert!(copy.polygons().iter().all(|p| p.gpu.is_none()));
        assert_eq!(copy.center(), obj.center());
    }
}
