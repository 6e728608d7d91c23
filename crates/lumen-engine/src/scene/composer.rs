use crate::config::EngineConfig;
use crate::error::{EngineError, LookupKind, Result};
use crate::geometry::{GraphObject, ObjectId};
use crate::math::{transform, Matrix, Vect3};

use super::{
    Camera, DepthKey, DrawCmd, DrawTarget, FramePlan, Instances, Kernel, Light, LightState,
    OutlineInstance, PostSettings,
};

/// Owns everything that makes up a scene and decides the draw order.
///
/// Per frame, [`SceneComposer::compose`] emits light markers, then opaque
/// objects (all instances per draw), then every transparent instance of
/// every transparent object sorted farthest-first, one draw each.
#[derive(Debug)]
pub struct SceneComposer {
    camera: Camera,

    fov: f64,
    near: f64,
    far: f64,
    aspect: f64,
    projection: Matrix,

    /// Sorted by id (ids are handed out increasing, removal keeps order).
    objects: Vec<GraphObject>,
    next_object_id: u32,
    placeholder: GraphObject,

    lights: Vec<Option<Light>>,

    post: PostSettings,
    clear_color: Vect3,
    gamma: f64,
    max_instances: usize,
}

impl SceneComposer {
    /// `aspect` is surface width / height.
    pub fn new(config: &EngineConfig, aspect: f64) -> Self {
        let projection = transform::perspective(config.fov, aspect, config.near, config.far);

        Self {
            camera: Camera::default(),
            fov: config.fov,
            near: config.near,
            far: config.far,
            aspect,
            projection,
            objects: Vec::new(),
            next_object_id: 0,
            placeholder: GraphObject::default(),
            lights: vec![None; config.effective_light_slots()],
            post: PostSettings {
                kernel: Kernel::identity(),
                offset: config.kernel_offset,
                grayscale: config.grayscale,
            },
            clear_color: config.clear_color,
            gamma: config.gamma,
            max_instances: config.max_instances,
        }
    }

    // ── camera / projection ───────────────────────────────────────────────

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn rotate_camera(&mut self, axis: Vect3, angle: f64) {
        self.camera.rotate(axis, angle);
    }

    /// Rebuilds the projection for a new surface aspect ratio.
    pub fn set_aspect(&mut self, aspect: f64) {
        if !(aspect.is_finite() && aspect > 0.0) {
            log::warn!("ignoring invalid aspect ratio {aspect}");
            return;
        }
        self.aspect = aspect;
        self.projection = transform::perspective(self.fov, aspect, self.near, self.far);
        log::debug!("projection rebuilt for aspect {aspect:.3}");
    }

    #[inline]
    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    #[inline]
    pub fn projection(&self) -> &Matrix {
        &self.projection
    }

    // ── objects ───────────────────────────────────────────────────────────

    /// Empty object with the configured instance capacity.
    pub fn new_object(&self) -> GraphObject {
        GraphObject::new(self.max_instances)
    }

    pub fn add_object(&mut self, mut object: GraphObject) -> ObjectId {
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        object.set_id(id);
        self.objects.push(object);
        id
    }

    /// Takes the object out of the scene; its GPU buffers go with it.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<GraphObject> {
        let i = self.index_of(id).map_err(EngineError::report)?;
        Ok(self.objects.remove(i))
    }

    pub fn try_object(&self, id: ObjectId) -> Result<&GraphObject> {
        self.index_of(id).map(|i| &self.objects[i])
    }

    /// Looks up an object; a miss is reported and yields a placeholder whose
    /// `id()` is `None`.
    pub fn object(&self, id: ObjectId) -> &GraphObject {
        match self.index_of(id) {
            Ok(i) => &self.objects[i],
            Err(e) => {
                e.report();
                &self.placeholder
            }
        }
    }

    /// Mutable lookup with the same placeholder fallback as [`SceneComposer::object`].
    pub fn object_mut(&mut self, id: ObjectId) -> &mut GraphObject {
        match self.index_of(id) {
            Ok(i) => &mut self.objects[i],
            Err(e) => {
                e.report();
                self.placeholder = GraphObject::default();
                &mut self.placeholder
            }
        }
    }

    #[inline]
    pub fn objects(&self) -> &[GraphObject] {
        &self.objects
    }

    #[inline]
    pub(crate) fn objects_mut(&mut self) -> &mut [GraphObject] {
        &mut self.objects
    }

    fn index_of(&self, id: ObjectId) -> Result<usize> {
        self.objects
            .binary_search_by_key(&Some(id), |o| o.id())
            .map_err(|_| EngineError::NotFound {
                kind: LookupKind::Object,
                id: id.get(),
            })
    }

    // ── lights ────────────────────────────────────────────────────────────

    #[inline]
    pub fn light_slots(&self) -> usize {
        self.lights.len()
    }

    fn slot(&self, slot: isize) -> usize {
        slot.rem_euclid(self.lights.len() as isize) as usize
    }

    /// Installs (or clears, with `None`) the light in `slot`, wrapping modulo
    /// the slot count.
    pub fn set_light(&mut self, slot: isize, light: Option<Light>) {
        let i = self.slot(slot);
        self.lights[i] = light;
    }

    pub fn light(&self, slot: isize) -> Option<&Light> {
        self.lights[self.slot(slot)].as_ref()
    }

    pub fn light_mut(&mut self, slot: isize) -> Option<&mut Light> {
        let i = self.slot(slot);
        self.lights[i].as_mut()
    }

    #[inline]
    pub(crate) fn lights_mut(&mut self) -> &mut [Option<Light>] {
        &mut self.lights
    }

    // ── frame settings ────────────────────────────────────────────────────

    #[inline]
    pub fn clear_color(&self) -> Vect3 {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Vect3) {
        self.clear_color = color;
    }

    #[inline]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn set_gamma(&mut self, gamma: f64) {
        self.gamma = gamma;
    }

    #[inline]
    pub fn post(&self) -> &PostSettings {
        &self.post
    }

    pub fn set_kernel(&mut self, kernel: Kernel) {
        self.post.kernel = kernel;
    }

    pub fn set_kernel_offset(&mut self, offset: f64) {
        self.post.offset = offset;
    }

    pub fn set_grayscale(&mut self, grayscale: bool) {
        self.post.grayscale = grayscale;
    }

    // ── composition ───────────────────────────────────────────────────────

    /// Builds this frame's draw order.
    pub fn compose(&self) -> FramePlan {
        let view_pos = self.camera.position;
        let mut out = PlanBuilder::new(view_pos);

        for (slot, light) in self.lights.iter().enumerate() {
            let Some(marker) = light.as_ref().and_then(Light::marker) else { continue };
            let n = marker.instance_count() as u32;
            if n > 0 {
                out.push(DrawTarget::Marker(slot), marker, Instances::All(n));
            }
        }

        let mut transparent: Vec<(DepthKey, &GraphObject, u32)> = Vec::new();

        for object in &self.objects {
            let Some(id) = object.id() else { continue };
            let n = object.instance_count() as u32;
            if n == 0 {
                continue;
            }

            if object.transparent {
                for (center, i) in object.instance_centers() {
                    let key = DepthKey::new((view_pos - center).length(), transparent.len() as u32);
                    transparent.push((key, object, i as u32));
                }
                continue;
            }

            out.push(DrawTarget::Object(id), object, Instances::All(n));
        }

        transparent.sort_by(|a, b| a.0.cmp(&b.0));

        for (_, object, i) in transparent {
            let Some(id) = object.id() else { continue };
            out.push(DrawTarget::Object(id), object, Instances::One(i));
        }

        FramePlan {
            view: self.camera.view_matrix(),
            projection: self.projection.clone(),
            view_pos,
            gamma: self.gamma,
            clear_color: self.clear_color,
            lights: self
                .lights
                .iter()
                .map(|l| l.as_ref().map_or_else(LightState::neutral, Light::state))
                .collect(),
            draws: out.draws,
            outlines: out.outlines,
            post: self.post,
        }
    }
}

/// Accumulates draws and outline instances, handing out stencil references.
struct PlanBuilder {
    view_pos: Vect3,
    draws: Vec<DrawCmd>,
    outlines: Vec<OutlineInstance>,
    next_ref: u32,
}

impl PlanBuilder {
    fn new(view_pos: Vect3) -> Self {
        Self {
            view_pos,
            draws: Vec::new(),
            outlines: Vec::new(),
            next_ref: 0,
        }
    }

    /// Cycles through 1..=255; 0 is left to draws without an outline.
    fn stencil_ref(&mut self) -> u32 {
        self.next_ref = self.next_ref % 255 + 1;
        self.next_ref
    }

    fn push(&mut self, target: DrawTarget, object: &GraphObject, instances: Instances) {
        let (stencil_ref, outline) = if object.border {
            let start = self.outlines.len() as u32;
            for i in instances.range() {
                self.outlines.push(OutlineInstance {
                    model: object.border_model(i as usize, self.view_pos),
                    color: object.border_color,
                });
            }
            (self.stencil_ref(), Some(start..self.outlines.len() as u32))
        } else {
            (0, None)
        };

        self.draws.push(DrawCmd {
            target,
            instances,
            transparent: object.transparent,
            stencil_ref,
            outline,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    fn composer() -> SceneComposer {
        SceneComposer::new(&EngineConfig::default(), 16.0 / 9.0)
    }

    fn quad_at(z: f64) -> GraphObject {
        let mut obj = GraphObject::new(8);
        let mut quad = Polygon::unit_quad();
        quad.change_matrix(&transform::translation(Vect3::new(0.0, 0.0, z)));
        obj.add_polygon(quad);
        obj
    }

    // ── objects ───────────────────────────────────────────────────────────

    #[test]
    fn object_ids_and_lookup() {
        let mut s = composer();
        let a = s.add_object(quad_at(1.0));
        let b = s.add_object(quad_at(2.0));
        assert_eq!(s.object(b).id(), Some(b));

        let removed = s.remove_object(a).unwrap();
        assert_eq!(removed.id(), Some(a));
        assert!(s.try_object(a).is_err());
        assert!(s.object(a).id().is_none());
        assert!(s.object_mut(a).id().is_none());
        assert_eq!(s.object(b).id(), Some(b));
        assert!(s.remove_object(a).is_err());
    }

    // ── lights ────────────────────────────────────────────────────────────

    #[test]
    fn light_slots_wrap() {
        let mut s = composer();
        let n = s.light_slots() as isize;
        s.set_light(n + 1, Some(Light::point(Vect3::zero())));
        assert!(s.light(1).is_some());
        assert!(s.light(-n + 1).is_some());
        s.set_light(1, None);
        assert!(s.light(1).is_none());
    }

    #[test]
    fn empty_slots_are_neutral() {
        let mut s = composer();
        s.set_light(0, Some(Light::directional(Vect3::new(0.0, -1.0, 0.0))));
        let plan = s.compose();
        assert_eq!(plan.lights.len(), s.light_slots());
        assert_eq!(plan.lights[0].direction, Vect3::new(0.0, -1.0, 0.0));
        assert_eq!(plan.lights[1], LightState::neutral());
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn transparent_instances_sorted_far_to_near() {
        let mut s = composer();
        let mut obj = quad_at(0.0);
        obj.transparent = true;
        obj.change_matrix(&transform::translation(Vect3::new(0.0, 0.0, 5.0)), 0);
        obj.add_matrix(transform::translation(Vect3::new(0.0, 0.0, 1.0))).unwrap();
        obj.add_matrix(transform::translation(Vect3::new(0.0, 0.0, 3.0))).unwrap();
        let id = s.add_object(obj);

        let plan = s.compose();
        let order: Vec<_> = plan.object_draws().collect();
        assert_eq!(
            order,
            vec![
                (id, Instances::One(0)),
                (id, Instances::One(2)),
                (id, Instances::One(1)),
            ]
        );
    }

    #[test]
    fn markers_then_opaque_then_transparent() {
        let mut s = composer();
        s.set_light(2, Some(Light::point(Vect3::new(0.0, 3.0, 0.0))));

        let mut glass = quad_at(2.0);
        glass.transparent = true;
        let glass = s.add_object(glass);
        let wall = s.add_object(quad_at(10.0));

        let plan = s.compose();
        let targets: Vec<_> = plan.draws.iter().map(|d| d.target).collect();
        assert_eq!(
            targets,
            vec![DrawTarget::Marker(2), DrawTarget::Object(wall), DrawTarget::Object(glass)]
        );
        assert_eq!(plan.draws[1].instances, Instances::All(1));
        assert!(plan.draws[2].transparent);
    }

    #[test]
    fn sorting_is_global_across_objects() {
        let mut s = composer();
        let mut near = quad_at(1.0);
        near.transparent = true;
        let mut far = quad_at(4.0);
        far.transparent = true;
        far.add_matrix(transform::translation(Vect3::new(0.0, 0.0, -3.5))).unwrap();

        let near = s.add_object(near);
        let far = s.add_object(far);

        let plan = s.compose();
        let order: Vec<_> = plan.object_draws().collect();
        assert_eq!(
            order,
            vec![(far, Instances::One(0)), (near, Instances::One(0)), (far, Instances::One(1))]
        );
    }

    #[test]
    fn instance_less_objects_are_skipped() {
        let mut s = composer();
        s.add_object(GraphObject::new(0));
        assert!(s.compose().draws.is_empty());
    }

    // ── outlines ──────────────────────────────────────────────────────────

    #[test]
    fn bordered_object_gets_outline_per_instance() {
        let mut s = composer();
        let mut obj = quad_at(3.0);
        obj.border = true;
        obj.add_matrix(transform::translation(Vect3::new(1.0, 0.0, 0.0))).unwrap();
        s.add_object(obj);
        s.add_object(quad_at(5.0));

        let plan = s.compose();
        assert_eq!(plan.outlines.len(), 2);
        assert_eq!(plan.draws[0].outline, Some(0..2));
        assert_eq!(plan.draws[0].stencil_ref, 1);
        assert_eq!(plan.draws[1].outline, None);
        assert_eq!(plan.draws[1].stencil_ref, 0);
        assert_eq!(plan.outlines[0].color, Vect3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn stencil_refs_cycle_without_zero() {
        let mut b = PlanBuilder::new(Vect3::zero());
        let refs: Vec<u32> = (0..257).map(|_| b.stencil_ref()).collect();
        assert_eq!(refs[0], 1);
        assert_eq!(refs[254], 255);
        assert_eq!(refs[255], 1);
        assert!(!refs.contains(&0));
    }

    // ── frame settings ────────────────────────────────────────────────────

    #[test]
    fn plan_carries_settings() {
        let mut s = composer();
        s.set_grayscale(true);
        s.set_kernel_offset(0.01);
        s.set_gamma(1.0);
        let plan = s.compose();
        assert!(plan.post.grayscale);
        assert_eq!(plan.post.offset, 0.01);
        assert_eq!(plan.gamma, 1.0);
        assert!(plan.projection.approx_eq(s.projection(), 0.0));
    }

    #[test]
    fn set_aspect_rebuilds_projection() {
        let mut s = composer();
        let before = s.projection()[(1, 1)];
        s.set_aspect(1.0);
        assert!(s.projection()[(1, 1)] < before);
        s.set_aspect(0.0);
        assert_eq!(s.aspect(), 1.0);
    }
}
