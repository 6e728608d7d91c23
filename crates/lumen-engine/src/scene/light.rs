use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::geometry::{GraphObject, Material, Polygon};
use crate::math::{transform, Vect3};

/// Distance falloff `1 / (constant + linear·d + quadratic·d²)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Attenuation {
    pub constant: f64,
    pub linear: f64,
    pub quadratic: f64,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LightKind {
    Directional {
        direction: Vect3,
    },
    Point {
        position: Vect3,
        attenuation: Attenuation,
    },
    /// Cone light; `cut_in`/`cut_out` are half-angles in radians.
    Spot {
        position: Vect3,
        direction: Vect3,
        cut_in: f64,
        cut_out: f64,
        attenuation: Attenuation,
    },
}

impl LightKind {
    /// Shader-side discriminant.
    pub fn code(&self) -> u32 {
        match self {
            LightKind::Directional { .. } => 0,
            LightKind::Point { .. } => 1,
            LightKind::Spot { .. } => 2,
        }
    }
}

/// A light source. Point and spot lights carry a visible marker object.
#[derive(Debug, Clone)]
pub struct Light {
    kind: LightKind,
    pub ambient: Vect3,
    pub diffuse: Vect3,
    pub specular: Vect3,
    marker: Option<GraphObject>,
    custom_marker: bool,
}

impl Light {
    pub fn directional(direction: Vect3) -> Self {
        Self::with_kind(LightKind::Directional { direction })
    }

    pub fn point(position: Vect3) -> Self {
        Self::with_kind(LightKind::Point {
            position,
            attenuation: Attenuation::default(),
        })
    }

    pub fn spot(position: Vect3, direction: Vect3, cut_in: f64, cut_out: f64) -> Self {
        Self::with_kind(LightKind::Spot {
            position,
            direction,
            cut_in,
            cut_out,
            attenuation: Attenuation::default(),
        })
    }

    fn with_kind(kind: LightKind) -> Self {
        let mut light = Self {
            kind,
            ambient: Vect3::zero(),
            diffuse: Vect3::zero(),
            specular: Vect3::zero(),
            marker: None,
            custom_marker: false,
        };
        light.marker = light.default_marker();
        light
    }

    /// Sets ambient/diffuse/specular in one call.
    pub fn with_colors(mut self, ambient: Vect3, diffuse: Vect3, specular: Vect3) -> Self {
        self.ambient = ambient;
        self.diffuse = diffuse;
        self.specular = specular;
        self
    }

    pub fn with_attenuation(mut self, attenuation: Attenuation) -> Self {
        self.set_attenuation(attenuation);
        self
    }

    #[inline]
    pub fn kind(&self) -> &LightKind {
        &self.kind
    }

    pub fn position(&self) -> Option<Vect3> {
        match self.kind {
            LightKind::Directional { .. } => None,
            LightKind::Point { position, .. } | LightKind::Spot { position, .. } => Some(position),
        }
    }

    /// Moves a point/spot light, dragging its marker along.
    pub fn set_position(&mut self, new_position: Vect3) {
        let (LightKind::Point { position, .. } | LightKind::Spot { position, .. }) = &mut self.kind
        else {
            log::warn!("directional light has no position");
            return;
        };

        let delta = new_position - *position;
        *position = new_position;
        if let Some(marker) = &mut self.marker {
            marker.change_all_matrices(&transform::translation(delta));
        }
    }

    pub fn set_direction(&mut self, new_direction: Vect3) {
        match &mut self.kind {
            LightKind::Directional { direction } | LightKind::Spot { direction, .. } => {
                *direction = new_direction
            }
            LightKind::Point { .. } => log::warn!("point light has no direction"),
        }
    }

    pub fn set_attenuation(&mut self, value: Attenuation) {
        match &mut self.kind {
            LightKind::Point { attenuation, .. } | LightKind::Spot { attenuation, .. } => {
                *attenuation = value
            }
            LightKind::Directional { .. } => log::warn!("directional light has no attenuation"),
        }
    }

    pub fn set_cutoff(&mut self, inner: f64, outer: f64) {
        match &mut self.kind {
            LightKind::Spot { cut_in, cut_out, .. } => {
                *cut_in = inner;
                *cut_out = outer;
            }
            _ => log::warn!("only spot lights have a cut-off"),
        }
    }

    // ── marker ────────────────────────────────────────────────────────────

    #[inline]
    pub fn marker(&self) -> Option<&GraphObject> {
        self.marker.as_ref()
    }

    #[inline]
    pub(crate) fn marker_mut(&mut self) -> Option<&mut GraphObject> {
        self.marker.as_mut()
    }

    /// Replaces the marker with `object`, used as-is (world placement is the
    /// caller's). Ignored for directional lights.
    pub fn set_marker(&mut self, object: GraphObject) {
        if matches!(self.kind, LightKind::Directional { .. }) {
            log::warn!("directional light cannot carry a marker");
            return;
        }
        self.marker = Some(object);
        self.custom_marker = true;
    }

    /// Restores the built-in cube marker at the current position.
    pub fn reset_marker(&mut self) {
        self.marker = self.default_marker();
        self.custom_marker = false;
    }

    #[inline]
    pub fn has_custom_marker(&self) -> bool {
        self.custom_marker
    }

    fn default_marker(&self) -> Option<GraphObject> {
        match self.kind {
            LightKind::Directional { .. } => None,
            LightKind::Point { position, .. } => Some(marker_cube(position, false)),
            LightKind::Spot { position, .. } => Some(marker_cube(position, true)),
        }
    }

    /// Uniform-ready snapshot of this light.
    pub fn state(&self) -> LightState {
        let mut state = LightState {
            code: self.kind.code(),
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            ..LightState::neutral()
        };

        match self.kind {
            LightKind::Directional { direction } => state.direction = direction,
            LightKind::Point {
                position,
                attenuation,
            } => {
                state.position = position;
                state.attenuation = attenuation;
            }
            LightKind::Spot {
                position,
                direction,
                cut_in,
                cut_out,
                attenuation,
            } => {
                state.position = position;
                state.direction = direction;
                state.cos_cut_in = cut_in.cos();
                state.cos_cut_out = cut_out.cos();
                state.attenuation = attenuation;
            }
        }
        state
    }
}

/// Flattened light parameters, one per slot. Cut-offs are cosines.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightState {
    pub code: u32,
    pub position: Vect3,
    pub direction: Vect3,
    pub attenuation: Attenuation,
    pub cos_cut_in: f64,
    pub cos_cut_out: f64,
    pub ambient: Vect3,
    pub diffuse: Vect3,
    pub specular: Vect3,
}

impl LightState {
    /// What an empty slot uploads: a black directional light.
    pub fn neutral() -> Self {
        Self {
            code: 0,
            position: Vect3::zero(),
            direction: Vect3::new(1.0, 0.0, 0.0),
            attenuation: Attenuation::default(),
            cos_cut_in: 1.0,
            cos_cut_out: 1.0,
            ambient: Vect3::zero(),
            diffuse: Vect3::zero(),
            specular: Vect3::zero(),
        }
    }
}

/// Unit cube of six white emissive faces, shrunk to 1/5 and centred on
/// `position`. The spot variant is turned 45° about z.
fn marker_cube(position: Vect3, spot: bool) -> GraphObject {
    let mut face = Polygon::new(vec![
        Vect3::new(0.5, 0.5, 0.5),
        Vect3::new(0.5, -0.5, 0.5),
        Vect3::new(-0.5, -0.5, 0.5),
        Vect3::new(-0.5, 0.5, 0.5),
    ])
    .unwrap_or_default();
    face.set_material(Material::emissive(Vect3::new(1.0, 1.0, 1.0)));

    let y = Vect3::new(0.0, 1.0, 0.0);
    let z = Vect3::new(0.0, 0.0, 1.0);
    let turns = [
        transform::rotation(y, FRAC_PI_2),
        transform::rotation(y, FRAC_PI_2),
        transform::rotation(y, FRAC_PI_2),
        transform::rotation(z, FRAC_PI_2),
        transform::rotation(z, PI),
    ];

    let mut cube = GraphObject::new(1);
    cube.add_polygon(face.clone());
    for turn in &turns {
        face.change_matrix(turn);
        cube.add_polygon(face.clone());
    }

    if spot {
        cube.change_matrix(&transform::rotation(z, FRAC_PI_4), 0);
    }
    cube.change_matrix(&transform::uniform_scale(1.0 / 5.0), 0);
    cube.change_matrix(&transform::translation(position), 0);
    cube
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── kinds ─────────────────────────────────────────────────────────────

    #[test]
    fn discriminants() {
        assert_eq!(Light::directional(Vect3::new(1.0, 0.0, 0.0)).kind().code(), 0);
        assert_eq!(Light::point(Vect3::zero()).kind().code(), 1);
        assert_eq!(Light::spot(Vect3::zero(), Vect3::new(0.0, 0.0, 1.0), 0.1, 0.2).kind().code(), 2);
    }

    #[test]
    fn spot_state_uploads_cosines() {
        let l = Light::spot(Vect3::zero(), Vect3::new(0.0, 0.0, 1.0), 0.0, std::f64::consts::FRAC_PI_3);
        let s = l.state();
        assert!((s.cos_cut_in - 1.0).abs() < 1e-12);
        assert!((s.cos_cut_out - 0.5).abs() < 1e-12);
        assert_eq!(s.attenuation, Attenuation::default());
    }

    #[test]
    fn neutral_state_is_black() {
        let s = LightState::neutral();
        assert_eq!(s.code, 0);
        assert_eq!(s.diffuse, Vect3::zero());
        assert_eq!(s.direction, Vect3::new(1.0, 0.0, 0.0));
    }

    // ── markers ───────────────────────────────────────────────────────────

    #[test]
    fn directional_light_has_no_marker() {
        let mut l = Light::directional(Vect3::new(0.0, -1.0, 0.0));
        assert!(l.marker().is_none());
        l.set_marker(GraphObject::new(1));
        assert!(l.marker().is_none());
    }

    #[test]
    fn default_marker_is_small_cube_at_position() {
        let l = Light::point(Vect3::new(1.0, 2.0, 3.0));
        let m = l.marker().unwrap();
        assert_eq!(m.polygons().len(), 6);
        assert!(m.polygons().iter().all(|p| p.material().light));

        let (center, _) = m.instance_centers()[0];
        assert!(center.approx_eq(Vect3::new(1.0, 2.0, 3.0), 1e-9));

        // Each face sits 0.5 from the cube centre before the 1/5 scale.
        for p in m.polygons() {
            assert!((p.center().length() - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn cube_faces_point_outwards() {
        let l = Light::point(Vect3::zero());
        for p in l.marker().unwrap().polygons() {
            assert!(p.normals()[0].dot(p.center()) > 0.0);
        }
    }

    #[test]
    fn set_position_drags_marker() {
        let mut l = Light::spot(Vect3::zero(), Vect3::new(0.0, 0.0, 1.0), 0.2, 0.3);
        l.set_position(Vect3::new(0.0, 5.0, 0.0));
        assert_eq!(l.position(), Some(Vect3::new(0.0, 5.0, 0.0)));
        let (center, _) = l.marker().unwrap().instance_centers()[0];
        assert!(center.approx_eq(Vect3::new(0.0, 5.0, 0.0), 1e-9));
    }

    #[test]
    fn custom_marker_and_reset() {
        let mut l = Light::point(Vect3::new(2.0, 0.0, 0.0));
        l.set_marker(GraphObject::new(3));
        assert!(l.has_custom_marker());
        assert_eq!(l.marker().unwrap().polygons().len(), 0);

        l.reset_marker();
        assert!(!l.has_custom_marker());
        let (center, _) = l.marker().unwrap().instance_centers()[0];
        assert!(center.approx_eq(Vect3::new(2.0, 0.0, 0.0), 1e-9));
    }
}
