use std::sync::Arc;

use crate::math::Vect3;
use crate::render::Texture;

/// Phong surface parameters of a polygon.
///
/// `light` marks marker surfaces that only show their emission and ignore
/// scene lighting.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub ambient: Vect3,
    pub diffuse: Vect3,
    pub specular: Vect3,
    pub emission: Vect3,
    pub shininess: f64,
    pub alpha: f64,
    pub light: bool,
}

impl Material {
    /// Unlit surface glowing in `color`.
    pub fn emissive(color: Vect3) -> Self {
        Self {
            emission: color,
            light: true,
            ..Self::default()
        }
    }

    /// Lit surface with the same `color` for ambient and diffuse response.
    pub fn solid(color: Vect3) -> Self {
        Self {
            ambient: color,
            diffuse: color,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_translucent(&self) -> bool {
        self.alpha < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vect3::zero(),
            diffuse: Vect3::zero(),
            specular: Vect3::zero(),
            emission: Vect3::zero(),
            shininess: 1.0,
            alpha: 1.0,
            light: false,
        }
    }
}

/// Optional texture maps of a polygon. Maps are shared, never copied.
#[derive(Debug, Clone, Default)]
pub struct TextureSet {
    pub diffuse: Option<Arc<Texture>>,
    pub specular: Option<Arc<Texture>>,
    pub emission: Option<Arc<Texture>>,
}

impl TextureSet {
    pub fn diffuse(texture: Arc<Texture>) -> Self {
        Self {
            diffuse: Some(texture),
            ..Self::default()
        }
    }

    /// Bit set of bound maps: 1 diffuse, 2 specular, 4 emission.
    pub fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.diffuse.is_some() {
            flags |= 1;
        }
        if self.specular.is_some() {
            flags |= 2;
        }
        if self.emission.is_some() {
            flags |= 4;
        }
        flags
    }

    /// True when any bound map has a pixel with alpha below 255.
    pub fn has_translucency(&self) -> bool {
        [&self.diffuse, &self.specular, &self.emission]
            .into_iter()
            .flatten()
            .any(|t| t.min_alpha() < u8::MAX)
    }
}
