//! Engine construction parameters.

use crate::math::Vect3;
use crate::scene::DEFAULT_KERNEL_OFFSET;

/// Size of the light array in the scene shader.
pub const MAX_LIGHT_SLOTS: usize = 16;

/// Scene-level configuration, fixed at engine construction except where a
/// setter exists on [`SceneComposer`](crate::scene::SceneComposer).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Horizontal field of view, radians.
    pub fov: f64,
    pub near: f64,
    pub far: f64,

    /// Number of light slots; clamped to `1..=MAX_LIGHT_SLOTS`.
    pub light_slots: usize,

    /// Instance capacity of objects created through
    /// [`SceneComposer::new_object`](crate::scene::SceneComposer::new_object).
    pub max_instances: usize,

    pub gamma: f64,
    pub clear_color: Vect3,
    pub kernel_offset: f64,
    pub grayscale: bool,
}

impl EngineConfig {
    /// `light_slots` clamped to what the shader can hold.
    pub fn effective_light_slots(&self) -> usize {
        let n = self.light_slots.clamp(1, MAX_LIGHT_SLOTS);
        if n != self.light_slots {
            log::warn!("light_slots {} clamped to {n}", self.light_slots);
        }
        n
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fov: std::f64::consts::FRAC_PI_2,
            near: 0.1,
            far: 100.0,
            light_slots: 8,
            max_instances: 64,
            gamma: 2.2,
            clear_color: Vect3::new(0.2, 0.3, 0.3),
            kernel_offset: DEFAULT_KERNEL_OFFSET,
            grayscale: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_slots_are_clamped() {
        let cfg = EngineConfig {
            light_slots: 100,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.effective_light_slots(), MAX_LIGHT_SLOTS);

        let cfg = EngineConfig {
            light_slots: 0,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.effective_light_slots(), 1);
    }

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.gamma, 2.2);
        assert_eq!(cfg.clear_color, Vect3::new(0.2, 0.3, 0.3));
        assert!(cfg.near < cfg.far);
    }
}
