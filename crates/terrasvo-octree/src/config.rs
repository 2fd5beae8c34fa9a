//! Octree build configuration.

use serde::{Deserialize, Serialize};
use terrasvo_core::constants::{
    DEFAULT_HEIGHT_BIAS, DEFAULT_MAX_NODES, DEFAULT_SIZE, MAX_DATA, PROGRESS_INTERVAL,
};
use terrasvo_core::{Error, Result};

/// How filled cells below the terrain surface are assigned materials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceRule {
    /// Every filled cell gets `Material::SOLID`.
    #[default]
    Solid,
    /// Grass on the top filled cell, `dirt_depth` cells of dirt below, stone underneath.
    Layered { dirt_depth: u32 },
}

/// Parameters of the volumetric build variant.
///
/// A cell is filled iff `density + gradient * (column_height - y) > threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumetricParams {
    /// Solid/void cut-off.
    pub threshold: f64,
    /// Weight of the height bias term per cell of depth below the surface.
    pub gradient: f64,
}

impl Default for VolumetricParams {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            gradient: 1.0 / 16.0,
        }
    }
}

/// Octree configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OctreeConfig {
    /// Lateral extent in cells (power of two).
    pub size: u32,
    /// Vertical build ceiling; everything at or above is air.
    pub height: u32,
    /// Added to every height oracle sample.
    pub height_bias: i32,
    /// Node budget, normally the capacity of the device buffer.
    pub max_nodes: usize,
    /// Evaluated cells between two progress log lines (0 disables).
    pub progress_interval: u64,
    /// Material assignment for filled cells.
    pub surface: SurfaceRule,
    /// Parameters read by `Octree::generate_volumetric`; plain `generate` ignores them.
    pub volumetric: Option<VolumetricParams>,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            height_bias: DEFAULT_HEIGHT_BIAS,
            max_nodes: DEFAULT_MAX_NODES,
            progress_interval: PROGRESS_INTERVAL,
            surface: SurfaceRule::Solid,
            volumetric: None,
        }
    }
}

impl OctreeConfig {
    /// Create a config for a cube of edge `size`, with the ceiling at the top
    /// of the cube and no height bias.
    pub fn new(size: u32) -> Self {
        Self {
            size,
            height: size,
            height_bias: 0,
            ..Default::default()
        }
    }

    /// Set the lateral extent; also moves the ceiling to the top of the cube.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self.height = size;
        self
    }

    /// Set the vertical build ceiling.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Set the vertical bias added to oracle samples.
    pub fn with_height_bias(mut self, bias: i32) -> Self {
        self.height_bias = bias;
        self
    }

    /// Set the node budget.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Set the progress logging interval.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the surface material rule.
    pub fn with_surface(mut self, surface: SurfaceRule) -> Self {
        self.surface = surface;
        self
    }

    /// Set the parameters used by `Octree::generate_volumetric`.
    pub fn with_volumetric(mut self, params: VolumetricParams) -> Self {
        self.volumetric = Some(params);
        self
    }

    /// Reject configurations the node layout cannot represent.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 || !self.size.is_power_of_two() {
            return Err(Error::InvalidConfig(format!(
                "size must be a power of two, got {}",
                self.size
            )));
        }
        if self.size > MAX_DATA {
            return Err(Error::InvalidConfig(format!(
                "size {} exceeds the 30-bit data field",
                self.size
            )));
        }
        if self.max_nodes == 0 || self.max_nodes > MAX_DATA as usize + 1 {
            return Err(Error::InvalidConfig(format!(
                "max_nodes must be in 1..={}, got {}",
                MAX_DATA as usize + 1,
                self.max_nodes
            )));
        }
        if let Some(params) = self.volumetric {
            if !params.threshold.is_finite() || !params.gradient.is_finite() {
                return Err(Error::InvalidConfig(
                    "volumetric parameters must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_terrain() {
        let config = OctreeConfig::default();
        assert_eq!(config.size, 256);
        assert_eq!(config.height, 256);
        assert_eq!(config.height_bias, 64);
        assert_eq!(config.max_nodes, 16_777_216);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn with_size_moves_ceiling() {
        let config = OctreeConfig::default().with_size(16).with_height(4);
        assert_eq!(config.size, 16);
        assert_eq!(config.height, 4);
        assert_eq!(OctreeConfig::new(8).height, 8);
    }

    #[test]
    fn rejects_non_power_of_two() {
        assert!(OctreeConfig::new(0).validate().is_err());
        assert!(OctreeConfig::new(12).validate().is_err());
        assert!(OctreeConfig::new(1).validate().is_ok());
    }

    #[test]
    fn rejects_unaddressable_budget() {
        let config = OctreeConfig::new(4).with_max_nodes(MAX_DATA as usize + 2);
        assert!(config.validate().is_err());
        assert!(OctreeConfig::new(4).with_max_nodes(0).validate().is_err());
    }

    #[test]
    fn rejects_non_finite_volumetric() {
        let config = OctreeConfig::new(4).with_volumetric(VolumetricParams {
            threshold: f64::NAN,
            gradient: 1.0,
        });
        assert!(config.validate().is_err());
    }
}
