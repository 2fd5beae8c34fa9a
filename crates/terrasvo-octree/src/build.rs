//! Recursive merge-collapsing octree construction.
//!
//! The builder appends nodes in depth-first pre-order: a node reserves its
//! eight children at the arena tail, recurses into them, and when all eight
//! resolve to the same leaf value it truncates them again and becomes that
//! leaf. Peak memory is the final tree plus eight slots per level of
//! recursion, never the dense grid.

use rayon::prelude::*;
use terrasvo_core::{octant_offset, DensityField, HeightOracle, Material, Result};
use tracing::{debug, info, warn};

use crate::arena::NodeArena;
use crate::config::{SurfaceRule, VolumetricParams};
use crate::node::{merged, Node};
use crate::octree::Octree;

impl Octree {
    /// Sample the oracle over every column and build the minimal tree.
    ///
    /// A cell is filled iff its y is strictly below the column height.
    /// `config.volumetric` is not consulted here.
    pub fn generate<H>(&mut self, oracle: &H) -> Result<()>
    where
        H: HeightOracle + Sync,
    {
        if self.config.volumetric.is_some() {
            warn!("Volumetric parameters are set but ignored; use generate_volumetric");
        }
        self.sample_heightmap(oracle);
        self.build(None)
    }

    /// Volumetric variant: threshold a density field combined with the
    /// height bias term, using `config.volumetric` (or its defaults).
    pub fn generate_volumetric<H, D>(&mut self, oracle: &H, density: &D) -> Result<()>
    where
        H: HeightOracle + Sync,
        D: DensityField,
    {
        let params = self.config.volumetric.unwrap_or_default();
        self.sample_heightmap(oracle);
        let density: &dyn DensityField = density;
        self.build(Some((density, params)))
    }

    fn sample_heightmap<H>(&mut self, oracle: &H)
    where
        H: HeightOracle + Sync,
    {
        info!("Generating terrain height...");
        let size = self.config.size as usize;
        let bias = self.config.height_bias;
        self.heightmap = (0..size * size)
            .into_par_iter()
            .map(|i| {
                let x = (i % size) as i64;
                let z = (i / size) as i64;
                oracle.height_at(x, z).saturating_add(bias)
            })
            .collect();
    }

    fn build(&mut self, density: Option<(&dyn DensityField, VolumetricParams)>) -> Result<()> {
        info!("Generating octree...");
        self.nodes.clear();
        let root = self.nodes.reserve(1)?;

        let mut builder = Builder {
            nodes: &mut self.nodes,
            heightmap: &self.heightmap,
            size: self.config.size,
            ceiling: self.config.height,
            surface: self.config.surface,
            density,
            progress_interval: self.config.progress_interval,
            evaluated: 0,
        };
        let result = builder.build_node(root, 0, 0, 0, self.config.size);
        let evaluated = builder.evaluated;

        if let Err(err) = result {
            // Leave a well-formed (if empty) tree behind.
            self.nodes.clear();
            self.nodes.reserve(1)?;
            return Err(err);
        }

        info!(
            "Octree generated: {} nodes, {} cells evaluated",
            self.nodes.len(),
            evaluated
        );
        Ok(())
    }
}

struct Builder<'a> {
    nodes: &'a mut NodeArena,
    heightmap: &'a [i32],
    size: u32,
    ceiling: u32,
    surface: SurfaceRule,
    density: Option<(&'a dyn DensityField, VolumetricParams)>,
    progress_interval: u64,
    evaluated: u64,
}

impl Builder<'_> {
    /// Build the node at `index` covering the cube of edge `cell_size` at
    /// `(x0, y0, z0)`. Returns the leaf value if the node ended up a leaf.
    fn build_node(
        &mut self,
        index: u32,
        x0: u32,
        y0: u32,
        z0: u32,
        cell_size: u32,
    ) -> Result<Option<Material>> {
        debug_assert!(cell_size.is_power_of_two());
        debug_assert!(x0 < self.size && y0 < self.size && z0 < self.size);

        if y0 >= self.ceiling {
            self.nodes.set(index, Node::leaf(Material::AIR));
            return Ok(Some(Material::AIR));
        }

        if cell_size == 1 {
            let material = self.cell_value(x0, y0, z0);
            self.nodes.set(index, Node::leaf(material));
            self.evaluated += 1;
            if self.progress_interval != 0 && self.evaluated % self.progress_interval == 0 {
                info!(
                    "{} cells evaluated, {} nodes in use",
                    self.evaluated,
                    self.nodes.len()
                );
            }
            return Ok(Some(material));
        }

        let mark = self.nodes.len();
        let base = self.nodes.reserve(8)?;
        let half = cell_size / 2;

        let mut children = [None; 8];
        for (i, child) in children.iter_mut().enumerate() {
            let (dx, dy, dz) = octant_offset(i, half);
            *child = self.build_node(base + i as u32, x0 + dx, y0 + dy, z0 + dz, half)?;
        }

        if let Some(material) = merged(&children) {
            // Every child collapsed, so nothing was appended after them.
            debug_assert_eq!(self.nodes.len(), mark + 8);
            self.nodes.truncate(mark);
            self.nodes.set(index, Node::leaf(material));
            if cell_size == self.size {
                debug!("Root collapsed to {:?}", material);
            }
            Ok(Some(material))
        } else {
            self.nodes.set(index, Node::internal(base));
            Ok(None)
        }
    }

    fn cell_value(&self, x: u32, y: u32, z: u32) -> Material {
        let height = self.heightmap[z as usize * self.size as usize + x as usize];
        let filled = match self.density {
            None => (y as i64) < height as i64,
            Some((field, params)) => {
                let density = field.density_at(x as i64, y as i64, z as i64);
                density + params.gradient * (height as f64 - y as f64) > params.threshold
            }
        };

        if !filled {
            return Material::AIR;
        }
        match self.surface {
            SurfaceRule::Solid => Material::SOLID,
            SurfaceRule::Layered { dirt_depth } => {
                let depth = height as i64 - 1 - y as i64;
                if depth <= 0 {
                    Material::GRASS
                } else if depth <= dirt_depth as i64 {
                    Material::DIRT
                } else {
                    Material::STONE
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OctreeConfig;
    use terrasvo_core::{CellPos, Error};

    fn generate(config: OctreeConfig, oracle: impl Fn(i64, i64) -> i32 + Sync) -> Octree {
        let mut tree = Octree::new(config).unwrap();
        tree.generate(&oracle).unwrap();
        tree
    }

    fn slope(x: i64, z: i64) -> i32 {
        ((x + 2 * z) % 7) as i32
    }

    #[test]
    fn flat_half_filled_cube_stays_split() {
        let tree = generate(OctreeConfig::new(2).with_height(2), |_, _| 1);

        assert_eq!(tree.node_count(), 9);
        assert_eq!(tree.root(), Node::internal(1));
        for i in 0..8u32 {
            let expected = if i & 0b010 == 0 {
                Material::SOLID
            } else {
                Material::AIR
            };
            assert_eq!(tree.node(1 + i), Some(Node::leaf(expected)), "octant {i}");
        }
    }

    #[test]
    fn empty_terrain_collapses_to_root() {
        let tree = generate(OctreeConfig::new(4), |_, _| -1);

        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root(), Node::leaf(Material::AIR));
        assert_eq!(tree.root().data(), 0);
    }

    #[test]
    fn solid_terrain_collapses_to_root() {
        let tree = generate(OctreeConfig::new(8), |_, _| 100);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root(), Node::leaf(Material::SOLID));
    }

    #[test]
    fn height_bias_is_added_to_samples() {
        let tree = generate(OctreeConfig::new(4).with_height_bias(2), |_, _| 0);
        assert_eq!(tree.column_height(1, 3), Some(2));
        assert_eq!(tree.sample(CellPos::new(1, 1, 3)), Some(Material::SOLID));
        assert_eq!(tree.sample(CellPos::new(1, 2, 3)), Some(Material::AIR));
    }

    #[test]
    fn cells_match_heightmap_rule() {
        let size = 16;
        let tree = generate(OctreeConfig::new(size), slope);

        for z in 0..size {
            for y in 0..size {
                for x in 0..size {
                    let filled = (y as i32) < slope(x as i64, z as i64);
                    assert_eq!(
                        tree.sample(CellPos::new(x, y, z)),
                        Some(Material::from(filled)),
                        "Mismatch at ({x}, {y}, {z})"
                    );
                }
            }
        }
    }

    #[test]
    fn generated_tree_has_no_redundant_nodes() {
        let tree = generate(OctreeConfig::new(32), slope);
        let report = tree.check();
        assert_eq!(report.redundant, 0);
        assert_eq!(report.reachable, tree.node_count());
    }

    #[test]
    fn ceiling_forces_air() {
        let tree = generate(OctreeConfig::new(8).with_height(4), |_, _| 100);

        assert_eq!(tree.sample(CellPos::new(0, 3, 0)), Some(Material::SOLID));
        assert_eq!(tree.sample(CellPos::new(0, 4, 0)), Some(Material::AIR));
        assert_eq!(tree.sample(CellPos::new(7, 7, 7)), Some(Material::AIR));
        // Split once by y: lower four octants solid, upper four air.
        assert_eq!(tree.node_count(), 9);
    }

    #[test]
    fn layered_surface_materials() {
        let config = OctreeConfig::new(8).with_surface(SurfaceRule::Layered { dirt_depth: 2 });
        let tree = generate(config, |_, _| 6);

        assert_eq!(tree.sample(CellPos::new(2, 5, 2)), Some(Material::GRASS));
        assert_eq!(tree.sample(CellPos::new(2, 4, 2)), Some(Material::DIRT));
        assert_eq!(tree.sample(CellPos::new(2, 3, 2)), Some(Material::DIRT));
        assert_eq!(tree.sample(CellPos::new(2, 2, 2)), Some(Material::STONE));
        assert_eq!(tree.sample(CellPos::new(2, 6, 2)), Some(Material::AIR));
    }

    #[test]
    fn volumetric_density_carves_caves() {
        let config = OctreeConfig::new(8).with_volumetric(VolumetricParams {
            threshold: 0.5,
            gradient: 1.0,
        });
        let mut tree = Octree::new(config).unwrap();
        // A void pocket at x = 3 cancels the height term below the surface.
        let density = |x: i64, _y: i64, _z: i64| if x == 3 { -100.0 } else { 0.0 };
        tree.generate_volumetric(&|_: i64, _: i64| 4, &density).unwrap();

        assert_eq!(tree.sample(CellPos::new(0, 0, 0)), Some(Material::SOLID));
        assert_eq!(tree.sample(CellPos::new(3, 0, 0)), Some(Material::AIR));
        // depth term: 1.0 * (4 - 3) = 1.0 > 0.5
        assert_eq!(tree.sample(CellPos::new(0, 3, 0)), Some(Material::SOLID));
        // depth term: 1.0 * (4 - 4) = 0.0, not above the threshold
        assert_eq!(tree.sample(CellPos::new(0, 4, 0)), Some(Material::AIR));
        assert_eq!(tree.check().redundant, 0);
    }

    #[test]
    fn plain_generate_ignores_volumetric_params() {
        let params = VolumetricParams {
            threshold: 1000.0,
            gradient: 0.0,
        };
        let volumetric = generate(OctreeConfig::new(16).with_volumetric(params), slope);
        let plain = generate(OctreeConfig::new(16), slope);

        assert_eq!(volumetric.nodes(), plain.nodes());
        assert_eq!(volumetric.sample(CellPos::new(6, 0, 0)), Some(Material::SOLID));
    }

    #[test]
    fn budget_overflow_is_reported() {
        let config = OctreeConfig::new(16).with_max_nodes(20);
        let mut tree = Octree::new(config).unwrap();
        let err = tree.generate(&slope).unwrap_err();

        assert!(matches!(err, Error::CapacityExceeded { limit: 20, .. }));
        assert_eq!(tree.node_count(), 1);
        assert!(!tree.root().is_generated());
    }

    #[test]
    fn regenerate_replaces_previous_tree() {
        let mut tree = generate(OctreeConfig::new(8), slope);
        assert!(tree.node_count() > 1);
        tree.generate(&|_: i64, _: i64| 0).unwrap();
        assert_eq!(tree.node_count(), 1);
    }
}
