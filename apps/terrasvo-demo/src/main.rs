//! Terrasvo demo driver
//!
//! Generates a terrain octree, uploads it to an emulated device buffer,
//! lets the "device" edit the terrain in dynamic mode, then runs the
//! maintenance pass that verifies and compacts the tree.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -p terrasvo-demo -- [OPTIONS]
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod args;

use std::time::Instant;

use anyhow::{bail, Context};
use terrasvo_core::{CellPos, DensityField, HeightOracle, Material};
use terrasvo_gpu::{HostBuffer, HostFence, SharedNodeBuffer};
use terrasvo_octree::{Octree, OctreeConfig};
use terrasvo_world::{
    DensityConfig, DensityGenerator, TerrainGenerator, ValueNoiseConfig, ValueNoiseTerrain,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::DemoArgs;

/// Spare device capacity when `--capacity` is not given, in nodes.
const DEFAULT_HEADROOM: usize = 1 << 16;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = DemoArgs::from_env()?;
    if args.help {
        print_help();
        return Ok(());
    }

    let config = args.octree_config();
    let mut tree = Octree::new(config.clone()).context("invalid octree configuration")?;

    let start = Instant::now();
    if args.value_noise {
        let terrain = ValueNoiseTerrain::new(ValueNoiseConfig {
            seed: args.seed,
            ..Default::default()
        });
        generate(&mut tree, &args, &terrain, &terrain)?;
    } else {
        let terrain = TerrainGenerator::with_seed(args.seed);
        let density = DensityGenerator::new(DensityConfig {
            seed: args.seed,
            ..Default::default()
        });
        generate(&mut tree, &args, &terrain, &density)?;
    }
    let stats = tree.stats();
    info!(
        "Built {} nodes ({} leaves, {} filled) in {:.2?}, {} bytes on the wire",
        stats.nodes,
        stats.leaves,
        stats.filled_leaves,
        start.elapsed(),
        stats.wire_bytes
    );

    let report = tree.check();
    if !report.is_clean() {
        bail!("freshly built octree is not minimal: {report}");
    }

    let capacity = args
        .capacity
        .unwrap_or_else(|| (tree.node_count() + DEFAULT_HEADROOM).min(config.max_nodes));
    let shared = SharedNodeBuffer::new(HostBuffer::with_node_capacity(capacity));
    shared.publish(&tree)?;

    if args.dynamic > 0 {
        run_dynamic(&shared, &mut tree, &config, args.dynamic, args.seed)?;
    }

    Ok(())
}

fn generate<H, D>(
    tree: &mut Octree,
    args: &DemoArgs,
    terrain: &H,
    density: &D,
) -> anyhow::Result<()>
where
    H: HeightOracle + Sync,
    D: DensityField,
{
    if args.volumetric.is_some() {
        tree.generate_volumetric(terrain, density)?;
    } else {
        tree.generate(terrain)?;
    }
    Ok(())
}

/// Emulate `edits` device dispatches that each set one cell near the surface.
///
/// Half of the edits rewrite a cell with the value it already has, which
/// leaves redundant nodes behind for maintenance to reclaim.
fn run_dynamic(
    shared: &SharedNodeBuffer<HostBuffer>,
    tree: &mut Octree,
    config: &OctreeConfig,
    edits: usize,
    seed: u64,
) -> anyhow::Result<()> {
    let fence = HostFence::new();
    let mut rng = SplitMix64(seed);
    let mut passes = 0;

    for edit in 0..edits {
        let x = (rng.next() % u64::from(config.size)) as u32;
        let z = (rng.next() % u64::from(config.size)) as u32;
        let surface = tree.column_height(x, z).unwrap_or(0);
        let top = config.height.min(config.size).saturating_sub(1);
        let y = u32::try_from(surface.max(0)).unwrap_or(0).min(top);
        let pos = CellPos::new(x, y, z);

        let material = if edit % 2 == 0 {
            Material::GRASS
        } else {
            tree.sample(pos).unwrap_or(Material::AIR)
        };

        let mut retried = false;
        loop {
            let inserted = shared.with_device(|buffer| {
                let _dispatch = fence.begin_dispatch();
                buffer.device_insert(pos, config.size, material)
            })?;
            if inserted {
                break;
            }
            if retried {
                let capacity = shared.with_device(|buffer| buffer.node_capacity());
                bail!("device buffer of {capacity} nodes is too small for the edited tree");
            }
            let report = shared.maintain(tree, &fence, true)?;
            passes += 1;
            info!("Buffer full after {} edits: {:?}", edit, report);
            retried = true;
        }
    }

    let report = shared.maintain(tree, &fence, true)?;
    passes += 1;
    if let Some(check) = report.check {
        info!("Device tree before final compaction: {}", check);
    }
    let after = tree.check();
    if !after.is_clean() {
        warn!("Compacted tree still has issues: {}", after);
    }
    info!(
        "{} edits applied in {} maintenance passes, {} nodes resident",
        edits, passes, report.compacted
    );
    Ok(())
}

/// Small deterministic generator for edit positions.
struct SplitMix64(u64);

impl SplitMix64 {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

fn print_help() {
    eprintln!(
        "Terrasvo terrain octree demo

USAGE:
    cargo run --release -p terrasvo-demo -- [OPTIONS]

TERRAIN OPTIONS:
    --size <N>              Lateral extent in cells, power of two (default: 256)
    --height <N>            Build ceiling in cells (default: size)
    --bias <N>              Added to every terrain height sample (default: 64)
    --seed <N>              World generation seed (default: 42)
    --value-noise           Use integer-hash value noise instead of Perlin
    --layered <DEPTH>       Grass and DEPTH cells of dirt over stone
    --volumetric <T>        Threshold a 3-D density field at T

DYNAMIC MODE:
    --dynamic <N>           Emulate N device edits, then compact (default: 0)
    --capacity <NODES>      Device buffer capacity (default: tree + 65536)

OTHER:
    -h, --help              Print this help message

EXAMPLES:
    # Default Perlin terrain
    cargo run --release -p terrasvo-demo

    # Small layered world with device edits and a tight buffer
    cargo run --release -p terrasvo-demo -- --size 64 --layered 3 --dynamic 5000 --capacity 20000

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
