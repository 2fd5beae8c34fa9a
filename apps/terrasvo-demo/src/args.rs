//! Command line flags.

use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use terrasvo_core::constants::{DEFAULT_HEIGHT_BIAS, DEFAULT_SIZE};
use terrasvo_octree::{OctreeConfig, SurfaceRule, VolumetricParams};

/// Parsed demo options.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoArgs {
    pub size: u32,
    pub height: Option<u32>,
    pub bias: i32,
    pub seed: u64,
    /// Dirt depth for layered surfaces.
    pub layered: Option<u32>,
    /// Density threshold for the volumetric build.
    pub volumetric: Option<f64>,
    /// Use integer-hash value noise instead of Perlin.
    pub value_noise: bool,
    /// Number of emulated device edits.
    pub dynamic: usize,
    /// Device buffer capacity in nodes.
    pub capacity: Option<usize>,
    pub help: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            height: None,
            bias: DEFAULT_HEIGHT_BIAS,
            seed: 42,
            layered: None,
            volumetric: None,
            value_noise: false,
            dynamic: 0,
            capacity: None,
            help: false,
        }
    }
}

impl DemoArgs {
    /// Parse the process arguments.
    pub fn from_env() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse flags, not including the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--size" => parsed.size = value(&flag, args.next())?,
                "--height" => parsed.height = Some(value(&flag, args.next())?),
                "--bias" => parsed.bias = value(&flag, args.next())?,
                "--seed" => parsed.seed = value(&flag, args.next())?,
                "--layered" => parsed.layered = Some(value(&flag, args.next())?),
                "--volumetric" => parsed.volumetric = Some(value(&flag, args.next())?),
                "--value-noise" => parsed.value_noise = true,
                "--dynamic" => parsed.dynamic = value(&flag, args.next())?,
                "--capacity" => parsed.capacity = Some(value(&flag, args.next())?),
                other => bail!("unknown option {other:?} (try --help)"),
            }
        }

        Ok(parsed)
    }

    /// Octree configuration described by these flags.
    pub fn octree_config(&self) -> OctreeConfig {
        let mut config = OctreeConfig::default()
            .with_size(self.size)
            .with_height_bias(self.bias);
        if let Some(height) = self.height {
            config = config.with_height(height);
        }
        if let Some(dirt_depth) = self.layered {
            config = config.with_surface(SurfaceRule::Layered { dirt_depth });
        }
        if let Some(threshold) = self.volumetric {
            config = config.with_volumetric(VolumetricParams {
                threshold,
                ..Default::default()
            });
        }
        if let Some(capacity) = self.capacity {
            config = config.with_max_nodes(capacity);
        }
        config
    }
}

fn value<T>(flag: &str, raw: Option<String>) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = raw.ok_or_else(|| anyhow!("{flag} needs a value"))?;
    raw.parse()
        .map_err(|e| anyhow!("invalid value {raw:?} for {flag}: {e}"))
}
