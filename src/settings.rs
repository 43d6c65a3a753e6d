//! Render configuration. Every struct can be deserialized from a partial description, missing
//! fields take their defaults.

use crate::{Float, Error};
use serde::{Deserialize, Serialize};

pub use crate::bvh::{BvhOptions, SplitMethod};
pub use crate::scene::LightSelection;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Edge length of the square tiles the image is split into
    pub tile_size: u32,
    pub samples_per_pixel: u32,
    /// Number of worker threads, all hardware threads when unset
    pub worker_count: Option<usize>,
    /// Base seed that per-tile sampler seeds are derived from
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            tile_size: 16,
            samples_per_pixel: 16,
            worker_count: None,
            seed: 0,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.tile_size == 0 {
            return Err(Error::InvalidSettings("tile size must be positive".to_string()));
        }
        if self.samples_per_pixel == 0 {
            return Err(Error::InvalidSettings("samples per pixel must be positive".to_string()));
        }
        if self.worker_count == Some(0) {
            return Err(Error::InvalidSettings("worker count must be positive".to_string()));
        }
        Ok(())
    }

    pub fn resolved_worker_count(&self) -> usize {
        self.worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        })
    }
}

/// When Russian roulette may end a path.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RouletteStrategy {
    /// Continue with a fixed probability
    Constant(Float),
    /// Continue with probability equal to the largest throughput component, within [0.05, 1]
    Throughput,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MisHeuristic {
    Balance,
    Power,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Bounces before Russian roulette is applied
    pub min_depth: u32,
    /// Bounces after which every path ends
    pub max_depth: u32,
    pub roulette: RouletteStrategy,
    pub mis: MisHeuristic,
    /// Whether participating media attenuate and scatter
    pub volumetric: bool,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            min_depth: 5,
            max_depth: 10,
            roulette: RouletteStrategy::Throughput,
            mis: MisHeuristic::Power,
            volumetric: true,
        }
    }
}

impl PathSettings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.min_depth > self.max_depth {
            return Err(Error::InvalidSettings(format!(
                "min depth {} exceeds max depth {}", self.min_depth, self.max_depth
            )));
        }
        if let RouletteStrategy::Constant(p) = self.roulette {
            if !(p > 0.0 && p <= 1.0) {
                return Err(Error::InvalidSettings(format!(
                    "continuation probability {} is not in (0, 1]", p
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RenderSettings::default().validate().is_ok());
        assert!(PathSettings::default().validate().is_ok());
        assert!(RenderSettings::default().resolved_worker_count() >= 1);
    }

    #[test]
    fn test_invalid_settings() {
        let bad_render = [
            RenderSettings { tile_size: 0, ..Default::default() },
            RenderSettings { samples_per_pixel: 0, ..Default::default() },
            RenderSettings { worker_count: Some(0), ..Default::default() },
        ];
        for s in bad_render {
            assert!(matches!(s.validate(), Err(Error::InvalidSettings(_))), "{:?}", s);
        }

        let bad_path = [
            PathSettings { min_depth: 4, max_depth: 3, ..Default::default() },
            PathSettings { roulette: RouletteStrategy::Constant(0.0), ..Default::default() },
            PathSettings { roulette: RouletteStrategy::Constant(1.5), ..Default::default() },
        ];
        for s in bad_path {
            assert!(matches!(s.validate(), Err(Error::InvalidSettings(_))), "{:?}", s);
        }
    }

    #[test]
    fn test_partial_config() -> anyhow::Result<()> {
        let render: RenderSettings = serde_json::from_str(r#"{ "samples_per_pixel": 64, "worker_count": 2 }"#)?;
        assert_eq!(render, RenderSettings { samples_per_pixel: 64, worker_count: Some(2), ..Default::default() });

        let path: PathSettings = serde_json::from_str(r#"{ "max_depth": 3, "min_depth": 1, "roulette": { "Constant": 0.5 } }"#)?;
        assert_eq!(path.roulette, RouletteStrategy::Constant(0.5));
        assert_eq!(path.mis, MisHeuristic::Power);
        assert!(path.validate().is_ok());

        let bvh: BvhOptions = serde_json::from_str(r#"{ "split_method": "EqualCounts" }"#)?;
        assert_eq!(bvh.max_leaf_size, 4);
        Ok(())
    }
}
