// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-call numeric tolerances and operation settings
//!
//! Nothing here is global: every operation receives its configuration
//! explicitly. [`KernelConfig`] only bundles defaults that can be read from
//! `polyframe-mesh.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::KernelError;

/// Default configuration file looked up by [`KernelConfig::load`]
pub const CONFIG_FILE: &str = "polyframe-mesh.toml";

/// Distance under which two constructed points are considered equal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Absolute welding distance, or a fraction of the bounding-box
    /// diagonal when `relative` is set
    pub merge_distance: f64,
    pub relative: bool,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            merge_distance: 1e-9,
            relative: false,
        }
    }
}

impl Tolerance {
    pub fn absolute(merge_distance: f64) -> Self {
        Self {
            merge_distance,
            relative: false,
        }
    }

    pub fn relative(fraction: f64) -> Self {
        Self {
            merge_distance: fraction,
            relative: true,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !(self.merge_distance.is_finite() && self.merge_distance >= 0.0) {
            return Err(KernelError::invalid_parameter(
                "merge_distance",
                format!("must be finite and non-negative, got {}", self.merge_distance),
            ));
        }
        Ok(())
    }

    /// Absolute distance for geometry whose bounding box has diagonal `scale`
    pub fn resolve(&self, scale: f64) -> f64 {
        if self.relative {
            self.merge_distance * scale.max(f64::MIN_POSITIVE)
        } else {
            self.merge_distance
        }
    }
}

/// Point-in-solid test used to classify boolean fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// Ray casting with retries on degenerate hits
    RayParity,
    /// Generalized winding number from solid angles
    WindingNumber,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanConfig {
    pub tolerance: Tolerance,
    /// Intersect face pairs on the rayon pool
    pub parallel: bool,
    pub classification: ClassificationMethod,
    /// Reject results that are not closed manifolds
    pub validate_output: bool,
}

impl Default for BooleanConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            parallel: true,
            classification: ClassificationMethod::RayParity,
            validate_output: true,
        }
    }
}

impl BooleanConfig {
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_classification(mut self, classification: ClassificationMethod) -> Self {
        self.classification = classification;
        self
    }

    pub fn with_validate_output(mut self, validate_output: bool) -> Self {
        self.validate_output = validate_output;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemeshConfig {
    /// Pull vertices back onto the input surface after relaxation
    pub do_project: bool,
    /// Edges (vertex index pairs of the input) that are never split,
    /// collapsed or flipped
    pub constrained_edges: Vec<[usize; 2]>,
    /// Treat boundary edges of open meshes as constrained
    pub protect_boundary: bool,
    /// Tangential smoothing passes per iteration
    pub relaxation_steps: usize,
}

impl Default for RemeshConfig {
    fn default() -> Self {
        Self {
            do_project: true,
            constrained_edges: Vec::new(),
            protect_boundary: true,
            relaxation_steps: 1,
        }
    }
}

impl RemeshConfig {
    pub fn with_projection(mut self, do_project: bool) -> Self {
        self.do_project = do_project;
        self
    }

    pub fn with_constrained_edges(mut self, edges: Vec<[usize; 2]>) -> Self {
        self.constrained_edges = edges;
        self
    }

    pub fn with_protect_boundary(mut self, protect: bool) -> Self {
        self.protect_boundary = protect;
        self
    }

    pub fn with_relaxation_steps(mut self, steps: usize) -> Self {
        self.relaxation_steps = steps;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceConfig {
    /// Endpoint matching distance when stitching segments
    pub tolerance: Tolerance,
    /// Remove vertices lying on straight runs of a polyline
    pub merge_collinear: bool,
    /// Slice planes on the rayon pool
    pub parallel: bool,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            merge_collinear: true,
            parallel: true,
        }
    }
}

impl SliceConfig {
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_merge_collinear(mut self, merge: bool) -> Self {
        self.merge_collinear = merge;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationConfig {
    /// Upper bound on edge lengths, met by inserting Steiner points
    pub max_edge_length: Option<f64>,
    /// Refinement gives up beyond this many Steiner points
    pub max_steiner_points: usize,
    /// Lloyd relaxation of the free vertices after refinement
    pub optimize: bool,
}

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            max_edge_length: None,
            max_steiner_points: 100_000,
            optimize: false,
        }
    }
}

impl TriangulationConfig {
    pub fn with_max_edge_length(mut self, max_edge_length: Option<f64>) -> Self {
        self.max_edge_length = max_edge_length;
        self
    }

    pub fn with_max_steiner_points(mut self, max_steiner_points: usize) -> Self {
        self.max_steiner_points = max_steiner_points;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }
}

/// Defaults for every operation, loadable from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub tolerance: Tolerance,
    pub boolean: BooleanConfig,
    pub remesh: RemeshConfig,
    pub slice: SliceConfig,
    pub triangulation: TriangulationConfig,
}

impl KernelConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: KernelConfig = toml::from_str(content).context("Invalid kernel configuration")?;
        config.tolerance.validate()?;
        config.boolean.tolerance.validate()?;
        config.slice.tolerance.validate()?;
        Ok(config)
    }

    /// Load `polyframe-mesh.toml` when present, then apply environment
    /// variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        if let Ok(distance) = std::env::var("POLYFRAME_MESH_MERGE_DISTANCE") {
            let distance: f64 = distance
                .parse()
                .with_context(|| format!("Invalid POLYFRAME_MESH_MERGE_DISTANCE: {distance}"))?;
            config.set_merge_distance(distance);
            config.tolerance.validate()?;
        }

        if let Ok(parallel) = std::env::var("POLYFRAME_MESH_PARALLEL") {
            let parallel = parallel.parse().unwrap_or(true);
            config.boolean.parallel = parallel;
            config.slice.parallel = parallel;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Uses one welding distance for every operation
    pub fn set_merge_distance(&mut self, distance: f64) {
        self.tolerance.merge_distance = distance;
        self.boolean.tolerance.merge_distance = distance;
        self.slice.tolerance.merge_distance = distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KernelConfig::default();
        assert_eq!(config.tolerance.merge_distance, 1e-9);
        assert!(config.boolean.validate_output);
        assert_eq!(config.boolean.classification, ClassificationMethod::RayParity);
        assert!(config.remesh.do_project);
        assert!(config.slice.merge_collinear);
        assert_eq!(config.triangulation.max_edge_length, None);
    }

    #[test]
    fn test_partial_toml() {
        let config = KernelConfig::from_toml_str(
            r#"
            [boolean]
            classification = "winding_number"
            parallel = false

            [remesh]
            constrained_edges = [[0, 1], [1, 2]]
            "#,
        )
        .unwrap();
        assert_eq!(config.boolean.classification, ClassificationMethod::WindingNumber);
        assert!(!config.boolean.parallel);
        assert!(config.boolean.validate_output);
        assert_eq!(config.remesh.constrained_edges, vec![[0, 1], [1, 2]]);
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        assert!(KernelConfig::from_toml_str("[tolerance]\nmerge_distance = -1.0\n").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = KernelConfig::default();
        config.set_merge_distance(1e-6);
        config.triangulation.max_edge_length = Some(0.5);
        config.save(&path).unwrap();

        let loaded = KernelConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_tolerance_resolve() {
        assert_eq!(Tolerance::absolute(1e-6).resolve(100.0), 1e-6);
        assert!((Tolerance::relative(1e-6).resolve(100.0) - 1e-4).abs() < 1e-18);
    }
}
