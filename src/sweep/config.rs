//! Experiment configuration

use crate::{RcmError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sweep description loaded from a YAML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Name of the solver to sample with
    pub solver_name: String,
    /// Problem in COO format
    pub input_file: PathBuf,
    /// Precomputed embedding as JSON
    pub embedding_file: PathBuf,
    /// Root of the output tree
    pub output_dir: PathBuf,
    /// Chain strength scales, relative to the largest interaction
    pub chain_strength_scales: Vec<f64>,
    /// Annealing times in microseconds
    pub annealing_times: Vec<u64>,
    /// Reads per sampling call
    pub batch_size: usize,
    /// Sampling calls per parameter point
    pub num_batches: usize,
}

impl ExperimentConfig {
    /// Load and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: ExperimentConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Report the first violated constraint
    pub fn validate(&self) -> Result<()> {
        if self.solver_name.trim().is_empty() {
            return Err(RcmError::config_error("solver_name must not be empty"));
        }
        if self.chain_strength_scales.is_empty() {
            return Err(RcmError::config_error("chain_strength_scales must not be empty"));
        }
        if let Some(css) = self
            .chain_strength_scales
            .iter()
            .find(|css| !css.is_finite() || **css <= 0.0)
        {
            return Err(RcmError::config_error(format!(
                "chain strength scale {} must be finite and positive",
                css
            )));
        }
        if self.annealing_times.is_empty() {
            return Err(RcmError::config_error("annealing_times must not be empty"));
        }
        if self.annealing_times.contains(&0) {
            return Err(RcmError::config_error("annealing times must be positive"));
        }
        if self.batch_size == 0 {
            return Err(RcmError::config_error("batch_size must be positive"));
        }
        if self.num_batches == 0 {
            return Err(RcmError::config_error("num_batches must be positive"));
        }
        Ok(())
    }

    /// Parameter points, chain strength scales varying slowest
    pub fn parameter_points(&self) -> Vec<(f64, u64)> {
        self.chain_strength_scales
            .iter()
            .flat_map(|&css| self.annealing_times.iter().map(move |&at| (css, at)))
            .collect()
    }

    /// Directory holding cached raw batches
    pub fn raw_dir(&self) -> PathBuf {
        self.output_dir.join("raw_outputs")
    }

    /// Directory holding unembedded CSV results
    pub fn results_dir(&self) -> PathBuf {
        self.output_dir.join("outputs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "\
solver_name: DW_2000Q_6
input_file: problem.coo
embedding_file: embedding.json
output_dir: out
chain_strength_scales: [1.0, 1.5]
annealing_times: [20, 200]
batch_size: 100
num_batches: 2
";

    #[test]
    fn test_parse() {
        let config = ExperimentConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.solver_name, "DW_2000Q_6");
        assert_eq!(config.chain_strength_scales, vec![1.0, 1.5]);
        assert_eq!(config.raw_dir(), PathBuf::from("out/raw_outputs"));
    }

    #[test]
    fn test_parameter_order() {
        let config = ExperimentConfig::from_yaml(YAML).unwrap();
        assert_eq!(
            config.parameter_points(),
            vec![(1.0, 20), (1.0, 200), (1.5, 20), (1.5, 200)]
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = format!("{}extra: 1\n", YAML);
        assert!(ExperimentConfig::from_yaml(&yaml).unwrap_err().is_config_error());
    }

    #[test]
    fn test_missing_field_rejected() {
        let yaml = YAML.replace("num_batches: 2\n", "");
        assert!(ExperimentConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_constraints() {
        for (from, to) in [
            ("[1.0, 1.5]", "[]"),
            ("[1.0, 1.5]", "[1.0, -0.5]"),
            ("[20, 200]", "[0]"),
            ("batch_size: 100", "batch_size: 0"),
            ("num_batches: 2", "num_batches: 0"),
        ] {
            let yaml = YAML.replace(from, to);
            let err = ExperimentConfig::from_yaml(&yaml).unwrap_err();
            assert!(err.is_config_error(), "{} -> {}: {}", from, to, err);
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let config = ExperimentConfig::from_yaml(YAML).unwrap();

        config.to_file(&path).unwrap();
        assert_eq!(ExperimentConfig::from_file(&path).unwrap(), config);
    }
}
