//! Detector configuration read from the process environment.

pub mod env_parsing;
pub mod labels;

use crate::error::ConfigurationError;
use env_parsing::{parse_bool_literal, parse_positive_count, parse_unit_interval};
use labels::{read_classes_of_interest, read_classes_txt_file};
use std::collections::HashSet;
use std::env::VarError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CLASSES_PATH_VAR: &str = "DETECTRON2_CLASSES_PATH";
pub const CLASSES_OF_INTEREST_PATH_VAR: &str = "DETECTRON2_CLASSES_OF_INTEREST_PATH";
pub const ENABLE_GPU_VAR: &str = "ENABLE_GPU_ACCELERATION";
pub const CONFIDENCE_THRESHOLD_VAR: &str = "DETECTRON2_CONFIDENCE_THRESHOLD";
pub const MODEL_CONFIG_PATH_VAR: &str = "DETECTRON2_CONFIG_PATH";
pub const WEIGHTS_PATH_VAR: &str = "DETECTRON2_WEIGHTS_PATH";
pub const NUM_CLASSES_VAR: &str = "DETECTRON2_NUM_CLASSES";

/// Everything the detector needs, parsed once at startup.
///
/// There are no defaults: a wrong threshold or label list would silently corrupt every
/// detection, so each value must be present and well formed.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    class_all: Vec<String>,
    classes_of_interest: HashSet<String>,
    use_gpu: bool,
    confidence_threshold: f32,
    model_config_path: PathBuf,
    model_weights_path: PathBuf,
    num_classes: usize,
}

impl DetectionConfig {
    /// Loads the configuration from the real process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name))
    }

    /// Loads the configuration through `lookup`, which behaves like `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let require = |name: &'static str| -> Result<String, ConfigurationError> {
            lookup(name).map_err(|err| match err {
                VarError::NotPresent => ConfigurationError::MissingVariable { name },
                VarError::NotUnicode(_) => ConfigurationError::NotUnicode { name },
            })
        };

        let classes_path = PathBuf::from(require(CLASSES_PATH_VAR)?);
        let class_all = read_classes_txt_file(&classes_path)?;
        let coi_path = PathBuf::from(require(CLASSES_OF_INTEREST_PATH_VAR)?);
        let classes_of_interest = read_classes_of_interest(&coi_path)?;
        let use_gpu = parse_bool_literal(ENABLE_GPU_VAR, &require(ENABLE_GPU_VAR)?)?;
        let confidence_threshold = parse_unit_interval(
            CONFIDENCE_THRESHOLD_VAR,
            &require(CONFIDENCE_THRESHOLD_VAR)?,
        )?;
        let model_config_path = PathBuf::from(require(MODEL_CONFIG_PATH_VAR)?);
        let model_weights_path = PathBuf::from(require(WEIGHTS_PATH_VAR)?);
        let num_classes = parse_positive_count(NUM_CLASSES_VAR, &require(NUM_CLASSES_VAR)?)?;

        let config = Self {
            class_all,
            classes_of_interest,
            use_gpu,
            confidence_threshold,
            model_config_path,
            model_weights_path,
            num_classes,
        };
        config.report();
        Ok(config)
    }

    fn report(&self) {
        info!(
            labels = self.class_all.len(),
            classes_of_interest = self.classes_of_interest.len(),
            use_gpu = self.use_gpu,
            confidence_threshold = self.confidence_threshold,
            model_config = %self.model_config_path.display(),
            weights = %self.model_weights_path.display(),
            num_classes = self.num_classes,
            "loaded detection config"
        );
        if self.num_classes != self.class_all.len() {
            warn!(
                num_classes = self.num_classes,
                labels = self.class_all.len(),
                "class count does not match the label file; out-of-range ids will fail lookup"
            );
        }
    }

    pub fn class_all(&self) -> &[String] {
        &self.class_all
    }

    pub fn classes_of_interest(&self) -> &HashSet<String> {
        &self.classes_of_interest
    }

    pub fn use_gpu(&self) -> bool {
        self.use_gpu
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn model_config_path(&self) -> &Path {
        &self.model_config_path
    }

    pub fn model_weights_path(&self) -> &Path {
        &self.model_weights_path
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}
