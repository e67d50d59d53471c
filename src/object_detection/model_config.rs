use crate::error::ModelError;
use crate::image_utils::image_conversion::ChannelOrder;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Describes how to feed an exported detection network and where to read its results.
///
/// Every key is optional; missing keys fall back to the defaults the network was
/// trained with.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub input_name: String,
    pub boxes_output: String,
    pub scores_output: String,
    pub classes_output: String,
    pub input_format: ChannelOrder,
    pub min_size_test: u32,
    pub max_size_test: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_name: "image".to_string(),
            boxes_output: "boxes".to_string(),
            scores_output: "scores".to_string(),
            classes_output: "classes".to_string(),
            input_format: ChannelOrder::Bgr,
            min_size_test: 800,
            max_size_test: 1333,
        }
    }
}

impl ModelConfig {
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path).map_err(|source| ModelError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ModelError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }
}
