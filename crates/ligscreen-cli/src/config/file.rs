use crate::error::{CliError, Result};
use ligscreen::core::analysis::conformers::UntaggedAtomPolicy;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub ligand: Option<FileLigandConfig>,
    pub thresholds: Option<FileThresholdsConfig>,
    pub conformers: Option<FileConformersConfig>,
    pub scan: Option<FileScanConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileLigandConfig {
    pub codes: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileThresholdsConfig {
    #[serde(rename = "b-avg-max")]
    pub b_avg_max: Option<f64>,
    #[serde(rename = "b-cv-max")]
    pub b_cv_max: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConformersConfig {
    #[serde(rename = "untagged-atoms")]
    pub untagged_atoms: Option<UntaggedAtomPolicy>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileScanConfig {
    pub parallel: Option<bool>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
