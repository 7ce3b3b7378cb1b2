use crate::core::analysis::classifier::{DEFAULT_B_AVG_MAX, DEFAULT_B_CV_MAX, Thresholds};
use crate::core::analysis::conformers::UntaggedAtomPolicy;
use thiserror::Error;

/// Component codes of (4S)- and (4R)-2-methyl-2,4-pentanediol.
pub const DEFAULT_LIGAND_CODES: [&str; 2] = ["MPD", "MRD"];

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("At least one ligand code must be given")]
    EmptyLigandSet,
    #[error("Invalid ligand code '{0}' (expected 1-3 alphanumeric characters)")]
    InvalidLigandCode(String),
    #[error("Threshold '{name}' must be a finite, non-negative number (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningConfig {
    /// Upper-cased component codes of the ligand to screen, without duplicates.
    pub ligand_codes: Vec<String>,
    pub thresholds: Thresholds,
    pub untagged_atoms: UntaggedAtomPolicy,
    /// Scan structures on the rayon thread pool.
    pub parallel: bool,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            ligand_codes: DEFAULT_LIGAND_CODES.iter().map(|c| c.to_string()).collect(),
            thresholds: Thresholds::default(),
            untagged_atoms: UntaggedAtomPolicy::default(),
            parallel: true,
        }
    }
}

#[derive(Default)]
pub struct ScreeningConfigBuilder {
    ligand_codes: Option<Vec<String>>,
    b_avg_max: Option<f64>,
    b_cv_max: Option<f64>,
    untagged_atoms: Option<UntaggedAtomPolicy>,
    parallel: Option<bool>,
}

impl ScreeningConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ligand_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ligand_codes = Some(codes.into_iter().map(Into::into).collect());
        self
    }
    pub fn b_avg_max(mut self, value: f64) -> Self {
        self.b_avg_max = Some(value);
        self
    }
    pub fn b_cv_max(mut self, value: f64) -> Self {
        self.b_cv_max = Some(value);
        self
    }
    pub fn untagged_atoms(mut self, policy: UntaggedAtomPolicy) -> Self {
        self.untagged_atoms = Some(policy);
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    pub fn build(self) -> Result<ScreeningConfig, ConfigError> {
        let raw_codes = self
            .ligand_codes
            .ok_or(ConfigError::MissingParameter("ligand_codes"))?;
        let mut ligand_codes: Vec<String> = Vec::with_capacity(raw_codes.len());
        for raw in raw_codes {
            let code = raw.trim().to_ascii_uppercase();
            if code.is_empty()
                || code.len() > 3
                || !code.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(ConfigError::InvalidLigandCode(raw));
            }
            if !ligand_codes.contains(&code) {
                ligand_codes.push(code);
            }
        }
        if ligand_codes.is_empty() {
            return Err(ConfigError::EmptyLigandSet);
        }

        let b_avg_max = validate_threshold(
            "b_avg_max",
            self.b_avg_max
                .ok_or(ConfigError::MissingParameter("b_avg_max"))?,
        )?;
        let b_cv_max = validate_threshold(
            "b_cv_max",
            self.b_cv_max
                .ok_or(ConfigError::MissingParameter("b_cv_max"))?,
        )?;

        Ok(ScreeningConfig {
            ligand_codes,
            thresholds: Thresholds {
                b_avg_max,
                b_cv_max,
            },
            untagged_atoms: self.untagged_atoms.unwrap_or_default(),
            parallel: self.parallel.unwrap_or(true),
        })
    }
}

fn validate_threshold(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_builder() -> ScreeningConfigBuilder {
        ScreeningConfigBuilder::new()
            .ligand_codes(DEFAULT_LIGAND_CODES)
            .b_avg_max(DEFAULT_B_AVG_MAX)
            .b_cv_max(DEFAULT_B_CV_MAX)
    }

    #[test]
    fn builder_with_defaults_matches_default_config() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config, ScreeningConfig::default());
    }

    #[test]
    fn builder_normalizes_and_deduplicates_codes() {
        let config = complete_builder()
            .ligand_codes(["mpd", " MRD ", "MPD"])
            .build()
            .unwrap();
        assert_eq!(config.ligand_codes, vec!["MPD", "MRD"]);
    }

    #[test]
    fn builder_applies_optional_settings() {
        let config = complete_builder()
            .untagged_atoms(UntaggedAtomPolicy::Ignore)
            .parallel(false)
            .b_avg_max(55.5)
            .build()
            .unwrap();
        assert_eq!(config.untagged_atoms, UntaggedAtomPolicy::Ignore);
        assert!(!config.parallel);
        assert_eq!(config.thresholds.b_avg_max, 55.5);
    }

    #[test]
    fn builder_reports_missing_parameters() {
        let err = ScreeningConfigBuilder::new()
            .b_avg_max(40.0)
            .b_cv_max(0.2)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("ligand_codes"));

        let err = ScreeningConfigBuilder::new()
            .ligand_codes(["MPD"])
            .b_cv_max(0.2)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("b_avg_max"));
    }

    #[test]
    fn builder_rejects_empty_or_invalid_codes() {
        let err = complete_builder()
            .ligand_codes(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptyLigandSet);

        let err = complete_builder().ligand_codes(["MPDX"]).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidLigandCode("MPDX".to_string()));
    }

    #[test]
    fn builder_rejects_invalid_thresholds() {
        let err = complete_builder().b_cv_max(-0.1).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidThreshold {
                name: "b_cv_max",
                value: -0.1
            }
        );
        assert!(complete_builder().b_avg_max(f64::NAN).build().is_err());
    }
}
