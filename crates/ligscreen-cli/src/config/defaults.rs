use ligscreen::core::analysis::classifier::{DEFAULT_B_AVG_MAX, DEFAULT_B_CV_MAX};
use ligscreen::core::analysis::conformers::UntaggedAtomPolicy;
use ligscreen::engine::config::DEFAULT_LIGAND_CODES;

pub struct DefaultsConfig {
    pub ligand_codes: Vec<String>,
    pub b_avg_max: f64,
    pub b_cv_max: f64,
    pub untagged_atoms: UntaggedAtomPolicy,
    pub parallel: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            ligand_codes: DEFAULT_LIGAND_CODES.iter().map(|c| c.to_string()).collect(),
            b_avg_max: DEFAULT_B_AVG_MAX,
            b_cv_max: DEFAULT_B_CV_MAX,
            untagged_atoms: UntaggedAtomPolicy::Shared,
            parallel: true,
        }
    }
}
