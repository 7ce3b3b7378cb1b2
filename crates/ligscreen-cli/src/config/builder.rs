use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::ScanArgs;
use crate::error::{CliError, Result};
use ligscreen::core::analysis::conformers::UntaggedAtomPolicy;
use ligscreen::engine::config::ScreeningConfigBuilder;
use ligscreen::workflows::screen::{ScreenRequest, StructureSelection};

/// Resolves the effective configuration of a `scan` run.
///
/// Values are taken from, in increasing priority: built-in defaults, the
/// configuration file, `--set` overrides and dedicated command-line flags.
pub fn build_config(args: &ScanArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let ligand_file = file_config.ligand.take().unwrap_or_default();
    let ligand_codes = if args.ligands.is_empty() {
        ligand_file.codes.unwrap_or(defaults.ligand_codes)
    } else {
        args.ligands.clone()
    };

    let thresholds_file = file_config.thresholds.take().unwrap_or_default();
    let b_avg_max = args
        .b_avg_max
        .or(thresholds_file.b_avg_max)
        .unwrap_or(defaults.b_avg_max);
    let b_cv_max = args
        .b_cv_max
        .or(thresholds_file.b_cv_max)
        .unwrap_or(defaults.b_cv_max);

    let untagged_atoms = args
        .untagged_atoms
        .or(file_config
            .conformers
            .take()
            .and_then(|c| c.untagged_atoms))
        .unwrap_or(defaults.untagged_atoms);

    let parallel = if args.sequential {
        false
    } else {
        file_config
            .scan
            .take()
            .and_then(|s| s.parallel)
            .unwrap_or(defaults.parallel)
    };

    let core_config = ScreeningConfigBuilder::new()
        .ligand_codes(ligand_codes)
        .b_avg_max(b_avg_max)
        .b_cv_max(b_cv_max)
        .untagged_atoms(untagged_atoms)
        .parallel(parallel)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let selection = match &args.manifest {
        Some(path) => StructureSelection::Manifest(path.clone()),
        None => StructureSelection::Directory,
    };

    Ok(AppConfig {
        request: ScreenRequest {
            structures_dir: args.structures_dir.clone(),
            selection,
            report_path: args.output.clone(),
            append: args.append,
        },
        core_config,
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    if set_values.is_empty() {
        return Ok(config);
    }
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let (key, value_str) = (key.trim(), value_str.trim());

        match key {
            "ligand.codes" => {
                config.ligand.get_or_insert_with(Default::default).codes = Some(
                    value_str
                        .split(',')
                        .map(|code| code.trim().to_string())
                        .filter(|code| !code.is_empty())
                        .collect(),
                );
            }
            "thresholds.b-avg-max" => {
                config
                    .thresholds
                    .get_or_insert_with(Default::default)
                    .b_avg_max = Some(value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                })?);
            }
            "thresholds.b-cv-max" => {
                config
                    .thresholds
                    .get_or_insert_with(Default::default)
                    .b_cv_max = Some(value_str.parse().map_err(|_| {
                    CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                })?);
            }
            "conformers.untagged-atoms" => {
                let policy: UntaggedAtomPolicy = value_str.parse().map_err(|_| {
                    CliError::Config(format!(
                        "Invalid value for {}: {} (expected 'shared' or 'ignore')",
                        key, value_str
                    ))
                })?;
                config
                    .conformers
                    .get_or_insert_with(Default::default)
                    .untagged_atoms = Some(policy);
            }
            "scan.parallel" => {
                config.scan.get_or_insert_with(Default::default).parallel =
                    Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!(
                            "Invalid boolean value for {}: {}",
                            key, value_str
                        ))
                    })?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
