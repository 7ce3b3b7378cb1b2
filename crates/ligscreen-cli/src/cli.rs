use clap::{Args, Parser, Subcommand};
use ligscreen::core::analysis::conformers::UntaggedAtomPolicy;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The ligscreen developers",
    version,
    about = "ligscreen - Flags poorly modelled cryoprotectant ligands (MPD/MRD) in PDB structures from their B-factor statistics.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to scan structures.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Screen structure files for anomalous ligand conformations and write a report.
    Scan(ScanArgs),
    /// Download the structure files listed in a manifest from the RCSB PDB.
    Fetch(FetchArgs),
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    // --- Inputs and Outputs ---
    /// Directory holding the structure files (`<ID>.pdb`, `pdb<id>.ent` or `<ID>.cif`).
    #[arg(short = 'd', long, required = true, value_name = "DIR")]
    pub structures_dir: PathBuf,

    /// CSV manifest listing the identifiers to screen (header row, one ID per row).
    /// When omitted, every structure file under the directory is screened.
    #[arg(short, long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Path of the report file.
    #[arg(short, long, default_value = "report.txt", value_name = "PATH")]
    pub output: PathBuf,

    /// Append to the report file instead of replacing it.
    #[arg(long)]
    pub append: bool,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Screening Overrides ---
    /// Residue name of the ligand to screen. Can be used multiple times.
    #[arg(short = 'l', long = "ligand", value_name = "CODE")]
    pub ligands: Vec<String>,

    /// Override the largest acceptable mean B-factor.
    #[arg(long, value_name = "FLOAT")]
    pub b_avg_max: Option<f64>,

    /// Override the largest acceptable coefficient of variation.
    #[arg(long, value_name = "FLOAT")]
    pub b_cv_max: Option<f64>,

    /// How atoms without an alternate-location label are treated in
    /// disordered residues ('shared' or 'ignore').
    #[arg(long, value_name = "POLICY", value_parser = parse_untagged_policy)]
    pub untagged_atoms: Option<UntaggedAtomPolicy>,

    /// Scan structures one at a time instead of on the thread pool.
    #[arg(long)]
    pub sequential: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S thresholds.b-avg-max=35
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `fetch` subcommand.
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// CSV manifest listing the identifiers to download.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub manifest: PathBuf,

    /// Directory the structure files are written to.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Download again even if the file already exists.
    #[arg(long)]
    pub force: bool,

    /// Base URL of the download service, for mirrors.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}

fn parse_untagged_policy(value: &str) -> Result<UntaggedAtomPolicy, String> {
    value
        .parse()
        .map_err(|_| format!("expected 'shared' or 'ignore', got '{}'", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_arguments_parse() {
        let cli = Cli::try_parse_from([
            "ligscreen",
            "-v",
            "scan",
            "-d",
            "structures",
            "-m",
            "ids.csv",
            "-l",
            "MPD",
            "-l",
            "GOL",
            "--b-avg-max",
            "35",
            "--untagged-atoms",
            "ignore",
            "-S",
            "scan.parallel=false",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan command");
        };
        assert_eq!(args.structures_dir, PathBuf::from("structures"));
        assert_eq!(args.manifest, Some(PathBuf::from("ids.csv")));
        assert_eq!(args.output, PathBuf::from("report.txt"));
        assert_eq!(args.ligands, vec!["MPD", "GOL"]);
        assert_eq!(args.b_avg_max, Some(35.0));
        assert_eq!(args.untagged_atoms, Some(UntaggedAtomPolicy::Ignore));
        assert_eq!(args.set_values, vec!["scan.parallel=false"]);
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let result = Cli::try_parse_from([
            "ligscreen",
            "scan",
            "-d",
            "structures",
            "--untagged-atoms",
            "sometimes",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn fetch_requires_manifest_and_out_dir() {
        assert!(Cli::try_parse_from(["ligscreen", "fetch", "-m", "ids.csv"]).is_err());
        let cli =
            Cli::try_parse_from(["ligscreen", "fetch", "-m", "ids.csv", "-o", "pdb", "--force"])
                .unwrap();
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch command");
        };
        assert!(args.force);
        assert_eq!(args.base_url, None);
    }
}
