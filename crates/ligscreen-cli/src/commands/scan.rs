use crate::cli::ScanArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use ligscreen::engine::progress::ProgressReporter;
use ligscreen::workflows;
use tracing::info;

pub async fn run(args: ScanArgs) -> Result<()> {
    info!("Building configuration...");
    let app = build_config(&args)?;
    info!(
        ligands = ?app.core_config.ligand_codes,
        b_avg_max = app.core_config.thresholds.b_avg_max,
        b_cv_max = app.core_config.thresholds.b_cv_max,
        untagged_atoms = %app.core_config.untagged_atoms,
        parallel = app.core_config.parallel,
        "Configuration resolved."
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the core screening workflow...");
    let summary = tokio::task::block_in_place(|| {
        workflows::screen::run(&app.request, &app.core_config, &reporter)
    })?;

    println!("{}", summary.summary_line());
    if let Some(line) = summary.skipped_line() {
        println!("{}", line);
    }
    info!(
        "Report written to {} ({} structures screened, {} groups examined, {} excluded).",
        app.request.report_path.display(),
        summary.structures_scanned,
        summary.groups_examined,
        summary.degenerate.len()
    );

    Ok(())
}
