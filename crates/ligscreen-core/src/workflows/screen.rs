use crate::core::io::manifest::read_manifest;
use crate::engine::config::ScreeningConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::report::{ReportSink, TextReport};
use crate::engine::scanner::{BatchScanner, ScanSummary};
use crate::engine::source::{DirectorySource, FileListSource, StructureSource};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Where the list of structures to screen comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureSelection {
    /// A CSV manifest of identifiers, resolved against the structure directory.
    Manifest(PathBuf),
    /// Every structure file found under the structure directory.
    Directory,
}

/// Everything a screening run reads from and writes to.
#[derive(Debug, Clone)]
pub struct ScreenRequest {
    pub structures_dir: PathBuf,
    pub selection: StructureSelection,
    pub report_path: PathBuf,
    /// Append to an existing report instead of replacing it.
    pub append: bool,
}

/// Runs a complete screen.
///
/// The identifier list is read first; a missing or malformed manifest aborts
/// the run before the report file is touched. The report is then opened once
/// and released when the scan ends, whether or not it succeeded.
///
/// # Errors
///
/// Returns [`EngineError`] for fatal conditions only: a bad manifest, an
/// unreadable structure directory, or a report that cannot be written.
#[instrument(skip_all, name = "screen_workflow")]
pub fn run(
    request: &ScreenRequest,
    config: &ScreeningConfig,
    reporter: &ProgressReporter,
) -> Result<ScanSummary, EngineError> {
    info!(
        directory = %request.structures_dir.display(),
        report = %request.report_path.display(),
        "Starting screening workflow."
    );

    reporter.report(Progress::PhaseStart {
        name: "Loading structure list",
    });
    let (ids, source): (Vec<String>, Box<dyn StructureSource>) = match &request.selection {
        StructureSelection::Manifest(path) => {
            let ids = read_manifest(path)?;
            (ids, Box::new(DirectorySource::new(&request.structures_dir)))
        }
        StructureSelection::Directory => {
            let files = DirectorySource::discover(&request.structures_dir).map_err(|source| {
                EngineError::Discovery {
                    path: request.structures_dir.clone(),
                    source,
                }
            })?;
            let source = FileListSource::new(files);
            (source.identifiers(), Box::new(source))
        }
    };
    info!(structures = ids.len(), "Structure list loaded.");
    reporter.report(Progress::PhaseFinish);

    let mut report = if request.append {
        TextReport::append(&request.report_path)?
    } else {
        TextReport::create(&request.report_path)?
    };

    run_with(&ids, source.as_ref(), &mut report, config, reporter)
}

/// Runs the batch scan over an explicit identifier list, source and sink.
///
/// # Errors
///
/// Returns [`EngineError`] if the report sink fails.
pub fn run_with<S, R>(
    ids: &[String],
    source: &S,
    sink: &mut R,
    config: &ScreeningConfig,
    reporter: &ProgressReporter,
) -> Result<ScanSummary, EngineError>
where
    S: StructureSource + ?Sized,
    R: ReportSink + ?Sized,
{
    BatchScanner::new(config, reporter).run(ids, source, sink)
}
