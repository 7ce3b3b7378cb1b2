use super::config::ScreeningConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::report::{Finding, ReportSink};
use super::source::StructureSource;
use crate::core::analysis::classifier::{ClassifyError, ResidueClassifier};
use crate::core::analysis::conformers::ConformerResolver;
use crate::core::models::system::MolecularSystem;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// An identifier that could not be scanned.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStructure {
    pub id: String,
    pub reason: String,
    /// `true` if the file was found but could not be parsed.
    pub parse_error: bool,
}

/// A conformer group whose statistics could not be evaluated.
///
/// Such groups never count as anomalous.
#[derive(Debug, Clone, PartialEq)]
pub struct DegenerateGroup {
    pub structure_id: String,
    pub chain_id: char,
    pub residue_name: String,
    pub residue_number: isize,
    pub insertion_code: Option<char>,
    pub conformer: Option<char>,
    pub error: ClassifyError,
}

/// The result of screening one structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureScan {
    pub residues_examined: usize,
    pub groups_examined: usize,
    pub findings: Vec<Finding>,
    pub degenerate: Vec<DegenerateGroup>,
}

/// Totals for a whole batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    pub structures_scanned: usize,
    pub residues_examined: usize,
    pub groups_examined: usize,
    /// Equal to the number of findings handed to the report sink.
    pub anomalous_groups: usize,
    pub skipped: Vec<SkippedStructure>,
    pub degenerate: Vec<DegenerateGroup>,
}

impl ScanSummary {
    pub fn summary_line(&self) -> String {
        format!("Anomalous ligand conformer groups: {}", self.anomalous_groups)
    }

    /// A line naming the skipped identifiers, or `None` if nothing was skipped.
    pub fn skipped_line(&self) -> Option<String> {
        if self.skipped.is_empty() {
            return None;
        }
        let ids: Vec<&str> = self.skipped.iter().map(|s| s.id.as_str()).collect();
        Some(format!(
            "Skipped structures ({}): {}",
            ids.len(),
            ids.join(", ")
        ))
    }

    fn absorb(&mut self, scan: StructureScan) {
        self.structures_scanned += 1;
        self.residues_examined += scan.residues_examined;
        self.groups_examined += scan.groups_examined;
        self.degenerate.extend(scan.degenerate);
    }
}

/// Screens every ligand residue of one structure.
///
/// Each conformer group is classified against its own statistics. Groups with
/// degenerate statistics are returned separately and produce no finding.
pub fn scan_structure(
    id: &str,
    system: &MolecularSystem,
    config: &ScreeningConfig,
) -> StructureScan {
    let resolver = ConformerResolver::new(config.untagged_atoms);
    let classifier = ResidueClassifier::new(config.thresholds);
    let mut scan = StructureScan::default();

    for (residue_id, residue) in system.residues_iter() {
        if !residue.matches_any(&config.ligand_codes) {
            continue;
        }
        let Some(atoms) = system.residue_atoms(residue_id) else {
            continue;
        };
        let chain_id = system
            .chain(residue.chain_id)
            .map(|chain| chain.id)
            .unwrap_or(' ');
        scan.residues_examined += 1;

        let groups = resolver.resolve(&atoms);
        if groups.len() > 2 {
            debug!(
                structure = id,
                residue = residue.residue_number,
                conformers = groups.len(),
                "Residue has more than two conformations."
            );
        }

        for group in &groups {
            scan.groups_examined += 1;
            match classifier.classify(group) {
                Ok(verdict) if verdict.is_anomalous() => scan.findings.push(Finding {
                    structure_id: id.to_string(),
                    chain_id,
                    residue_name: residue.name.clone(),
                    residue_number: residue.residue_number,
                    insertion_code: residue.insertion_code,
                    conformer: group.label(),
                    verdict,
                }),
                Ok(_) => {}
                Err(error) => {
                    warn!(
                        structure = id,
                        chain = %chain_id,
                        residue = residue.residue_number,
                        conformer = ?group.label(),
                        "Excluding conformer group: {}",
                        error
                    );
                    scan.degenerate.push(DegenerateGroup {
                        structure_id: id.to_string(),
                        chain_id,
                        residue_name: residue.name.clone(),
                        residue_number: residue.residue_number,
                        insertion_code: residue.insertion_code,
                        conformer: group.label(),
                        error,
                    });
                }
            }
        }
    }

    scan
}

type ScanOutcome = Result<StructureScan, SkippedStructure>;

/// Runs the screen over a list of identifiers.
pub struct BatchScanner<'a> {
    config: &'a ScreeningConfig,
    reporter: &'a ProgressReporter<'a>,
}

impl<'a> BatchScanner<'a> {
    pub fn new(config: &'a ScreeningConfig, reporter: &'a ProgressReporter<'a>) -> Self {
        Self { config, reporter }
    }

    /// Fetches and screens every identifier, writing findings to `sink`.
    ///
    /// Structures that cannot be fetched or parsed are skipped. Findings are
    /// written in identifier order whether or not the scan runs in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Report`] if the sink rejects a finding and
    /// [`EngineError::ReportOutput`] if it cannot be flushed.
    #[instrument(skip_all, name = "batch_scan", fields(structures = ids.len()))]
    pub fn run<S, R>(
        &self,
        ids: &[String],
        source: &S,
        sink: &mut R,
    ) -> Result<ScanSummary, EngineError>
    where
        S: StructureSource + ?Sized,
        R: ReportSink + ?Sized,
    {
        let ids = unique_identifiers(ids);
        info!(structures = ids.len(), "Screening structures.");
        self.reporter.report(Progress::PhaseStart {
            name: "Screening structures",
        });
        self.reporter.report(Progress::BatchStart {
            total_structures: ids.len() as u64,
        });

        let mut summary = ScanSummary::default();
        if self.config.parallel {
            let outcomes: Vec<ScanOutcome> = ids
                .par_iter()
                .map(|id| self.process(id, source))
                .collect();
            for (id, outcome) in ids.iter().zip(outcomes) {
                record(id, outcome, sink, &mut summary)?;
            }
        } else {
            for id in &ids {
                let outcome = self.process(id, source);
                record(id, outcome, sink, &mut summary)?;
            }
        }
        sink.finish()?;

        self.reporter.report(Progress::BatchFinish);
        info!(
            scanned = summary.structures_scanned,
            skipped = summary.skipped.len(),
            anomalous = summary.anomalous_groups,
            "Screening finished."
        );
        self.reporter.report(Progress::PhaseFinish);
        Ok(summary)
    }

    fn process<S>(&self, id: &str, source: &S) -> ScanOutcome
    where
        S: StructureSource + ?Sized,
    {
        match source.fetch(id) {
            Ok(system) => {
                let scan = scan_structure(id, &system, self.config);
                debug!(
                    structure = id,
                    residues = scan.residues_examined,
                    findings = scan.findings.len(),
                    "Structure screened."
                );
                for group in &scan.degenerate {
                    self.reporter.report(Progress::Message(format!(
                        "{} chain {} residue {} {}: group excluded ({})",
                        id, group.chain_id, group.residue_name, group.residue_number, group.error
                    )));
                }
                self.reporter.report(Progress::StructureDone {
                    id: id.to_string(),
                    findings: scan.findings.len(),
                });
                Ok(scan)
            }
            Err(e) => {
                warn!(structure = id, "Skipping structure: {}", e);
                let skipped = SkippedStructure {
                    id: id.to_string(),
                    reason: e.to_string(),
                    parse_error: e.is_parse_error(),
                };
                self.reporter.report(Progress::StructureSkipped {
                    id: id.to_string(),
                    reason: skipped.reason.clone(),
                });
                Err(skipped)
            }
        }
    }
}

fn record<R>(
    id: &str,
    outcome: ScanOutcome,
    sink: &mut R,
    summary: &mut ScanSummary,
) -> Result<(), EngineError>
where
    R: ReportSink + ?Sized,
{
    match outcome {
        Ok(mut scan) => {
            for finding in scan.findings.drain(..) {
                sink.write_finding(&finding)
                    .map_err(|source| EngineError::Report {
                        id: id.to_string(),
                        source,
                    })?;
                summary.anomalous_groups += 1;
            }
            summary.absorb(scan);
        }
        Err(skipped) => summary.skipped.push(skipped),
    }
    Ok(())
}

fn unique_identifiers(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if seen.insert(id.as_str()) {
            unique.push(id.clone());
        } else {
            warn!(structure = %id, "Identifier listed more than once; scanning it once.");
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::classifier::Thresholds;
    use crate::core::analysis::conformers::UntaggedAtomPolicy;
    use crate::core::models::atom::Atom;
    use crate::engine::report::{ReportError, TextReport};
    use crate::engine::source::SourceError;
    use std::collections::HashMap;

    /// Builds structures in memory, keyed by identifier.
    #[derive(Default)]
    struct MemorySource {
        structures: HashMap<String, MolecularSystem>,
    }

    impl MemorySource {
        fn with(mut self, id: &str, system: MolecularSystem) -> Self {
            self.structures.insert(id.to_string(), system);
            self
        }
    }

    impl StructureSource for MemorySource {
        fn fetch(&self, id: &str) -> Result<MolecularSystem, SourceError> {
            self.structures
                .get(id)
                .cloned()
                .ok_or_else(|| SourceError::Unavailable {
                    id: id.to_string(),
                    reason: "not in memory".to_string(),
                })
        }
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn write_finding(&mut self, _finding: &Finding) -> Result<(), ReportError> {
            Err(ReportError::Write(std::io::Error::other("disk full")))
        }

        fn finish(&mut self) -> Result<(), ReportError> {
            Ok(())
        }
    }

    /// `atoms` are `(name, b_factor, alt_loc)` triples.
    fn add_residue(
        system: &mut MolecularSystem,
        chain: char,
        number: isize,
        name: &str,
        atoms: &[(&str, f64, Option<char>)],
    ) {
        let chain_id = system.add_chain(chain);
        let residue_id = system.add_residue(chain_id, number, None, name).unwrap();
        for &(atom_name, b, alt) in atoms {
            let mut atom = Atom::new(atom_name, residue_id, b);
            atom.alt_loc = alt;
            system.add_atom_to_residue(residue_id, atom).unwrap();
        }
    }

    fn uniform(b: f64) -> Vec<(&'static str, f64, Option<char>)> {
        vec![
            ("C1", b, None),
            ("C2", b, None),
            ("O2", b, None),
            ("C4", b, None),
        ]
    }

    fn structure_with(
        residues: &[(char, isize, &str, Vec<(&str, f64, Option<char>)>)],
    ) -> MolecularSystem {
        let mut system = MolecularSystem::new();
        for (chain, number, name, atoms) in residues {
            add_residue(&mut system, *chain, *number, name, atoms);
        }
        system
    }

    fn sequential() -> ScreeningConfig {
        ScreeningConfig {
            parallel: false,
            ..ScreeningConfig::default()
        }
    }

    fn run(
        ids: &[&str],
        source: &MemorySource,
        config: &ScreeningConfig,
    ) -> (ScanSummary, String) {
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        let reporter = ProgressReporter::new();
        let mut report = TextReport::new(Vec::new());
        let summary = BatchScanner::new(config, &reporter)
            .run(&ids, source, &mut report)
            .unwrap();
        assert_eq!(summary.anomalous_groups, report.written());
        let text = String::from_utf8(report.into_inner()).unwrap();
        (summary, text)
    }

    #[test]
    fn well_modelled_ligand_produces_no_finding() {
        let system = structure_with(&[('A', 301, "MPD", uniform(10.0))]);
        let scan = scan_structure("1ABC", &system, &ScreeningConfig::default());
        assert_eq!(scan.residues_examined, 1);
        assert_eq!(scan.groups_examined, 1);
        assert!(scan.findings.is_empty());
    }

    #[test]
    fn high_mean_ligand_is_reported() {
        let system = structure_with(&[(
            'A',
            301,
            "MPD",
            vec![
                ("C1", 50.0, None),
                ("C2", 52.0, None),
                ("O2", 48.0, None),
                ("C4", 50.0, None),
            ],
        )]);
        let scan = scan_structure("1ABC", &system, &ScreeningConfig::default());
        assert_eq!(scan.findings.len(), 1);
        let finding = &scan.findings[0];
        assert!(finding.verdict.high_mean);
        assert!(!finding.verdict.high_cv);
        assert_eq!(finding.conformer, None);
        assert_eq!(
            finding.to_string(),
            "Structure 1ABC\nChain A\nResidue MPD 301\nAverage B-factor is high\n\n"
        );
    }

    #[test]
    fn high_spread_ligand_is_reported() {
        let system = structure_with(&[(
            'B',
            12,
            "MRD",
            vec![
                ("C1", 10.0, None),
                ("C2", 10.0, None),
                ("O2", 50.0, None),
                ("C4", 10.0, None),
            ],
        )]);
        let scan = scan_structure("1ABC", &system, &ScreeningConfig::default());
        assert_eq!(scan.findings.len(), 1);
        assert!(scan.findings[0].verdict.high_cv);
        assert!(!scan.findings[0].verdict.high_mean);
        assert!(scan.findings[0].to_string().contains("Coefficient of variation is high\n"));
    }

    #[test]
    fn other_residues_are_ignored() {
        let system = structure_with(&[
            ('A', 1, "GLY", uniform(90.0)),
            ('A', 401, "HOH", uniform(90.0)),
        ]);
        let scan = scan_structure("1ABC", &system, &ScreeningConfig::default());
        assert_eq!(scan.residues_examined, 0);
        assert!(scan.findings.is_empty());
    }

    #[test]
    fn ligand_codes_are_configurable() {
        let system = structure_with(&[('A', 1, "GOL", uniform(90.0))]);
        let config = ScreeningConfig {
            ligand_codes: vec!["GOL".to_string()],
            ..ScreeningConfig::default()
        };
        assert_eq!(scan_structure("1ABC", &system, &config).findings.len(), 1);
    }

    #[test]
    fn only_the_anomalous_conformer_is_reported() {
        // Conformer B is judged on its own statistics. Conformer A being
        // anomalous must not produce a block for conformer B.
        let system = structure_with(&[(
            'A',
            301,
            "MPD",
            vec![
                ("C1", 50.0, Some('A')),
                ("C1", 20.0, Some('B')),
                ("O2", 50.0, Some('A')),
                ("O2", 19.0, Some('B')),
                ("C4", 50.0, Some('A')),
                ("C4", 21.0, Some('B')),
            ],
        )]);
        let source = MemorySource::default().with("1ABC", system);

        let (summary, text) = run(&["1ABC"], &source, &sequential());

        assert_eq!(summary.anomalous_groups, 1);
        assert_eq!(summary.groups_examined, 2);
        assert_eq!(
            text,
            "Structure 1ABC\nChain A\nResidue MPD 301\n\
             Residue has at least two conformations\nConformer A\n\
             Average B-factor is high\n\n"
        );
    }

    #[test]
    fn both_anomalous_conformers_count_twice() {
        let system = structure_with(&[(
            'A',
            301,
            "MPD",
            vec![
                ("C1", 50.0, Some('A')),
                ("C1", 60.0, Some('B')),
                ("O2", 50.0, Some('A')),
                ("O2", 60.0, Some('B')),
            ],
        )]);
        let scan = scan_structure("1ABC", &system, &ScreeningConfig::default());
        let labels: Vec<_> = scan.findings.iter().map(|f| f.conformer).collect();
        assert_eq!(labels, vec![Some('A'), Some('B')]);
    }

    #[test]
    fn ignoring_untagged_atoms_changes_the_groups() {
        let atoms = vec![
            ("C1", 10.0, Some('A')),
            ("C1", 10.0, Some('B')),
            ("O4", 90.0, None),
        ];
        let system = structure_with(&[('A', 301, "MPD", atoms)]);

        let shared = scan_structure("1ABC", &system, &ScreeningConfig::default());
        assert_eq!(shared.findings.len(), 2);

        let config = ScreeningConfig {
            untagged_atoms: UntaggedAtomPolicy::Ignore,
            ..ScreeningConfig::default()
        };
        assert!(scan_structure("1ABC", &system, &config).findings.is_empty());
    }

    #[test]
    fn zero_mean_group_is_excluded_not_fatal() {
        let system = structure_with(&[
            ('A', 301, "MPD", uniform(0.0)),
            ('A', 302, "MPD", uniform(80.0)),
        ]);
        let source = MemorySource::default().with("1ABC", system);

        let (summary, text) = run(&["1ABC"], &source, &sequential());

        assert_eq!(summary.anomalous_groups, 1);
        assert_eq!(summary.degenerate.len(), 1);
        assert_eq!(summary.degenerate[0].residue_number, 301);
        assert!(matches!(
            summary.degenerate[0].error,
            ClassifyError::DegenerateStatistics { .. }
        ));
        assert!(text.contains("Residue MPD 302\n"));
        assert!(!text.contains("Residue MPD 301\n"));
    }

    #[test]
    fn degenerate_groups_are_announced_to_the_reporter() {
        let system = structure_with(&[('A', 301, "MPD", uniform(-4.0))]);
        let source = MemorySource::default().with("1ABC", system);
        let events = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| {
            events.lock().unwrap().push(event);
        }));
        let mut report = TextReport::new(Vec::new());

        let summary = BatchScanner::new(&sequential(), &reporter)
            .run(&["1ABC".to_string()], &source, &mut report)
            .unwrap();
        drop(reporter);

        assert_eq!(summary.anomalous_groups, 0);
        assert_eq!(summary.degenerate.len(), 1);
        let messages: Vec<String> = events
            .into_inner()
            .unwrap()
            .into_iter()
            .filter_map(|event| match event {
                Progress::Message(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("1ABC chain A residue MPD 301: group excluded"));
    }

    #[test]
    fn ligand_sharing_a_position_with_water_is_screened_alone() {
        use crate::core::io::pdb::PdbFile;
        use crate::core::io::traits::StructureFile;

        let text = "\
HETATM    1  O  AHOH A 301       1.000   2.000   3.000  0.50 20.00           O
HETATM    2  C1 BMPD A 301       1.100   2.100   3.100  0.50 90.00           C
HETATM    3  C2 BMPD A 301       1.200   2.200   3.200  0.50 90.00           C
END
";
        let (system, _) = PdbFile::read_from(&mut std::io::Cursor::new(text)).unwrap();
        let scan = scan_structure("1ABC", &system, &ScreeningConfig::default());

        assert_eq!(scan.residues_examined, 1);
        assert_eq!(scan.groups_examined, 1);
        assert_eq!(scan.findings.len(), 1);
        let finding = &scan.findings[0];
        assert_eq!(finding.residue_name, "MPD");
        assert_eq!(finding.conformer, Some('B'));
        assert!((finding.verdict.mean_b - 90.0).abs() < 1e-9);
    }

    #[test]
    fn unfetchable_identifier_is_skipped() {
        let source = MemorySource::default()
            .with("1ABC", structure_with(&[('A', 1, "MPD", uniform(80.0))]))
            .with("3DEF", structure_with(&[('A', 1, "MPD", uniform(80.0))]));

        let (summary, text) = run(&["1ABC", "2BAD", "3DEF"], &source, &sequential());

        assert_eq!(summary.structures_scanned, 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].id, "2BAD");
        assert!(!summary.skipped[0].parse_error);
        assert_eq!(summary.anomalous_groups, 2);
        assert!(text.find("Structure 1ABC").unwrap() < text.find("Structure 3DEF").unwrap());
        assert_eq!(
            summary.skipped_line().as_deref(),
            Some("Skipped structures (1): 2BAD")
        );
    }

    #[test]
    fn parallel_and_sequential_reports_are_identical() {
        let mut source = MemorySource::default();
        let mut ids = Vec::new();
        for i in 0..24 {
            let id = format!("{i}ABC");
            let b = if i % 3 == 0 { 80.0 } else { 15.0 };
            source = source.with(&id, structure_with(&[('A', i, "MPD", uniform(b))]));
            ids.push(id);
        }
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();

        let (seq_summary, seq_text) = run(&ids, &source, &sequential());
        let (par_summary, par_text) = run(&ids, &source, &ScreeningConfig::default());
        let (again_summary, again_text) = run(&ids, &source, &ScreeningConfig::default());

        assert_eq!(seq_text, par_text);
        assert_eq!(par_text, again_text);
        assert_eq!(seq_summary, par_summary);
        assert_eq!(par_summary, again_summary);
        assert_eq!(seq_summary.anomalous_groups, 8);
        assert_eq!(seq_summary.summary_line(), "Anomalous ligand conformer groups: 8");
    }

    #[test]
    fn duplicate_identifiers_are_scanned_once() {
        let source = MemorySource::default()
            .with("1ABC", structure_with(&[('A', 1, "MPD", uniform(80.0))]));
        let (summary, _) = run(&["1ABC", "1ABC"], &source, &sequential());
        assert_eq!(summary.structures_scanned, 1);
        assert_eq!(summary.anomalous_groups, 1);
    }

    #[test]
    fn empty_batch_writes_nothing() {
        let (summary, text) = run(&[], &MemorySource::default(), &ScreeningConfig::default());
        assert_eq!(summary, ScanSummary::default());
        assert!(text.is_empty());
        assert_eq!(summary.skipped_line(), None);
    }

    #[test]
    fn report_failure_is_fatal() {
        let source = MemorySource::default()
            .with("1ABC", structure_with(&[('A', 1, "MPD", uniform(80.0))]));
        let config = sequential();
        let reporter = ProgressReporter::new();
        let err = BatchScanner::new(&config, &reporter)
            .run(&["1ABC".to_string()], &source, &mut FailingSink)
            .unwrap_err();
        assert!(matches!(err, EngineError::Report { ref id, .. } if id == "1ABC"));
    }

    #[test]
    fn custom_thresholds_apply() {
        let system = structure_with(&[('A', 1, "MPD", uniform(45.0))]);
        let config = ScreeningConfig {
            thresholds: Thresholds {
                b_avg_max: 50.0,
                b_cv_max: 0.2,
            },
            ..ScreeningConfig::default()
        };
        assert!(scan_structure("1ABC", &system, &config).findings.is_empty());
    }
}
