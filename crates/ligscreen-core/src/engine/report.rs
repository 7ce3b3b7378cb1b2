use crate::core::analysis::classifier::Verdict;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DISORDERED_LINE: &str = "Residue has at least two conformations";
pub const HIGH_MEAN_LINE: &str = "Average B-factor is high";
pub const HIGH_CV_LINE: &str = "Coefficient of variation is high";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to open report file '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write report: {0}")]
    Write(#[from] io::Error),
}

/// One anomalous conformer group, ready to be written to the report.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub structure_id: String,
    pub chain_id: char,
    pub residue_name: String,
    pub residue_number: isize,
    pub insertion_code: Option<char>,
    /// The alternate-location label, set only for disordered residues.
    pub conformer: Option<char>,
    pub verdict: Verdict,
}

impl fmt::Display for Finding {
    /// Renders the finding as a report block, terminated by a blank line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Structure {}", self.structure_id)?;
        writeln!(f, "Chain {}", self.chain_id)?;
        write!(f, "Residue {} {}", self.residue_name, self.residue_number)?;
        if let Some(code) = self.insertion_code {
            write!(f, "{}", code)?;
        }
        writeln!(f)?;
        if let Some(label) = self.conformer {
            writeln!(f, "{}", DISORDERED_LINE)?;
            writeln!(f, "Conformer {}", label)?;
        }
        if self.verdict.high_mean {
            writeln!(f, "{}", HIGH_MEAN_LINE)?;
        }
        if self.verdict.high_cv {
            writeln!(f, "{}", HIGH_CV_LINE)?;
        }
        writeln!(f)
    }
}

/// Append-only destination for findings.
pub trait ReportSink {
    fn write_finding(&mut self, finding: &Finding) -> Result<(), ReportError>;

    /// Flushes anything buffered. Called once after the last finding.
    fn finish(&mut self) -> Result<(), ReportError>;
}

/// Writes findings as plain UTF-8 text blocks.
#[derive(Debug)]
pub struct TextReport<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> TextReport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of findings written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl TextReport<BufWriter<File>> {
    /// Creates (or truncates) the report file at `path`.
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let file = File::create(path).map_err(|source| ReportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Opens the report file at `path` for appending, creating it if needed.
    pub fn append(path: &Path) -> Result<Self, ReportError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ReportError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn write_finding(&mut self, finding: &Finding) -> Result<(), ReportError> {
        write!(self.writer, "{}", finding)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.writer.flush()?;
        Ok(())
    }
}
