use crate::core::io::manifest::normalize_identifier;
use crate::core::io::pdb::{MmcifFile, PdbError, PdbFile};
use crate::core::io::traits::StructureFile;
use crate::core::models::system::MolecularSystem;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

const STRUCTURE_EXTENSIONS: [&str; 3] = ["pdb", "ent", "cif"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("No structure file found for '{id}' in '{}'", .root.display())]
    NotFound { id: String, root: PathBuf },
    #[error("Failed to read structure file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse structure file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PdbError,
    },
    #[error("Structure '{id}' is unavailable: {reason}")]
    Unavailable { id: String, reason: String },
}

impl SourceError {
    /// Returns `true` if the structure was found but could not be parsed.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, SourceError::Parse { .. })
    }
}

/// Supplies parsed structures by identifier.
///
/// Implementations must be shareable across threads because the batch
/// scanner may fetch several identifiers concurrently.
pub trait StructureSource: Sync {
    fn fetch(&self, id: &str) -> Result<MolecularSystem, SourceError>;
}

/// Reads structures from PDB or mmCIF files stored in one local directory.
///
/// For an identifier such as `1ABC` the candidates are, in order,
/// `1ABC.pdb`, `1abc.pdb`, `pdb1abc.ent`, `1abc.ent`, `1ABC.cif` and
/// `1abc.cif`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, id: &str) -> [PathBuf; 6] {
        let upper = id.to_ascii_uppercase();
        let lower = id.to_ascii_lowercase();
        [
            self.root.join(format!("{}.pdb", upper)),
            self.root.join(format!("{}.pdb", lower)),
            self.root.join(format!("pdb{}.ent", lower)),
            self.root.join(format!("{}.ent", lower)),
            self.root.join(format!("{}.cif", upper)),
            self.root.join(format!("{}.cif", lower)),
        ]
    }

    /// Returns the path of the file that would be read for `id`, if any.
    pub fn locate(&self, id: &str) -> Option<PathBuf> {
        self.candidates(id).into_iter().find(|path| path.is_file())
    }

    /// Walks `root` recursively and lists every structure file it contains.
    ///
    /// Returns `(identifier, path)` pairs sorted by identifier. The identifier
    /// is the file stem, with the `pdb` prefix of mirror-style `.ent` names
    /// removed, upper-cased when it is a valid PDB code. When two files map to
    /// the same identifier, the first one in path order wins.
    pub fn discover(root: &Path) -> io::Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        collect_structure_files(root, &mut files)?;
        files.sort();

        let mut entries: Vec<(String, PathBuf)> = Vec::with_capacity(files.len());
        for path in files {
            let Some(id) = identifier_for_path(&path) else {
                continue;
            };
            if entries.iter().any(|(existing, _)| *existing == id) {
                debug!("Ignoring duplicate structure file {:?} for '{}'.", path, id);
                continue;
            }
            entries.push((id, path));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

impl StructureSource for DirectorySource {
    fn fetch(&self, id: &str) -> Result<MolecularSystem, SourceError> {
        let path = self.locate(id).ok_or_else(|| SourceError::NotFound {
            id: id.to_string(),
            root: self.root.clone(),
        })?;
        trace!("Reading '{}' from {:?}", id, path);
        read_structure(&path, id)
    }
}

/// A source over an explicit list of files, as produced by
/// [`DirectorySource::discover`].
#[derive(Debug, Clone, Default)]
pub struct FileListSource {
    files: Vec<(String, PathBuf)>,
}

impl FileListSource {
    pub fn new(files: Vec<(String, PathBuf)>) -> Self {
        Self { files }
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.files.iter().map(|(id, _)| id.clone()).collect()
    }
}

impl StructureSource for FileListSource {
    fn fetch(&self, id: &str) -> Result<MolecularSystem, SourceError> {
        let (_, path) = self
            .files
            .iter()
            .find(|(known, _)| known == id)
            .ok_or_else(|| SourceError::Unavailable {
                id: id.to_string(),
                reason: "not part of the discovered file list".to_string(),
            })?;
        read_structure(path, id)
    }
}

fn read_structure(path: &Path, id: &str) -> Result<MolecularSystem, SourceError> {
    let parsed = if is_mmcif(path) {
        MmcifFile::read_from_path(path)
    } else {
        PdbFile::read_from_path(path)
    };
    let (mut system, _metadata) = parsed.map_err(|e| match e {
        PdbError::Io(source) => SourceError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => SourceError::Parse {
            path: path.to_path_buf(),
            source: other,
        },
    })?;
    if system.identifier().is_none() {
        system.set_identifier(id);
    }
    Ok(system)
}

fn collect_structure_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_structure_files(&path, out)?;
        } else if has_structure_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn has_structure_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            STRUCTURE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn is_mmcif(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cif"))
}

fn identifier_for_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let is_ent = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ent"));
    let stem = match stem.strip_prefix("pdb") {
        Some(rest) if is_ent && !rest.is_empty() => rest,
        _ => stem,
    };
    Some(normalize_identifier(stem).unwrap_or_else(|| stem.to_string()))
}
