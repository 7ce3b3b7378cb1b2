use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::system::MolecularSystem;
use pdbtbx::{Format, PDB, ReadOptions, StrictnessLevel};
use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, BufReader};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    /// The entry ID (`HEADER` id code or mmCIF `_entry.id`), upper-cased.
    pub id_code: Option<String>,
    /// Number of non-fatal problems the parser reported.
    pub warnings: usize,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {}", .messages.join("; "))]
    Parse { messages: Vec<String> },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

/// Reader for the legacy PDB coordinate format.
pub struct PdbFile;

/// Reader for the PDBx/mmCIF format.
pub struct MmcifFile;

impl StructureFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        read_with_format(reader, Format::Pdb)
    }
}

impl StructureFile for MmcifFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        read_with_format(reader, Format::Mmcif)
    }
}

fn read_with_format(
    reader: &mut impl BufRead,
    format: Format,
) -> Result<(MolecularSystem, PdbMetadata), PdbError> {
    let (pdb, warnings) = ReadOptions::new()
        .set_format(format)
        .set_level(StrictnessLevel::Loose)
        .set_only_first_model(true)
        .read_raw(BufReader::new(reader))
        .map_err(|errors| PdbError::Parse {
            messages: errors
                .iter()
                .map(|e| e.short_description().to_string())
                .collect(),
        })?;
    for warning in &warnings {
        trace!("Parser warning: {}", warning.short_description());
    }

    let mut system = convert(&pdb)?;
    let metadata = PdbMetadata {
        id_code: pdb
            .identifier
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_ascii_uppercase),
        warnings: warnings.len(),
    };

    if system.atom_count() == 0 {
        return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
    }
    if let Some(id_code) = &metadata.id_code {
        system.set_identifier(id_code.clone());
    }
    debug!(
        "Read {} atoms in {} residues (id: {:?}, {} parser warnings).",
        system.atom_count(),
        system.residue_count(),
        metadata.id_code,
        metadata.warnings
    );
    Ok((system, metadata))
}

/// Copies the first model of a parsed entry into a [`MolecularSystem`].
///
/// Each conformer becomes part of the residue named after it, so two
/// components sharing one chain position stay separate. An atom listed under
/// several conformers of the same component is stored once without a label.
fn convert(pdb: &PDB) -> Result<MolecularSystem, PdbError> {
    let mut system = MolecularSystem::new();
    let Some(model) = pdb.models().next() else {
        return Ok(system);
    };

    for chain in model.chains() {
        let chain_char = chain.id().trim().chars().next().unwrap_or(' ');
        let chain_id = system.add_chain(chain_char);

        for residue in chain.residues() {
            let residue_number = residue.serial_number();
            let insertion_code = residue
                .insertion_code()
                .and_then(|code| code.trim().chars().next());

            let mut listings: HashMap<(&str, usize, &str), usize> = HashMap::new();
            for conformer in residue.conformers() {
                for atom in conformer.atoms() {
                    *listings
                        .entry((conformer.name(), atom.serial_number(), atom.name()))
                        .or_default() += 1;
                }
            }

            let mut placed: HashSet<(&str, usize, &str)> = HashSet::new();
            for conformer in residue.conformers() {
                let name = conformer.name();
                let alt_loc = conformer
                    .alternative_location()
                    .and_then(|label| label.trim().chars().next());
                let residue_id = system
                    .add_residue(chain_id, residue_number, insertion_code, name)
                    .ok_or_else(|| PdbError::MissingRecord(format!("chain '{}'", chain_char)))?;

                for atom in conformer.atoms() {
                    let key = (name, atom.serial_number(), atom.name());
                    if !placed.insert(key) {
                        continue;
                    }
                    let shared = listings.get(&key).copied().unwrap_or(1) > 1;

                    let mut record = Atom::new(atom.name(), residue_id, atom.b_factor());
                    record.serial = atom.serial_number();
                    record.occupancy = atom.occupancy();
                    record.alt_loc = if shared { None } else { alt_loc };
                    record.element = atom.element().map(|e| e.symbol().to_string());

                    system.add_atom_to_residue(residue_id, record).ok_or_else(|| {
                        PdbError::MissingRecord(format!("residue {} {}", name, residue_number))
                    })?;
                }
            }
        }
    }

    Ok(system)
}
