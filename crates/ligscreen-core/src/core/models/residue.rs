use super::ids::{AtomId, ChainId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub residue_number: isize,          // Residue sequence number from source file
    pub insertion_code: Option<char>,   // Insertion code distinguishing repeated numbers
    pub name: String,                   // Three-letter component code (e.g., "MPD")
    pub chain_id: ChainId,              // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>,      // Atoms in file order
}

impl Residue {
    pub(crate) fn new(
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
        chain_id: ChainId,
    ) -> Self {
        Self {
            residue_number,
            insertion_code,
            name: name.to_string(),
            chain_id,
            atoms: Vec::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_id: AtomId) {
        self.atoms.push(atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    /// Returns `true` if the residue's component code is one of `codes`.
    ///
    /// Codes are compared case-insensitively after trimming.
    pub fn matches_any<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        let name = self.name.trim();
        codes
            .iter()
            .any(|code| code.as_ref().trim().eq_ignore_ascii_case(name))
    }
}
