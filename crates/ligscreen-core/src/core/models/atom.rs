use super::ids::ResidueId;

/// Represents a single atom record of a deposited structure.
///
/// Only the fields needed to judge how well an atom was modelled are kept:
/// its identity, its thermal displacement value (B-factor), its occupancy and
/// the alternate-location label that assigns it to one conformation of a
/// disordered residue. Atoms are immutable once parsed; the owning
/// [`MolecularSystem`](super::system::MolecularSystem) hands out shared
/// references only.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The serial number from the source file.
    pub serial: usize,
    /// The name of the atom (e.g., "C1", "O2").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The isotropic thermal displacement value in square Angstroms.
    pub b_factor: f64,
    /// The fractional occupancy of this atom position.
    pub occupancy: f64,
    /// The alternate-location label, `None` when the atom has a single position.
    pub alt_loc: Option<char>,
    /// The element symbol, if the file provides one.
    pub element: Option<String>,
}

impl Atom {
    /// Creates a new `Atom` with default values for most fields.
    ///
    /// The atom starts fully occupied, without an alternate-location label and
    /// without an element symbol. Other fields can be set afterward.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `b_factor` - The thermal displacement value of the atom.
    pub fn new(name: &str, residue_id: ResidueId, b_factor: f64) -> Self {
        Self {
            serial: 0,
            name: name.to_string(),
            residue_id,
            b_factor,
            occupancy: 1.0,
            alt_loc: None,
            element: None,
        }
    }

    /// Returns this atom with the given alternate-location label.
    pub fn with_alt_loc(mut self, alt_loc: char) -> Self {
        self.alt_loc = Some(alt_loc);
        self
    }

    /// Returns `true` if the atom belongs to one specific conformation.
    pub fn is_alternate(&self) -> bool {
        self.alt_loc.is_some()
    }
}
