use slotmap::new_key_type;

new_key_type! {
    /// Stable handle of an [`Atom`](super::atom::Atom) inside a [`MolecularSystem`](super::system::MolecularSystem).
    pub struct AtomId;
    /// Stable handle of a [`Residue`](super::residue::Residue).
    pub struct ResidueId;
    /// Stable handle of a [`Chain`](super::chain::Chain).
    pub struct ChainId;
}
