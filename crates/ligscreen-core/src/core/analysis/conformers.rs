use crate::core::models::atom::Atom;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Decides what happens to atoms without an alternate-location label when the
/// residue they belong to is disordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UntaggedAtomPolicy {
    /// Untagged atoms are common to all conformations and join every group.
    #[default]
    Shared,
    /// Untagged atoms are left out of every group.
    Ignore,
}

impl FromStr for UntaggedAtomPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shared" | "both" => Ok(UntaggedAtomPolicy::Shared),
            "ignore" | "ignored" | "exclude" => Ok(UntaggedAtomPolicy::Ignore),
            _ => Err(()),
        }
    }
}

impl fmt::Display for UntaggedAtomPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UntaggedAtomPolicy::Shared => "shared",
            UntaggedAtomPolicy::Ignore => "ignore",
        })
    }
}

/// A non-owning view over the atoms of one conformation of a residue.
///
/// For an ordered residue there is a single group without a label that holds
/// every atom.
#[derive(Debug, Clone, PartialEq)]
pub struct ConformerGroup<'a> {
    label: Option<char>,
    atoms: Vec<&'a Atom>,
}

impl<'a> ConformerGroup<'a> {
    /// The alternate-location label, or `None` for an ordered residue.
    pub fn label(&self) -> Option<char> {
        self.label
    }

    pub fn atoms(&self) -> &[&'a Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn b_factors(&self) -> impl Iterator<Item = f64> + '_ {
        self.atoms.iter().map(|atom| atom.b_factor)
    }
}

/// Returns `true` if any atom carries an alternate-location label.
pub fn has_alt_conformers(atoms: &[&Atom]) -> bool {
    atoms.iter().any(|atom| atom.is_alternate())
}

/// Partitions residue atoms into independently evaluated conformer groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConformerResolver {
    policy: UntaggedAtomPolicy,
}

impl ConformerResolver {
    pub fn new(policy: UntaggedAtomPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UntaggedAtomPolicy {
        self.policy
    }

    /// Resolves the conformer groups of one residue.
    ///
    /// An ordered residue yields one unlabelled group with all atoms. A
    /// disordered residue yields one group per distinct label, in label order;
    /// atoms with a label belong to exactly one group, atoms without one are
    /// handled according to the [`UntaggedAtomPolicy`]. Atom order inside each
    /// group follows the input order.
    pub fn resolve<'a>(&self, atoms: &[&'a Atom]) -> Vec<ConformerGroup<'a>> {
        if !has_alt_conformers(atoms) {
            return vec![ConformerGroup {
                label: None,
                atoms: atoms.to_vec(),
            }];
        }

        let labels: BTreeSet<char> = atoms.iter().filter_map(|atom| atom.alt_loc).collect();

        labels
            .into_iter()
            .map(|label| ConformerGroup {
                label: Some(label),
                atoms: atoms
                    .iter()
                    .copied()
                    .filter(|atom| match atom.alt_loc {
                        Some(tag) => tag == label,
                        None => self.policy == UntaggedAtomPolicy::Shared,
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ResidueId;
    use std::collections::HashSet;

    fn atom(name: &str, b: f64, alt: Option<char>) -> Atom {
        let mut atom = Atom::new(name, ResidueId::default(), b);
        atom.alt_loc = alt;
        atom
    }

    fn names(group: &ConformerGroup) -> Vec<String> {
        group.atoms().iter().map(|a| a.name.clone()).collect()
    }

    #[test]
    fn ordered_residue_yields_single_group_with_every_atom() {
        let atoms = [
            atom("C1", 10.0, None),
            atom("C2", 11.0, None),
            atom("O2", 12.0, None),
        ];
        let refs: Vec<&Atom> = atoms.iter().collect();

        let groups = ConformerResolver::default().resolve(&refs);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label(), None);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(names(&groups[0]), vec!["C1", "C2", "O2"]);
    }

    #[test]
    fn ordered_residue_group_is_independent_of_input_order() {
        let atoms = [atom("C1", 10.0, None), atom("C2", 11.0, None)];
        let forward: Vec<&Atom> = atoms.iter().collect();
        let backward: Vec<&Atom> = atoms.iter().rev().collect();

        let resolver = ConformerResolver::default();
        let a: HashSet<_> = names(&resolver.resolve(&forward)[0]).into_iter().collect();
        let b: HashSet<_> = names(&resolver.resolve(&backward)[0]).into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn disordered_residue_yields_disjoint_groups_covering_all_atoms() {
        let atoms = [
            atom("C1", 50.0, Some('A')),
            atom("C1", 20.0, Some('B')),
            atom("O2", 52.0, Some('A')),
            atom("O2", 21.0, Some('B')),
        ];
        let refs: Vec<&Atom> = atoms.iter().collect();

        let groups = ConformerResolver::default().resolve(&refs);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label(), Some('A'));
        assert_eq!(groups[1].label(), Some('B'));
        assert!(groups[0].atoms().iter().all(|a| a.alt_loc == Some('A')));
        assert!(groups[1].atoms().iter().all(|a| a.alt_loc == Some('B')));
        assert_eq!(groups[0].len() + groups[1].len(), atoms.len());
        assert_eq!(groups[0].b_factors().collect::<Vec<_>>(), vec![50.0, 52.0]);
    }

    #[test]
    fn labels_are_sorted_regardless_of_file_order() {
        let atoms = [atom("C1", 20.0, Some('B')), atom("C1", 50.0, Some('A'))];
        let refs: Vec<&Atom> = atoms.iter().collect();
        let labels: Vec<_> = ConformerResolver::default()
            .resolve(&refs)
            .iter()
            .map(|g| g.label())
            .collect();
        assert_eq!(labels, vec![Some('A'), Some('B')]);
    }

    #[test]
    fn untagged_atoms_are_shared_by_default() {
        let atoms = [
            atom("C1", 50.0, Some('A')),
            atom("C1", 20.0, Some('B')),
            atom("O4", 30.0, None),
        ];
        let refs: Vec<&Atom> = atoms.iter().collect();

        let groups = ConformerResolver::new(UntaggedAtomPolicy::Shared).resolve(&refs);

        assert_eq!(groups.len(), 2);
        for group in &groups {
            assert_eq!(group.len(), 2);
            assert!(group.atoms().iter().any(|a| a.name == "O4"));
        }
    }

    #[test]
    fn untagged_atoms_can_be_ignored() {
        let atoms = [
            atom("C1", 50.0, Some('A')),
            atom("C1", 20.0, Some('B')),
            atom("O4", 30.0, None),
        ];
        let refs: Vec<&Atom> = atoms.iter().collect();

        let groups = ConformerResolver::new(UntaggedAtomPolicy::Ignore).resolve(&refs);

        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.len() == 1));
        assert!(
            groups
                .iter()
                .all(|g| g.atoms().iter().all(|a| a.name != "O4"))
        );
    }

    #[test]
    fn single_label_yields_single_labelled_group() {
        let atoms = [atom("C1", 50.0, Some('A')), atom("O2", 30.0, None)];
        let refs: Vec<&Atom> = atoms.iter().collect();
        let groups = ConformerResolver::default().resolve(&refs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label(), Some('A'));
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn resolving_does_not_modify_atoms() {
        let atoms = [atom("C1", 50.0, Some('A')), atom("C1", 20.0, Some('B'))];
        let before = atoms.clone();
        let refs: Vec<&Atom> = atoms.iter().collect();
        let _ = ConformerResolver::default().resolve(&refs);
        assert_eq!(atoms, before);
    }

    #[test]
    fn policy_parses_from_str_case_insensitively() {
        assert_eq!(
            UntaggedAtomPolicy::from_str("Shared"),
            Ok(UntaggedAtomPolicy::Shared)
        );
        assert_eq!(
            UntaggedAtomPolicy::from_str("IGNORE"),
            Ok(UntaggedAtomPolicy::Ignore)
        );
        assert_eq!(UntaggedAtomPolicy::from_str("maybe"), Err(()));
        assert_eq!(UntaggedAtomPolicy::Ignore.to_string(), "ignore");
    }
}
