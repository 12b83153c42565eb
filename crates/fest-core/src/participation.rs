//! Sport-participation diffing.
//!
//! When a team edits its sports list, the stored per-team-per-sport rows are
//! reconciled by diff: rows are inserted for newly selected sports and
//! removed for deselected ones, while rows for unchanged sports are left
//! untouched (keeping their status and `created_at`). The stored rows are
//! never rewritten wholesale.

use crate::sport::Sport;

/// Outcome of reconciling a team's current participation rows against its
/// desired sports list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SportsDiff {
    /// Sports to insert rows for.
    pub added: Vec<Sport>,
    /// Sports whose rows should be removed.
    pub removed: Vec<Sport>,
    /// Sports whose rows stay as they are.
    pub kept: Vec<Sport>,
}

impl SportsDiff {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compute the row changes needed to move from `current` to `desired`.
/// Order within each bucket follows the input order; duplicates in either
/// input are ignored after their first occurrence.
pub fn diff_sports(current: &[Sport], desired: &[Sport]) -> SportsDiff {
    let mut diff = SportsDiff::default();
    for sport in desired {
        if diff.added.contains(sport) || diff.kept.contains(sport) {
            continue;
        }
        if current.contains(sport) {
            diff.kept.push(*sport);
        } else {
            diff.added.push(*sport);
        }
    }
    for sport in current {
        if !desired.contains(sport) && !diff.removed.contains(sport) {
            diff.removed.push(*sport);
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_list_is_noop() {
        let sports = [Sport::Cricket, Sport::Chess];
        let diff = diff_sports(&sports, &sports);
        assert!(diff.is_noop());
        assert_eq!(diff.kept, vec![Sport::Cricket, Sport::Chess]);
    }

    #[test]
    fn partitions_added_removed_kept() {
        let current = [Sport::Cricket, Sport::Futsal, Sport::Ludo];
        let desired = [Sport::Futsal, Sport::Badminton];
        let diff = diff_sports(&current, &desired);
        assert_eq!(diff.added, vec![Sport::Badminton]);
        assert_eq!(diff.removed, vec![Sport::Cricket, Sport::Ludo]);
        assert_eq!(diff.kept, vec![Sport::Futsal]);
    }

    #[test]
    fn duplicates_collapse() {
        let diff = diff_sports(&[], &[Sport::Chess, Sport::Chess]);
        assert_eq!(diff.added, vec![Sport::Chess]);
    }

    #[test]
    fn empty_desired_removes_everything() {
        let diff = diff_sports(&[Sport::Gaming, Sport::Athletics], &[]);
        assert_eq!(diff.removed, vec![Sport::Gaming, Sport::Athletics]);
        assert!(diff.added.is_empty() && diff.kept.is_empty());
    }
}
