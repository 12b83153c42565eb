//! Member roster editing.
//!
//! Backs the dynamic member list on the registration and team-edit forms.
//! Every row gets a stable id at creation; display numbering is derived from
//! position and is never used as identity, so removing a row leaves the
//! other rows' ids untouched.

use thiserror::Error;
use uuid::Uuid;

use crate::sport::Sport;
use crate::team::{Member, TeamCategory, MEMBER_SPORT_CAP};

/// A rejected roster operation. The roster is unchanged when one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("Maximum {cap} members allowed for the {category} category")]
    AtCapacity { category: TeamCategory, cap: usize },
    #[error("A member may enter at most {MEMBER_SPORT_CAP} sports")]
    SportLimit,
    #[error("No such member row")]
    NoSuchRow,
}

/// An ordered, editable list of member rows for one team category.
#[derive(Debug, Clone)]
pub struct RosterEditor {
    category: TeamCategory,
    rows: Vec<Member>,
}

impl RosterEditor {
    pub fn new(category: TeamCategory) -> Self {
        Self {
            category,
            rows: Vec::new(),
        }
    }

    /// Rebuild an editor over an existing roster, keeping the stored ids.
    pub fn from_members(category: TeamCategory, rows: Vec<Member>) -> Self {
        Self { category, rows }
    }

    pub fn category(&self) -> TeamCategory {
        self.category
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append an empty row and return its stable id. Refused at the
    /// category cap; nothing is created on refusal.
    pub fn add_row(&mut self) -> Result<Uuid, RosterError> {
        let cap = self.category.member_cap();
        if self.rows.len() >= cap {
            return Err(RosterError::AtCapacity {
                category: self.category,
                cap,
            });
        }
        let id = Uuid::new_v4();
        self.rows.push(Member {
            id,
            name: String::new(),
            phone: String::new(),
            cnic: String::new(),
            sports: Vec::new(),
        });
        Ok(id)
    }

    /// Remove a row by stable id. Remaining rows keep their ids; only the
    /// display numbering (row position) shifts.
    pub fn remove_row(&mut self, id: Uuid) -> Result<Member, RosterError> {
        let index = self
            .rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(RosterError::NoSuchRow)?;
        Ok(self.rows.remove(index))
    }

    /// Flip a sport on one row: deselect it if present, otherwise select it.
    /// A selection that would exceed the per-member cap is refused and the
    /// row is left unchanged.
    pub fn toggle_sport(&mut self, id: Uuid, sport: Sport) -> Result<(), RosterError> {
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RosterError::NoSuchRow)?;
        if let Some(index) = row.sports.iter().position(|s| *s == sport) {
            row.sports.remove(index);
            return Ok(());
        }
        if row.sports.len() >= MEMBER_SPORT_CAP {
            return Err(RosterError::SportLimit);
        }
        row.sports.push(sport);
        Ok(())
    }

    /// Mutable access to one row's text fields.
    pub fn row_mut(&mut self, id: Uuid) -> Option<&mut Member> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    /// One-based display position of a row.
    pub fn display_position(&self, id: Uuid) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id).map(|i| i + 1)
    }

    /// The current rows, exactly as they would be handed to the validator.
    pub fn members(&self) -> &[Member] {
        &self.rows
    }

    pub fn into_members(self) -> Vec<Member> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejected_at_category_cap() {
        let mut editor = RosterEditor::new(TeamCategory::School);
        for _ in 0..10 {
            editor.add_row().expect("under cap");
        }
        let err = editor.add_row().unwrap_err();
        assert_eq!(
            err,
            RosterError::AtCapacity {
                category: TeamCategory::School,
                cap: 10
            }
        );
        assert_eq!(editor.len(), 10);
    }

    #[test]
    fn removal_keeps_other_ids_and_shifts_display_positions() {
        let mut editor = RosterEditor::new(TeamCategory::Club);
        let first = editor.add_row().unwrap();
        let second = editor.add_row().unwrap();
        let third = editor.add_row().unwrap();

        editor.remove_row(second).unwrap();

        assert_eq!(editor.display_position(first), Some(1));
        assert_eq!(editor.display_position(third), Some(2));
        let ids: Vec<Uuid> = editor.members().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![first, third]);
        assert_eq!(editor.remove_row(second), Err(RosterError::NoSuchRow));
    }

    #[test]
    fn fourth_sport_refused_and_selection_unchanged() {
        let mut editor = RosterEditor::new(TeamCategory::University);
        let id = editor.add_row().unwrap();
        for sport in [Sport::Cricket, Sport::Futsal, Sport::Chess] {
            editor.toggle_sport(id, sport).unwrap();
        }
        assert_eq!(editor.toggle_sport(id, Sport::Ludo), Err(RosterError::SportLimit));
        assert_eq!(
            editor.members()[0].sports,
            vec![Sport::Cricket, Sport::Futsal, Sport::Chess]
        );

        // Deselecting one then selecting another lands exactly at the cap.
        editor.toggle_sport(id, Sport::Futsal).unwrap();
        editor.toggle_sport(id, Sport::Ludo).unwrap();
        assert_eq!(editor.members()[0].sports.len(), 3);
    }

    #[test]
    fn snapshot_matches_rows() {
        let mut editor = RosterEditor::new(TeamCategory::Amateur);
        let id = editor.add_row().unwrap();
        let row = editor.row_mut(id).unwrap();
        row.name = "Bilal".to_string();
        row.phone = "03001234567".to_string();
        assert_eq!(editor.members().len(), 1);
        assert_eq!(editor.members()[0].name, "Bilal");
    }
}
