//! Team-list export formatting.
//!
//! The CSV column order is fixed and load-bearing: downstream sheets expect
//! `Team Name, Category, City, Institution, Captain Name, Captain Phone,
//! Members Count, Sports, Status` with every cell quoted. Members count
//! includes the captain.

use serde::Serialize;

use crate::sport::Sport;
use crate::team::{TeamCategory, TeamStatus};

pub const CSV_HEADER: &str =
    "\"Team Name\",\"Category\",\"City\",\"Institution\",\"Captain Name\",\"Captain Phone\",\"Members Count\",\"Sports\",\"Status\"";

/// Flattened view of one team as it appears in exports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub team_name: String,
    pub category: TeamCategory,
    pub city: String,
    pub institution: String,
    pub captain_name: String,
    pub captain_phone: String,
    /// Headcount including the captain.
    pub members_count: usize,
    pub sports: Vec<Sport>,
    pub status: TeamStatus,
}

/// Render the team list as CSV, header row included.
pub fn teams_to_csv(teams: &[TeamSummary]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for team in teams {
        let sports = team
            .sports
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join("; ");
        let row = [
            team.team_name.as_str(),
            team.category.as_str(),
            team.city.as_str(),
            team.institution.as_str(),
            team.captain_name.as_str(),
            team.captain_phone.as_str(),
            &team.members_count.to_string(),
            &sports,
            team.status.as_str(),
        ];
        let mut first = true;
        for cell in row {
            if !first {
                out.push(',');
            }
            first = false;
            out.push('"');
            // RFC 4180 quoting: double any embedded quote.
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TeamSummary {
        TeamSummary {
            team_name: "Falcons".to_string(),
            category: TeamCategory::University,
            city: "Lahore".to_string(),
            institution: "Model College".to_string(),
            captain_name: "Ayesha Khan".to_string(),
            captain_phone: "+923001234567".to_string(),
            members_count: 5,
            sports: vec![Sport::Cricket, Sport::TableTennis],
            status: TeamStatus::Approved,
        }
    }

    #[test]
    fn header_column_order_is_fixed() {
        let csv = teams_to_csv(&[]);
        assert_eq!(csv, format!("{CSV_HEADER}\n"));
        assert!(csv.starts_with("\"Team Name\",\"Category\",\"City\""));
    }

    #[test]
    fn rows_are_fully_quoted() {
        let csv = teams_to_csv(&[summary()]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "\"Falcons\",\"university\",\"Lahore\",\"Model College\",\"Ayesha Khan\",\"+923001234567\",\"5\",\"Cricket; Table Tennis\",\"approved\""
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let mut team = summary();
        team.team_name = "The \"A\" Team".to_string();
        let csv = teams_to_csv(&[team]);
        assert!(csv.contains("\"The \"\"A\"\" Team\""));
    }
}
