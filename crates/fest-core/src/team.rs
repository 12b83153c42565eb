//! Team-side domain types: categories, statuses, captain and member shapes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::sport::Sport;

/// Maximum sports a single member may enter.
pub const MEMBER_SPORT_CAP: usize = 3;

/// Team category. Determines the member cap enforced at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeamCategory {
    University,
    College,
    School,
    Club,
    Corporate,
    Amateur,
}

impl TeamCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamCategory::University => "university",
            TeamCategory::College => "college",
            TeamCategory::School => "school",
            TeamCategory::Club => "club",
            TeamCategory::Corporate => "corporate",
            TeamCategory::Amateur => "amateur",
        }
    }

    pub fn parse(s: &str) -> Option<TeamCategory> {
        match s {
            "university" => Some(TeamCategory::University),
            "college" => Some(TeamCategory::College),
            "school" => Some(TeamCategory::School),
            "club" => Some(TeamCategory::Club),
            "corporate" => Some(TeamCategory::Corporate),
            "amateur" => Some(TeamCategory::Amateur),
            _ => None,
        }
    }

    /// Maximum member rows for this category, captain excluded.
    pub fn member_cap(&self) -> usize {
        match self {
            TeamCategory::University | TeamCategory::College => 15,
            TeamCategory::School => 10,
            TeamCategory::Club | TeamCategory::Corporate => 20,
            TeamCategory::Amateur => 12,
        }
    }
}

impl std::fmt::Display for TeamCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a registered team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    Pending,
    Approved,
    Rejected,
    Disqualified,
}

impl TeamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamStatus::Pending => "pending",
            TeamStatus::Approved => "approved",
            TeamStatus::Rejected => "rejected",
            TeamStatus::Disqualified => "disqualified",
        }
    }

    pub fn parse(s: &str) -> Option<TeamStatus> {
        match s {
            "pending" => Some(TeamStatus::Pending),
            "approved" => Some(TeamStatus::Approved),
            "rejected" => Some(TeamStatus::Rejected),
            "disqualified" => Some(TeamStatus::Disqualified),
            _ => None,
        }
    }
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team captain / head delegate contact details.
///
/// Phone is stored normalized (`+923XXXXXXXXX`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Captain {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub cnic: String,
}

/// One team member.
///
/// `id` is assigned when the row is created and never changes; display
/// position is presentation only and must not be used as identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub cnic: String,
    pub sports: Vec<Sport>,
}

/// Normalized output of the registration validator: a team record ready for
/// persistence, with phones normalized and all rules already enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub team_name: String,
    pub institution: String,
    pub city: String,
    pub category: TeamCategory,
    pub captain: Captain,
    pub members: Vec<Member>,
    pub sports: Vec<Sport>,
}

impl NewTeam {
    /// Total headcount, captain included.
    pub fn participant_count(&self) -> usize {
        self.members.len() + 1
    }
}
