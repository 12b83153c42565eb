//! The closed set of sports offered at the fest.
//!
//! Wire names are camelCase to match the stored document shapes
//! (`"tableTennis"`, `"tugOfWar"`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One of the sixteen offered sports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Sport {
    Futsal,
    Cricket,
    Basketball,
    Throwball,
    Volleyball,
    Dodgeball,
    Badminton,
    Chess,
    Ludo,
    Carrom,
    ScavengerHunt,
    Gaming,
    TableTennis,
    Athletics,
    Strongmen,
    TugOfWar,
}

impl Sport {
    /// Every offered sport, in display order.
    pub const ALL: [Sport; 16] = [
        Sport::Futsal,
        Sport::Cricket,
        Sport::Basketball,
        Sport::Throwball,
        Sport::Volleyball,
        Sport::Dodgeball,
        Sport::Badminton,
        Sport::Chess,
        Sport::Ludo,
        Sport::Carrom,
        Sport::ScavengerHunt,
        Sport::Gaming,
        Sport::TableTennis,
        Sport::Athletics,
        Sport::Strongmen,
        Sport::TugOfWar,
    ];

    /// Wire name of the sport.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Futsal => "futsal",
            Sport::Cricket => "cricket",
            Sport::Basketball => "basketball",
            Sport::Throwball => "throwball",
            Sport::Volleyball => "volleyball",
            Sport::Dodgeball => "dodgeball",
            Sport::Badminton => "badminton",
            Sport::Chess => "chess",
            Sport::Ludo => "ludo",
            Sport::Carrom => "carrom",
            Sport::ScavengerHunt => "scavengerHunt",
            Sport::Gaming => "gaming",
            Sport::TableTennis => "tableTennis",
            Sport::Athletics => "athletics",
            Sport::Strongmen => "strongmen",
            Sport::TugOfWar => "tugOfWar",
        }
    }

    /// Parse a wire name. Returns `None` for unknown sports.
    pub fn parse(s: &str) -> Option<Sport> {
        Sport::ALL.iter().copied().find(|sport| sport.as_str() == s)
    }

    /// Human-readable label for display surfaces and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Sport::Futsal => "Futsal",
            Sport::Cricket => "Cricket",
            Sport::Basketball => "Basketball",
            Sport::Throwball => "Throwball",
            Sport::Volleyball => "Volleyball",
            Sport::Dodgeball => "Dodgeball",
            Sport::Badminton => "Badminton",
            Sport::Chess => "Chess",
            Sport::Ludo => "Ludo",
            Sport::Carrom => "Carrom",
            Sport::ScavengerHunt => "Scavenger Hunt",
            Sport::Gaming => "Gaming",
            Sport::TableTennis => "Table Tennis",
            Sport::Athletics => "Athletics",
            Sport::Strongmen => "Strongmen",
            Sport::TugOfWar => "Tug of War",
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for sport in Sport::ALL {
            assert_eq!(Sport::parse(sport.as_str()), Some(sport));
        }
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_string(&Sport::TableTennis).unwrap();
        assert_eq!(json, "\"tableTennis\"");
        let back: Sport = serde_json::from_str("\"tugOfWar\"").unwrap();
        assert_eq!(back, Sport::TugOfWar);
    }

    #[test]
    fn unknown_sport_rejected() {
        assert_eq!(Sport::parse("handball"), None);
        assert!(serde_json::from_str::<Sport>("\"handball\"").is_err());
    }
}
