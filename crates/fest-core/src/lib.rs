//! # fest-core
//!
//! Domain logic for the fest portal: sport and team types, the registration
//! validator, the member roster editor, participation diffing, and export
//! formatting. Everything here is pure — no I/O, no async — so the API
//! service and the CLI share one set of rules.

pub mod export;
pub mod messages;
pub mod participation;
pub mod roster;
pub mod sport;
pub mod team;
pub mod validate;

pub use sport::Sport;
pub use team::{Captain, Member, NewTeam, TeamCategory, TeamStatus};
pub use validate::{RegistrationError, RegistrationForm};
