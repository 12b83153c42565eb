//! API route modules, one per resource.

pub mod activity;
pub mod admin;
pub mod auth;
pub mod events;
pub mod participation;
pub mod results;
pub mod teams;
pub mod watch;
