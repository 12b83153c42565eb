//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. Every collection lives in an explicit [`Store`]
//! owned by [`AppState`] — there is no module-level mutable state anywhere
//! in the service, so every read and write goes through one place.
//!
//! When a Postgres pool is configured the stores are hydrated from it at
//! startup and writes are mirrored back; the in-memory stores remain the
//! source of truth for reads.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fest_core::export::TeamSummary;
use fest_core::participation::diff_sports;
use fest_core::sport::Sport;
use fest_core::team::{Captain, Member, TeamCategory, TeamStatus};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Role;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across an `.await` point.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if
    /// not found.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(id) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Atomically read-validate-update a record under a single write lock,
    /// eliminating TOCTOU races between the precondition check and the
    /// mutation. Returns `None` if the record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Run a closure with exclusive access to the whole map, for
    /// multi-record reconciliations that must observe and mutate the
    /// collection under a single lock.
    pub fn with_map<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    /// Remove every record the predicate selects, returning the removed
    /// records. Runs under one write lock.
    pub fn remove_where(&self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        let mut guard = self.data.write();
        let ids: Vec<Uuid> = guard
            .iter()
            .filter(|(_, v)| pred(v))
            .map(|(k, _)| *k)
            .collect();
        ids.iter().filter_map(|id| guard.remove(id)).collect()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Record Types -------------------------------------------------------------

/// A portal account.
///
/// `password_hash` is a PHC-formatted Argon2id string and is never included
/// in any API response; route handlers return view DTOs instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub permissions: Vec<String>,
}

/// A registered team. The record id equals the owning user's id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub id: Uuid,
    pub team_name: String,
    pub institution: String,
    pub city: String,
    pub category: TeamCategory,
    pub captain: Captain,
    pub members: Vec<Member>,
    pub sports: Vec<Sport>,
    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamRecord {
    /// Headcount including the captain.
    pub fn participant_count(&self) -> usize {
        self.members.len() + 1
    }

    /// Flattened export/summary view.
    pub fn summary(&self) -> TeamSummary {
        TeamSummary {
            team_name: self.team_name.clone(),
            category: self.category,
            city: self.city.clone(),
            institution: self.institution.clone(),
            captain_name: self.captain.name.clone(),
            captain_phone: self.captain.phone.clone(),
            members_count: self.participant_count(),
            sports: self.sports.clone(),
            status: self.status,
        }
    }
}

/// Event lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upcoming" => Some(Self::Upcoming),
            "ongoing" => Some(Self::Ongoing),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default cap on participating teams per event.
pub const DEFAULT_MAX_TEAMS: u32 = 16;

/// A scheduled fest event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: Uuid,
    pub name: String,
    pub sport: Sport,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub venue: String,
    pub description: String,
    pub max_teams: u32,
    pub status: EventStatus,
    pub participating_teams: Vec<Uuid>,
}

/// Result record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Final,
    Provisional,
    Disqualified,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Final => "final",
            Self::Provisional => "provisional",
            Self::Disqualified => "disqualified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "final" => Some(Self::Final),
            "provisional" => Some(Self::Provisional),
            "disqualified" => Some(Self::Disqualified),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded match/competition result for one team in one sport.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub team_name: String,
    pub sport: Sport,
    pub score: String,
    pub position: Option<u32>,
    pub date: DateTime<Utc>,
    pub status: ResultStatus,
    pub notes: Option<String>,
}

/// Participation row status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    Registered,
    Active,
    Completed,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "registered" => Some(Self::Registered),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One team-sport participation row. Exactly one row exists per pair;
/// [`AppState::reconcile_participation`] is the only writer, so rows for
/// unchanged sports keep their status and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub team_name: String,
    pub sport: Sport,
    pub status: ParticipationStatus,
    pub created_at: DateTime<Utc>,
}

/// Rows inserted and removed by one participation reconcile.
#[derive(Debug, Default)]
pub struct ParticipationSync {
    pub added: Vec<ParticipationRecord>,
    pub removed: Vec<ParticipationRecord>,
}

/// Which audience an activity entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityScope {
    Admin,
    Team,
}

impl ActivityScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Team => "team",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "team" => Some(Self::Team),
            _ => None,
        }
    }
}

/// Kind of activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    // Admin feed
    TeamRegistered,
    EventCreated,
    ResultUpdated,
    TeamDeleted,
    EventDeleted,
    // Team feed
    Registration,
    SportAdded,
    Payment,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TeamRegistered => "team_registered",
            Self::EventCreated => "event_created",
            Self::ResultUpdated => "result_updated",
            Self::TeamDeleted => "team_deleted",
            Self::EventDeleted => "event_deleted",
            Self::Registration => "registration",
            Self::SportAdded => "sport_added",
            Self::Payment => "payment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "team_registered" => Some(Self::TeamRegistered),
            "event_created" => Some(Self::EventCreated),
            "result_updated" => Some(Self::ResultUpdated),
            "team_deleted" => Some(Self::TeamDeleted),
            "event_deleted" => Some(Self::EventDeleted),
            "registration" => Some(Self::Registration),
            "sport_added" => Some(Self::SportAdded),
            "payment" => Some(Self::Payment),
            _ => None,
        }
    }
}

/// Append-only activity-feed entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: Uuid,
    pub scope: ActivityScope,
    pub kind: ActivityKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

/// An issued bearer session. Keyed by the token itself.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// -- Change Feed --------------------------------------------------------------

/// Stored collection names, as used in change notices and the watch filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    Teams,
    Events,
    Results,
    SportsParticipation,
    Activity,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Teams => "teams",
            Self::Events => "events",
            Self::Results => "results",
            Self::SportsParticipation => "sports_participation",
            Self::Activity => "activity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "users" => Some(Self::Users),
            "teams" => Some(Self::Teams),
            "events" => Some(Self::Events),
            "results" => Some(Self::Results),
            "sports_participation" => Some(Self::SportsParticipation),
            "activity" => Some(Self::Activity),
            _ => None,
        }
    }
}

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Created,
    Updated,
    Deleted,
}

/// One change-feed notice, pushed to `/v1/watch` subscribers. Best-effort:
/// a lagging subscriber drops notices rather than blocking writers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNotice {
    pub collection: Collection,
    pub id: Uuid,
    pub op: ChangeOp,
}

// -- Configuration ------------------------------------------------------------

/// Service configuration, collected from the environment.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Static operator bearer token. `None` leaves only user sessions.
    pub admin_token: Option<String>,
    /// When set, every request runs as an admin. Local development only.
    pub auth_disabled: bool,
    pub database_url: Option<String>,
    pub rate_limit_max_requests: u64,
    pub rate_limit_window_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            admin_token: None,
            auth_disabled: false,
            database_url: None,
            rate_limit_max_requests: 1000,
            rate_limit_window_secs: 60,
        }
    }
}

impl AppConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
            admin_token: std::env::var("FEST_ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            auth_disabled: std::env::var("FEST_AUTH_DISABLED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            database_url: std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
            rate_limit_max_requests: std::env::var("FEST_RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.rate_limit_max_requests),
            rate_limit_window_secs: std::env::var("FEST_RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.rate_limit_window_secs),
        }
    }
}

// Redact secrets; the config is logged at startup.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "admin_token",
                &self.admin_token.as_ref().map(|_| "<redacted>"),
            )
            .field("auth_disabled", &self.auth_disabled)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "<redacted>"),
            )
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .finish()
    }
}

// -- Application State --------------------------------------------------------

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Cloneable handle to every store and shared service resource.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Store<UserRecord>,
    pub teams: Store<TeamRecord>,
    pub events: Store<EventRecord>,
    pub results: Store<ResultRecord>,
    pub participation: Store<ParticipationRecord>,
    pub activity: Store<ActivityRecord>,
    pub sessions: Store<SessionRecord>,
    pub pool: Option<PgPool>,
    changes: broadcast::Sender<ChangeNotice>,
}

impl AppState {
    /// Memory-only state.
    pub fn new(config: AppConfig) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            users: Store::new(),
            teams: Store::new(),
            events: Store::new(),
            results: Store::new(),
            participation: Store::new(),
            activity: Store::new(),
            sessions: Store::new(),
            pool: None,
            changes,
        }
    }

    /// Connect per the configuration: if `DATABASE_URL` is set, open the
    /// pool, run migrations, and hydrate every store from the database.
    pub async fn connect(config: AppConfig) -> anyhow::Result<Self> {
        let pool = match &config.database_url {
            Some(url) => Some(crate::db::init_pool(url).await?),
            None => None,
        };
        let mut state = Self::new(config);
        state.pool = pool;
        if state.pool.is_some() {
            state.hydrate_from_db().await?;
        }
        Ok(state)
    }

    /// Load every collection from the database into the stores.
    pub async fn hydrate_from_db(&self) -> anyhow::Result<()> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };
        for user in crate::db::users::load_all(pool).await? {
            self.users.insert(user.id, user);
        }
        for team in crate::db::teams::load_all(pool).await? {
            self.teams.insert(team.id, team);
        }
        for event in crate::db::events::load_all(pool).await? {
            self.events.insert(event.id, event);
        }
        for result in crate::db::results::load_all(pool).await? {
            self.results.insert(result.id, result);
        }
        for row in crate::db::participation::load_all(pool).await? {
            self.participation.insert(row.id, row);
        }
        for entry in crate::db::activity::load_all(pool).await? {
            self.activity.insert(entry.id, entry);
        }
        tracing::info!(
            users = self.users.len(),
            teams = self.teams.len(),
            events = self.events.len(),
            results = self.results.len(),
            participation = self.participation.len(),
            activity = self.activity.len(),
            "hydrated stores from database"
        );
        Ok(())
    }

    /// Publish a change notice. Dropped silently when nobody is watching.
    pub fn notify(&self, collection: Collection, id: Uuid, op: ChangeOp) {
        let _ = self.changes.send(ChangeNotice { collection, id, op });
    }

    /// Subscribe to the change feed.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.changes.subscribe()
    }

    /// Reconcile a team's participation rows against its desired sports
    /// list under one write lock.
    ///
    /// The diff is taken against the rows actually in the store, never a
    /// caller-supplied baseline, so replayed or interleaved edits cannot
    /// produce a second row for the same team-sport pair. Rows for
    /// unchanged sports keep their id, status, and `created_at`; their
    /// `team_name` is refreshed in case the team was renamed.
    pub fn reconcile_participation(
        &self,
        team_id: Uuid,
        team_name: &str,
        desired: &[Sport],
        now: DateTime<Utc>,
    ) -> ParticipationSync {
        self.participation.with_map(|rows| {
            let current: Vec<Sport> = rows
                .values()
                .filter(|row| row.team_id == team_id)
                .map(|row| row.sport)
                .collect();
            let diff = diff_sports(&current, desired);

            let mut sync = ParticipationSync::default();
            let doomed: Vec<Uuid> = rows
                .values()
                .filter(|row| row.team_id == team_id && diff.removed.contains(&row.sport))
                .map(|row| row.id)
                .collect();
            for id in doomed {
                if let Some(row) = rows.remove(&id) {
                    sync.removed.push(row);
                }
            }
            for row in rows.values_mut().filter(|row| row.team_id == team_id) {
                row.team_name = team_name.to_string();
            }
            for sport in diff.added {
                let row = ParticipationRecord {
                    id: Uuid::new_v4(),
                    team_id,
                    team_name: team_name.to_string(),
                    sport,
                    status: ParticipationStatus::Registered,
                    created_at: now,
                };
                rows.insert(row.id, row.clone());
                sync.added.push(row);
            }
            sync
        })
    }

    /// Case-insensitive account lookup.
    pub fn user_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users
            .list()
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }

    /// Append an activity entry, publish the change, and mirror it to the
    /// database when one is configured. Activity is display-only, so a
    /// failed mirror write is logged and not surfaced.
    pub async fn record_activity(
        &self,
        scope: ActivityScope,
        kind: ActivityKind,
        description: impl Into<String>,
        team_id: Option<Uuid>,
    ) -> ActivityRecord {
        let entry = ActivityRecord {
            id: Uuid::new_v4(),
            scope,
            kind,
            description: description.into(),
            team_id,
            timestamp: Utc::now(),
        };
        self.activity.insert(entry.id, entry.clone());
        self.notify(Collection::Activity, entry.id, ChangeOp::Created);
        if let Some(pool) = &self.pool {
            if let Err(err) = crate::db::activity::insert(pool, &entry).await {
                tracing::warn!(error = %err, activity_id = %entry.id, "failed to mirror activity entry");
            }
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team_record() -> TeamRecord {
        TeamRecord {
            id: Uuid::new_v4(),
            team_name: "Falcons".to_string(),
            institution: "Model College".to_string(),
            city: "Lahore".to_string(),
            category: TeamCategory::University,
            captain: Captain {
                name: "Ayesha Khan".to_string(),
                email: "ayesha@example.com".to_string(),
                phone: "+923001234567".to_string(),
                cnic: "35202-1234567-8".to_string(),
            },
            members: vec![],
            sports: vec![Sport::Cricket],
            status: TeamStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn store_insert_get_update_remove() {
        let store: Store<TeamRecord> = Store::new();
        let team = team_record();
        let id = team.id;
        assert!(store.insert(id, team).is_none());
        assert!(store.contains(&id));

        let updated = store
            .update(&id, |t| t.status = TeamStatus::Approved)
            .unwrap();
        assert_eq!(updated.status, TeamStatus::Approved);

        assert!(store.remove(&id).is_some());
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn try_update_propagates_closure_result() {
        let store: Store<TeamRecord> = Store::new();
        let team = team_record();
        let id = team.id;
        store.insert(id, team);

        let outcome: Option<Result<(), String>> = store.try_update(&id, |t| {
            if t.status == TeamStatus::Pending {
                t.status = TeamStatus::Approved;
                Ok(())
            } else {
                Err("already decided".to_string())
            }
        });
        assert_eq!(outcome, Some(Ok(())));

        let outcome: Option<Result<(), String>> =
            store.try_update(&id, |_| Err("already decided".to_string()));
        assert_eq!(outcome, Some(Err("already decided".to_string())));

        let missing: Option<Result<(), String>> =
            store.try_update(&Uuid::new_v4(), |_| Ok(()));
        assert!(missing.is_none());
    }

    #[test]
    fn remove_where_filters_under_one_lock() {
        let store: Store<ParticipationRecord> = Store::new();
        let team_id = Uuid::new_v4();
        for sport in [Sport::Cricket, Sport::Chess] {
            let id = Uuid::new_v4();
            store.insert(
                id,
                ParticipationRecord {
                    id,
                    team_id,
                    team_name: "Falcons".to_string(),
                    sport,
                    status: ParticipationStatus::Registered,
                    created_at: Utc::now(),
                },
            );
        }
        let removed = store.remove_where(|row| row.sport == Sport::Chess);
        assert_eq!(removed.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reconcile_keeps_one_row_per_pair_when_edits_replay() {
        let state = AppState::new(AppConfig::default());
        let team_id = Uuid::new_v4();
        let now = Utc::now();

        let first = state.reconcile_participation(team_id, "Falcons", &[Sport::Cricket], now);
        assert_eq!(first.added.len(), 1);
        let cricket_row = &first.added[0];

        // Two edits computed from the same baseline arrive back to back;
        // only the first may insert the volleyball row.
        let desired = [Sport::Cricket, Sport::Volleyball];
        let a = state.reconcile_participation(team_id, "Falcons", &desired, Utc::now());
        let b = state.reconcile_participation(team_id, "Falcons", &desired, Utc::now());
        assert_eq!(a.added.len(), 1);
        assert_eq!(a.added[0].sport, Sport::Volleyball);
        assert!(b.added.is_empty() && b.removed.is_empty());

        let rows = state.participation.list();
        assert_eq!(rows.len(), 2);
        let volleyball_rows = rows.iter().filter(|r| r.sport == Sport::Volleyball).count();
        assert_eq!(volleyball_rows, 1);

        // The cricket row survived both edits untouched.
        let kept = rows.iter().find(|r| r.sport == Sport::Cricket).unwrap();
        assert_eq!(kept.id, cricket_row.id);
        assert_eq!(kept.created_at, now);
    }

    #[test]
    fn reconcile_removes_dropped_sports_and_refreshes_name() {
        let state = AppState::new(AppConfig::default());
        let team_id = Uuid::new_v4();
        let now = Utc::now();
        state.reconcile_participation(team_id, "Falcons", &[Sport::Cricket, Sport::Chess], now);

        let sync =
            state.reconcile_participation(team_id, "Eagles", &[Sport::Cricket], Utc::now());
        assert_eq!(sync.removed.len(), 1);
        assert_eq!(sync.removed[0].sport, Sport::Chess);

        let rows = state.participation.list();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team_name, "Eagles");
    }

    #[test]
    fn change_notices_reach_subscribers() {
        let state = AppState::new(AppConfig::default());
        let mut rx = state.subscribe();
        let id = Uuid::new_v4();
        state.notify(Collection::Teams, id, ChangeOp::Created);
        let notice = rx.try_recv().expect("notice delivered");
        assert_eq!(notice.collection, Collection::Teams);
        assert_eq!(notice.id, id);
        assert_eq!(notice.op, ChangeOp::Created);
    }

    #[test]
    fn config_debug_redacts_secrets() {
        let config = AppConfig {
            admin_token: Some("super-secret".to_string()),
            database_url: Some("postgres://user:pw@host/db".to_string()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("postgres://"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn user_lookup_is_case_insensitive() {
        let state = AppState::new(AppConfig::default());
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: "Ayesha@Example.com".to_string(),
            display_name: "Ayesha".to_string(),
            role: Role::Team,
            password_hash: String::new(),
            created_at: Utc::now(),
            last_login: None,
            is_active: true,
            permissions: vec![],
        };
        state.users.insert(user.id, user);
        assert!(state.user_by_email("ayesha@example.com").is_some());
        assert!(state.user_by_email("other@example.com").is_none());
    }

    #[test]
    fn team_summary_counts_captain() {
        let mut team = team_record();
        team.members.push(Member {
            id: Uuid::new_v4(),
            name: "Bilal".to_string(),
            phone: "+923001234568".to_string(),
            cnic: "35202-7654321-1".to_string(),
            sports: vec![Sport::Chess],
        });
        let summary = team.summary();
        assert_eq!(summary.members_count, 2);
    }
}
