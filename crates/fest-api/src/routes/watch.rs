//! # Change Feed API
//!
//! Server-sent events over the in-process change feed. Clients poll the
//! collection endpoints for state and use this stream only as a cheap
//! "something changed" signal.

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use utoipa::IntoParams;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::{AppState, Collection};

/// Watch filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct WatchQuery {
    /// Restrict the stream to one collection.
    pub collection: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/watch", get(watch))
}

/// GET /v1/watch — Stream change notices as server-sent events.
///
/// A slow consumer that falls behind the channel capacity silently loses
/// the lagged notices; the stream itself stays open.
#[utoipa::path(
    get,
    path = "/v1/watch",
    params(WatchQuery),
    responses(
        (status = 200, description = "SSE stream of change notices", content_type = "text/event-stream"),
        (status = 422, description = "Unknown collection filter", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "watch"
)]
async fn watch(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<WatchQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let collection = match query.collection.as_deref() {
        None => None,
        Some(raw) => Some(
            Collection::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown collection: {raw}")))?,
        ),
    };

    let stream = BroadcastStream::new(state.subscribe()).filter_map(move |notice| match notice {
        Ok(notice) => {
            if collection.map_or(true, |c| notice.collection == c) {
                Some(Event::default().event("change").json_data(&notice))
            } else {
                None
            }
        }
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            tracing::warn!(missed, "watch subscriber lagged, dropping notices");
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
