/// Global total endpoints, including the live SSE stream
use crate::{context::AppContext, counter::TotalCounter, error::AppResult};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

/// Client reconnect hint carried on the first frame
const RETRY_MILLIS: u64 = 2000;
/// Comment frames at this interval defeat idle-timeout proxies
const KEEP_ALIVE_SECS: u64 = 15;

/// Build total routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/total", get(current_total))
        .route("/api/total/stream", get(stream_total))
}

#[derive(Debug, Serialize)]
pub struct TotalResponse {
    pub total: i64,
}

async fn current_total(State(ctx): State<AppContext>) -> AppResult<Json<TotalResponse>> {
    let total = ctx.counter.total().await?;
    Ok(Json(TotalResponse { total }))
}

/// JSON body of one total frame
fn total_payload(total: i64) -> String {
    format!("{{\"total\":{}}}", total)
}

/// Payload frames for one subscriber: the snapshot first, then one frame
/// per counter update
///
/// The subscription is held by the stream itself, so when the client
/// disconnects and the stream drops, the receiver unregisters with it.
fn total_frames(
    snapshot: i64,
    mut rx: Receiver<i64>,
    counter: Arc<TotalCounter>,
) -> impl Stream<Item = String> {
    async_stream::stream! {
        yield total_payload(snapshot);

        loop {
            match rx.recv().await {
                Ok(total) => {
                    yield total_payload(total);
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Slow consumer missed frames; the cached counter is
                    // always current, so send that instead
                    tracing::debug!(skipped, "SSE subscriber lagged, re-syncing");
                    if let Ok(total) = counter.total().await {
                        yield total_payload(total);
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

/// Live stream of the global total
async fn stream_total(
    State(ctx): State<AppContext>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let rx = ctx.broadcaster.subscribe();
    let snapshot = ctx.counter.total().await?;

    let stream = total_frames(snapshot, rx, ctx.counter.clone())
        .enumerate()
        .map(|(i, payload)| {
            let event = Event::default().data(payload);
            Ok::<_, Infallible>(if i == 0 {
                event.retry(Duration::from_millis(RETRY_MILLIS))
            } else {
                event
            })
        });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    ))
}
