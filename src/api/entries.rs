/// Recitation entry endpoints
use crate::{
    auth::AuthUser,
    context::AppContext,
    db::models::DuroodEntry,
    entries::RankingEntry,
    error::AppResult,
};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Build entry routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/entries", post(add_entry).get(list_entries))
        .route("/api/entries/today", get(today))
        .route("/api/rankings", get(rankings))
}

#[derive(Debug, Deserialize)]
pub struct AddEntryRequest {
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub date: NaiveDate,
    pub count: i64,
    pub total: i64,
}

async fn add_entry(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<AddEntryRequest>,
) -> AppResult<Json<EntryResponse>> {
    let date = ctx.clock.today();
    let count = ctx.entries.add_count(&user.user_id, date, req.count).await?;
    let total = ctx.counter.total().await?;

    Ok(Json(EntryResponse { date, count, total }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

async fn list_entries(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DuroodEntry>>> {
    let limit = query.limit.unwrap_or(30).clamp(1, 365);
    let entries = ctx.entries.recent(&user.user_id, limit).await?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct RankingsQuery {
    pub date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

async fn rankings(
    State(ctx): State<AppContext>,
    _user: AuthUser,
    Query(query): Query<RankingsQuery>,
) -> AppResult<Json<Vec<RankingEntry>>> {
    let date = query.date.unwrap_or_else(|| ctx.clock.today());
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let board = ctx.entries.rankings(date, limit).await?;
    Ok(Json(board))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub count: i64,
    pub streak: i64,
}

async fn today(
    State(ctx): State<AppContext>,
    user: AuthUser,
) -> AppResult<Json<TodayResponse>> {
    let date = ctx.clock.today();
    let count = ctx.entries.count_for(&user.user_id, date).await?;
    let streak = ctx.entries.streak(&user.user_id, date).await?;

    Ok(Json(TodayResponse {
        date,
        count,
        streak,
    }))
}
