/// Prayer completion endpoints
use crate::{
    auth::AuthUser, context::AppContext, db::models::PrayerCompletion, error::AppResult,
    prayers::Prayer,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

/// Build prayer routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/prayers", get(list_prayers).post(set_prayer))
}

#[derive(Debug, Deserialize)]
pub struct PrayersQuery {
    pub date: Option<NaiveDate>,
}

async fn list_prayers(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Query(query): Query<PrayersQuery>,
) -> AppResult<Json<Vec<PrayerCompletion>>> {
    let date = query.date.unwrap_or_else(|| ctx.clock.today());
    let prayers = ctx.prayers.for_date(&user.user_id, date).await?;
    Ok(Json(prayers))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPrayerRequest {
    pub date: Option<NaiveDate>,
    pub prayer_name: String,
    pub completed: bool,
}

async fn set_prayer(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<SetPrayerRequest>,
) -> AppResult<Json<PrayerCompletion>> {
    let date = req.date.unwrap_or_else(|| ctx.clock.today());
    let prayer: Prayer = req.prayer_name.parse()?;
    let record = ctx
        .prayers
        .set_status(&user.user_id, date, prayer, req.completed)
        .await?;
    Ok(Json(record))
}
