/// Daily goal and timer endpoints
use crate::{
    auth::AuthUser,
    context::AppContext,
    db::models::{DailyGoal, TimerSession},
    error::AppResult,
    goals::GoalProgress,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Build goal and timer routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/goal", post(set_goal))
        .route("/api/goal/today", get(today_goal))
        .route("/api/goal/complete", post(check_goal))
        .route("/api/timer/start", post(start_timer))
        .route("/api/timer/complete", post(complete_timer))
}

#[derive(Debug, Deserialize)]
pub struct SetGoalRequest {
    pub goal: i64,
}

async fn set_goal(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<SetGoalRequest>,
) -> AppResult<Json<DailyGoal>> {
    let goal = ctx
        .goals
        .set_goal(&user.user_id, ctx.clock.today(), req.goal)
        .await?;
    Ok(Json(goal))
}

async fn today_goal(
    State(ctx): State<AppContext>,
    user: AuthUser,
) -> AppResult<Json<Option<DailyGoal>>> {
    let goal = ctx.goals.goal_for(&user.user_id, ctx.clock.today()).await?;
    Ok(Json(goal))
}

async fn check_goal(
    State(ctx): State<AppContext>,
    user: AuthUser,
) -> AppResult<Json<GoalProgress>> {
    let today = ctx.clock.today();
    let current_count = ctx.entries.count_for(&user.user_id, today).await?;
    let progress = ctx
        .goals
        .check_completion(&user.user_id, today, current_count)
        .await?;
    Ok(Json(progress))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTimerRequest {
    /// Planned duration in seconds
    pub duration: i64,
    pub started_at: Option<DateTime<Utc>>,
}

async fn start_timer(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<StartTimerRequest>,
) -> AppResult<Json<TimerSession>> {
    let session = ctx
        .timers
        .start(
            &user.user_id,
            ctx.clock.today(),
            req.duration,
            req.started_at.unwrap_or_else(Utc::now),
        )
        .await?;
    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTimerRequest {
    pub completed_at: Option<DateTime<Utc>>,
}

async fn complete_timer(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<CompleteTimerRequest>,
) -> AppResult<Json<TimerSession>> {
    let session = ctx
        .timers
        .complete(
            &user.user_id,
            ctx.clock.today(),
            req.completed_at.unwrap_or_else(Utc::now),
        )
        .await?;
    Ok(Json(session))
}
