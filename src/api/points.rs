/// Points endpoints
use crate::{
    auth::AuthUser,
    context::AppContext,
    error::{AppError, AppResult},
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build points routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/points", get(points_status).post(points_action))
}

#[derive(Debug, Serialize)]
pub struct PointsView {
    pub points: i64,
    pub level: i64,
    pub title: String,
}

async fn points_status(
    State(ctx): State<AppContext>,
    user: AuthUser,
) -> AppResult<Json<PointsView>> {
    let (points, level, title) = ctx.points.status(&user.user_id).await?;
    Ok(Json(PointsView {
        points,
        level,
        title,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PointsActionRequest {
    Award {
        amount: i64,
        category: String,
        description: String,
    },
    Redeem {
        cost: i64,
        name: String,
    },
}

#[derive(Debug, Serialize)]
pub struct PointsActionResponse {
    pub success: bool,
    pub points: i64,
    pub level: i64,
    pub title: String,
}

async fn points_action(
    State(ctx): State<AppContext>,
    user: AuthUser,
    Json(req): Json<PointsActionRequest>,
) -> AppResult<Json<PointsActionResponse>> {
    let success = match req {
        PointsActionRequest::Award {
            amount,
            category,
            description,
        } => {
            if amount < 1 {
                return Err(AppError::Validation(
                    "Award amount must be positive".to_string(),
                ));
            }
            ctx.points
                .award(&user.user_id, amount, &category, &description)
                .await?;
            true
        }
        PointsActionRequest::Redeem { cost, name } => {
            if cost < 1 {
                return Err(AppError::Validation(
                    "Redemption cost must be positive".to_string(),
                ));
            }
            ctx.points.redeem(&user.user_id, cost, &name).await?
        }
    };

    let (points, level, title) = ctx.points.status(&user.user_id).await?;
    Ok(Json(PointsActionResponse {
        success,
        points,
        level,
        title,
    }))
}
