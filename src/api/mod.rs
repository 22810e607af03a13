use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Settings;
use crate::db::{
    check_connection, create_pool, delete_result, delete_user, get_game, get_games_for_week,
    get_pending_games, get_pick_counts, get_picks_for_game, get_result, get_results_for_week,
    get_user_picks, init_database, load_user_graded, record_result, upsert_game, upsert_pick,
    upsert_user,
};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    ApiResponse, Game, GameResult, PendingGame, PickEntry, ResultView, Scope, StandingsReport,
    UserPickCount,
};
use crate::services::{grade_entry, refresh_week, standings_for, Outcome, PickType, Side, WeekSlate};
use crate::utils::validate_user_name;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub settings: Arc<Settings>,
}

impl AppState {
    fn require_admin(&self, password: Option<&str>) -> Result<(), ApiError> {
        if self.settings.is_admin(password) {
            Ok(())
        } else {
            tracing::warn!("Rejected admin request");
            Err(ApiError::Unauthorized)
        }
    }
}

pub async fn serve(port: u16, settings: Settings) -> anyhow::Result<()> {
    let pool = create_pool(&settings.database_url).await?;
    init_database(&pool).await?;

    if settings.admin_password.is_none() {
        tracing::warn!("ADMIN_PASSWORD not set, admin endpoints are disabled");
    }

    let state = AppState {
        pool,
        settings: Arc::new(settings),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Pick'em API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/games", get(get_games_handler))
        .route("/games/history", get(get_game_history_handler))
        .route(
            "/picks",
            get(get_picks_handler)
                .post(submit_picks_handler)
                .delete(delete_user_handler),
        )
        .route(
            "/results",
            get(get_results_handler)
                .post(record_result_handler)
                .delete(delete_result_handler),
        )
        .route("/standings", get(get_standings_handler))
        .route("/debug/pick", get(debug_pick_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// Health check endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    database_time: String,
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Health> {
    let database_time = check_connection(&state.pool).await?;
    Ok(Json(ApiResponse::success(Health {
        status: "ok",
        database_time,
    })))
}

#[derive(Deserialize)]
struct WeekQuery {
    week: Option<u32>,
}

// GET /games - This week's slate from the odds feed, stored for pick submission
async fn get_games_handler(
    State(state): State<AppState>,
    params: Result<Query<WeekQuery>, QueryRejection>,
) -> ApiResult<WeekSlate> {
    let Query(params) = params?;
    let slate = refresh_week(&state.pool, &state.settings, params.week).await?;
    Ok(Json(ApiResponse::success(slate)))
}

// GET /games/history - Games already stored for a week
async fn get_game_history_handler(
    State(state): State<AppState>,
    params: Result<Query<WeekQuery>, QueryRejection>,
) -> ApiResult<Vec<Game>> {
    let Query(params) = params?;
    let calendar = state.settings.season;
    let week = params
        .week
        .unwrap_or_else(|| calendar.week_for(Utc::now()));
    let games = get_games_for_week(&state.pool, week).await?;
    Ok(Json(ApiResponse::success(games)))
}

// POST /picks - Save a user's picks, freezing each line at submission
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitPicksRequest {
    user_name: Option<String>,
    week: Option<u32>,
    picks: Option<Vec<PickSubmission>>,
    #[serde(default)]
    games: Vec<Game>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PickSubmission {
    game_id: String,
    selection: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectedPick {
    game_id: String,
    reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitPicksResponse {
    user_name: String,
    week: u32,
    saved: usize,
    skipped: Vec<RejectedPick>,
}

async fn submit_picks_handler(
    State(state): State<AppState>,
    request: Result<Json<SubmitPicksRequest>, JsonRejection>,
) -> ApiResult<SubmitPicksResponse> {
    let Json(request) = request?;
    let user_name = request
        .user_name
        .map(|n| n.trim().to_string())
        .filter(|n| validate_user_name(n))
        .ok_or_else(|| ApiError::BadRequest("userName is required".to_string()))?;
    let week = request
        .week
        .filter(|w| *w > 0)
        .ok_or_else(|| ApiError::BadRequest("week is required".to_string()))?;
    let picks = request
        .picks
        .ok_or_else(|| ApiError::BadRequest("picks must be an array".to_string()))?;

    for mut game in request.games {
        if game.week == 0 {
            game.week = week;
        }
        upsert_game(&state.pool, &game).await?;
    }

    let user_id = upsert_user(&state.pool, &user_name).await?;

    let mut saved = 0;
    let mut skipped = Vec::new();

    for pick in picks {
        let selection = pick.selection.trim();
        let Some(game) = get_game(&state.pool, &pick.game_id).await? else {
            skipped.push(RejectedPick {
                game_id: pick.game_id,
                reason: "unknown game".to_string(),
            });
            continue;
        };

        let pick_type = PickType::for_selection(selection);
        if let Err(e) = Side::resolve(pick_type, selection, &game.home_team, &game.away_team) {
            skipped.push(RejectedPick {
                game_id: pick.game_id,
                reason: e.to_string(),
            });
            continue;
        }

        let line = match pick_type {
            PickType::Spread => game.spread,
            PickType::Total => game.total,
        };
        upsert_pick(&state.pool, &user_id, &game.id, pick_type, selection, line).await?;
        saved += 1;
    }

    tracing::info!(
        "Saved {} picks for {} in week {} ({} skipped)",
        saved,
        user_name,
        week,
        skipped.len()
    );

    Ok(Json(ApiResponse::success(SubmitPicksResponse {
        user_name,
        week,
        saved,
        skipped,
    })))
}

// GET /picks - A user's selections for a week
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPicksQuery {
    user_name: String,
    week: u32,
}

#[derive(Serialize)]
struct UserPicks {
    picks: BTreeMap<String, String>,
}

async fn get_picks_handler(
    State(state): State<AppState>,
    params: Result<Query<UserPicksQuery>, QueryRejection>,
) -> ApiResult<UserPicks> {
    let Query(params) = params?;
    let picks = get_user_picks(&state.pool, &params.user_name, params.week).await?;
    Ok(Json(ApiResponse::success(UserPicks { picks })))
}

// DELETE /picks - Remove a user and all their picks (admin)
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteUserRequest {
    user_name: String,
    admin_password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Deleted {
    deleted: String,
}

async fn delete_user_handler(
    State(state): State<AppState>,
    request: Result<Json<DeleteUserRequest>, JsonRejection>,
) -> ApiResult<Deleted> {
    let Json(request) = request?;
    state.require_admin(request.admin_password.as_deref())?;

    if !delete_user(&state.pool, &request.user_name).await? {
        return Err(ApiError::NotFound(format!("User {} not found", request.user_name)));
    }
    Ok(Json(ApiResponse::success(Deleted {
        deleted: request.user_name,
    })))
}

// POST /results - Enter or correct a score (admin)
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordResultRequest {
    game_id: String,
    home_score: i64,
    away_score: i64,
    is_final: Option<bool>,
    admin_password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordedResult {
    changed: bool,
    result: Option<ResultView>,
}

fn score(value: i64, field: &str) -> Result<u32, ApiError> {
    u32::try_from(value)
        .map_err(|_| ApiError::BadRequest(format!("{} must be a non-negative integer", field)))
}

async fn record_result_handler(
    State(state): State<AppState>,
    request: Result<Json<RecordResultRequest>, JsonRejection>,
) -> ApiResult<RecordedResult> {
    let Json(request) = request?;
    state.require_admin(request.admin_password.as_deref())?;

    let home_score = score(request.home_score, "homeScore")?;
    let away_score = score(request.away_score, "awayScore")?;

    if get_game(&state.pool, &request.game_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Game {} not found", request.game_id)));
    }

    let is_final = request.is_final.unwrap_or(true);
    let changed = record_result(&state.pool, &request.game_id, home_score, away_score, is_final).await?;
    if changed {
        tracing::info!(
            "Recorded result for {}: {}-{} (final: {})",
            request.game_id,
            home_score,
            away_score,
            is_final
        );
    }

    let result = get_result(&state.pool, &request.game_id).await?;
    Ok(Json(ApiResponse::success(RecordedResult { changed, result })))
}

// GET /results - One game's result, a week's results, or the games still pending
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultsQuery {
    game_id: Option<String>,
    week: Option<u32>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ResultsView {
    Game { result: Option<ResultView> },
    Week { week: u32, results: Vec<ResultView> },
    Pending { pending: Vec<PendingGame> },
}

async fn get_results_handler(
    State(state): State<AppState>,
    params: Result<Query<ResultsQuery>, QueryRejection>,
) -> ApiResult<ResultsView> {
    let Query(params) = params?;
    let view = match (params.game_id, params.week) {
        (Some(game_id), _) => {
            if get_game(&state.pool, &game_id).await?.is_none() {
                return Err(ApiError::NotFound(format!("Game {} not found", game_id)));
            }
            ResultsView::Game {
                result: get_result(&state.pool, &game_id).await?,
            }
        }
        (None, Some(week)) => ResultsView::Week {
            week,
            results: get_results_for_week(&state.pool, week).await?,
        },
        (None, None) => ResultsView::Pending {
            pending: get_pending_games(&state.pool).await?,
        },
    };
    Ok(Json(ApiResponse::success(view)))
}

// DELETE /results - Clear a recorded score (admin)
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResultRequest {
    game_id: String,
    admin_password: Option<String>,
}

async fn delete_result_handler(
    State(state): State<AppState>,
    request: Result<Json<DeleteResultRequest>, JsonRejection>,
) -> ApiResult<Deleted> {
    let Json(request) = request?;
    state.require_admin(request.admin_password.as_deref())?;

    if !delete_result(&state.pool, &request.game_id).await? {
        return Err(ApiError::NotFound(format!("No result for game {}", request.game_id)));
    }
    tracing::info!("Deleted result for {}", request.game_id);
    Ok(Json(ApiResponse::success(Deleted {
        deleted: request.game_id,
    })))
}

// GET /standings - Ranked records for a week or the season; bare request lists users
#[derive(Deserialize)]
struct StandingsQuery {
    week: Option<u32>,
    season: Option<bool>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum StandingsView {
    Ranked(StandingsReport),
    Users { users: Vec<UserPickCount> },
}

async fn get_standings_handler(
    State(state): State<AppState>,
    params: Result<Query<StandingsQuery>, QueryRejection>,
) -> ApiResult<StandingsView> {
    let Query(params) = params?;
    let scope = match (params.week, params.season.unwrap_or(false)) {
        (Some(0), _) => return Err(ApiError::BadRequest("week must be at least 1".to_string())),
        (Some(week), _) => Some(Scope::Week(week)),
        (None, true) => Some(Scope::Season),
        (None, false) => None,
    };

    let view = match scope {
        Some(scope) => StandingsView::Ranked(standings_for(&state.pool, scope).await?),
        None => StandingsView::Users {
            users: get_pick_counts(&state.pool).await?,
        },
    };
    Ok(Json(ApiResponse::success(view)))
}

// GET /debug/pick - Picks with the outcome the grader assigns them
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugQuery {
    user_name: Option<String>,
    game_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GradedPick {
    #[serde(flatten)]
    pick: PickEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl GradedPick {
    fn new(pick: PickEntry, result: Option<&GameResult>) -> Self {
        let (outcome, error) = match grade_entry(&pick, result) {
            Ok(outcome) => (outcome, None),
            Err(e) => (None, Some(e.to_string())),
        };
        GradedPick {
            pick,
            outcome,
            error,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum DebugView {
    #[serde(rename_all = "camelCase")]
    Game {
        game: Game,
        result: Option<ResultView>,
        picks: Vec<GradedPick>,
    },
    #[serde(rename_all = "camelCase")]
    User {
        user_name: String,
        picks: Vec<GradedPick>,
    },
}

async fn debug_pick_handler(
    State(state): State<AppState>,
    params: Result<Query<DebugQuery>, QueryRejection>,
) -> ApiResult<DebugView> {
    let Query(params) = params?;
    let view = match (params.game_id, params.user_name) {
        (Some(game_id), _) => {
            let game = get_game(&state.pool, &game_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Game {} not found", game_id)))?;
            let result = get_result(&state.pool, &game_id).await?;
            let graded_against = result.as_ref().map(ResultView::score);
            let picks = get_picks_for_game(&state.pool, &game_id)
                .await?
                .into_iter()
                .map(|p| GradedPick::new(p, graded_against.as_ref()))
                .collect();
            DebugView::Game {
                game,
                result,
                picks,
            }
        }
        (None, Some(user_name)) => {
            let data = load_user_graded(&state.pool, &user_name).await?;
            let picks = data
                .picks
                .into_iter()
                .map(|p| {
                    let result = data.results.get(&p.game_id);
                    GradedPick::new(p, result)
                })
                .collect();
            DebugView::User { user_name, picks }
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "userName or gameId is required".to_string(),
            ))
        }
    };
    Ok(Json(ApiResponse::success(view)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::db::tests::{game, memory_pool};

    async fn app_with(admin_password: Option<&str>) -> Router {
        let pool = memory_pool().await;
        upsert_game(&pool, &game("g1", 1, "Georgia", "Marshall", -28.5, 61.5))
            .await
            .unwrap();
        upsert_game(&pool, &game("g2", 1, "Texas A&M", "UTSA", -21.5, 54.5))
            .await
            .unwrap();

        let settings = Settings {
            admin_password: admin_password.map(str::to_string),
            ..Settings::default()
        };
        create_router(AppState {
            pool,
            settings: Arc::new(settings),
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_reports_database_time() {
        let app = app_with(None).await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn submitted_picks_freeze_the_line_and_skip_unknown_games() {
        let app = app_with(None).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/picks",
            Some(json!({
                "userName": "alice",
                "week": 1,
                "picks": [
                    { "gameId": "g1", "selection": "Marshall" },
                    { "gameId": "g2", "selection": "Over" },
                    { "gameId": "nope", "selection": "Georgia" },
                    { "gameId": "g1", "selection": "Alabama" }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["saved"], 2);

        let skipped = body["data"]["skipped"].as_array().unwrap();
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0]["gameId"], "nope");
        assert_eq!(skipped[0]["reason"], "unknown game");

        let (_, body) = send(&app, Method::GET, "/picks?userName=alice&week=1", None).await;
        assert_eq!(body["data"]["picks"]["g1"], "Marshall");
        assert_eq!(body["data"]["picks"]["g2"], "Over");

        let (_, body) = send(&app, Method::GET, "/debug/pick?gameId=g1", None).await;
        assert_eq!(body["data"]["picks"][0]["line"], -28.5);
        assert_eq!(body["data"]["picks"][0]["pickType"], "spread");
    }

    #[tokio::test]
    async fn submission_without_picks_array_is_rejected() {
        let app = app_with(None).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/picks",
            Some(json!({ "userName": "alice", "week": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "picks must be an array");

        let (status, _) = send(
            &app,
            Method::POST,
            "/picks",
            Some(json!({ "userName": "  ", "week": 1, "picks": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_bodies_and_queries_get_the_error_envelope() {
        let app = app_with(Some("secret")).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/picks",
            Some(json!({ "userName": "alice", "week": 1, "picks": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("picks"));

        let (status, body) = send(
            &app,
            Method::DELETE,
            "/picks",
            Some(json!({ "adminPassword": "secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("userName"));

        let (status, body) = send(&app, Method::GET, "/standings?week=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["timestamp"].is_string());

        let (status, body) = send(&app, Method::GET, "/picks?week=1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn payload_games_are_stored_before_picks() {
        let app = app_with(None).await;
        let (_, body) = send(
            &app,
            Method::POST,
            "/picks",
            Some(json!({
                "userName": "bob",
                "week": 2,
                "games": [{
                    "id": "g9", "home": "LSU", "away": "Clemson",
                    "spread": 3.5, "total": 57.5, "date": "2025-09-06", "time": "19:30"
                }],
                "picks": [{ "gameId": "g9", "selection": "Clemson" }]
            })),
        )
        .await;
        assert_eq!(body["data"]["saved"], 1);

        let (_, body) = send(&app, Method::GET, "/games/history?week=2", None).await;
        assert_eq!(body["data"][0]["id"], "g9");
        assert_eq!(body["data"][0]["home"], "LSU");
    }

    #[tokio::test]
    async fn admin_actions_need_the_configured_password() {
        let result = json!({ "gameId": "g1", "homeScore": 45, "awayScore": 7, "adminPassword": "secret" });

        let unset = app_with(None).await;
        let (status, _) = send(&unset, Method::POST, "/results", Some(result.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let app = app_with(Some("secret")).await;
        let wrong = json!({ "gameId": "g1", "homeScore": 45, "awayScore": 7, "adminPassword": "guess" });
        let (status, body) = send(&app, Method::POST, "/results", Some(wrong)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid admin password");

        let (status, body) = send(&app, Method::POST, "/results", Some(result.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["changed"], true);
        assert_eq!(body["data"]["result"]["isFinal"], true);

        let (_, body) = send(&app, Method::POST, "/results", Some(result)).await;
        assert_eq!(body["data"]["changed"], false);
    }

    #[tokio::test]
    async fn results_for_unknown_games_and_negative_scores_are_rejected() {
        let app = app_with(Some("secret")).await;

        let unknown = json!({ "gameId": "nope", "homeScore": 1, "awayScore": 0, "adminPassword": "secret" });
        let (status, _) = send(&app, Method::POST, "/results", Some(unknown)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let negative = json!({ "gameId": "g1", "homeScore": -3, "awayScore": 0, "adminPassword": "secret" });
        let (status, body) = send(&app, Method::POST, "/results", Some(negative)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "homeScore must be a non-negative integer");
    }

    #[tokio::test]
    async fn results_listing_and_deletion() {
        let app = app_with(Some("secret")).await;
        let provisional = json!({
            "gameId": "g1", "homeScore": 14, "awayScore": 0, "isFinal": false, "adminPassword": "secret"
        });
        send(&app, Method::POST, "/results", Some(provisional)).await;

        let (_, body) = send(&app, Method::GET, "/results", None).await;
        assert_eq!(body["data"]["pending"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, Method::GET, "/results?week=1", None).await;
        assert_eq!(body["data"]["results"][0]["homeScore"], 14);

        let delete = json!({ "gameId": "g1", "adminPassword": "secret" });
        let (status, _) = send(&app, Method::DELETE, "/results", Some(delete.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::DELETE, "/results", Some(delete)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, Method::GET, "/results?gameId=g1", None).await;
        assert_eq!(body["data"]["result"], Value::Null);
    }

    #[tokio::test]
    async fn standings_rank_graded_picks() {
        let app = app_with(Some("secret")).await;
        for (user, g1, g2) in [("alice", "Georgia", "under"), ("bob", "Marshall", "under"), ("carol", "Georgia", "over")] {
            send(
                &app,
                Method::POST,
                "/picks",
                Some(json!({
                    "userName": user,
                    "week": 1,
                    "picks": [
                        { "gameId": "g1", "selection": g1 },
                        { "gameId": "g2", "selection": g2 }
                    ]
                })),
            )
            .await;
        }

        // Georgia 45-7 covers 28.5; Texas A&M 30-20 is 50 points, under 54.5
        for (game_id, home, away) in [("g1", 45, 7), ("g2", 30, 20)] {
            send(
                &app,
                Method::POST,
                "/results",
                Some(json!({ "gameId": game_id, "homeScore": home, "awayScore": away, "adminPassword": "secret" })),
            )
            .await;
        }

        let (status, body) = send(&app, Method::GET, "/standings?week=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["scope"], "week");
        assert_eq!(body["data"]["week"], 1);

        let standings = body["data"]["standings"].as_array().unwrap();
        let names: Vec<&str> = standings.iter().map(|s| s["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
        assert_eq!(standings[0]["record"], "2-0");
        assert_eq!(standings[0]["winPercentage"], 100);
        assert_eq!(standings[1]["record"], "1-1");

        let (_, body) = send(&app, Method::GET, "/standings?season=true", None).await;
        assert_eq!(body["data"]["scope"], "season");

        let (_, body) = send(&app, Method::GET, "/standings", None).await;
        assert_eq!(body["data"]["users"].as_array().unwrap().len(), 3);

        let (_, body) = send(&app, Method::GET, "/debug/pick?userName=carol", None).await;
        let outcomes: Vec<&str> = body["data"]["picks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["outcome"].as_str().unwrap())
            .collect();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.contains(&"win") && outcomes.contains(&"loss"));
    }

    #[tokio::test]
    async fn deleting_a_user_clears_their_picks() {
        let app = app_with(Some("secret")).await;
        send(
            &app,
            Method::POST,
            "/picks",
            Some(json!({ "userName": "alice", "week": 1, "picks": [{ "gameId": "g1", "selection": "Georgia" }] })),
        )
        .await;

        let (status, _) = send(
            &app,
            Method::DELETE,
            "/picks",
            Some(json!({ "userName": "alice", "adminPassword": "secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, "/picks?userName=alice&week=1", None).await;
        assert!(body["data"]["picks"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn debug_needs_a_user_or_game() {
        let app = app_with(None).await;
        let (status, _) = send(&app, Method::GET, "/debug/pick", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::GET, "/debug/pick?gameId=nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
