//! REST API routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use steamstats_core::{
    AverageHoursPerWeek, FeaturedApp, GameDetails, GenreCount, LibraryValue, MostPlayedGame,
    PlayerSummary, RareAchievement, StatsError, TotalHours,
};

use crate::aggregator::DEFAULT_FRIEND_AMOUNT;
use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SteamIdParams {
    pub steamid: Option<String>,
}

impl SteamIdParams {
    fn require(self) -> Result<String, ApiError> {
        required(self.steamid, "steamid")
    }
}

#[derive(Debug, Deserialize)]
pub struct FriendsParams {
    pub steamid: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppIdParams {
    pub appid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenreParams {
    pub genre: Option<String>,
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError(StatsError::MissingInput(name)))
}

fn parse_number<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError(StatsError::InvalidInput(format!("{} must be a non-negative integer", name))))
}

// ============================================================================
// Registry
// ============================================================================

pub async fn add_user(
    State(state): State<Arc<AppState>>,
    Path(steam_id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    let result: steamstats_core::Result<bool> = async {
        if state.registry.exists(&steam_id).await? {
            return Ok(false);
        }
        state.registry.insert(&steam_id).await
    }
    .await;

    match result {
        Ok(true) => {
            tracing::info!(steam_id = %steam_id, "User registered");
            (StatusCode::CREATED, Json(serde_json::json!({"message": "User added"})))
        }
        Ok(false) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "User already exists"})),
        ),
        Err(e) => {
            tracing::error!("Failed to register user {}: {}", steam_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Internal server error"})),
            )
        }
    }
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<serde_json::Value> {
    let ids = state.registry.list().await?;
    let users = state.stats.registered_users(ids).await;
    Ok(Json(serde_json::json!({ "users": users })))
}

// ============================================================================
// Steam proxy
// ============================================================================

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SteamIdParams>,
) -> ApiResult<PlayerSummary> {
    let steam_id = params.require()?;
    Ok(Json(state.stats.account_summary(&steam_id).await?))
}

pub async fn get_friends(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FriendsParams>,
) -> ApiResult<Vec<PlayerSummary>> {
    let steam_id = required(params.steamid, "steamid")?;
    let amount = match params.amount.as_deref() {
        Some(raw) => parse_number(raw, "amount")?,
        None => DEFAULT_FRIEND_AMOUNT,
    };
    Ok(Json(state.stats.friends(&steam_id, amount).await?))
}

pub async fn get_most_played(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SteamIdParams>,
) -> ApiResult<Vec<MostPlayedGame>> {
    let steam_id = params.require()?;
    Ok(Json(state.stats.most_played(&steam_id).await?))
}

pub async fn get_top_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SteamIdParams>,
) -> ApiResult<Vec<GenreCount>> {
    let steam_id = params.require()?;
    Ok(Json(state.stats.top_categories(&steam_id).await?))
}

pub async fn get_rare_achievements(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SteamIdParams>,
) -> ApiResult<Vec<RareAchievement>> {
    let steam_id = params.require()?;
    Ok(Json(state.stats.rare_achievements(&steam_id).await?))
}

pub async fn get_total_hours(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SteamIdParams>,
) -> ApiResult<TotalHours> {
    let steam_id = params.require()?;
    Ok(Json(state.stats.total_hours(&steam_id).await?))
}

pub async fn get_average_hours_per_week(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SteamIdParams>,
) -> ApiResult<AverageHoursPerWeek> {
    let steam_id = params.require()?;
    Ok(Json(state.stats.average_hours_per_week(&steam_id).await?))
}

pub async fn get_library_value(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SteamIdParams>,
) -> ApiResult<LibraryValue> {
    let steam_id = params.require()?;
    Ok(Json(state.stats.library_value(&steam_id).await?))
}

pub async fn get_game_details(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AppIdParams>,
) -> ApiResult<GameDetails> {
    let appid = required(params.appid, "appid")?;
    let appid: u64 = parse_number(&appid, "appid")?;
    Ok(Json(state.stats.game_details(appid).await?))
}

pub async fn get_featured_games(State(state): State<Arc<AppState>>) -> ApiResult<Vec<FeaturedApp>> {
    Ok(Json(state.stats.featured_games().await?))
}

pub async fn get_apps_in_genre(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GenreParams>,
) -> ApiResult<Vec<GameDetails>> {
    let genre = required(params.genre, "genre")?;
    Ok(Json(state.stats.apps_in_genre(&genre).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::StatsService;
    use crate::db::MemoryRegistry;
    use crate::testing::{game, store_detail, summary, FakeSteam};
    use axum::{body::Body, http::Request, Router};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(fake: FakeSteam) -> Router {
        let state = Arc::new(AppState {
            stats: StatsService::new(Arc::new(fake), 4),
            registry: Arc::new(MemoryRegistry::default()),
        });
        crate::router(state)
    }

    async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn missing_steamid_is_bad_request() {
        let app = app(FakeSteam::new());
        let (status, body) = send(&app, "GET", "/steam/api/most-played").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "steamid parameter is required"}));
    }

    #[tokio::test]
    async fn most_played_serializes_view() {
        let app = app(FakeSteam::new().with_games(
            "1",
            vec![game(10, "A", 120), game(20, "B", 0), game(30, "C", 600)],
        ));
        let (status, body) = send(&app, "GET", "/steam/api/most-played?steamid=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"appid": 30, "title": "C", "imageurl": "https://steamcdn-a.akamaihd.net/steam/apps/30/header.jpg", "playtime_forever": 600},
                {"appid": 10, "title": "A", "imageurl": "https://steamcdn-a.akamaihd.net/steam/apps/10/header.jpg", "playtime_forever": 120}
            ])
        );
    }

    #[tokio::test]
    async fn private_library_is_bad_gateway() {
        let app = app(FakeSteam::new());
        let (status, _) = send(&app, "GET", "/steam/api/total-hours?steamid=1").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn game_details_statuses() {
        let app = app(FakeSteam::new().with_store(70, store_detail(json!({"name": "Half-Life", "is_free": true}))));

        let (status, body) = send(&app, "GET", "/steam/api/game-details?appid=70").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["base_price"], json!("Free"));
        assert_eq!(body["title"], json!("Half-Life"));

        let (status, _) = send(&app, "GET", "/steam/api/game-details?appid=71").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/steam/api/game-details?appid=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/steam/api/game-details").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_creation_date_is_unprocessable() {
        let app = app(
            FakeSteam::new()
                .with_summary(summary("1", "gabe", None))
                .with_games("1", vec![game(1, "a", 60)]),
        );
        let (status, body) = send(&app, "GET", "/steam/api/average-hours-per-week?steamid=1").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, json!({"error": "Account creation date not available"}));
    }

    #[tokio::test]
    async fn top_categories_are_pairs() {
        let app = app(
            FakeSteam::new()
                .with_games("1", vec![game(1, "a", 60)])
                .with_store(1, store_detail(json!({"genres": [{"description": "Action"}]}))),
        );
        let (status, body) = send(&app, "GET", "/steam/api/top_categories?steamid=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([["Action", 1]]));
    }

    #[tokio::test]
    async fn friends_amount_must_be_numeric() {
        let app = app(FakeSteam::new().with_friends("1", &["2"]));
        let (status, _) = send(&app, "GET", "/steam/api/friends?steamid=1&amount=lots").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn featured_games_with_and_without_trailing_slash() {
        let app = app(FakeSteam::new().with_featured(vec![FeaturedApp {
            id: 620,
            name: "Portal 2".into(),
            final_price: 999,
            ..Default::default()
        }]));
        let (status, body) = send(&app, "GET", "/steam/api/featured-games").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], json!(620));
        assert_eq!(body[0]["name"], json!("Portal 2"));
        let (status, _) = send(&app, "GET", "/steam/api/featured-games/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn registry_add_and_list() {
        let app = app(FakeSteam::new().with_summary(summary("7", "seven", None)));

        let (status, body) = send(&app, "POST", "/add_user/7").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"message": "User added"}));

        let (status, body) = send(&app, "POST", "/add_user/7").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({"error": "User already exists"}));

        send(&app, "POST", "/add_user/8").await;

        let (status, body) = send(&app, "GET", "/users").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"users": [
                {"steam_id": "7", "personaname": "seven", "avatarmedium": "https://avatars.example/7.jpg"},
                {"steam_id": "8", "personaname": "N/A", "avatarmedium": "N/A"}
            ]})
        );
    }
}
