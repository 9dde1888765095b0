//! Steam API calls from the backend

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use steamstats_core::{
    Achievement, FeaturedApp, Friend, GlobalAchievementPercent, PlayerSummary, Result, StatsError,
    SteamGame, SteamSource, StoreAppDetail,
};

use crate::config::Config;

const API_PLAYER_SUMMARIES: &str = "/ISteamUser/GetPlayerSummaries/v0002/";
const API_FRIEND_LIST: &str = "/ISteamUser/GetFriendList/v0001/";
const API_OWNED_GAMES: &str = "/IPlayerService/GetOwnedGames/v0001/";
const API_GLOBAL_PERCENTAGES: &str = "/ISteamUserStats/GetGlobalAchievementPercentagesForApp/v0002/";
const API_ACHIEVEMENTS: &str = "/ISteamUserStats/GetPlayerAchievements/v0001/";
const STORE_APP_DETAILS: &str = "/api/appdetails";
const STORE_FEATURED: &str = "/api/featured";
const STORE_APPS_IN_GENRE: &str = "/api/getappsingenre";

/// reqwest-backed `SteamSource`. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct SteamClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    store_base: String,
}

impl std::fmt::Debug for SteamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteamClient")
            .field("api_base", &self.api_base)
            .field("store_base", &self.store_base)
            .finish_non_exhaustive()
    }
}

impl SteamClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_bases(
            &config.steam_api_key,
            &config.api_base,
            &config.store_base,
            config.upstream_timeout,
        )
    }

    pub fn with_bases(api_key: &str, api_base: &str, store_base: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StatsError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            store_base: store_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self.http.get(url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatsError::unavailable(
                Some(status.as_u16()),
                format!("Steam responded with {}", status),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| StatsError::malformed(e.without_url().to_string()))
    }

    async fn store_app_details(&self, appid: u64, filters: Option<&str>) -> Result<StoreAppDetail> {
        let mut url = format!("{}{}?appids={}", self.store_base, STORE_APP_DETAILS, appid);
        if let Some(filters) = filters {
            url.push_str("&filters=");
            url.push_str(filters);
        }

        let body = self.get_json(&url).await?;
        let entry = &body[appid.to_string()];
        if !entry["success"].as_bool().unwrap_or(false) {
            return Err(StatsError::NotFound(format!("App {}", appid)));
        }

        decode(&entry["data"], "appdetails data")
    }
}

/// Never leak the request URL: it carries the API key.
fn transport_error(e: reqwest::Error) -> StatsError {
    let status = e.status().map(|s| s.as_u16());
    StatsError::unavailable(status, e.without_url().to_string())
}

fn decode<T: DeserializeOwned>(value: &Value, what: &str) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| StatsError::malformed(format!("{}: {}", what, e)))
}

fn array_at<'a>(body: &'a Value, pointer: &str) -> Result<&'a Vec<Value>> {
    body.pointer(pointer)
        .and_then(Value::as_array)
        .ok_or_else(|| StatsError::malformed(format!("missing {}", pointer)))
}

#[async_trait]
impl SteamSource for SteamClient {
    async fn fetch_account_summary(&self, steam_id: &str) -> Result<PlayerSummary> {
        let url = format!(
            "{}{}?key={}&steamids={}",
            self.api_base,
            API_PLAYER_SUMMARIES,
            self.api_key,
            urlencoding::encode(steam_id)
        );

        let body = self.get_json(&url).await?;
        let players = array_at(&body, "/response/players")?;
        match players.first() {
            Some(player) => decode(player, "player summary"),
            None => Err(StatsError::NotFound(format!("Steam user {}", steam_id))),
        }
    }

    async fn fetch_friend_ids(&self, steam_id: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}{}?key={}&steamid={}&relationship=friend",
            self.api_base,
            API_FRIEND_LIST,
            self.api_key,
            urlencoding::encode(steam_id)
        );

        let body = self.get_json(&url).await?;
        let friends = array_at(&body, "/friendslist/friends")?;

        Ok(friends
            .iter()
            .filter_map(|f| serde_json::from_value::<Friend>(f.clone()).ok())
            .map(|f| f.steamid)
            .collect())
    }

    async fn fetch_owned_games(&self, steam_id: &str) -> Result<Vec<SteamGame>> {
        let url = format!(
            "{}{}?key={}&steamid={}&format=json&include_played_free_games=1&include_appinfo=1",
            self.api_base,
            API_OWNED_GAMES,
            self.api_key,
            urlencoding::encode(steam_id)
        );

        let body = self.get_json(&url).await?;
        // Private profiles answer with an empty `response` object.
        let games = array_at(&body, "/response/games")?;

        Ok(games
            .iter()
            .filter_map(|g| serde_json::from_value(g.clone()).ok())
            .collect())
    }

    async fn fetch_global_achievement_stats(&self, appid: u64) -> Result<HashMap<String, f64>> {
        let url = format!(
            "{}{}?gameid={}&format=json",
            self.api_base, API_GLOBAL_PERCENTAGES, appid
        );

        let body = self.get_json(&url).await?;
        let achievements = array_at(&body, "/achievementpercentages/achievements")?;

        Ok(achievements
            .iter()
            .filter_map(|a| serde_json::from_value::<GlobalAchievementPercent>(a.clone()).ok())
            .map(|a| (a.name, a.percent))
            .collect())
    }

    async fn fetch_player_achievements(&self, appid: u64, steam_id: &str) -> Result<Vec<Achievement>> {
        let url = format!(
            "{}{}?appid={}&key={}&steamid={}",
            self.api_base,
            API_ACHIEVEMENTS,
            appid,
            self.api_key,
            urlencoding::encode(steam_id)
        );

        let body = self.get_json(&url).await?;
        if body["playerstats"]["success"].as_bool() == Some(false) {
            return Err(StatsError::NotFound(format!("Achievements for app {}", appid)));
        }
        let achievements = array_at(&body, "/playerstats/achievements")?;

        Ok(achievements
            .iter()
            .filter_map(|a| serde_json::from_value(a.clone()).ok())
            .collect())
    }

    async fn fetch_store_detail(&self, appid: u64) -> Result<StoreAppDetail> {
        self.store_app_details(appid, None).await
    }

    async fn fetch_store_price(&self, appid: u64) -> Result<StoreAppDetail> {
        self.store_app_details(appid, Some("price_overview,basic")).await
    }

    async fn fetch_featured_apps(&self) -> Result<Vec<FeaturedApp>> {
        let url = format!("{}{}", self.store_base, STORE_FEATURED);

        let body = self.get_json(&url).await?;
        let featured = body["featured_win"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|a| serde_json::from_value(a.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(featured)
    }

    async fn fetch_apps_in_genre(&self, genre: &str) -> Result<Vec<u64>> {
        let url = format!(
            "{}{}?genre={}",
            self.store_base,
            STORE_APPS_IN_GENRE,
            urlencoding::encode(genre)
        );

        let body = self.get_json(&url).await?;
        let Some(tabs) = body["tabs"].as_object() else {
            return Ok(Vec::new());
        };

        // Tabs in document order; an app listed in several tabs appears once per tab.
        Ok(tabs
            .values()
            .filter_map(|tab| tab["items"].as_array())
            .flatten()
            .filter_map(|item| item["id"].as_u64())
            .filter(|&id| id != 0)
            .collect())
    }
}
