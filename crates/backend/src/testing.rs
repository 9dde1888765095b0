//! In-memory `SteamSource` for pipeline and route tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use steamstats_core::{
    Achievement, FeaturedApp, PlayerSummary, Result, StatsError, SteamGame, SteamSource,
    StoreAppDetail,
};

/// Canned upstream. Anything not registered answers like Steam would for an unknown id.
#[derive(Default)]
pub struct FakeSteam {
    summaries: HashMap<String, PlayerSummary>,
    summary_errors: HashMap<String, StatsError>,
    friends: HashMap<String, Vec<String>>,
    games: HashMap<String, Vec<SteamGame>>,
    global_stats: HashMap<u64, HashMap<String, f64>>,
    player_achievements: HashMap<(u64, String), Vec<Achievement>>,
    store: HashMap<u64, StoreAppDetail>,
    featured: Vec<FeaturedApp>,
    genres: HashMap<String, Vec<u64>>,
    latency: bool,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
    pub store_calls: AtomicUsize,
}

pub fn game(appid: u64, name: &str, playtime: u32) -> SteamGame {
    SteamGame {
        appid,
        name: name.to_string(),
        playtime_forever: playtime,
        rtime_last_played: None,
        img_icon_url: None,
    }
}

pub fn summary(steam_id: &str, name: &str, timecreated: Option<i64>) -> PlayerSummary {
    PlayerSummary {
        steamid: steam_id.to_string(),
        personaname: name.to_string(),
        profileurl: None,
        avatar: None,
        avatarmedium: Some(format!("https://avatars.example/{}.jpg", steam_id)),
        avatarfull: None,
        personastate: None,
        timecreated,
    }
}

pub fn unlocked(apiname: &str, achieved: bool) -> Achievement {
    Achievement {
        apiname: apiname.to_string(),
        achieved: u8::from(achieved),
        unlocktime: 0,
    }
}

pub fn store_detail(value: serde_json::Value) -> StoreAppDetail {
    serde_json::from_value(value).expect("valid store detail")
}

impl FakeSteam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(mut self, summary: PlayerSummary) -> Self {
        self.summaries.insert(summary.steamid.clone(), summary);
        self
    }

    pub fn with_summary_error(mut self, steam_id: &str, error: StatsError) -> Self {
        self.summary_errors.insert(steam_id.to_string(), error);
        self
    }

    /// Summary and store lookups sleep longer the smaller the id, so early
    /// requests finish last.
    pub fn with_latency(mut self) -> Self {
        self.latency = true;
        self
    }

    pub fn with_friends(mut self, steam_id: &str, friends: &[&str]) -> Self {
        self.friends
            .insert(steam_id.to_string(), friends.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn with_games(mut self, steam_id: &str, games: Vec<SteamGame>) -> Self {
        self.games.insert(steam_id.to_string(), games);
        self
    }

    pub fn with_global_stats(mut self, appid: u64, stats: &[(&str, f64)]) -> Self {
        self.global_stats.insert(
            appid,
            stats.iter().map(|(name, pct)| (name.to_string(), *pct)).collect(),
        );
        self
    }

    pub fn with_player_achievements(mut self, appid: u64, steam_id: &str, achievements: Vec<Achievement>) -> Self {
        self.player_achievements
            .insert((appid, steam_id.to_string()), achievements);
        self
    }

    pub fn with_store(mut self, appid: u64, detail: StoreAppDetail) -> Self {
        self.store.insert(appid, detail);
        self
    }

    pub fn with_featured(mut self, featured: Vec<FeaturedApp>) -> Self {
        self.featured = featured;
        self
    }

    pub fn with_genre(mut self, genre: &str, appids: &[u64]) -> Self {
        self.genres.insert(genre.to_string(), appids.to_vec());
        self
    }

    async fn simulate_call(&self, id: u64) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if self.latency {
            tokio::time::sleep(Duration::from_millis(100 - 10 * id.min(9))).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SteamSource for FakeSteam {
    async fn fetch_account_summary(&self, steam_id: &str) -> Result<PlayerSummary> {
        self.simulate_call(steam_id.parse().unwrap_or(0)).await;
        if let Some(e) = self.summary_errors.get(steam_id) {
            return Err(e.clone());
        }
        self.summaries
            .get(steam_id)
            .cloned()
            .ok_or_else(|| StatsError::NotFound(format!("Steam user {}", steam_id)))
    }

    async fn fetch_friend_ids(&self, steam_id: &str) -> Result<Vec<String>> {
        self.friends
            .get(steam_id)
            .cloned()
            .ok_or_else(|| StatsError::unavailable(Some(401), "Steam responded with 401 Unauthorized"))
    }

    async fn fetch_owned_games(&self, steam_id: &str) -> Result<Vec<SteamGame>> {
        self.games
            .get(steam_id)
            .cloned()
            .ok_or_else(|| StatsError::malformed("missing /response/games"))
    }

    async fn fetch_global_achievement_stats(&self, appid: u64) -> Result<HashMap<String, f64>> {
        self.global_stats
            .get(&appid)
            .cloned()
            .ok_or_else(|| StatsError::unavailable(Some(403), "Steam responded with 403 Forbidden"))
    }

    async fn fetch_player_achievements(&self, appid: u64, steam_id: &str) -> Result<Vec<Achievement>> {
        self.player_achievements
            .get(&(appid, steam_id.to_string()))
            .cloned()
            .ok_or_else(|| StatsError::NotFound(format!("Achievements for app {}", appid)))
    }

    async fn fetch_store_detail(&self, appid: u64) -> Result<StoreAppDetail> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_call(appid).await;
        self.store
            .get(&appid)
            .cloned()
            .ok_or_else(|| StatsError::NotFound(format!("App {}", appid)))
    }

    async fn fetch_featured_apps(&self) -> Result<Vec<FeaturedApp>> {
        Ok(self.featured.clone())
    }

    async fn fetch_apps_in_genre(&self, genre: &str) -> Result<Vec<u64>> {
        Ok(self.genres.get(genre).cloned().unwrap_or_default())
    }
}
