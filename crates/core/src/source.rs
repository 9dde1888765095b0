//! Capability trait over the Steam Web and Store APIs

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Achievement, FeaturedApp, PlayerSummary, SteamGame, StoreAppDetail};

/// One method per upstream resource. Implementations perform a single
/// outbound call and never retry.
#[async_trait]
pub trait SteamSource: Send + Sync {
    async fn fetch_account_summary(&self, steam_id: &str) -> Result<PlayerSummary>;

    async fn fetch_friend_ids(&self, steam_id: &str) -> Result<Vec<String>>;

    /// Upstream order, unsorted.
    async fn fetch_owned_games(&self, steam_id: &str) -> Result<Vec<SteamGame>>;

    /// Achievement api name -> global unlock percent.
    async fn fetch_global_achievement_stats(&self, appid: u64) -> Result<HashMap<String, f64>>;

    async fn fetch_player_achievements(&self, appid: u64, steam_id: &str) -> Result<Vec<Achievement>>;

    async fn fetch_store_detail(&self, appid: u64) -> Result<StoreAppDetail>;

    /// Store detail trimmed to basic and price fields.
    async fn fetch_store_price(&self, appid: u64) -> Result<StoreAppDetail> {
        self.fetch_store_detail(appid).await
    }

    async fn fetch_featured_apps(&self) -> Result<Vec<FeaturedApp>>;

    /// App ids from every tab of the genre page, duplicates kept.
    async fn fetch_apps_in_genre(&self, genre: &str) -> Result<Vec<u64>>;
}
