//! Aggregation pipelines: fan out to Steam, fold, sort, cap
//!
//! Independent upstream calls run concurrently, at most `concurrency` at a
//! time. Results are collected before any sorting, so output order never
//! depends on which call finished first.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use steamstats_core::stats;
use steamstats_core::{
    AverageHoursPerWeek, FeaturedApp, GameDetails, GenreCount, LibraryValue, MostPlayedGame,
    PlayerSummary, RareAchievement, RegisteredUser, Result, StatsError, SteamSource, TotalHours,
};

pub const DEFAULT_FRIEND_AMOUNT: usize = 10;

#[derive(Clone)]
pub struct StatsService {
    source: Arc<dyn SteamSource>,
    concurrency: usize,
}

impl StatsService {
    pub fn new(source: Arc<dyn SteamSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn account_summary(&self, steam_id: &str) -> Result<PlayerSummary> {
        self.source.fetch_account_summary(steam_id).await
    }

    /// Summaries of the first `amount` friends, in friend-list order.
    pub async fn friends(&self, steam_id: &str, amount: usize) -> Result<Vec<PlayerSummary>> {
        let ids = self.source.fetch_friend_ids(steam_id).await?;
        let source = self.source.as_ref();

        let summaries: Vec<_> = stream::iter(ids.into_iter().take(amount))
            .map(|friend_id| async move {
                let result = source.fetch_account_summary(&friend_id).await;
                (friend_id, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        Ok(summaries
            .into_iter()
            .filter_map(|(friend_id, result)| match result {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::warn!(friend_id = %friend_id, error = %e, "Skipping friend without summary");
                    None
                }
            })
            .collect())
    }

    pub async fn most_played(&self, steam_id: &str) -> Result<Vec<MostPlayedGame>> {
        let games = self.source.fetch_owned_games(steam_id).await?;
        Ok(stats::most_played(&games, stats::MOST_PLAYED_LIMIT))
    }

    pub async fn total_hours(&self, steam_id: &str) -> Result<TotalHours> {
        let games = self.source.fetch_owned_games(steam_id).await?;
        Ok(TotalHours {
            steamid: steam_id.to_string(),
            total_hours_played: stats::total_hours(&games),
        })
    }

    pub async fn average_hours_per_week(&self, steam_id: &str) -> Result<AverageHoursPerWeek> {
        self.average_hours_per_week_at(steam_id, Utc::now()).await
    }

    pub async fn average_hours_per_week_at(
        &self,
        steam_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AverageHoursPerWeek> {
        let (summary, games) = tokio::join!(
            self.source.fetch_account_summary(steam_id),
            self.source.fetch_owned_games(steam_id),
        );
        let summary = summary?;
        let games = games?;

        let average = stats::average_hours_per_week(stats::total_hours(&games), summary.created_at(), now)?;

        Ok(AverageHoursPerWeek {
            steamid: steam_id.to_string(),
            average_hours_per_week: average,
        })
    }

    /// Sum of current prices of owned games. A failed price lookup counts as zero.
    pub async fn library_value(&self, steam_id: &str) -> Result<LibraryValue> {
        let games = self.source.fetch_owned_games(steam_id).await?;
        let source = self.source.as_ref();

        let cents: Vec<u64> = stream::iter(games)
            .map(|game| async move {
                match source.fetch_store_price(game.appid).await {
                    Ok(detail) => stats::price_contribution_cents(&detail),
                    Err(e) => {
                        tracing::warn!(appid = game.appid, error = %e, "Price lookup failed, counting as 0");
                        0
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        Ok(LibraryValue {
            steamid: steam_id.to_string(),
            total_library_value_usd: stats::format_cents(cents.iter().sum()),
        })
    }

    pub async fn top_categories(&self, steam_id: &str) -> Result<Vec<GenreCount>> {
        let games = self.source.fetch_owned_games(steam_id).await?;
        let top_games = stats::by_playtime(&games, stats::TOP_CATEGORY_GAMES);
        let source = self.source.as_ref();

        let details: Vec<_> = stream::iter(top_games)
            .map(|game| async move {
                match source.fetch_store_detail(game.appid).await {
                    Ok(detail) => Some(detail),
                    Err(e) => {
                        tracing::warn!(appid = game.appid, error = %e, "No store detail, skipping genres");
                        None
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        Ok(stats::tally_genres(
            details.iter().flatten().map(|d| d.genre_descriptions()),
            stats::TOP_CATEGORY_GENRES,
        ))
    }

    /// Rarest unlocked achievements across the whole library.
    ///
    /// Games whose global or player stats cannot be fetched are skipped.
    pub async fn rare_achievements(&self, steam_id: &str) -> Result<Vec<RareAchievement>> {
        let games = self.source.fetch_owned_games(steam_id).await?;
        let source = self.source.as_ref();

        let per_game: Vec<Vec<RareAchievement>> = stream::iter(games)
            .map(|game| async move {
                let (global, player) = tokio::join!(
                    source.fetch_global_achievement_stats(game.appid),
                    source.fetch_player_achievements(game.appid, steam_id),
                );
                match (global, player) {
                    (Ok(global), Ok(player)) => stats::unlocked_with_rarity(&game.name, &global, &player),
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::debug!(appid = game.appid, error = %e, "Skipping game achievements");
                        Vec::new()
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        Ok(stats::rarest(
            per_game.into_iter().flatten().collect(),
            stats::RARE_ACHIEVEMENTS_LIMIT,
        ))
    }

    pub async fn game_details(&self, appid: u64) -> Result<GameDetails> {
        let detail = self.source.fetch_store_detail(appid).await?;
        Ok(stats::game_details(appid, &detail))
    }

    pub async fn featured_games(&self) -> Result<Vec<FeaturedApp>> {
        self.source.fetch_featured_apps().await
    }

    /// Details for every app listed under `genre`, listing order, failures dropped.
    pub async fn apps_in_genre(&self, genre: &str) -> Result<Vec<GameDetails>> {
        let appids = self.source.fetch_apps_in_genre(genre).await?;

        let details: Vec<_> = stream::iter(appids)
            .map(|appid| async move { (appid, self.game_details(appid).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        Ok(details
            .into_iter()
            .filter_map(|(appid, result)| match result {
                Ok(details) => Some(details),
                Err(e) => {
                    tracing::debug!(appid, error = %e, "Dropping app from genre listing");
                    None
                }
            })
            .collect())
    }

    /// Registry rows joined with their Steam profile. Ids Steam does not know
    /// are listed with `N/A` fields; other lookup failures carry the error.
    pub async fn registered_users(&self, steam_ids: Vec<String>) -> Vec<RegisteredUser> {
        let source = self.source.as_ref();

        stream::iter(steam_ids)
            .map(|steam_id| async move {
                match source.fetch_account_summary(&steam_id).await {
                    Ok(summary) => RegisteredUser::Found {
                        personaname: non_empty_or_na(summary.display_name()),
                        avatarmedium: non_empty_or_na(summary.avatarmedium.as_deref().unwrap_or_default()),
                        steam_id,
                    },
                    Err(StatsError::NotFound(_)) => RegisteredUser::Found {
                        personaname: "N/A".to_string(),
                        avatarmedium: "N/A".to_string(),
                        steam_id,
                    },
                    Err(e) => RegisteredUser::Failed {
                        error: e.to_string(),
                        steam_id,
                    },
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

fn non_empty_or_na(value: &str) -> String {
    if value.is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}
