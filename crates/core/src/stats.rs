//! Pure folds over Steam payloads
//!
//! Every function here works on data that has already been fetched, so the
//! ordering and capping rules can be tested without a network.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{Result, StatsError};
use crate::models::{
    Achievement, BasePrice, GameDetails, GameImages, GenreCount, MostPlayedGame, MovieView,
    RareAchievement, SteamGame, StoreAppDetail,
};

pub const MOST_PLAYED_LIMIT: usize = 20;
pub const RARE_ACHIEVEMENTS_LIMIT: usize = 10;
pub const TOP_CATEGORY_GAMES: usize = 10;
pub const TOP_CATEGORY_GENRES: usize = 5;

/// Genre descriptions containing any of these (case-insensitive) are not real genres.
pub const EXCLUDED_GENRE_KEYWORDS: [&str; 3] = ["Steam", "support", "controller"];

const SECONDS_PER_WEEK: f64 = 7.0 * 24.0 * 3600.0;

/// Accounts younger than one hour have no meaningful weekly average.
pub const MIN_ELAPSED_WEEKS: f64 = 3600.0 / SECONDS_PER_WEEK;

/// Played games only, most minutes first, upstream order kept among ties.
pub fn most_played(games: &[SteamGame], limit: usize) -> Vec<MostPlayedGame> {
    let mut played: Vec<&SteamGame> = games.iter().filter(|g| g.playtime_forever > 0).collect();
    // sort_by is stable
    played.sort_by(|a, b| b.playtime_forever.cmp(&a.playtime_forever));

    played
        .into_iter()
        .take(limit)
        .map(|g| MostPlayedGame {
            appid: g.appid,
            title: g.name.clone(),
            imageurl: g.header_image_url(),
            playtime_forever: g.playtime_forever,
        })
        .collect()
}

/// Games ordered by playtime descending, zero-playtime games included.
pub fn by_playtime(games: &[SteamGame], limit: usize) -> Vec<SteamGame> {
    let mut sorted = games.to_vec();
    sorted.sort_by(|a, b| b.playtime_forever.cmp(&a.playtime_forever));
    sorted.truncate(limit);
    sorted
}

pub fn total_minutes(games: &[SteamGame]) -> u64 {
    games.iter().map(|g| u64::from(g.playtime_forever)).sum()
}

/// Whole hours played, rounded down.
pub fn total_hours(games: &[SteamGame]) -> u64 {
    total_minutes(games) / 60
}

pub fn elapsed_weeks(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - since).num_seconds() as f64 / SECONDS_PER_WEEK
}

pub fn average_hours_per_week(
    total_hours: u64,
    created_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<f64> {
    let created_at = created_at.ok_or(StatsError::MissingCreationDate)?;
    let weeks = elapsed_weeks(created_at, now);
    if weeks < MIN_ELAPSED_WEEKS {
        return Err(StatsError::DivisionUndefined);
    }
    Ok(total_hours as f64 / weeks)
}

/// Contribution of one app to the library value, in cents.
///
/// Only priced, non-free games count.
pub fn price_contribution_cents(detail: &StoreAppDetail) -> u64 {
    if !detail.is_game() {
        return 0;
    }
    match &detail.price_overview {
        Some(price) if !price.is_free => price.final_price,
        _ => 0,
    }
}

pub fn format_cents(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

pub fn is_excluded_genre(description: &str) -> bool {
    let lower = description.to_lowercase();
    EXCLUDED_GENRE_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(&keyword.to_lowercase()))
}

/// Counts genre occurrences across games and keeps the `limit` most common.
///
/// Ties keep the order in which genres were first seen.
pub fn tally_genres<'a, I, G>(games: I, limit: usize) -> Vec<GenreCount>
where
    I: IntoIterator<Item = G>,
    G: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<GenreCount> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for genres in games {
        for genre in genres {
            if genre.is_empty() || is_excluded_genre(genre) {
                continue;
            }
            match index.get(genre) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(genre, counts.len());
                    counts.push(GenreCount(genre.to_string(), 1));
                }
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

/// Achievements the player unlocked that also carry a global unlock rate.
pub fn unlocked_with_rarity(
    game_title: &str,
    global: &HashMap<String, f64>,
    player: &[Achievement],
) -> Vec<RareAchievement> {
    player
        .iter()
        .filter(|a| a.is_achieved())
        .filter_map(|a| {
            global.get(&a.apiname).map(|&percent| RareAchievement {
                game: game_title.to_string(),
                achievement: a.apiname.clone(),
                rarity: percent,
            })
        })
        .collect()
}

/// Rarest first.
pub fn rarest(mut achievements: Vec<RareAchievement>, limit: usize) -> Vec<RareAchievement> {
    achievements.sort_by(|a, b| a.rarity.total_cmp(&b.rarity));
    achievements.truncate(limit);
    achievements
}

pub fn base_price(detail: &StoreAppDetail) -> BasePrice {
    let cheapest = detail
        .package_groups
        .iter()
        .find(|group| group.name == "default")
        .and_then(|group| group.subs.iter().map(|s| s.price_in_cents_with_discount).min());

    match cheapest {
        Some(cents) => BasePrice::Amount(cents as f64 / 100.0),
        None if detail.is_free => BasePrice::Free,
        None => BasePrice::Unavailable,
    }
}

/// Recommended requirements, when the store published any.
pub fn recommended_requirements(detail: &StoreAppDetail) -> Option<Value> {
    match &detail.pc_requirements {
        Value::Object(map) if !map.is_empty() => map.get("recommended").cloned(),
        _ => None,
    }
}

pub fn game_details(appid: u64, detail: &StoreAppDetail) -> GameDetails {
    GameDetails {
        steam_appid: detail.steam_appid.unwrap_or(appid),
        title: detail
            .name
            .clone()
            .unwrap_or_else(|| "No title available".to_string()),
        genre: detail.genre_descriptions().map(str::to_string).collect(),
        images: GameImages {
            header_image: detail.header_image.clone(),
            background: detail.background.clone(),
            background_raw: detail.background_raw.clone(),
        },
        developers: detail.developers.clone(),
        publishers: detail.publishers.clone(),
        categories: detail.categories.clone(),
        screenshots: detail.screenshots.clone(),
        movies: detail
            .movies
            .iter()
            .map(|m| MovieView {
                id: m.id,
                name: m.name.clone(),
                thumbnail: m.thumbnail.clone(),
                webm: m.webm.clone().unwrap_or_else(empty_object),
                mp4: m.mp4.clone().unwrap_or_else(empty_object),
            })
            .collect(),
        achievements: detail.achievements.as_ref().map(|a| a.total).unwrap_or(0),
        release_date: detail
            .release_date
            .as_ref()
            .map(|r| r.date.clone())
            .unwrap_or_else(|| "No release date".to_string()),
        ratings: detail.ratings.clone().unwrap_or_else(empty_object),
        pc_requirements: recommended_requirements(detail),
        base_price: base_price(detail),
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
