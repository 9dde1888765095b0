//! Shared data models: raw Steam payloads and the derived views served to clients

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const HEADER_IMAGE_CDN: &str = "https://steamcdn-a.akamaihd.net/steam/apps";

// ============================================================================
// Steam Web API payloads
// ============================================================================

/// Player summary from `ISteamUser/GetPlayerSummaries`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub steamid: String,
    #[serde(default)]
    pub personaname: String,
    #[serde(default)]
    pub profileurl: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub avatarmedium: Option<String>,
    #[serde(default)]
    pub avatarfull: Option<String>,
    #[serde(default)]
    pub personastate: Option<u8>,
    /// Unix seconds; private profiles omit it.
    #[serde(default)]
    pub timecreated: Option<i64>,
}

impl PlayerSummary {
    pub fn display_name(&self) -> &str {
        &self.personaname
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timecreated
            .and_then(|t| Utc.timestamp_opt(t, 0).single())
    }
}

/// Friend list entry from `ISteamUser/GetFriendList`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friend {
    pub steamid: String,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub friend_since: Option<i64>,
}

/// Raw game data from `IPlayerService/GetOwnedGames`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteamGame {
    pub appid: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub playtime_forever: u32,
    #[serde(default)]
    pub rtime_last_played: Option<u32>,
    #[serde(default)]
    pub img_icon_url: Option<String>,
}

impl SteamGame {
    pub fn header_image_url(&self) -> String {
        format!("{}/{}/header.jpg", HEADER_IMAGE_CDN, self.appid)
    }
}

/// Global unlock rate for one achievement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalAchievementPercent {
    pub name: String,
    #[serde(deserialize_with = "percent_from_number_or_string")]
    pub percent: f64,
}

/// Steam has shipped `percent` both as a JSON number and as a numeric string.
fn percent_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Achievement progress from `ISteamUserStats/GetPlayerAchievements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub apiname: String,
    pub achieved: u8,
    #[serde(default)]
    pub unlocktime: u32,
}

impl Achievement {
    pub fn is_achieved(&self) -> bool {
        self.achieved == 1
    }
}

// ============================================================================
// Store API payloads
// ============================================================================

/// `data` object of a store `appdetails` entry. Every field is optional upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreAppDetail {
    #[serde(rename = "type")]
    pub app_type: Option<String>,
    pub name: Option<String>,
    pub steam_appid: Option<u64>,
    pub is_free: bool,
    pub header_image: Option<String>,
    pub background: Option<String>,
    pub background_raw: Option<String>,
    pub developers: Vec<String>,
    pub publishers: Vec<String>,
    pub genres: Vec<Genre>,
    pub categories: Vec<Category>,
    pub screenshots: Vec<Screenshot>,
    pub movies: Vec<Movie>,
    pub achievements: Option<AchievementTotal>,
    pub release_date: Option<ReleaseDate>,
    pub ratings: Option<serde_json::Value>,
    /// An object with `minimum`/`recommended`, or `[]` when the store has none.
    pub pc_requirements: serde_json::Value,
    pub price_overview: Option<PriceOverview>,
    pub package_groups: Vec<PackageGroup>,
}

impl StoreAppDetail {
    pub fn is_game(&self) -> bool {
        self.app_type.as_deref() == Some("game")
    }

    pub fn genre_descriptions(&self) -> impl Iterator<Item = &str> {
        self.genres.iter().filter_map(|g| g.description.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Genre {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: u32,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Screenshot {
    pub id: u32,
    pub path_thumbnail: String,
    pub path_full: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub id: u64,
    pub name: String,
    pub thumbnail: String,
    pub webm: Option<serde_json::Value>,
    pub mp4: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementTotal {
    pub total: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseDate {
    pub coming_soon: bool,
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceOverview {
    pub currency: String,
    pub initial: u64,
    #[serde(rename = "final")]
    pub final_price: u64,
    pub discount_percent: u32,
    pub is_free: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageGroup {
    pub name: String,
    pub subs: Vec<PackageSub>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSub {
    pub packageid: u64,
    pub option_text: String,
    pub price_in_cents_with_discount: u64,
    pub is_free_license: bool,
}

/// Entry of the store's `featured_win` list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturedApp {
    pub id: u64,
    pub name: String,
    pub discounted: bool,
    pub discount_percent: u32,
    pub original_price: Option<u64>,
    pub final_price: u64,
    pub currency: String,
    pub large_capsule_image: String,
    pub small_capsule_image: String,
    pub header_image: String,
    pub windows_available: bool,
    pub mac_available: bool,
    pub linux_available: bool,
    pub controller_support: Option<String>,
}

// ============================================================================
// Derived views
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostPlayedGame {
    pub appid: u64,
    pub title: String,
    pub imageurl: String,
    pub playtime_forever: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RareAchievement {
    pub game: String,
    pub achievement: String,
    pub rarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalHours {
    pub steamid: String,
    pub total_hours_played: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageHoursPerWeek {
    pub steamid: String,
    pub average_hours_per_week: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryValue {
    pub steamid: String,
    pub total_library_value_usd: String,
}

/// `(genre, count)`, serialized as a two-element array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCount(pub String, pub u32);

/// Cheapest price of an app, or why there is none
#[derive(Debug, Clone, PartialEq)]
pub enum BasePrice {
    Amount(f64),
    Free,
    Unavailable,
}

impl BasePrice {
    pub const FREE_LABEL: &'static str = "Free";
    pub const UNAVAILABLE_LABEL: &'static str = "Price information not available";
}

impl Serialize for BasePrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BasePrice::Amount(amount) => serializer.serialize_f64(*amount),
            BasePrice::Free => serializer.serialize_str(Self::FREE_LABEL),
            BasePrice::Unavailable => serializer.serialize_str(Self::UNAVAILABLE_LABEL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameImages {
    pub header_image: Option<String>,
    pub background: Option<String>,
    pub background_raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieView {
    pub id: u64,
    pub name: String,
    pub thumbnail: String,
    pub webm: serde_json::Value,
    pub mp4: serde_json::Value,
}

/// Store detail flattened for clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameDetails {
    pub steam_appid: u64,
    pub title: String,
    pub genre: Vec<String>,
    pub images: GameImages,
    pub developers: Vec<String>,
    pub publishers: Vec<String>,
    pub categories: Vec<Category>,
    pub screenshots: Vec<Screenshot>,
    pub movies: Vec<MovieView>,
    pub achievements: u32,
    pub release_date: String,
    pub ratings: serde_json::Value,
    pub pc_requirements: Option<serde_json::Value>,
    pub base_price: BasePrice,
}

/// Row of the `/users` listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RegisteredUser {
    Found {
        steam_id: String,
        personaname: String,
        avatarmedium: String,
    },
    Failed {
        steam_id: String,
        error: String,
    },
}
