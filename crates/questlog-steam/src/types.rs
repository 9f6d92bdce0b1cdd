//! Wire shapes for the Steam Web API and the domain types derived from them.

use chrono::{DateTime, Utc};
use serde::Deserialize;

const MEDIA_BASE: &str = "https://media.steampowered.com/steamcommunity/public/images/apps";

// ---------------------------------------------------------------------------
// Wire types (Steam's JSON envelopes)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct VanityEnvelope {
    pub response: VanityResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VanityResponse {
    pub success: i32,
    pub steamid: Option<String>,
    #[allow(dead_code)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummariesEnvelope {
    pub response: SummariesResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummariesResponse {
    #[serde(default)]
    pub players: Vec<WirePlayer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePlayer {
    pub steamid: String,
    pub personaname: String,
    pub avatarfull: Option<String>,
    /// 3 means the profile is public.
    pub communityvisibilitystate: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnedGamesEnvelope {
    pub response: OwnedGamesResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnedGamesResponse {
    #[serde(default)]
    pub game_count: i64,
    /// Absent (not empty) when the profile's game details are private.
    pub games: Option<Vec<WireOwnedGame>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireOwnedGame {
    pub appid: i64,
    pub name: String,
    /// All playtime fields are minutes.
    #[serde(default)]
    pub playtime_forever: i64,
    #[serde(default)]
    pub playtime_windows_forever: i64,
    #[serde(default)]
    pub playtime_mac_forever: i64,
    #[serde(default)]
    pub playtime_linux_forever: i64,
    /// Unix seconds; 0 means never played.
    #[serde(default)]
    pub rtime_last_played: i64,
    pub img_icon_url: Option<String>,
    pub img_logo_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// A Steam profile summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub steam_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub is_public: bool,
}

impl From<WirePlayer> for PlayerProfile {
    fn from(player: WirePlayer) -> Self {
        Self {
            is_public: player.communityvisibilitystate == 3,
            steam_id: player.steamid,
            display_name: player.personaname,
            avatar_url: player.avatarfull,
        }
    }
}

/// One owned title as reported by the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedGame {
    pub app_id: i64,
    pub name: String,
    pub playtime_minutes: i64,
    pub playtime_windows_minutes: i64,
    pub playtime_mac_minutes: i64,
    pub playtime_linux_minutes: i64,
    pub last_played_at: Option<DateTime<Utc>>,
    pub icon_url: Option<String>,
    pub logo_url: Option<String>,
}

impl From<WireOwnedGame> for OwnedGame {
    fn from(game: WireOwnedGame) -> Self {
        let media_url = |hash: Option<String>| {
            hash.filter(|h| !h.is_empty())
                .map(|h| format!("{MEDIA_BASE}/{}/{h}.jpg", game.appid))
        };
        Self {
            app_id: game.appid,
            playtime_minutes: game.playtime_forever,
            playtime_windows_minutes: game.playtime_windows_forever,
            playtime_mac_minutes: game.playtime_mac_forever,
            playtime_linux_minutes: game.playtime_linux_forever,
            last_played_at: (game.rtime_last_played > 0)
                .then(|| DateTime::from_timestamp(game.rtime_last_played, 0))
                .flatten(),
            icon_url: media_url(game.img_icon_url),
            logo_url: media_url(game.img_logo_url),
            name: game.name,
        }
    }
}
