use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Third-party platform that reports owned titles and playtime.
///
/// Stored as lowercase text; `Steam` is the only storefront wired up today
/// but every key that touches persistence is namespaced by this enum so a
/// second storefront is a data change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Storefront {
    Steam,
}

impl Storefront {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Storefront::Steam => "steam",
        }
    }
}

impl std::str::FromStr for Storefront {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "steam" => Ok(Storefront::Steam),
            other => Err(format!("unknown storefront: {other}")),
        }
    }
}

/// Catalog-match state of an imported game row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Matched,
    Unmatched,
}

impl MatchStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Matched => "matched",
            MatchStatus::Unmatched => "unmatched",
        }
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "matched" => Ok(MatchStatus::Matched),
            "unmatched" => Ok(MatchStatus::Unmatched),
            other => Err(format!("unknown match status: {other}")),
        }
    }
}

/// How a collection item was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionType {
    Digital,
    Physical,
    Subscription,
}

impl AcquisitionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AcquisitionType::Digital => "digital",
            AcquisitionType::Physical => "physical",
            AcquisitionType::Subscription => "subscription",
        }
    }
}

impl std::str::FromStr for AcquisitionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "digital" => Ok(AcquisitionType::Digital),
            "physical" => Ok(AcquisitionType::Physical),
            "subscription" => Ok(AcquisitionType::Subscription),
            other => Err(format!("unknown acquisition type: {other}")),
        }
    }
}

/// One storefront title flowing through the reconciliation pipeline.
///
/// The merge stage produces these from raw storefront entries; the filter
/// stage prunes them; the upsert store persists the survivors. All playtime
/// figures are minutes, matching what the storefront reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportCandidate {
    pub storefront: Storefront,
    pub storefront_game_id: String,
    pub name: String,
    pub playtime_minutes: i64,
    pub playtime_windows_minutes: i64,
    pub playtime_mac_minutes: i64,
    pub playtime_linux_minutes: i64,
    pub last_played_at: Option<DateTime<Utc>>,
    pub icon_url: Option<String>,
    pub logo_url: Option<String>,
    /// Carried when the storefront entry already maps to a catalog id,
    /// letting the resolver skip the name search.
    pub catalog_id: Option<i64>,
}
