use chrono::NaiveDate;
use serde::Deserialize;

/// One canonical record from the metadata catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogGame {
    pub id: i64,
    pub name: String,
    pub cover_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub platforms: Vec<String>,
    pub main_story_hours: Option<f64>,
    pub main_extra_hours: Option<f64>,
    pub completionist_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchEnvelope {
    #[serde(default)]
    pub results: Vec<CatalogGame>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GameEnvelope {
    pub game: CatalogGame,
}
