// Person search port. The crate defines the contract and data shapes the
// profile writer consumes; actual search-engine integrations live outside.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A social media profile surfaced by search
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SocialProfile {
    pub platform: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// A news article mentioning the person
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Professional details extracted from search results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfessionalInfo {
    #[serde(default)]
    pub current_position: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Any other relevant reference
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Reference {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Aggregated public information about one person
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchData {
    #[serde(default)]
    pub social_profiles: Vec<SocialProfile>,
    #[serde(default)]
    pub news_articles: Vec<NewsArticle>,
    #[serde(default)]
    pub professional_info: ProfessionalInfo,
    #[serde(default)]
    pub other_references: Vec<Reference>,
}

/// Errors from a search backend
#[derive(Debug)]
pub struct SearchError(pub String);

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Search failed: {}", self.0)
    }
}

impl std::error::Error for SearchError {}

/// Port for web-search backends that look up public information about a
/// person by name.
#[async_trait]
pub trait PersonSearch: Send + Sync {
    async fn search_person(&self, full_name: &str) -> Result<SearchData, SearchError>;
}
