//! Trello integration.
//!
//! Read-only access to the boards and cards of the authenticated member.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::core::{ListItem, TrelloConfig};

/// Trello API client.
pub struct TrelloClient {
    /// API base URL
    base_url: String,

    /// Application key
    api_key: String,

    /// Member token
    token: String,

    /// HTTP client
    client: reqwest::blocking::Client,
}

/// A Trello board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Board ID
    pub id: String,

    /// Board name
    pub name: String,
}

/// A label attached to a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardLabel {
    /// Label name
    #[serde(default)]
    pub name: String,
}

/// A Trello card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Card ID
    pub id: String,

    /// Card title
    pub name: String,

    /// Short link to the card
    #[serde(default)]
    pub short_url: String,

    /// Short identifier shown as the link label
    #[serde(default)]
    pub short_link: String,

    /// Labels on the card
    #[serde(default)]
    pub labels: Vec<CardLabel>,

    /// Last activity timestamp (RFC 3339)
    #[serde(default)]
    pub date_last_activity: Option<String>,
}

impl Card {
    /// Check if the card carries a label with the given name.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    /// Parsed last activity timestamp.
    pub fn last_activity(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(self.date_last_activity.as_deref()?).ok()
    }
}

/// Which cards of a board to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFilter {
    /// Cards that are not archived
    Open,
    /// Archived cards
    Closed,
}

impl CardFilter {
    fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// Error types for Trello operations.
#[derive(Debug, thiserror::Error)]
pub enum TrelloError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Trello API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for Trello operations.
pub type TrelloResult<T> = Result<T, TrelloError>;

impl TrelloClient {
    /// Create a new Trello client.
    pub fn new(api_key: impl Into<String>, token: impl Into<String>) -> TrelloResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!("gtd/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: "https://api.trello.com/1".to_string(),
            api_key: api_key.into(),
            token: token.into(),
            client,
        })
    }

    /// Create a client from the `[trello]` config section.
    pub fn from_config(config: &TrelloConfig) -> TrelloResult<Self> {
        Self::new(&config.api_key, &config.token)
    }

    /// Make an authenticated GET request.
    fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> TrelloResult<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("token", self.token.as_str())])
            .query(query)
            .send()?;

        let status = response.status();
        if status.is_success() {
            return response.json().map_err(|e| TrelloError::InvalidResponse(e.to_string()));
        }

        let message = response.text().unwrap_or_else(|_| "Unknown error".to_string());
        match status.as_u16() {
            401 => Err(TrelloError::Auth(message)),
            404 => Err(TrelloError::NotFound(message)),
            _ => Err(TrelloError::Api { status: status.as_u16(), message }),
        }
    }

    /// List boards of the authenticated member.
    pub fn boards(&self) -> TrelloResult<Vec<Board>> {
        self.get("/members/me/boards", &[])
    }

    /// Find a board by name.
    pub fn board(&self, name: &str) -> TrelloResult<Board> {
        self.boards()?
            .into_iter()
            .find(|b| b.name == name)
            .ok_or_else(|| TrelloError::NotFound(format!("board '{name}'")))
    }

    /// List cards of a board.
    pub fn cards(&self, board_id: &str, filter: CardFilter) -> TrelloResult<Vec<Card>> {
        let cards: Vec<Card> =
            self.get(&format!("/boards/{board_id}/cards"), &[("filter", filter.as_str())])?;
        tracing::debug!(
            board = board_id,
            filter = filter.as_str(),
            count = cards.len(),
            "Trello cards"
        );
        Ok(cards)
    }
}

/// Format a card as a list item linking to the card.
pub fn format_card(card: &Card) -> ListItem {
    if card.short_url.is_empty() {
        return ListItem::new(&card.name);
    }
    let label = if card.short_link.is_empty() { &card.id } else { &card.short_link };
    ListItem::linked(label, &card.short_url, &card.name)
}
