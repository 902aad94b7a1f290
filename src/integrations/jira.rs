//! Jira integration.
//!
//! Minimal read-only client for Jira's REST search API. All searches are
//! JQL queries and are paged until every matching issue has been fetched.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{JiraConfig, ListItem};

/// Jira REST API client.
pub struct JiraClient {
    /// Base URL of the instance, without trailing slash
    base_url: String,

    /// Basic-auth user name
    username: String,

    /// Basic-auth password or API token
    password: String,

    /// Issues requested per page
    page_size: u32,

    /// HTTP client
    client: reqwest::blocking::Client,
}

/// A Jira issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraIssue {
    /// Issue key (e.g., "GTD-42")
    pub key: String,

    /// Issue fields
    pub fields: IssueFields,
}

/// The subset of issue fields used in reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    /// Issue title
    #[serde(default)]
    pub summary: String,

    /// Workflow status
    #[serde(default)]
    pub status: Option<IssueStatus>,

    /// Due date (YYYY-MM-DD)
    #[serde(default)]
    pub duedate: Option<String>,

    /// Comments on the issue
    #[serde(default)]
    pub comment: Option<CommentPage>,

    /// Parent issue, e.g. the epic of a task
    #[serde(default)]
    pub parent: Option<ParentIssue>,

    /// Everything else, including custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Workflow status of an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueStatus {
    /// Status name
    pub name: String,
}

/// Comments embedded in an issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A single comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub body: String,
}

/// Reference to a parent issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentIssue {
    pub key: String,
    #[serde(default)]
    pub fields: ParentFields,
}

/// Fields of a parent issue returned inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParentFields {
    #[serde(default)]
    pub summary: String,
}

impl JiraIssue {
    /// Value of a select-type custom field, e.g. the task context.
    pub fn custom_value(&self, field: &str) -> Option<&str> {
        self.fields.extra.get(field)?.get("value")?.as_str()
    }

    /// Entries of a multi-value text custom field, e.g. the stakeholders of
    /// an epic.
    pub fn custom_strings(&self, field: &str) -> Vec<&str> {
        self.fields
            .extra
            .get(field)
            .and_then(serde_json::Value::as_array)
            .map(|values| values.iter().filter_map(serde_json::Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Comment bodies in posting order.
    pub fn comment_bodies(&self) -> Vec<&str> {
        self.fields
            .comment
            .as_ref()
            .map(|page| page.comments.iter().map(|c| c.body.as_str()).collect())
            .unwrap_or_default()
    }

    /// Summary of the parent issue, or an empty string when there is none.
    pub fn parent_summary(&self) -> &str {
        self.fields.parent.as_ref().map(|p| p.fields.summary.as_str()).unwrap_or("")
    }

    /// Status name, or an empty string when missing.
    pub fn status_name(&self) -> &str {
        self.fields.status.as_ref().map(|s| s.name.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    start_at: u32,
    total: u32,
    issues: Vec<JiraIssue>,
}

/// Error types for Jira operations.
#[derive(Debug, thiserror::Error)]
pub enum JiraError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Jira API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for Jira operations.
pub type JiraResult<T> = Result<T, JiraError>;

impl JiraClient {
    /// Create a new Jira client.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> JiraResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!("gtd/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            page_size: 100,
            client,
        })
    }

    /// Create a client from the `[jira]` config section.
    pub fn from_config(config: &JiraConfig) -> JiraResult<Self> {
        Self::new(&config.url, &config.username, &config.password)
    }

    /// Base URL of the instance.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser URL of an issue.
    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }

    /// Run a JQL search and return every matching issue.
    pub fn search(&self, jql: &str) -> JiraResult<Vec<JiraIssue>> {
        let mut issues = Vec::new();
        let mut start_at = 0u32;

        loop {
            let page = self.search_page(jql, start_at)?;
            let fetched = page.issues.len() as u32;
            issues.extend(page.issues);

            start_at = page.start_at + fetched;
            if fetched == 0 || start_at >= page.total {
                break;
            }
        }

        tracing::debug!(jql, count = issues.len(), "Jira search");
        Ok(issues)
    }

    fn search_page(&self, jql: &str, start_at: u32) -> JiraResult<SearchResponse> {
        let url = format!("{}/rest/api/2/search", self.base_url);
        let start_at = start_at.to_string();
        let max_results = self.page_size.to_string();

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .query(&[
                ("jql", jql),
                ("startAt", start_at.as_str()),
                ("maxResults", max_results.as_str()),
            ])
            .send()?;

        handle_response(response)
    }
}

/// Handle API response.
fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::blocking::Response,
) -> JiraResult<T> {
    let status = response.status();

    if status.is_success() {
        response.json().map_err(|e| JiraError::InvalidResponse(e.to_string()))
    } else {
        let message = response.text().unwrap_or_else(|_| "Unknown error".to_string());

        match status.as_u16() {
            401 | 403 => Err(JiraError::Auth(message)),
            404 => Err(JiraError::NotFound(message)),
            _ => Err(JiraError::Api { status: status.as_u16(), message }),
        }
    }
}

/// Format an issue as a list item linking to its browser page.
///
/// Extended items also carry the due date and the comments.
pub fn format_issue(issue: &JiraIssue, href: impl Into<String>, extended: bool) -> ListItem {
    let mut text = issue.fields.summary.clone();

    let status = issue.status_name();
    if !status.is_empty() {
        text.push_str(&format!(" ({status})"));
    }

    if extended {
        if let Some(due) = &issue.fields.duedate {
            text.push_str(&format!(" (Due {due})"));
        }
        let comments = issue.comment_bodies();
        if !comments.is_empty() {
            text.push_str(&format!(": {}", comments.join(", ")));
        }
    }

    ListItem::linked(&issue.key, href, text)
}

/// Format issues, sorted by due date when every issue has one.
pub fn format_issues(client: &JiraClient, issues: &[&JiraIssue], extended: bool) -> Vec<ListItem> {
    let mut sorted: Vec<&JiraIssue> = issues.to_vec();
    if sorted.iter().all(|i| i.fields.duedate.is_some()) {
        // ISO dates sort lexicographically
        sorted.sort_by(|a, b| a.fields.duedate.cmp(&b.fields.duedate));
    }
    sorted
        .into_iter()
        .map(|i| format_issue(i, client.browse_url(&i.key), extended))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(key: &str, due: Option<&str>) -> JiraIssue {
        JiraIssue {
            key: key.to_string(),
            fields: IssueFields {
                summary: format!("Task {key}"),
                status: Some(IssueStatus { name: "To Do".to_string() }),
                duedate: due.map(String::from),
                ..IssueFields::default()
            },
        }
    }

    #[test]
    fn test_deserialize_search_response() {
        let json = r#"{
            "startAt": 0,
            "maxResults": 50,
            "total": 1,
            "issues": [{
                "key": "GTD-7",
                "fields": {
                    "summary": "Renew passport",
                    "status": { "name": "In Progress" },
                    "duedate": "2025-03-01",
                    "customfield_10036": { "value": "Errands" }
                }
            }]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total, 1);

        let issue = &response.issues[0];
        assert_eq!(issue.key, "GTD-7");
        assert_eq!(issue.status_name(), "In Progress");
        assert_eq!(issue.custom_value("customfield_10036"), Some("Errands"));
        assert_eq!(issue.custom_value("customfield_99999"), None);
    }

    #[test]
    fn test_null_fields_tolerated() {
        let json = r#"{
            "key": "GTD-1",
            "fields": { "summary": "x", "duedate": null, "customfield_10036": null }
        }"#;
        let issue: JiraIssue = serde_json::from_str(json).unwrap();
        assert!(issue.fields.duedate.is_none());
        assert_eq!(issue.custom_value("customfield_10036"), None);
        assert_eq!(issue.status_name(), "");
    }

    #[test]
    fn test_format_issue() {
        let mut i = issue("GTD-1", Some("2025-01-10"));
        let href = "https://jira.test/browse/GTD-1";

        let item = format_issue(&i, href, false);
        assert_eq!(item.to_string(), "[GTD-1] Task GTD-1 (To Do)");
        assert_eq!(item.link.as_ref().map(|l| l.href.as_str()), Some(href));
        assert_eq!(
            format_issue(&i, href, true).to_string(),
            "[GTD-1] Task GTD-1 (To Do) (Due 2025-01-10)"
        );

        i.fields.comment = Some(CommentPage {
            comments: vec![Comment { body: "waiting".into() }, Comment { body: "pinged".into() }],
        });
        assert_eq!(
            format_issue(&i, href, true).text,
            "Task GTD-1 (To Do) (Due 2025-01-10): waiting, pinged"
        );
        assert_eq!(format_issue(&i, href, false).text, "Task GTD-1 (To Do)");
    }

    #[test]
    fn test_format_issues_sorted_by_due_date() {
        let client = JiraClient::new("https://jira.test", "me", "secret").unwrap();
        let late = issue("A", Some("2025-02-01"));
        let early = issue("B", Some("2025-01-01"));
        let items = format_issues(&client, &[&late, &early], false);
        assert!(items[0].to_string().starts_with("[B]"));
        assert_eq!(items[0].link.as_ref().unwrap().href, "https://jira.test/browse/B");

        let undated = issue("C", None);
        let items = format_issues(&client, &[&late, &undated, &early], false);
        assert!(items[0].to_string().starts_with("[A]"));
    }

    #[test]
    fn test_parent_and_multi_value_fields() {
        let json = r#"{
            "key": "GTD-9",
            "fields": {
                "summary": "Draft plan",
                "parent": { "key": "GTD-1", "fields": { "summary": "Move flat" } },
                "customfield_10038": ["Alice", "Bob"],
                "comment": { "comments": [{ "body": "ok" }], "total": 1 }
            }
        }"#;
        let issue: JiraIssue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.parent_summary(), "Move flat");
        assert_eq!(issue.custom_strings("customfield_10038"), vec!["Alice", "Bob"]);
        assert!(issue.custom_strings("customfield_1").is_empty());
        assert_eq!(issue.comment_bodies(), vec!["ok"]);
    }

    #[test]
    fn test_client_urls() {
        let client = JiraClient::new("https://example.atlassian.net/", "me", "secret").unwrap();
        assert_eq!(client.base_url(), "https://example.atlassian.net");
        assert_eq!(client.browse_url("GTD-3"), "https://example.atlassian.net/browse/GTD-3");
    }
}
