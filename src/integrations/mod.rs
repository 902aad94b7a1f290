//! External integrations module.
//!
//! Read-only clients for the ticket-tracking services reports pull from.
//! Clients are cheap to build; each extension constructs its own.

pub mod jira;
pub mod trello;

pub use jira::{
    format_issue, format_issues, Comment, CommentPage, IssueFields, IssueStatus, JiraClient,
    JiraError, JiraIssue, JiraResult, ParentFields, ParentIssue,
};
pub use trello::{
    format_card, Board, Card, CardFilter, CardLabel, TrelloClient, TrelloError, TrelloResult,
};
