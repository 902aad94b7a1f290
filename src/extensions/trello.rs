//! Trello extension.
//!
//! Lists the cards planned for this week and a few closing statistics for
//! the configured board.

use anyhow::Context;
use chrono::{Datelike, Duration, Local, NaiveDate};

use crate::core::{retry, Config, Extension, ExtensionContext, Report};
use crate::integrations::{format_card, Card, CardFilter, TrelloClient};

/// Registry name.
pub const NAME: &str = "trello";

/// Monday of the week containing `day`.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Average number of cards closed per day, counting both `since` and `today`.
pub fn closed_per_day(closed: usize, since: NaiveDate, today: NaiveDate) -> f64 {
    let days = (today - since).num_days() + 1;
    closed as f64 / days.max(1) as f64
}

/// Cards whose last activity falls on or after `start`, in local time.
pub fn closed_since(cards: &[Card], start: NaiveDate) -> Vec<&Card> {
    cards
        .iter()
        .filter(|c| {
            c.last_activity().is_some_and(|t| t.with_timezone(&Local).date_naive() >= start)
        })
        .collect()
}

/// Trello report extension.
#[derive(Debug, Default)]
pub struct TrelloExtension;

/// Build the extension when Trello credentials are configured.
pub fn factory(config: &Config) -> anyhow::Result<Option<Box<dyn Extension>>> {
    if !config.trello.is_configured() {
        return Ok(None);
    }
    // Reject a malformed date at discovery
    parse_date(&config.trello.stats_since)?;
    Ok(Some(Box::new(TrelloExtension)))
}

fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid trello.stats_since date '{value}'"))
}

impl Extension for TrelloExtension {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Cards planned for this week and closing statistics from Trello"
    }

    fn run(&self, ctx: &ExtensionContext, report: &mut Report) -> anyhow::Result<()> {
        let config = &ctx.config().trello;
        let policy = ctx.retry_policy();
        let since = parse_date(&config.stats_since)?;
        let client = TrelloClient::from_config(config)?;

        let board = retry(&policy, || client.board(&config.board))
            .into_result()
            .with_context(|| format!("Failed to load Trello board '{}'", config.board))?;
        let open = retry(&policy, || client.cards(&board.id, CardFilter::Open))
            .into_result()
            .context("Failed to load open cards")?;
        let closed = retry(&policy, || client.cards(&board.id, CardFilter::Closed))
            .into_result()
            .context("Failed to load closed cards")?;

        report.heading("Trello", 0);

        report.heading("Tickets this week", 1);
        let planned = open.iter().filter(|c| c.has_label(&config.this_week_label));
        report.items(planned.map(format_card));

        let today = Local::now().date_naive();
        let week_start = start_of_week(today);
        let closed_this_week = closed_since(&closed, week_start);

        report.heading("Statistics", 1);
        report.paragraph(format!(
            "Average cards closed per day: {:.2}",
            closed_per_day(closed.len(), since, today)
        ));
        report.paragraph(format!("Number of open cards: {}", open.len()));
        report.paragraph(format!("Start of week: {week_start}"));
        if let Some(last) = closed.first().and_then(|c| c.date_last_activity.as_deref()) {
            report.paragraph(format!("Last card closed on {last}"));
        }
        report.paragraph(format!("Cards closed this week: {}", closed_this_week.len()));

        report.heading("Closed cards this week", 1);
        report.items(closed_this_week.into_iter().map(format_card));

        tracing::info!(
            board = %config.board,
            open = open.len(),
            closed = closed.len(),
            "Trello report ready"
        );
        Ok(())
    }
}
