//! Jira extension.
//!
//! Weekly health overview of the Jira backlog: an overall rating, the
//! resolution rate of the past week, overdue and upcoming tasks grouped by
//! context, the weekly retro, badly specified tickets, free and overloaded
//! due dates, and the stakeholders of open epics.

use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use chrono::{Duration, Local, NaiveDate};

use crate::core::{retry, Config, Element, Extension, ExtensionContext, Report, RetryPolicy, Tone};
use crate::integrations::{format_issues, JiraClient, JiraIssue};

/// Registry name.
pub const NAME: &str = "jira";

const BAD_TICKETS: &str = "filter = 'Badly specified tasks'";
const BAD_EPICS: &str = "filter = 'Badly specified epics'";
const OVERDUE: &str = "filter = 'Tasks this week' and duedate < endOFDay()";
const THIS_WEEK: &str = "filter = 'Tasks this week'";
const RESOLVED: &str = "resolved > -7days";
const DELEGATED: &str = "filter = 'Delegated'";
const BACKLOG: &str = "filter = 'Backlog' and duedate is empty";
const RETRO: &str = "filter = 'weekly retro'";
const SCHEDULED: &str =
    "issuetype = Task AND statuscategory != Done AND duedate < 60days AND duedate is not empty";
const UPCOMING: &str = "issuetype = Task AND statuscategory != Done AND duedate < 32days";
const OPEN_EPICS: &str = "issuetype = Epic AND statuscategory != Done";

/// Days ahead searched for free due dates.
const FREE_SLOT_DAYS: i64 = 60;

/// Retro group of tasks without an epic.
pub const NO_PROJECT: &str = "Non-project related tasks";

/// Tasks due this week above which the week counts as overloaded.
const BUSY_WEEK: usize = 21;

/// Overall state of the backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Bad,
    Concerning,
    Good,
    Excellent,
}

impl Rating {
    /// Rate the backlog from the sizes of the relevant searches.
    pub fn assess(bad_tickets: usize, bad_epics: usize, overdue: usize, this_week: usize) -> Self {
        if bad_tickets > 0 || bad_epics > 0 || overdue > 1 {
            Self::Bad
        } else if overdue > 0 || this_week > BUSY_WEEK {
            Self::Concerning
        } else if this_week > 5 {
            Self::Good
        } else {
            Self::Excellent
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Bad => "Bad",
            Self::Concerning => "Concerning",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        }
    }

    /// Highlight used when rendering.
    pub fn tone(self) -> Tone {
        match self {
            Self::Bad => Tone::Bad,
            Self::Concerning => Tone::Warning,
            Self::Good => Tone::Good,
            Self::Excellent => Tone::Info,
        }
    }
}

/// Advice derived from the number of tasks resolved in the last 7 days.
///
/// The target is four tasks per day.
pub fn resolution_advice(resolved: usize) -> (String, Tone) {
    let rate = resolved as f64 / 7.0;

    if (4.0..6.0).contains(&rate) {
        (format!("{rate:.2} - keep doing 4 tasks per day!"), Tone::Good)
    } else if rate < 4.0 {
        let missing = 32usize.saturating_sub(resolved);
        (format!("{rate:.2} - do {missing} tasks today to get to rate of 4"), Tone::Warning)
    } else {
        let rest = resolved.saturating_sub(28) / 4;
        (format!("{rate:.2} - rest for {rest} days"), Tone::Info)
    }
}

/// Number of backlog tasks to suggest for today.
pub fn focus_count(overdue: usize, this_week: usize, backlog_focus: usize) -> usize {
    if overdue == 0 && this_week < BUSY_WEEK {
        backlog_focus
    } else {
        1
    }
}

/// Group issues by the value of their context field.
///
/// Issues without a context end up under "No context".
pub fn group_by_context<'a>(
    issues: &'a [JiraIssue],
    field: &str,
) -> BTreeMap<String, Vec<&'a JiraIssue>> {
    let mut groups: BTreeMap<String, Vec<&JiraIssue>> = BTreeMap::new();
    for issue in issues {
        let context = issue.custom_value(field).unwrap_or("No context");
        groups.entry(context.to_string()).or_default().push(issue);
    }
    groups
}

/// Days from `today` on that still have room for a due date, with the number
/// of free slots on each.
pub fn free_slots<'a>(
    due_dates: impl IntoIterator<Item = &'a str>,
    today: NaiveDate,
    days: i64,
    max_per_day: usize,
) -> Vec<(NaiveDate, usize)> {
    let mut taken: HashMap<&str, usize> = HashMap::new();
    for due in due_dates {
        *taken.entry(due).or_default() += 1;
    }

    (0..days)
        .map(|offset| today + Duration::days(offset))
        .filter_map(|day| {
            let key = day.format("%Y-%m-%d").to_string();
            let used = taken.get(key.as_str()).copied().unwrap_or(0);
            (used < max_per_day).then(|| (day, max_per_day - used))
        })
        .collect()
}

/// Due dates carrying more than `max_per_day` issues.
pub fn critical_days(
    issues: &[JiraIssue],
    max_per_day: usize,
) -> BTreeMap<&str, Vec<&JiraIssue>> {
    let mut by_day: BTreeMap<&str, Vec<&JiraIssue>> = BTreeMap::new();
    for issue in issues {
        if let Some(due) = issue.fields.duedate.as_deref() {
            by_day.entry(due).or_default().push(issue);
        }
    }
    by_day.retain(|_, issues| issues.len() > max_per_day);
    by_day
}

/// Stakeholders named on the given epics with their epic count, most
/// involved first.
pub fn stakeholders(epics: &[JiraIssue], field: &str) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for epic in epics {
        for name in epic.custom_strings(field) {
            *counts.entry(name).or_default() += 1;
        }
    }

    let mut sorted: Vec<(String, usize)> =
        counts.into_iter().map(|(name, n)| (name.to_string(), n)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

/// Finished tasks grouped by the summary of their epic.
pub fn retro_groups(tasks: &[JiraIssue]) -> BTreeMap<&str, Vec<&JiraIssue>> {
    let mut groups: BTreeMap<&str, Vec<&JiraIssue>> = BTreeMap::new();
    for task in tasks {
        let epic = match task.parent_summary() {
            "" => NO_PROJECT,
            summary => summary,
        };
        groups.entry(epic).or_default().push(task);
    }
    groups
}

/// Jira report extension.
#[derive(Debug, Default)]
pub struct JiraExtension;

/// Build the extension when a Jira instance is configured.
pub fn factory(config: &Config) -> anyhow::Result<Option<Box<dyn Extension>>> {
    if !config.jira.is_configured() {
        return Ok(None);
    }
    Ok(Some(Box::new(JiraExtension)))
}

fn search(
    client: &JiraClient,
    policy: &RetryPolicy,
    jql: &str,
) -> anyhow::Result<Vec<JiraIssue>> {
    let outcome = retry(policy, || client.search(jql));
    if outcome.was_retried() {
        tracing::debug!(jql, attempts = outcome.attempts, "Jira search retried");
    }
    outcome.into_result().with_context(|| format!("Jira search failed ({jql})"))
}

fn issue_list(client: &JiraClient, issues: &[&JiraIssue], extended: bool) -> Element {
    Element::list(format_issues(client, issues, extended))
}

impl Extension for JiraExtension {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Backlog rating, resolution rate and due tasks from Jira"
    }

    fn run(&self, ctx: &ExtensionContext, report: &mut Report) -> anyhow::Result<()> {
        let config = &ctx.config().jira;
        let policy = ctx.retry_policy();
        let client = JiraClient::from_config(config)?;

        let bad_tickets = search(&client, &policy, BAD_TICKETS)?;
        let bad_epics = search(&client, &policy, BAD_EPICS)?;
        let overdue = search(&client, &policy, OVERDUE)?;
        let this_week = search(&client, &policy, THIS_WEEK)?;
        let resolved = search(&client, &policy, RESOLVED)?;

        report.heading("Jira", 0);

        let rating =
            Rating::assess(bad_tickets.len(), bad_epics.len(), overdue.len(), this_week.len());
        report.add(Element::rating("Overall rating", rating.label(), rating.tone()));

        let (advice, tone) = resolution_advice(resolved.len());
        report.add(Element::rating("Resolution rate", advice, tone));

        report.heading("Overdue tasks", 1);
        for (context, issues) in group_by_context(&overdue, &config.context_field) {
            report.heading(context, 2);
            report.add(issue_list(&client, &issues, true));
        }

        report.heading("Due this week", 1);
        let today = Local::now().date_naive();
        for offset in 0..8 {
            let day = today + Duration::days(offset);
            report.heading(day.format("%A, %d %B %Y").to_string(), 2);

            let key = day.format("%Y-%m-%d").to_string();
            let due: Vec<JiraIssue> = this_week
                .iter()
                .filter(|i| i.fields.duedate.as_deref() == Some(key.as_str()))
                .cloned()
                .collect();
            for (context, issues) in group_by_context(&due, &config.context_field) {
                report.heading(context, 3);
                report.add(issue_list(&client, &issues, true));
            }
        }

        report.heading("Delegated tasks", 1);
        let delegated = search(&client, &policy, DELEGATED)?;
        report.add(issue_list(&client, &delegated.iter().collect::<Vec<_>>(), true));

        report.heading("Non-urgent tasks focus of the day", 1);
        let backlog = search(&client, &policy, BACKLOG)?;
        let focus = focus_count(overdue.len(), this_week.len(), config.backlog_focus);
        report.add(issue_list(&client, &backlog.iter().take(focus).collect::<Vec<_>>(), false));

        report.heading("Weekly retro", 1);
        let finished = search(&client, &policy, RETRO)?;
        let groups = retro_groups(&finished);
        for (epic, tasks) in &groups {
            report.heading(*epic, 2);
            report.add(issue_list(&client, tasks, true));
        }
        report.heading("Statistics", 2);
        report.paragraph(format!("Number of Finished tasks: {}", finished.len()));
        report.paragraph(format!(
            "Number of Finished tasks without project: {}",
            groups.get(NO_PROJECT).map_or(0, Vec::len)
        ));

        report.heading("Badly specified tickets", 1);
        if bad_tickets.is_empty() {
            report.paragraph("There are no badly specified tickets");
        } else {
            report.add(issue_list(&client, &bad_tickets.iter().collect::<Vec<_>>(), false));
        }

        report.heading("Badly specified epics", 1);
        if bad_epics.is_empty() {
            report.paragraph("There are no badly specified epics");
        } else {
            report.add(issue_list(&client, &bad_epics.iter().collect::<Vec<_>>(), false));
        }

        report.heading("Report of available days", 1);
        report.paragraph("The following days are available to be used as due dates:");
        let scheduled = search(&client, &policy, SCHEDULED)?;
        let slots = free_slots(
            scheduled.iter().filter_map(|i| i.fields.duedate.as_deref()),
            today,
            FREE_SLOT_DAYS,
            config.max_deadlines_per_day,
        );
        report.items(slots.into_iter().map(|(day, free)| {
            if config.max_deadlines_per_day == 1 {
                day.to_string()
            } else {
                format!("{day} ({free} free)")
            }
        }));

        let upcoming = search(&client, &policy, UPCOMING)?;
        let critical = critical_days(&upcoming, config.max_deadlines_per_day);
        if !critical.is_empty() {
            report.heading("Days with many tasks due", 1);
            for (day, issues) in &critical {
                report.heading(*day, 2);
                report.add(issue_list(&client, issues, true));
            }
        }

        report.heading("Stakeholders", 1);
        let epics = search(&client, &policy, OPEN_EPICS)?;
        let rows = stakeholders(&epics, &config.stakeholders_field)
            .into_iter()
            .map(|(name, count)| vec![name, count.to_string()])
            .collect();
        report.add(Element::table(
            vec!["Name".to_string(), "Number of tickets".to_string()],
            rows,
        ));

        tracing::info!(
            rating = rating.label(),
            overdue = overdue.len(),
            this_week = this_week.len(),
            critical_days = critical.len(),
            "Jira report ready"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::JiraConfig;
    use crate::integrations::{IssueFields, ParentFields, ParentIssue};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn due(key: &str, day: &str) -> JiraIssue {
        let mut i = issue(key, None);
        i.fields.duedate = Some(day.to_string());
        i
    }

    fn issue(key: &str, context: Option<&str>) -> JiraIssue {
        let mut extra = HashMap::new();
        if let Some(c) = context {
            extra.insert("customfield_10036".to_string(), serde_json::json!({ "value": c }));
        }
        JiraIssue {
            key: key.to_string(),
            fields: IssueFields { summary: key.to_lowercase(), extra, ..IssueFields::default() },
        }
    }

    #[test]
    fn test_rating() {
        assert_eq!(Rating::assess(1, 0, 0, 0), Rating::Bad);
        assert_eq!(Rating::assess(0, 1, 0, 0), Rating::Bad);
        assert_eq!(Rating::assess(0, 0, 2, 0), Rating::Bad);
        assert_eq!(Rating::assess(0, 0, 1, 0), Rating::Concerning);
        assert_eq!(Rating::assess(0, 0, 0, 22), Rating::Concerning);
        assert_eq!(Rating::assess(0, 0, 0, 21), Rating::Good);
        assert_eq!(Rating::assess(0, 0, 0, 6), Rating::Good);
        assert_eq!(Rating::assess(0, 0, 0, 5), Rating::Excellent);
        assert_eq!(Rating::Concerning.tone(), Tone::Warning);
    }

    #[test]
    fn test_resolution_advice() {
        let (text, tone) = resolution_advice(28);
        assert_eq!(text, "4.00 - keep doing 4 tasks per day!");
        assert_eq!(tone, Tone::Good);

        let (text, tone) = resolution_advice(14);
        assert_eq!(text, "2.00 - do 18 tasks today to get to rate of 4");
        assert_eq!(tone, Tone::Warning);

        let (text, tone) = resolution_advice(42);
        assert_eq!(text, "6.00 - rest for 3 days");
        assert_eq!(tone, Tone::Info);
    }

    #[test]
    fn test_focus_count() {
        assert_eq!(focus_count(0, 3, 10), 10);
        assert_eq!(focus_count(1, 3, 10), 1);
        assert_eq!(focus_count(0, 21, 10), 1);
    }

    #[test]
    fn test_group_by_context() {
        let issues = vec![
            issue("A", Some("Work")),
            issue("B", Some("Home")),
            issue("C", None),
            issue("D", Some("Work")),
        ];
        let groups = group_by_context(&issues, "customfield_10036");

        let names: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Home", "No context", "Work"]);
        assert_eq!(groups["Work"].len(), 2);
    }

    #[test]
    fn test_free_slots() {
        let today = date("2025-03-03");
        let taken = ["2025-03-03", "2025-03-05", "2025-03-05", "2025-04-30"];

        let slots = free_slots(taken, today, 4, 1);
        assert_eq!(slots, vec![(date("2025-03-04"), 1), (date("2025-03-06"), 1)]);

        let slots = free_slots(taken, today, 4, 2);
        assert_eq!(
            slots,
            vec![(date("2025-03-03"), 1), (date("2025-03-04"), 2), (date("2025-03-06"), 2)]
        );
        assert!(free_slots(taken, today, 4, 0).is_empty());
    }

    #[test]
    fn test_critical_days() {
        let issues = vec![
            due("A", "2025-03-05"),
            due("B", "2025-03-05"),
            due("C", "2025-03-06"),
            issue("D", None),
        ];

        let critical = critical_days(&issues, 1);
        assert_eq!(critical.keys().copied().collect::<Vec<_>>(), vec!["2025-03-05"]);
        assert_eq!(critical["2025-03-05"].len(), 2);
        assert!(critical_days(&issues, 2).is_empty());
    }

    #[test]
    fn test_stakeholders() {
        let epic = |key: &str, names: &[&str]| {
            let mut i = issue(key, None);
            i.fields.extra.insert("customfield_10038".into(), serde_json::json!(names));
            i
        };
        let epics = vec![
            epic("E1", &["Bob", "Alice"]),
            epic("E2", &["Alice"]),
            epic("E3", &["Carol"]),
            issue("E4", None),
        ];

        assert_eq!(
            stakeholders(&epics, "customfield_10038"),
            vec![("Alice".to_string(), 2), ("Bob".to_string(), 1), ("Carol".to_string(), 1)]
        );
    }

    #[test]
    fn test_retro_groups() {
        let with_epic = |key: &str, epic: &str| {
            let mut i = issue(key, None);
            i.fields.parent = Some(ParentIssue {
                key: "EP-1".into(),
                fields: ParentFields { summary: epic.into() },
            });
            i
        };
        let tasks =
            vec![with_epic("A", "Move flat"), issue("B", None), with_epic("C", "Move flat")];

        let groups = retro_groups(&tasks);
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["Move flat", NO_PROJECT]);
        assert_eq!(groups["Move flat"].len(), 2);
        assert_eq!(groups[NO_PROJECT][0].key, "B");
        assert!(retro_groups(&[]).is_empty());
    }

    #[test]
    fn test_factory_requires_url() {
        let mut config = Config::default();
        assert!(factory(&config).unwrap().is_none());

        config.jira =
            JiraConfig { url: "https://example.atlassian.net".into(), ..JiraConfig::default() };
        let ext = factory(&config).unwrap().unwrap();
        assert_eq!(ext.name(), NAME);
    }
}
