//! Presentation-only derivations over lists the backend already returned.
//! Everything here is pure; sorts are stable so equal keys keep input order.
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::model::{EventType, GroupResponseCount, InquirySummary, OutreachEntry};

/// Comment count a post must exceed to count as a winner.
pub const WINNING_COMMENT_THRESHOLD: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Today,
    Recent,
    Cooling,
    Stale,
}

impl Urgency {
    pub fn for_days(days: i64) -> Self {
        match days {
            d if d <= 0 => Urgency::Today,
            1..=3 => Urgency::Recent,
            4..=7 => Urgency::Cooling,
            _ => Urgency::Stale,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Today => "today",
            Urgency::Recent => "recent",
            Urgency::Cooling => "cooling",
            Urgency::Stale => "stale",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLastPost {
    pub group_name: String,
    pub group_url: String,
    pub days_since: i64,
    pub last_post_date: String,
}

impl GroupLastPost {
    pub fn urgency(&self) -> Urgency {
        Urgency::for_days(self.days_since)
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_post_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// One row per group (URL, or name when the URL is empty), ordered by days
/// since its latest post, most recent first.
pub fn days_since_last_post(entries: &[OutreachEntry], today: NaiveDate) -> Vec<GroupLastPost> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&OutreachEntry>> = HashMap::new();
    for entry in entries {
        let key = entry.group_key();
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(entry);
    }

    let mut rows: Vec<GroupLastPost> = order
        .into_iter()
        .filter_map(|key| groups.get(key))
        .filter_map(|members| {
            // Latest parseable date; the first entry stands in when none parse.
            let latest = members
                .iter()
                .filter_map(|e| parse_post_date(&e.date_posted).map(|d| (d, *e)))
                .fold(None::<(NaiveDate, &OutreachEntry)>, |best, (d, e)| match best {
                    Some((bd, _)) if bd >= d => best,
                    _ => Some((d, e)),
                });
            let (entry, days_since) = match latest {
                Some((date, entry)) => (entry, (today - date).num_days().max(0)),
                None => (*members.first()?, 0),
            };
            Some(GroupLastPost {
                group_name: entry.group_name.clone(),
                group_url: entry.group_url.clone(),
                days_since,
                last_post_date: entry.date_posted.clone(),
            })
        })
        .collect();
    rows.sort_by_key(|row| row.days_since);
    rows
}

/// Posts with more than five comments, most comments first.
pub fn winning_posts(entries: &[OutreachEntry]) -> Vec<OutreachEntry> {
    let mut winners: Vec<OutreachEntry> = entries
        .iter()
        .filter(|e| e.num_comments > WINNING_COMMENT_THRESHOLD)
        .cloned()
        .collect();
    winners.sort_by(|a, b| b.num_comments.cmp(&a.num_comments));
    winners
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTypeRank {
    pub event_type: EventType,
    pub label: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypeRanking {
    pub rows: Vec<EventTypeRank>,
    /// False when every count is zero.
    pub has_data: bool,
}

pub fn rank_event_types(summary: &InquirySummary) -> EventTypeRanking {
    let mut rows: Vec<EventTypeRank> = EventType::ALL
        .iter()
        .map(|&event_type| EventTypeRank {
            event_type,
            label: event_type.label(),
            count: summary.count(event_type),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    let has_data = rows.iter().any(|r| r.count > 0);
    EventTypeRanking { rows, has_data }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuccessBar {
    pub group_name: String,
    pub count: u64,
    /// Width relative to the largest count, 0..=100.
    pub percent: f64,
}

pub fn success_rate_bars(counts: &[GroupResponseCount]) -> Vec<SuccessBar> {
    let mut sorted: Vec<&GroupResponseCount> = counts.iter().collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    let max = sorted.first().map(|c| c.count).unwrap_or(0);
    sorted
        .into_iter()
        .map(|c| SuccessBar {
            group_name: c.group_name.clone(),
            count: c.count,
            percent: if max > 0 {
                c.count as f64 / max as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect()
}
