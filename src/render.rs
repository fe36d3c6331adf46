//! Plain-text cards for the terminal dashboard.
use std::fmt::Write as _;

use crate::model::{HookTemplates, OutreachEntry};
use crate::views::{EventTypeRanking, GroupLastPost, SuccessBar};

const BAR_WIDTH: usize = 30;
const SNIPPET_CHARS: usize = 80;

fn plural<'a>(n: u64, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(SNIPPET_CHARS - 3).collect();
    format!("{}...", cut)
}

fn header(out: &mut String, title: &str, subtitle: &str) {
    let _ = writeln!(out, "== {} ==", title);
    if !subtitle.is_empty() {
        let _ = writeln!(out, "{}", subtitle);
    }
}

pub fn follow_ups(entries: &[OutreachEntry]) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        header(&mut out, "Follow-up Reminders", "No follow-ups scheduled for today");
        return out;
    }
    let n = entries.len() as u64;
    header(
        &mut out,
        "Follow-up Reminders",
        &format!("{} {} due for follow-up today", n, plural(n, "entry", "entries")),
    );
    for e in entries {
        let _ = writeln!(
            out,
            "  #{} {}  Posted: {}  [{}]",
            e.id,
            e.group_name,
            e.date_posted,
            e.response_status.label()
        );
        if !e.group_url.is_empty() {
            let _ = writeln!(out, "      {}", e.group_url);
        }
    }
    out
}

pub fn winning_posts(posts: &[OutreachEntry]) -> String {
    let mut out = String::new();
    if posts.is_empty() {
        header(&mut out, "Winning Posts", "Posts with more than 5 comments");
        let _ = writeln!(out, "  No winning posts yet. Keep engaging with your audience!");
        return out;
    }
    let n = posts.len() as u64;
    header(
        &mut out,
        "Winning Posts",
        &format!("{} {} with high engagement", n, plural(n, "post", "posts")),
    );
    for e in posts {
        let _ = writeln!(
            out,
            "  {}  Posted: {}  ({} comments)",
            e.group_name, e.date_posted, e.num_comments
        );
        let _ = writeln!(out, "      {}", snippet(&e.post_content));
    }
    out
}

pub fn days_since_last_post(rows: &[GroupLastPost]) -> String {
    let mut out = String::new();
    header(
        &mut out,
        "Days Since Last Post",
        "Track posting frequency to avoid spamming groups",
    );
    if rows.is_empty() {
        let _ = writeln!(out, "  No entries yet. Add your first post to start tracking.");
        return out;
    }
    let width = rows.iter().map(|r| r.group_name.chars().count()).max().unwrap_or(0);
    for row in rows {
        let days = row.days_since.max(0) as u64;
        let _ = writeln!(
            out,
            "  {:<width$}  {:>4} {:<4}  {}",
            row.group_name,
            days,
            plural(days, "day", "days"),
            row.urgency().as_str(),
            width = width
        );
    }
    out
}

pub fn success_rate(bars: &[SuccessBar]) -> String {
    let mut out = String::new();
    header(
        &mut out,
        "Success Rate by Group",
        "Groups with Active Discussion or Leads Generated",
    );
    if bars.is_empty() {
        let _ = writeln!(out, "  No successful engagements yet. Keep posting!");
        return out;
    }
    for bar in bars {
        let filled = ((bar.percent / 100.0) * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        let _ = writeln!(out, "  {} ({} posts)", bar.group_name, bar.count);
        let _ = writeln!(out, "  [{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled));
    }
    out
}

pub fn event_type_ranking(ranking: &EventTypeRanking) -> String {
    let mut out = String::new();
    header(
        &mut out,
        "Event Type Inquiry Ranking",
        "Group Booking inquiries ranked by event type",
    );
    if !ranking.has_data {
        let _ = writeln!(
            out,
            "  No Group Booking inquiries yet. Start tracking entries to see which event types are most popular!"
        );
        return out;
    }
    for (i, row) in ranking.rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {:<28} {} {}",
            i + 1,
            row.label,
            row.count,
            plural(row.count, "inquiry", "inquiries")
        );
    }
    out
}

pub fn entries_table(entries: &[OutreachEntry]) -> String {
    let mut out = String::new();
    header(&mut out, "Outreach Entries", "");
    if entries.is_empty() {
        let _ = writeln!(out, "  No entries yet. Run `entries add` to get started.");
        return out;
    }
    let _ = writeln!(
        out,
        "  {:>5}  {:<24} {:<10} {:>9} {:>8}  {:<17} {:<10}",
        "ID", "Group", "Posted", "Reactions", "Comments", "Status", "Follow-up"
    );
    for e in entries {
        let name: String = e.group_name.chars().take(24).collect();
        let _ = writeln!(
            out,
            "  {:>5}  {:<24} {:<10} {:>9} {:>8}  {:<17} {:<10}{}",
            e.id,
            name,
            e.date_posted,
            e.num_reactions,
            e.num_comments,
            e.response_status.label(),
            e.follow_up_date,
            if e.attachment.is_some() { "  [img]" } else { "" }
        );
    }
    out
}

pub fn entry_detail(entry: &OutreachEntry, notes: Option<&str>) -> String {
    let mut out = String::new();
    header(&mut out, &format!("Entry #{}", entry.id), "");
    let mut field = |label: &str, value: &str| {
        let _ = writeln!(out, "  {:<16} {}", label, value);
    };
    field("Group", &entry.group_name);
    field("Group URL", &entry.group_url);
    field("Posted", &entry.date_posted);
    field("Reactions", &entry.num_reactions.to_string());
    field("Comments", &entry.num_comments.to_string());
    field("Status", entry.response_status.label());
    field("Follow-up", &entry.follow_up_date);
    if let Some(c) = entry.craft_category {
        field("Category", c.label());
    }
    if let Some(t) = entry.type_of_interest {
        field("Interest", t.label());
    }
    if let Some(t) = entry.event_type {
        field("Event type", t.label());
    }
    if let Some(contact) = entry.contact_info.as_deref().filter(|c| !c.is_empty()) {
        field("Contact", contact);
    }
    if let Some(blob) = &entry.attachment {
        field("Attachment", &snippet(&blob.direct_url()));
    }
    if let Some(notes) = notes.filter(|n| !n.is_empty()) {
        field("Group notes", notes);
    }
    let _ = writeln!(out, "\n{}", entry.post_content);
    out
}

pub fn hook_library(templates: &HookTemplates) -> String {
    let mut out = String::new();
    header(
        &mut out,
        "Hook Template Library",
        "Save and manage your hook templates for quick access",
    );
    for (i, t) in templates.iter().enumerate() {
        let title = if t.title.trim().is_empty() {
            format!("Hook {}", i + 1)
        } else {
            t.title.clone()
        };
        let _ = writeln!(out, "  [{}] {}", i + 1, title);
        if t.content.trim().is_empty() {
            let _ = writeln!(out, "      (empty)");
        } else {
            for line in t.content.lines() {
                let _ = writeln!(out, "      {}", line);
            }
        }
    }
    out
}
