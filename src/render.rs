//! Terminal rendering of the quest log.

use chrono::{DateTime, Utc};
use colored::{Color, ColoredString, Colorize};
use std::fmt::Write;

use crate::store::Store;
use crate::types::{Quest, QuestGroup};

/// Parses `#rrggbb` into a truecolor value.
pub fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::TrueColor {
        r: channel(0..2)?,
        g: channel(2..4)?,
        b: channel(4..6)?,
    })
}

fn group_title(group: &QuestGroup) -> ColoredString {
    let name = group.name.bold();
    match group.color.as_deref().and_then(hex_color) {
        Some(color) => name.color(color),
        None => name,
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y %H:%M").to_string()
}

fn quest_line(quest: &Quest, selected: bool) -> String {
    let cursor = if selected { "›" } else { " " };
    let marker = if quest.is_tracked {
        "◆".yellow().to_string()
    } else {
        "◇".dimmed().to_string()
    };
    let icon = quest.icon.as_deref().map(|i| format!("{i} ")).unwrap_or_default();
    let title = if selected {
        quest.title.bold().underline().to_string()
    } else {
        quest.title.clone()
    };

    let mut line = format!("  {cursor} {marker} {icon}{title}");
    if let Some(level) = quest.suggested_level {
        let _ = write!(line, "  {}", format!("Lv {level}").cyan());
    }
    let progress = quest.progress();
    if progress.total > 0 {
        let _ = write!(line, "  {}/{}", progress.completed, progress.total);
    }
    let _ = write!(line, "  {}", quest.id.dimmed());
    line
}

/// The left-hand quest list: groups in display order with their quests.
/// Collapsed groups show only their header unless `expand_all` is set.
pub fn render_log(store: &Store, expand_all: bool) -> String {
    let state = store.state();
    let mut out = String::new();

    if !state.search_query.is_empty() {
        let _ = writeln!(out, "{} {}", "Search:".dimmed(), state.search_query.italic());
    }

    for group in store.sorted_groups() {
        let quests = store.quests_for_group(&group.id);
        let collapsed = group.is_collapsed && !expand_all;
        let arrow = if collapsed { "▸" } else { "▾" };
        let icon = group.icon.as_deref().map(|i| format!("{i} ")).unwrap_or_default();
        let _ = writeln!(
            out,
            "{arrow} {icon}{} ({})  {}",
            group_title(group),
            quests.len(),
            group.id.dimmed()
        );
        if collapsed {
            continue;
        }
        if quests.is_empty() {
            let _ = writeln!(out, "    {}", "No quests".dimmed());
        }
        for quest in quests {
            let selected = state.selected_quest_id.as_deref() == Some(quest.id.as_str());
            let _ = writeln!(out, "{}", quest_line(quest, selected));
        }
    }
    out
}

/// The detail view for one quest: metadata, description and objectives.
pub fn render_quest(store: &Store, quest: &Quest) -> String {
    let mut out = String::new();
    let icon = quest.icon.as_deref().map(|i| format!("{i} ")).unwrap_or_default();
    let _ = writeln!(out, "{icon}{}", quest.title.bold());

    let group = store
        .group_by_id(&quest.group_id)
        .map(|g| group_title(g).to_string())
        .unwrap_or_else(|| quest.group_id.clone());
    let _ = writeln!(out, "{:<11}{group}", "Group:");
    if let Some(location) = &quest.location {
        let _ = writeln!(out, "{:<11}{location}", "Location:");
    }
    if let Some(level) = quest.suggested_level {
        let _ = writeln!(out, "{:<11}{level}", "Level:");
    }
    if let Some(reminder) = &quest.reminder {
        let _ = writeln!(out, "{:<11}{reminder}", "Reminder:");
    }
    let _ = writeln!(out, "{:<11}{}", "Created:", format_date(&quest.created_at));
    if let Some(done) = &quest.completed_at {
        let _ = writeln!(out, "{:<11}{}", "Completed:", format_date(done).green());
    }
    if quest.is_failed {
        let _ = writeln!(out, "{:<11}{}", "Status:", "Cancelled".red());
    }
    if quest.is_tracked {
        let _ = writeln!(out, "{:<11}{}", "Tracking:", "yes".yellow());
    }

    if !quest.description.is_empty() {
        let _ = writeln!(out, "\n{}", quest.description);
    }

    let progress = quest.progress();
    let _ = writeln!(
        out,
        "\n{} {}/{} ({}%)",
        "Objectives".bold(),
        progress.completed,
        progress.total,
        progress.percent()
    );
    if quest.subtasks.is_empty() {
        let _ = writeln!(out, "  {}", "No objectives".dimmed());
    }
    for subtask in &quest.subtasks {
        let (check, text) = if subtask.is_completed {
            ("[x]".green(), subtask.text.strikethrough().dimmed())
        } else {
            ("[ ]".normal(), subtask.text.normal())
        };
        let _ = writeln!(out, "  {check} {text}  {}", subtask.id.dimmed());
    }
    if progress.all_completed() && quest.completed_at.is_none() && !quest.is_failed {
        let _ = writeln!(
            out,
            "\n{}",
            "All objectives completed! Run `complete` to turn it in.".green()
        );
    }
    out
}

pub fn render_groups(store: &Store) -> String {
    let mut out = String::new();
    for group in store.sorted_groups() {
        let total = store
            .state()
            .quests
            .iter()
            .filter(|q| q.group_id == group.id)
            .count();
        let flags = match (group.is_default, group.is_collapsed) {
            (true, true) => " [system, collapsed]",
            (true, false) => " [system]",
            (false, true) => " [collapsed]",
            (false, false) => "",
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {} quests{}  {}",
            group.order,
            group_title(group),
            total,
            flags.dimmed(),
            group.id.dimmed()
        );
    }
    out
}
