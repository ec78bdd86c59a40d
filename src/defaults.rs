//! Hard-coded initial state used when nothing usable is persisted.

use chrono::{DateTime, Utc};

use crate::types::{
    COMPLETED_GROUP_ID, FAILED_GROUP_ID, MAIN_GROUP_ID, Quest, QuestGroup, SECONDARY_GROUP_ID,
    State, Subtask,
};

pub const DEFAULT_GROUP_COLOR: &str = "#c4a258";

fn group(id: &str, name: &str, order: i64, is_collapsed: bool, color: &str) -> QuestGroup {
    QuestGroup {
        id: id.to_string(),
        name: name.to_string(),
        icon: None,
        order,
        is_collapsed,
        is_default: true,
        color: Some(color.to_string()),
    }
}

/// The four system-defined groups, in display order.
pub fn default_groups() -> Vec<QuestGroup> {
    vec![
        group(MAIN_GROUP_ID, "Priority Tasks", 0, false, DEFAULT_GROUP_COLOR),
        group(SECONDARY_GROUP_ID, "General Tasks", 1, false, "#a89a7c"),
        group(COMPLETED_GROUP_ID, "Completed", 98, true, "#4a7c4a"),
        group(FAILED_GROUP_ID, "Cancelled", 99, true, "#8b2323"),
    ]
}

fn subtasks(items: &[(&str, &str, bool)]) -> Vec<Subtask> {
    items
        .iter()
        .map(|(id, text, done)| Subtask {
            id: id.to_string(),
            text: text.to_string(),
            is_completed: *done,
        })
        .collect()
}

struct Seed<'a> {
    id: &'a str,
    group_id: &'a str,
    title: &'a str,
    location: &'a str,
    level: i64,
    icon: &'a str,
    description: &'a str,
    reminder: Option<&'a str>,
    subtasks: &'a [(&'a str, &'a str, bool)],
}

impl Seed<'_> {
    fn into_quest(self, created_at: DateTime<Utc>) -> Quest {
        Quest {
            id: self.id.to_string(),
            group_id: self.group_id.to_string(),
            title: self.title.to_string(),
            location: Some(self.location.to_string()),
            suggested_level: Some(self.level),
            icon: Some(self.icon.to_string()),
            description: self.description.to_string(),
            subtasks: subtasks(self.subtasks),
            reminder: self.reminder.map(str::to_string),
            created_at,
            completed_at: None,
            is_failed: false,
            is_tracked: false,
        }
    }
}

pub fn sample_quests(created_at: DateTime<Utc>) -> Vec<Quest> {
    let seeds = [
        Seed {
            id: "quest-1",
            group_id: MAIN_GROUP_ID,
            title: "Q4 Financial Report",
            location: "Office",
            level: 85,
            icon: "📊",
            description: "The quarterly financial report is due by end of month. It must cover \
                revenue analysis, expense breakdowns, profit margins and year-over-year \
                comparisons, with projections for the upcoming quarter.",
            reminder: None,
            subtasks: &[
                ("st-1", "Gather all revenue data from accounting.", true),
                ("st-2", "Compile expense reports from all departments.", false),
                ("st-3", "Create visualizations and charts.", false),
                ("st-4", "Write executive summary.", false),
            ],
        },
        Seed {
            id: "quest-2",
            group_id: MAIN_GROUP_ID,
            title: "Website Redesign Launch",
            location: "Remote",
            level: 90,
            icon: "🌐",
            description: "The company website needs a complete overhaul. Modernize the look, \
                make it mobile-friendly and optimize it for search engines. Coordinate with \
                the design team and developers.",
            reminder: None,
            subtasks: &[
                ("st-5", "Review and approve final mockups.", true),
                ("st-6", "Test all pages on mobile devices.", false),
                ("st-7", "Set up redirects for old URLs.", false),
            ],
        },
        Seed {
            id: "quest-3",
            group_id: SECONDARY_GROUP_ID,
            title: "Dentist Appointment",
            location: "Downtown Clinic",
            level: 40,
            icon: "🦷",
            description: "Regular six-month dental checkup and cleaning. Bring the insurance \
                card and arrive 15 minutes early for paperwork.",
            reminder: Some("Thursday 2:30 PM"),
            subtasks: &[
                ("st-8", "Confirm appointment time.", true),
                ("st-9", "Bring insurance documentation.", false),
            ],
        },
        Seed {
            id: "quest-4",
            group_id: SECONDARY_GROUP_ID,
            title: "Grocery Shopping",
            location: "Whole Foods",
            level: 25,
            icon: "🛒",
            description: "Weekly grocery run. Focus on healthy options and meal prep \
                ingredients for the week ahead.",
            reminder: None,
            subtasks: &[
                ("st-10", "Buy vegetables and fruits.", false),
                ("st-11", "Restock pantry essentials.", false),
                ("st-12", "Get items for weekend dinner party.", false),
            ],
        },
    ];

    seeds
        .into_iter()
        .map(|seed| seed.into_quest(created_at))
        .collect()
}

/// Initial state: default groups, seed quests, first seed quest selected.
pub fn default_state(now: DateTime<Utc>) -> State {
    State {
        groups: default_groups(),
        quests: sample_quests(now),
        selected_quest_id: Some("quest-1".to_string()),
        search_query: String::new(),
    }
}
