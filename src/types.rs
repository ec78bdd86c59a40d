use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAIN_GROUP_ID: &str = "main";
pub const SECONDARY_GROUP_ID: &str = "secondary";
pub const COMPLETED_GROUP_ID: &str = "completed";
pub const FAILED_GROUP_ID: &str = "failed";

/// Groups a quest only reaches by being moved (finishing or abandoning it).
pub fn is_terminal_group(group_id: &str) -> bool {
    group_id == COMPLETED_GROUP_ID || group_id == FAILED_GROUP_ID
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub text: String,
    pub is_completed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    /// Weak reference to a [`QuestGroup`]; resolve with `Store::group_by_id`.
    pub group_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Free-form reminder text such as "Thursday 2:30 PM".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_failed: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_tracked: bool,
}

impl Quest {
    /// Level used for ordering; quests without one rank as level 0.
    pub fn sort_level(&self) -> i64 {
        self.suggested_level.unwrap_or(0)
    }

    pub fn subtask(&self, subtask_id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|st| st.id == subtask_id)
    }

    pub fn progress(&self) -> SubtaskProgress {
        SubtaskProgress {
            completed: self.subtasks.iter().filter(|st| st.is_completed).count(),
            total: self.subtasks.len(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubtaskProgress {
    pub completed: usize,
    pub total: usize,
}

impl SubtaskProgress {
    /// True only when there is at least one subtask and all of them are done.
    pub fn all_completed(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestGroup {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub order: i64,
    #[serde(default)]
    pub is_collapsed: bool,
    /// System-defined groups cannot be deleted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// The aggregate root. Exactly one lives inside a `Store`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub groups: Vec<QuestGroup>,
    pub quests: Vec<Quest>,
    pub selected_quest_id: Option<String>,
    pub search_query: String,
}
