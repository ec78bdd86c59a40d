//! Form-level construction of quests and groups before they are dispatched.

use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::defaults::DEFAULT_GROUP_COLOR;
use crate::error::{QuestLogError, QuestLogResult};
use crate::types::{Quest, QuestGroup, SECONDARY_GROUP_ID, Subtask, is_terminal_group};

fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Ulid::new().to_string().to_lowercase())
}

/// Trimmed value, or `None` when nothing is left.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn new_subtask(text: &str) -> QuestLogResult<Subtask> {
    let text = text.trim();
    if text.is_empty() {
        return Err(QuestLogError::InvalidInput(
            "subtask text cannot be empty".to_string(),
        ));
    }
    Ok(Subtask {
        id: new_id("st"),
        text: text.to_string(),
        is_completed: false,
    })
}

#[derive(Clone, Debug, Default)]
pub struct QuestDraft {
    pub title: String,
    pub group_id: Option<String>,
    pub location: Option<String>,
    pub suggested_level: Option<i64>,
    pub icon: Option<String>,
    pub description: String,
    pub subtasks: Vec<Subtask>,
    pub reminder: Option<String>,
}

impl QuestDraft {
    /// Starts a draft pre-filled from an existing quest, for editing.
    pub fn from_quest(quest: &Quest) -> Self {
        Self {
            title: quest.title.clone(),
            group_id: Some(quest.group_id.clone()),
            location: quest.location.clone(),
            suggested_level: quest.suggested_level,
            icon: quest.icon.clone(),
            description: quest.description.clone(),
            subtasks: quest.subtasks.clone(),
            reminder: quest.reminder.clone(),
        }
    }

    pub fn push_subtask(&mut self, text: &str) -> QuestLogResult<()> {
        self.subtasks.push(new_subtask(text)?);
        Ok(())
    }

    fn subtask_mut(&mut self, id: &str) -> QuestLogResult<&mut Subtask> {
        self.subtasks
            .iter_mut()
            .find(|st| st.id == id)
            .ok_or_else(|| QuestLogError::NotFound {
                kind: "objective",
                id: id.to_string(),
            })
    }

    /// Drops one objective; the rest keep their ids and completion state.
    pub fn remove_subtask(&mut self, id: &str) -> QuestLogResult<()> {
        self.subtask_mut(id)?;
        self.subtasks.retain(|st| st.id != id);
        Ok(())
    }

    pub fn rename_subtask(&mut self, id: &str, text: &str) -> QuestLogResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QuestLogError::InvalidInput(
                "subtask text cannot be empty".to_string(),
            ));
        }
        self.subtask_mut(id)?.text = text.to_string();
        Ok(())
    }

    /// Builds the quest to dispatch. With `existing`, identity, timestamps and
    /// status flags are carried over; otherwise a fresh id and `created_at = now`
    /// are assigned and the quest may not start in a terminal group.
    pub fn into_quest(self, existing: Option<&Quest>, now: DateTime<Utc>) -> QuestLogResult<Quest> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(QuestLogError::InvalidInput(
                "quest title cannot be empty".to_string(),
            ));
        }

        let group_id = self
            .group_id
            .or_else(|| existing.map(|q| q.group_id.clone()))
            .unwrap_or_else(|| SECONDARY_GROUP_ID.to_string());
        if existing.is_none() && is_terminal_group(&group_id) {
            return Err(QuestLogError::InvalidInput(format!(
                "new quests cannot be created in the '{group_id}' group"
            )));
        }

        let (id, created_at, completed_at, is_failed, is_tracked) = match existing {
            Some(q) => (
                q.id.clone(),
                q.created_at,
                q.completed_at,
                q.is_failed,
                q.is_tracked,
            ),
            None => (new_id("quest"), now, None, false, false),
        };

        Ok(Quest {
            id,
            group_id,
            title,
            location: non_empty(self.location),
            suggested_level: self.suggested_level,
            icon: non_empty(self.icon),
            description: self.description.trim().to_string(),
            subtasks: self.subtasks,
            reminder: non_empty(self.reminder),
            created_at,
            completed_at,
            is_failed,
            is_tracked,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct GroupDraft {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl GroupDraft {
    /// Builds the group to dispatch. New groups are ordered after every
    /// non-terminal group so they stay above Completed and Cancelled.
    pub fn into_group(
        self,
        existing: Option<&QuestGroup>,
        groups: &[QuestGroup],
    ) -> QuestLogResult<QuestGroup> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(QuestLogError::InvalidInput(
                "group name cannot be empty".to_string(),
            ));
        }

        // On edit, an omitted field keeps the stored value and an empty one clears it.
        let group = match existing {
            Some(g) => QuestGroup {
                id: g.id.clone(),
                name,
                icon: self.icon.map_or_else(|| g.icon.clone(), |i| non_empty(Some(i))),
                order: g.order,
                is_collapsed: g.is_collapsed,
                is_default: g.is_default,
                color: self.color.map_or_else(|| g.color.clone(), |c| non_empty(Some(c))),
            },
            None => QuestGroup {
                id: new_id("group"),
                name,
                icon: non_empty(self.icon),
                order: next_group_order(groups),
                is_collapsed: false,
                is_default: false,
                color: Some(
                    non_empty(self.color).unwrap_or_else(|| DEFAULT_GROUP_COLOR.to_string()),
                ),
            },
        };
        Ok(group)
    }
}

pub fn next_group_order(groups: &[QuestGroup]) -> i64 {
    groups
        .iter()
        .filter(|g| !is_terminal_group(&g.id))
        .map(|g| g.order)
        .max()
        .map_or(0, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_groups;
    use crate::types::{COMPLETED_GROUP_ID, MAIN_GROUP_ID};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 3, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_new_quest_from_draft() {
        let mut draft = QuestDraft {
            title: "  Book flights ".to_string(),
            location: Some("   ".to_string()),
            suggested_level: Some(30),
            reminder: Some(" Friday ".to_string()),
            ..Default::default()
        };
        draft.push_subtask(" Compare prices ").unwrap();
        assert!(draft.push_subtask("   ").is_err());

        let quest = draft.into_quest(None, now()).unwrap();
        assert!(quest.id.starts_with("quest-"));
        assert_eq!(quest.title, "Book flights");
        assert_eq!(quest.group_id, SECONDARY_GROUP_ID);
        assert_eq!(quest.location, None);
        assert_eq!(quest.reminder.as_deref(), Some("Friday"));
        assert_eq!(quest.created_at, now());
        assert_eq!(quest.subtasks.len(), 1);
        assert_eq!(quest.subtasks[0].text, "Compare prices");
        assert!(quest.subtasks[0].id.starts_with("st-"));
    }

    #[test]
    fn test_new_quest_rejects_blank_title_and_terminal_group() {
        let blank = QuestDraft {
            title: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            blank.into_quest(None, now()),
            Err(QuestLogError::InvalidInput(_))
        ));

        let finished = QuestDraft {
            title: "Already done".to_string(),
            group_id: Some(COMPLETED_GROUP_ID.to_string()),
            ..Default::default()
        };
        assert!(finished.into_quest(None, now()).is_err());
    }

    #[test]
    fn test_edit_keeps_identity_and_status() {
        let original = QuestDraft {
            title: "Report".to_string(),
            group_id: Some(MAIN_GROUP_ID.to_string()),
            ..Default::default()
        }
        .into_quest(None, now())
        .unwrap();
        let mut done = original.clone();
        done.group_id = COMPLETED_GROUP_ID.to_string();
        done.completed_at = Some(now());
        done.is_tracked = true;

        let mut draft = QuestDraft::from_quest(&done);
        draft.title = "Final report".to_string();
        let edited = draft.into_quest(Some(&done), Utc::now()).unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, now());
        assert_eq!(edited.completed_at, Some(now()));
        assert_eq!(edited.group_id, COMPLETED_GROUP_ID);
        assert!(edited.is_tracked);
        assert_eq!(edited.title, "Final report");
    }

    #[test]
    fn test_new_group_goes_before_terminal_groups() {
        let groups = default_groups();
        assert_eq!(next_group_order(&groups), 2);
        assert_eq!(next_group_order(&[]), 0);

        let group = GroupDraft {
            name: " Side Projects ".to_string(),
            ..Default::default()
        }
        .into_group(None, &groups)
        .unwrap();
        assert!(group.id.starts_with("group-"));
        assert_eq!(group.name, "Side Projects");
        assert_eq!(group.order, 2);
        assert!(!group.is_default);
        assert_eq!(group.color.as_deref(), Some(DEFAULT_GROUP_COLOR));
    }

    #[test]
    fn test_edit_group_keeps_order_and_default_flag() {
        let groups = default_groups();
        let main = &groups[0];
        let edited = GroupDraft {
            name: "Urgent".to_string(),
            icon: Some("🔥".to_string()),
            color: None,
        }
        .into_group(Some(main), &groups)
        .unwrap();

        assert_eq!(edited.id, main.id);
        assert_eq!(edited.order, main.order);
        assert!(edited.is_default);
        assert_eq!(edited.color, main.color);
        assert_eq!(edited.icon.as_deref(), Some("🔥"));

        assert!(
            GroupDraft::default()
                .into_group(Some(main), &groups)
                .is_err()
        );
    }

    #[test]
    fn test_edit_group_clears_icon_and_color_when_empty() {
        let groups = default_groups();
        let mut styled = groups[0].clone();
        styled.icon = Some("🔥".to_string());

        let cleared = GroupDraft {
            name: styled.name.clone(),
            icon: Some(String::new()),
            color: Some("  ".to_string()),
        }
        .into_group(Some(&styled), &groups)
        .unwrap();
        assert_eq!(cleared.icon, None);
        assert_eq!(cleared.color, None);

        let fresh = GroupDraft {
            name: "Errands".to_string(),
            icon: Some(String::new()),
            color: Some(String::new()),
        }
        .into_group(None, &groups)
        .unwrap();
        assert_eq!(fresh.icon, None);
        assert_eq!(fresh.color.as_deref(), Some(DEFAULT_GROUP_COLOR));
    }

    fn three_objectives() -> QuestDraft {
        let subtask = |id: &str, text: &str, is_completed: bool| Subtask {
            id: id.to_string(),
            text: text.to_string(),
            is_completed,
        };
        QuestDraft {
            title: "Move house".to_string(),
            subtasks: vec![
                subtask("st-a", "Pack books", true),
                subtask("st-b", "Book van", false),
                subtask("st-c", "Clean flat", true),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_remove_subtask_keeps_the_others() {
        let mut draft = three_objectives();
        draft.remove_subtask("st-b").unwrap();

        let ids: Vec<_> = draft.subtasks.iter().map(|st| st.id.as_str()).collect();
        assert_eq!(ids, vec!["st-a", "st-c"]);
        assert!(draft.subtasks.iter().all(|st| st.is_completed));

        assert!(matches!(
            draft.remove_subtask("st-b"),
            Err(QuestLogError::NotFound { kind: "objective", .. })
        ));
        assert_eq!(draft.subtasks.len(), 2);
    }

    #[test]
    fn test_rename_subtask_keeps_id_and_completion() {
        let mut draft = three_objectives();
        draft.rename_subtask("st-a", "  Pack all books ").unwrap();

        assert_eq!(draft.subtasks[0].id, "st-a");
        assert_eq!(draft.subtasks[0].text, "Pack all books");
        assert!(draft.subtasks[0].is_completed);
        assert_eq!(draft.subtasks[1].text, "Book van");

        assert!(draft.rename_subtask("st-a", " ").is_err());
        assert!(draft.rename_subtask("st-z", "Anything").is_err());
        assert_eq!(draft.subtasks[0].text, "Pack all books");
    }
}
