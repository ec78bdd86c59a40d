//! Quest state container.
//!
//! All mutation goes through [`Action`] values applied by [`apply`]. Transitions
//! are total: an action that names an id which does not exist leaves the state
//! untouched instead of failing. The store performs no I/O; persisting the
//! result is the caller's job (see `crate::app`).

use chrono::{DateTime, Utc};

use crate::types::{COMPLETED_GROUP_ID, FAILED_GROUP_ID, Quest, QuestGroup, State};

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Bulk replace of all groups. No validation.
    SetGroups(Vec<QuestGroup>),
    AddGroup(QuestGroup),
    UpdateGroup(QuestGroup),
    DeleteGroup(String),
    ToggleGroupCollapse(String),
    /// Bulk replace of all quests. No validation.
    SetQuests(Vec<Quest>),
    AddQuest(Quest),
    UpdateQuest(Quest),
    DeleteQuest(String),
    SelectQuest(Option<String>),
    ToggleSubtask { quest_id: String, subtask_id: String },
    MoveQuestToGroup { quest_id: String, group_id: String },
    /// Tracks the quest and untracks every other one; tracking an already
    /// tracked quest untracks it.
    TrackQuest(String),
    SetSearchQuery(String),
    /// Replace the whole state, e.g. on import.
    LoadState(State),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetGroups(_) => "set_groups",
            Action::AddGroup(_) => "add_group",
            Action::UpdateGroup(_) => "update_group",
            Action::DeleteGroup(_) => "delete_group",
            Action::ToggleGroupCollapse(_) => "toggle_group_collapse",
            Action::SetQuests(_) => "set_quests",
            Action::AddQuest(_) => "add_quest",
            Action::UpdateQuest(_) => "update_quest",
            Action::DeleteQuest(_) => "delete_quest",
            Action::SelectQuest(_) => "select_quest",
            Action::ToggleSubtask { .. } => "toggle_subtask",
            Action::MoveQuestToGroup { .. } => "move_quest_to_group",
            Action::TrackQuest(_) => "track_quest",
            Action::SetSearchQuery(_) => "set_search_query",
            Action::LoadState(_) => "load_state",
        }
    }
}

/// Applies `action` using the current time for timestamps.
pub fn apply(state: State, action: Action) -> State {
    apply_at(state, action, Utc::now())
}

/// Applies `action`, stamping `now` wherever a transition records a time.
pub fn apply_at(mut state: State, action: Action, now: DateTime<Utc>) -> State {
    reduce(&mut state, action, now);
    state
}

/// In-place transition. Returns `false` when the action was ignored.
fn reduce(state: &mut State, action: Action, now: DateTime<Utc>) -> bool {
    let name = action.name();
    let applied = match action {
        Action::SetGroups(groups) => {
            state.groups = groups;
            true
        }
        Action::AddGroup(group) => {
            if has_group(state, &group.id) {
                false
            } else {
                state.groups.push(group);
                true
            }
        }
        Action::UpdateGroup(group) => match state.groups.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => {
                let is_default = existing.is_default;
                *existing = QuestGroup { is_default, ..group };
                true
            }
            None => false,
        },
        Action::DeleteGroup(group_id) => delete_group(state, &group_id),
        Action::ToggleGroupCollapse(group_id) => {
            match state.groups.iter_mut().find(|g| g.id == group_id) {
                Some(group) => {
                    group.is_collapsed = !group.is_collapsed;
                    true
                }
                None => false,
            }
        }
        Action::SetQuests(quests) => {
            state.quests = quests;
            true
        }
        Action::AddQuest(quest) => {
            if has_quest(state, &quest.id) || !has_group(state, &quest.group_id) {
                false
            } else {
                if quest.is_tracked {
                    untrack_all(state);
                }
                state.quests.push(quest);
                true
            }
        }
        Action::UpdateQuest(quest) => update_quest(state, quest),
        Action::DeleteQuest(quest_id) => {
            let before = state.quests.len();
            state.quests.retain(|q| q.id != quest_id);
            if state.quests.len() == before {
                false
            } else {
                if state.selected_quest_id.as_deref() == Some(quest_id.as_str()) {
                    state.selected_quest_id = None;
                }
                true
            }
        }
        Action::SelectQuest(quest_id) => {
            state.selected_quest_id = quest_id;
            true
        }
        Action::ToggleSubtask {
            quest_id,
            subtask_id,
        } => {
            let subtask = state
                .quests
                .iter_mut()
                .find(|q| q.id == quest_id)
                .and_then(|q| q.subtasks.iter_mut().find(|st| st.id == subtask_id));
            match subtask {
                Some(st) => {
                    st.is_completed = !st.is_completed;
                    true
                }
                None => false,
            }
        }
        Action::MoveQuestToGroup { quest_id, group_id } => {
            move_quest(state, &quest_id, group_id, now)
        }
        Action::TrackQuest(quest_id) => track_quest(state, &quest_id),
        Action::SetSearchQuery(query) => {
            state.search_query = query;
            true
        }
        Action::LoadState(next) => {
            *state = next;
            true
        }
    };

    if !applied {
        tracing::debug!(action = name, "action ignored: referenced id not usable");
    }
    applied
}

fn has_group(state: &State, group_id: &str) -> bool {
    state.groups.iter().any(|g| g.id == group_id)
}

fn has_quest(state: &State, quest_id: &str) -> bool {
    state.quests.iter().any(|q| q.id == quest_id)
}

fn untrack_all(state: &mut State) {
    for quest in &mut state.quests {
        quest.is_tracked = false;
    }
}

fn delete_group(state: &mut State, group_id: &str) -> bool {
    match state.groups.iter().find(|g| g.id == group_id) {
        None => return false,
        Some(group) if group.is_default => return false,
        Some(_) => {}
    }

    state.groups.retain(|g| g.id != group_id);
    state.quests.retain(|q| q.group_id != group_id);

    // The cascade may have removed the selected quest.
    if let Some(selected) = state.selected_quest_id.as_deref() {
        if !has_quest(state, selected) {
            state.selected_quest_id = None;
        }
    }
    true
}

fn update_quest(state: &mut State, quest: Quest) -> bool {
    if !has_group(state, &quest.group_id) {
        return false;
    }
    let Some(index) = state.quests.iter().position(|q| q.id == quest.id) else {
        return false;
    };
    if quest.is_tracked {
        untrack_all(state);
    }
    state.quests[index] = quest;
    true
}

fn move_quest(state: &mut State, quest_id: &str, group_id: String, now: DateTime<Utc>) -> bool {
    if !has_group(state, &group_id) {
        return false;
    }
    let Some(quest) = state.quests.iter_mut().find(|q| q.id == quest_id) else {
        return false;
    };

    let is_completing = group_id == COMPLETED_GROUP_ID;
    let is_failing = group_id == FAILED_GROUP_ID;
    quest.completed_at = is_completing.then_some(now);
    quest.is_failed = is_failing;
    quest.group_id = group_id;
    true
}

fn track_quest(state: &mut State, quest_id: &str) -> bool {
    let Some(was_tracked) = state
        .quests
        .iter()
        .find(|q| q.id == quest_id)
        .map(|q| q.is_tracked)
    else {
        return false;
    };

    for quest in &mut state.quests {
        quest.is_tracked = quest.id == quest_id && !was_tracked;
    }
    true
}

/// Case-insensitive substring match against title, location and description.
/// An empty query matches everything.
pub fn matches_search(quest: &Quest, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    let contains = |text: &str| text.to_lowercase().contains(&needle);

    contains(&quest.title)
        || quest.location.as_deref().is_some_and(|l| contains(l))
        || contains(&quest.description)
}

/// Quests of one group that match the search query, tracked quest first,
/// then by suggested level descending. The sort is stable.
pub fn quests_for_group<'a>(state: &'a State, group_id: &str) -> Vec<&'a Quest> {
    let mut quests: Vec<&Quest> = state
        .quests
        .iter()
        .filter(|q| q.group_id == group_id)
        .filter(|q| matches_search(q, &state.search_query))
        .collect();

    quests.sort_by(|a, b| {
        b.is_tracked
            .cmp(&a.is_tracked)
            .then_with(|| b.sort_level().cmp(&a.sort_level()))
    });
    quests
}

pub fn group_by_id<'a>(state: &'a State, group_id: &str) -> Option<&'a QuestGroup> {
    state.groups.iter().find(|g| g.id == group_id)
}

pub fn quest_by_id<'a>(state: &'a State, quest_id: &str) -> Option<&'a Quest> {
    state.quests.iter().find(|q| q.id == quest_id)
}

/// Groups in display order (ascending `order`, stable for ties).
pub fn sorted_groups(state: &State) -> Vec<&QuestGroup> {
    let mut groups: Vec<&QuestGroup> = state.groups.iter().collect();
    groups.sort_by_key(|g| g.order);
    groups
}

/// Owns the single [`State`] of a running application.
#[derive(Clone, Debug, Default)]
pub struct Store {
    state: State,
}

impl Store {
    pub fn new(state: State) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Applies an action. Returns `true` if the state was modified.
    pub fn dispatch(&mut self, action: Action) -> bool {
        self.dispatch_at(action, Utc::now())
    }

    pub fn dispatch_at(&mut self, action: Action, now: DateTime<Utc>) -> bool {
        reduce(&mut self.state, action, now)
    }

    pub fn quests_for_group(&self, group_id: &str) -> Vec<&Quest> {
        quests_for_group(&self.state, group_id)
    }

    pub fn group_by_id(&self, group_id: &str) -> Option<&QuestGroup> {
        group_by_id(&self.state, group_id)
    }

    pub fn quest_by_id(&self, quest_id: &str) -> Option<&Quest> {
        quest_by_id(&self.state, quest_id)
    }

    /// The selected quest, if the selection still resolves.
    pub fn selected_quest(&self) -> Option<&Quest> {
        self.state
            .selected_quest_id
            .as_deref()
            .and_then(|id| self.quest_by_id(id))
    }

    pub fn tracked_quest(&self) -> Option<&Quest> {
        self.state.quests.iter().find(|q| q.is_tracked)
    }

    pub fn sorted_groups(&self) -> Vec<&QuestGroup> {
        sorted_groups(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{default_groups, default_state};
    use crate::types::{MAIN_GROUP_ID, SECONDARY_GROUP_ID, Subtask};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn quest(id: &str, group_id: &str, level: Option<i64>) -> Quest {
        Quest {
            id: id.to_string(),
            group_id: group_id.to_string(),
            title: format!("Quest {id}"),
            location: None,
            suggested_level: level,
            icon: None,
            description: String::new(),
            subtasks: vec![Subtask {
                id: format!("{id}-st"),
                text: "Step".to_string(),
                is_completed: false,
            }],
            reminder: None,
            created_at: at(),
            completed_at: None,
            is_failed: false,
            is_tracked: false,
        }
    }

    fn custom_group(id: &str) -> QuestGroup {
        QuestGroup {
            id: id.to_string(),
            name: "Side Projects".to_string(),
            icon: None,
            order: 2,
            is_collapsed: false,
            is_default: false,
            color: None,
        }
    }

    fn state_with(quests: Vec<Quest>) -> State {
        let mut groups = default_groups();
        groups.push(custom_group("side"));
        State {
            groups,
            quests,
            selected_quest_id: None,
            search_query: String::new(),
        }
    }

    fn ids(quests: &[&Quest]) -> Vec<String> {
        quests.iter().map(|q| q.id.clone()).collect()
    }

    #[test]
    fn test_delete_group_cascades_to_its_quests() {
        let mut state = state_with(vec![
            quest("a", "side", None),
            quest("b", MAIN_GROUP_ID, None),
            quest("c", "side", Some(10)),
        ]);
        state.selected_quest_id = Some("c".to_string());

        let state = apply(state, Action::DeleteGroup("side".to_string()));

        assert!(group_by_id(&state, "side").is_none());
        assert_eq!(state.quests.len(), 1);
        assert!(state.quests.iter().all(|q| q.group_id != "side"));
        assert_eq!(state.selected_quest_id, None);
    }

    #[test]
    fn test_default_groups_cannot_be_deleted() {
        let state = state_with(vec![quest("a", MAIN_GROUP_ID, None)]);
        let next = apply(state.clone(), Action::DeleteGroup(MAIN_GROUP_ID.to_string()));
        assert_eq!(next, state);
    }

    #[test]
    fn test_group_add_update_toggle() {
        let mut store = Store::new(state_with(vec![]));
        assert!(!store.dispatch(Action::AddGroup(custom_group("side"))));

        let mut renamed = store.group_by_id(MAIN_GROUP_ID).unwrap().clone();
        renamed.name = "Urgent".to_string();
        renamed.is_default = false;
        assert!(store.dispatch(Action::UpdateGroup(renamed)));
        let main = store.group_by_id(MAIN_GROUP_ID).unwrap();
        assert_eq!(main.name, "Urgent");
        assert!(main.is_default);

        assert!(store.dispatch(Action::ToggleGroupCollapse("side".to_string())));
        assert!(store.group_by_id("side").unwrap().is_collapsed);
        assert!(!store.dispatch(Action::ToggleGroupCollapse("nope".to_string())));
        assert!(!store.dispatch(Action::UpdateGroup(custom_group("nope"))));
    }

    #[test]
    fn test_track_moves_and_toggles() {
        let state = state_with(vec![
            quest("a", MAIN_GROUP_ID, None),
            quest("b", MAIN_GROUP_ID, None),
        ]);

        let state = apply(state, Action::TrackQuest("a".to_string()));
        let state = apply(state, Action::TrackQuest("b".to_string()));
        let tracked: Vec<_> = state.quests.iter().filter(|q| q.is_tracked).collect();
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].id, "b");

        let state = apply(state, Action::TrackQuest("b".to_string()));
        assert!(state.quests.iter().all(|q| !q.is_tracked));
    }

    #[test]
    fn test_track_unknown_quest_keeps_current_tracking() {
        let state = state_with(vec![quest("a", MAIN_GROUP_ID, None)]);
        let state = apply(state, Action::TrackQuest("a".to_string()));
        let state = apply(state, Action::TrackQuest("missing".to_string()));
        assert!(quest_by_id(&state, "a").unwrap().is_tracked);
    }

    #[test]
    fn test_update_with_tracked_flag_keeps_single_tracked_quest() {
        let state = state_with(vec![
            quest("a", MAIN_GROUP_ID, None),
            quest("b", MAIN_GROUP_ID, None),
        ]);
        let state = apply(state, Action::TrackQuest("a".to_string()));
        let mut b = quest_by_id(&state, "b").unwrap().clone();
        b.is_tracked = true;
        let state = apply(state, Action::UpdateQuest(b));

        assert!(!quest_by_id(&state, "a").unwrap().is_tracked);
        assert!(quest_by_id(&state, "b").unwrap().is_tracked);
    }

    #[test]
    fn test_double_toggle_subtask_restores_value() {
        let state = state_with(vec![quest("a", MAIN_GROUP_ID, None)]);
        let toggle = Action::ToggleSubtask {
            quest_id: "a".to_string(),
            subtask_id: "a-st".to_string(),
        };

        let once = apply(state.clone(), toggle.clone());
        assert!(quest_by_id(&once, "a").unwrap().subtasks[0].is_completed);
        let twice = apply(once, toggle);
        assert_eq!(twice, state);
    }

    #[test]
    fn test_toggle_subtask_with_unknown_ids_is_noop() {
        let mut store = Store::new(state_with(vec![quest("a", MAIN_GROUP_ID, None)]));
        let before = store.state().clone();
        assert!(!store.dispatch(Action::ToggleSubtask {
            quest_id: "a".to_string(),
            subtask_id: "nope".to_string(),
        }));
        assert!(!store.dispatch(Action::ToggleSubtask {
            quest_id: "nope".to_string(),
            subtask_id: "a-st".to_string(),
        }));
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_quests_for_group_sorts_by_level() {
        let state = state_with(vec![
            quest("l40", MAIN_GROUP_ID, Some(40)),
            quest("none", MAIN_GROUP_ID, None),
            quest("l90", MAIN_GROUP_ID, Some(90)),
            quest("other", SECONDARY_GROUP_ID, Some(100)),
        ]);
        assert_eq!(
            ids(&quests_for_group(&state, MAIN_GROUP_ID)),
            vec!["l90", "l40", "none"]
        );

        let state = apply(state, Action::TrackQuest("l40".to_string()));
        assert_eq!(
            ids(&quests_for_group(&state, MAIN_GROUP_ID)),
            vec!["l40", "l90", "none"]
        );
    }

    #[test]
    fn test_quests_for_group_sort_is_stable_for_equal_levels() {
        let state = state_with(vec![
            quest("first", MAIN_GROUP_ID, Some(10)),
            quest("second", MAIN_GROUP_ID, None),
            quest("third", MAIN_GROUP_ID, Some(10)),
            quest("fourth", MAIN_GROUP_ID, Some(0)),
        ]);
        assert_eq!(
            ids(&quests_for_group(&state, MAIN_GROUP_ID)),
            vec!["first", "third", "second", "fourth"]
        );
    }

    #[test]
    fn test_search_filters_title_location_description() {
        let mut by_title = quest("t", MAIN_GROUP_ID, None);
        by_title.title = "Website Redesign".to_string();
        let mut by_location = quest("l", MAIN_GROUP_ID, None);
        by_location.location = Some("Downtown WEB Studio".to_string());
        let mut by_description = quest("d", MAIN_GROUP_ID, None);
        by_description.description = "update the webshop".to_string();
        let unrelated = quest("u", MAIN_GROUP_ID, None);

        let state = state_with(vec![by_title, by_location, by_description, unrelated]);
        let state = apply(state, Action::SetSearchQuery("Web".to_string()));

        let found = quests_for_group(&state, MAIN_GROUP_ID);
        assert_eq!(ids(&found), vec!["t", "l", "d"]);
        assert!(found.iter().all(|q| matches_search(q, "web")));

        let state = apply(state, Action::SetSearchQuery(String::new()));
        assert_eq!(quests_for_group(&state, MAIN_GROUP_ID).len(), 4);
    }

    #[test]
    fn test_move_to_completed_then_failed() {
        let state = state_with(vec![quest("a", MAIN_GROUP_ID, None)]);
        let state = apply_at(
            state,
            Action::MoveQuestToGroup {
                quest_id: "a".to_string(),
                group_id: COMPLETED_GROUP_ID.to_string(),
            },
            at(),
        );
        let a = quest_by_id(&state, "a").unwrap();
        assert_eq!(a.group_id, COMPLETED_GROUP_ID);
        assert_eq!(a.completed_at, Some(at()));
        assert!(!a.is_failed);

        let state = apply(
            state,
            Action::MoveQuestToGroup {
                quest_id: "a".to_string(),
                group_id: FAILED_GROUP_ID.to_string(),
            },
        );
        let a = quest_by_id(&state, "a").unwrap();
        assert_eq!(a.completed_at, None);
        assert!(a.is_failed);

        let state = apply(
            state,
            Action::MoveQuestToGroup {
                quest_id: "a".to_string(),
                group_id: SECONDARY_GROUP_ID.to_string(),
            },
        );
        let a = quest_by_id(&state, "a").unwrap();
        assert_eq!(a.completed_at, None);
        assert!(!a.is_failed);
    }

    #[test]
    fn test_move_to_unknown_group_is_noop() {
        let state = state_with(vec![quest("a", MAIN_GROUP_ID, None)]);
        let next = apply(
            state.clone(),
            Action::MoveQuestToGroup {
                quest_id: "a".to_string(),
                group_id: "ghost".to_string(),
            },
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_delete_quest_clears_only_matching_selection() {
        let mut state = state_with(vec![
            quest("a", MAIN_GROUP_ID, None),
            quest("b", MAIN_GROUP_ID, None),
        ]);
        state.selected_quest_id = Some("a".to_string());

        let state = apply(state, Action::DeleteQuest("b".to_string()));
        assert_eq!(state.selected_quest_id.as_deref(), Some("a"));

        let state = apply(state, Action::DeleteQuest("a".to_string()));
        assert_eq!(state.selected_quest_id, None);
        assert!(state.quests.is_empty());
    }

    #[test]
    fn test_add_quest_rejects_duplicates_and_orphans() {
        let mut store = Store::new(state_with(vec![quest("a", MAIN_GROUP_ID, None)]));
        assert!(!store.dispatch(Action::AddQuest(quest("a", SECONDARY_GROUP_ID, None))));
        assert!(!store.dispatch(Action::AddQuest(quest("b", "ghost", None))));
        assert!(store.dispatch(Action::AddQuest(quest("b", "side", None))));
        assert_eq!(store.state().quests.len(), 2);
        assert_eq!(store.state().quests[1].id, "b");
    }

    #[test]
    fn test_bulk_replace_and_select() {
        let mut store = Store::new(default_state(at()));
        assert!(store.dispatch(Action::SetQuests(vec![])));
        assert!(store.selected_quest().is_none());
        assert!(store.dispatch(Action::SetGroups(vec![custom_group("solo")])));
        assert_eq!(store.sorted_groups().len(), 1);

        assert!(store.dispatch(Action::LoadState(default_state(at()))));
        assert_eq!(store.state(), &default_state(at()));
        assert_eq!(store.selected_quest().unwrap().id, "quest-1");

        assert!(store.dispatch(Action::SelectQuest(None)));
        assert!(store.selected_quest().is_none());
    }

    #[test]
    fn test_sorted_groups_follow_order() {
        let mut state = state_with(vec![]);
        state.groups.reverse();
        let order: Vec<_> = sorted_groups(&state).iter().map(|g| g.id.as_str()).collect();
        assert_eq!(
            order,
            vec![MAIN_GROUP_ID, SECONDARY_GROUP_ID, "side", COMPLETED_GROUP_ID, FAILED_GROUP_ID]
        );
    }
}
