//! Selection movement across the visible quest list.

use crate::store::{Action, quests_for_group, sorted_groups};
use crate::types::{Quest, State};

/// Quests in display order: groups by `order`, collapsed groups skipped, each
/// group's quests filtered and sorted as they are listed.
pub fn visible_quests(state: &State) -> Vec<&Quest> {
    sorted_groups(state)
        .into_iter()
        .filter(|g| !g.is_collapsed)
        .flat_map(|g| quests_for_group(state, &g.id))
        .collect()
}

fn selected_index(visible: &[&Quest], state: &State) -> Option<usize> {
    let selected = state.selected_quest_id.as_deref()?;
    visible.iter().position(|q| q.id == selected)
}

/// Selection for "next quest". `None` when there is nothing to move to.
pub fn select_next(state: &State) -> Option<Action> {
    let visible = visible_quests(state);
    let target = match selected_index(&visible, state) {
        Some(i) => visible.get(i + 1)?,
        None => visible.first()?,
    };
    Some(Action::SelectQuest(Some(target.id.clone())))
}

/// Selection for "previous quest". `None` when nothing is selected or the
/// selection is already first.
pub fn select_previous(state: &State) -> Option<Action> {
    let visible = visible_quests(state);
    let index = selected_index(&visible, state)?;
    let target = visible.get(index.checked_sub(1)?)?;
    Some(Action::SelectQuest(Some(target.id.clone())))
}

/// "Track current": toggles tracking of the selected quest, if any.
pub fn track_selected(state: &State) -> Option<Action> {
    let selected = state.selected_quest_id.as_deref()?;
    state
        .quests
        .iter()
        .any(|q| q.id == selected)
        .then(|| Action::TrackQuest(selected.to_string()))
}
