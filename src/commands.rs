//! Maps parsed subcommands onto store actions and renders the result.

use chrono::Utc;
use dialoguer::Confirm;
use std::fs;
use std::path::Path;

use crate::app::QuestLog;
use crate::cli::{Command, GroupArgs, GroupCommand, QuestArgs};
use crate::defaults::default_state;
use crate::draft::{GroupDraft, QuestDraft, new_subtask};
use crate::error::{QuestLogError, QuestLogResult};
use crate::metadata::{PKG_NAME, PKG_VERSION};
use crate::navigation::{select_next, select_previous, track_selected};
use crate::render::{render_groups, render_log, render_quest};
use crate::storage::KeyValueStore;
use crate::store::Action;
use crate::types::{COMPLETED_GROUP_ID, FAILED_GROUP_ID, Quest, QuestGroup, State};

/// Asks before destructive operations unless `--yes` was given.
pub trait Confirmer {
    fn confirm(&self, prompt: &str) -> QuestLogResult<bool>;
}

/// Interactive terminal prompt.
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str) -> QuestLogResult<bool> {
        Ok(Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }
}

fn quest<'a, S: KeyValueStore>(app: &'a QuestLog<S>, id: &str) -> QuestLogResult<&'a Quest> {
    app.store()
        .quest_by_id(id)
        .ok_or_else(|| QuestLogError::quest_not_found(id))
}

fn group<'a, S: KeyValueStore>(app: &'a QuestLog<S>, id: &str) -> QuestLogResult<&'a QuestGroup> {
    app.store()
        .group_by_id(id)
        .ok_or_else(|| QuestLogError::group_not_found(id))
}

fn no_selection() -> QuestLogError {
    QuestLogError::InvalidInput("no quest is selected".to_string())
}

/// Explicit id, or the selected quest when none is given.
fn target_quest<S: KeyValueStore>(app: &QuestLog<S>, id: Option<String>) -> QuestLogResult<String> {
    match id {
        Some(id) => Ok(quest(app, &id)?.id.clone()),
        None => app
            .store()
            .selected_quest()
            .map(|q| q.id.clone())
            .ok_or_else(no_selection),
    }
}

fn apply_quest_args(draft: &mut QuestDraft, args: QuestArgs) -> QuestLogResult<()> {
    if let Some(title) = args.title {
        draft.title = title;
    }
    if let Some(group) = args.group {
        draft.group_id = Some(group);
    }
    if args.location.is_some() {
        draft.location = args.location;
    }
    if args.level.is_some() {
        draft.suggested_level = args.level;
    }
    if args.icon.is_some() {
        draft.icon = args.icon;
    }
    if let Some(description) = args.description {
        draft.description = description;
    }
    if args.reminder.is_some() {
        draft.reminder = args.reminder;
    }
    for text in &args.subtasks {
        draft.push_subtask(text)?;
    }
    Ok(())
}

fn group_draft(args: GroupArgs, existing: Option<&QuestGroup>) -> GroupDraft {
    GroupDraft {
        name: args
            .name
            .or_else(|| existing.map(|g| g.name.clone()))
            .unwrap_or_default(),
        icon: args.icon,
        color: args.color,
    }
}

fn show_quest<S: KeyValueStore>(app: &QuestLog<S>, id: &str) -> QuestLogResult<String> {
    Ok(render_quest(app.store(), quest(app, id)?))
}

fn show_selected<S: KeyValueStore>(app: &QuestLog<S>) -> String {
    match app.store().selected_quest() {
        Some(q) => render_quest(app.store(), q),
        None => "No quest selected.\n".to_string(),
    }
}

pub fn execute<S: KeyValueStore>(
    app: &mut QuestLog<S>,
    command: Command,
    confirmer: &dyn Confirmer,
) -> QuestLogResult<String> {
    match command {
        Command::List { all } => Ok(render_log(app.store(), all)),
        Command::Show { id } => {
            let id = target_quest(app, id)?;
            show_quest(app, &id)
        }
        Command::Add(args) => {
            if args.title.is_none() {
                return Err(QuestLogError::InvalidInput(
                    "a new quest needs --title".to_string(),
                ));
            }
            let mut draft = QuestDraft::default();
            apply_quest_args(&mut draft, args)?;
            if let Some(group_id) = &draft.group_id {
                group(app, group_id)?;
            }
            let new_quest = draft.into_quest(None, Utc::now())?;
            let id = new_quest.id.clone();
            app.dispatch(Action::AddQuest(new_quest));
            app.dispatch(Action::SelectQuest(Some(id.clone())));
            show_quest(app, &id)
        }
        Command::Edit {
            id,
            fields,
            clear_subtasks,
            remove_subtasks,
            rename_subtasks,
            clear_level,
        } => {
            let existing = quest(app, &id)?.clone();
            let mut draft = QuestDraft::from_quest(&existing);
            if clear_subtasks {
                draft.subtasks.clear();
            }
            for subtask_id in &remove_subtasks {
                draft.remove_subtask(subtask_id)?;
            }
            for (subtask_id, text) in &rename_subtasks {
                draft.rename_subtask(subtask_id, text)?;
            }
            apply_quest_args(&mut draft, fields)?;
            if clear_level {
                draft.suggested_level = None;
            }
            if let Some(group_id) = &draft.group_id {
                group(app, group_id)?;
            }
            let updated = draft.into_quest(Some(&existing), Utc::now())?;
            app.dispatch(Action::UpdateQuest(updated));
            show_quest(app, &id)
        }
        Command::Delete { id } => {
            let title = quest(app, &id)?.title.clone();
            app.dispatch(Action::DeleteQuest(id));
            Ok(format!("Deleted quest '{title}'.\n"))
        }
        Command::Select { id } => {
            let id = quest(app, &id)?.id.clone();
            app.dispatch(Action::SelectQuest(Some(id.clone())));
            show_quest(app, &id)
        }
        Command::Deselect => {
            app.dispatch(Action::SelectQuest(None));
            Ok("Selection cleared.\n".to_string())
        }
        Command::Next => {
            if let Some(action) = select_next(app.store().state()) {
                app.dispatch(action);
            }
            Ok(show_selected(app))
        }
        Command::Prev => {
            if let Some(action) = select_previous(app.store().state()) {
                app.dispatch(action);
            }
            Ok(show_selected(app))
        }
        Command::Track { id } => {
            let id = match id {
                Some(id) => quest(app, &id)?.id.clone(),
                None => {
                    let Some(Action::TrackQuest(id)) = track_selected(app.store().state()) else {
                        return Err(no_selection());
                    };
                    id
                }
            };
            app.dispatch(Action::TrackQuest(id.clone()));
            let q = quest(app, &id)?;
            let verb = if q.is_tracked { "Tracking" } else { "Stopped tracking" };
            Ok(format!("{verb} '{}'.\n", q.title))
        }
        Command::Subtask { quest: id, text } => {
            add_subtask(app, &id, &text)?;
            show_quest(app, &id)
        }
        Command::Toggle { quest: id, subtask } => {
            let q = quest(app, &id)?;
            if q.subtask(&subtask).is_none() {
                return Err(QuestLogError::NotFound {
                    kind: "objective",
                    id: subtask,
                });
            }
            app.dispatch(Action::ToggleSubtask {
                quest_id: id.clone(),
                subtask_id: subtask,
            });
            show_quest(app, &id)
        }
        Command::Move { quest: id, group: group_id } => move_quest(app, id, group_id),
        Command::Complete { id } => {
            let id = target_quest(app, id)?;
            move_quest(app, id, COMPLETED_GROUP_ID.to_string())
        }
        Command::Fail { id } => {
            let id = target_quest(app, id)?;
            move_quest(app, id, FAILED_GROUP_ID.to_string())
        }
        Command::Search { query, clear } => {
            let query = if clear { String::new() } else { query.unwrap_or_default() };
            app.dispatch(Action::SetSearchQuery(query));
            Ok(render_log(app.store(), false))
        }
        Command::Group(command) => execute_group(app, command, confirmer),
        Command::Export { output } => {
            let json = serde_json::to_string_pretty(app.store().state())?;
            match output {
                Some(path) => {
                    fs::write(&path, json)?;
                    Ok(format!("Exported quest log to {}.\n", path.display()))
                }
                None => Ok(format!("{json}\n")),
            }
        }
        Command::Import { path, yes } => import(app, &path, yes, confirmer),
        Command::Reset { yes } => {
            if !yes && !confirmer.confirm("Replace the quest log with the defaults?")? {
                return Ok("Reset cancelled.\n".to_string());
            }
            app.dispatch(Action::LoadState(default_state(Utc::now())));
            Ok(render_log(app.store(), false))
        }
        Command::Status => Ok(status(app)),
        Command::Version => Ok(format!("{PKG_NAME} {PKG_VERSION}\n")),
    }
}

fn move_quest<S: KeyValueStore>(
    app: &mut QuestLog<S>,
    id: String,
    group_id: String,
) -> QuestLogResult<String> {
    quest(app, &id)?;
    let name = group(app, &group_id)?.name.clone();
    app.dispatch(Action::MoveQuestToGroup {
        quest_id: id.clone(),
        group_id,
    });
    let title = &quest(app, &id)?.title;
    Ok(format!("Moved '{title}' to {name}.\n"))
}

fn import<S: KeyValueStore>(
    app: &mut QuestLog<S>,
    path: &Path,
    yes: bool,
    confirmer: &dyn Confirmer,
) -> QuestLogResult<String> {
    let raw = fs::read_to_string(path)?;
    let state: State = serde_json::from_str(&raw)?;
    let prompt = format!(
        "Replace the quest log with {} groups and {} quests from {}?",
        state.groups.len(),
        state.quests.len(),
        path.display()
    );
    if !yes && !confirmer.confirm(&prompt)? {
        return Ok("Import cancelled.\n".to_string());
    }
    app.dispatch(Action::LoadState(state));
    Ok(render_log(app.store(), false))
}

fn execute_group<S: KeyValueStore>(
    app: &mut QuestLog<S>,
    command: GroupCommand,
    confirmer: &dyn Confirmer,
) -> QuestLogResult<String> {
    match command {
        GroupCommand::List => Ok(render_groups(app.store())),
        GroupCommand::Add(args) => {
            let new_group =
                group_draft(args, None).into_group(None, &app.store().state().groups)?;
            let name = new_group.name.clone();
            app.dispatch(Action::AddGroup(new_group));
            Ok(format!("Created group '{name}'.\n{}", render_groups(app.store())))
        }
        GroupCommand::Edit { id, fields } => {
            let existing = group(app, &id)?.clone();
            let updated = group_draft(fields, Some(&existing))
                .into_group(Some(&existing), &app.store().state().groups)?;
            app.dispatch(Action::UpdateGroup(updated));
            Ok(render_groups(app.store()))
        }
        GroupCommand::Delete { id, yes } => {
            let target = group(app, &id)?;
            if target.is_default {
                return Err(QuestLogError::InvalidInput(format!(
                    "'{}' is a system group and cannot be deleted",
                    target.name
                )));
            }
            let name = target.name.clone();
            let count = app
                .store()
                .state()
                .quests
                .iter()
                .filter(|q| q.group_id == id)
                .count();
            let prompt = format!("Delete group '{name}' and its {count} quests?");
            if !yes && !confirmer.confirm(&prompt)? {
                return Ok("Delete cancelled.\n".to_string());
            }
            app.dispatch(Action::DeleteGroup(id));
            Ok(format!("Deleted group '{name}' and {count} quests.\n"))
        }
        GroupCommand::Toggle { id } => {
            group(app, &id)?;
            app.dispatch(Action::ToggleGroupCollapse(id));
            Ok(render_log(app.store(), false))
        }
    }
}

fn status<S: KeyValueStore>(app: &QuestLog<S>) -> String {
    let store = app.store();
    let state = store.state();
    let finished = state
        .quests
        .iter()
        .filter(|q| q.group_id == COMPLETED_GROUP_ID)
        .count();
    let tracked = store
        .tracked_quest()
        .map(|q| q.title.clone())
        .unwrap_or_else(|| "none".to_string());
    let selected = store
        .selected_quest()
        .map(|q| q.title.clone())
        .unwrap_or_else(|| "none".to_string());

    format!(
        "storage key: {}\ngroups: {}\nquests: {} ({} completed)\ntracked: {}\nselected: {}\nsearch: {}\n",
        app.key(),
        state.groups.len(),
        state.quests.len(),
        finished,
        tracked,
        selected,
        if state.search_query.is_empty() {
            "-"
        } else {
            state.search_query.as_str()
        }
    )
}

/// Adds one objective to a quest without going through a full edit.
pub fn add_subtask<S: KeyValueStore>(
    app: &mut QuestLog<S>,
    quest_id: &str,
    text: &str,
) -> QuestLogResult<String> {
    let mut updated = quest(app, quest_id)?.clone();
    let subtask = new_subtask(text)?;
    let id = subtask.id.clone();
    updated.subtasks.push(subtask);
    app.dispatch(Action::UpdateQuest(updated));
    Ok(id)
}
