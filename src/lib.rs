pub mod app;
pub mod cli;
pub mod commands;
pub mod defaults;
pub mod draft;
pub mod error;
pub mod metadata;
pub mod navigation;
pub mod render;
pub mod storage;
pub mod store;
pub mod types;

pub use app::QuestLog;
pub use error::{QuestLogError, QuestLogResult};
pub use store::{Action, Store};
pub use types::{Quest, QuestGroup, State, Subtask};
