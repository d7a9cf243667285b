//! Logical actions and the key -> action table

use crate::{Direction, Grade};
use std::collections::HashMap;

/// Command identifier as used in the keybinding configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandId(pub String);

impl CommandId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Grading (rate.a .. rate.f are built from the grade code)
    pub const RATE_PREFIX: &'static str = "rate.";
    pub const RATE_SKIP: &'static str = "rate.skip";

    // Movement
    pub const NAV_LEFT: &'static str = "nav.left";
    pub const NAV_RIGHT: &'static str = "nav.right";
    pub const NAV_UP: &'static str = "nav.up";
    pub const NAV_DOWN: &'static str = "nav.down";
    pub const NAV_ACTIVATE: &'static str = "nav.activate";
    pub const NAV_CLOSE: &'static str = "nav.close";

    // View
    pub const VIEW_COLUMNS_PREFIX: &'static str = "view.columns:";
    pub const VIEW_TOGGLE_MODE: &'static str = "view.toggle_mode";
    pub const VIEW_TOGGLE_RATINGS: &'static str = "view.toggle_ratings";

    // Screens
    pub const APP_DECK: &'static str = "app.deck";
    pub const APP_REVIEW: &'static str = "app.review";
    pub const APP_RELOAD: &'static str = "app.reload";
}

/// What a key press asks the session to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Rate(Grade),
    /// Remove the grade
    Skip,
    Move(Direction),
    /// Open the focused image in the lightbox, or close it when open
    Activate,
    /// Close the lightbox
    Close,
    SetColumns(usize),
    ToggleViewMode,
    ToggleRatings,
    ShowDeck,
    ShowReview,
    /// Re-fetch the manifest of the active collection
    Reload,
}

impl Action {
    /// Parse a command id from the keybinding configuration
    pub fn from_command_id(id: &str) -> Option<Self> {
        let action = match id {
            CommandId::RATE_SKIP => Action::Skip,
            CommandId::NAV_LEFT => Action::Move(Direction::Left),
            CommandId::NAV_RIGHT => Action::Move(Direction::Right),
            CommandId::NAV_UP => Action::Move(Direction::Up),
            CommandId::NAV_DOWN => Action::Move(Direction::Down),
            CommandId::NAV_ACTIVATE => Action::Activate,
            CommandId::NAV_CLOSE => Action::Close,
            CommandId::VIEW_TOGGLE_MODE => Action::ToggleViewMode,
            CommandId::VIEW_TOGGLE_RATINGS => Action::ToggleRatings,
            CommandId::APP_DECK => Action::ShowDeck,
            CommandId::APP_REVIEW => Action::ShowReview,
            CommandId::APP_RELOAD => Action::Reload,
            _ => {
                if let Some(code) = id.strip_prefix(CommandId::RATE_PREFIX) {
                    return Grade::from_code(code).map(Action::Rate);
                }
                if let Some(n) = id.strip_prefix(CommandId::VIEW_COLUMNS_PREFIX) {
                    return n.parse::<usize>().ok().filter(|&n| n > 0).map(Action::SetColumns);
                }
                return None;
            }
        };
        Some(action)
    }

    pub fn command_id(&self) -> CommandId {
        let id = match self {
            Action::Rate(grade) => format!("{}{}", CommandId::RATE_PREFIX, grade.code()),
            Action::SetColumns(n) => format!("{}{}", CommandId::VIEW_COLUMNS_PREFIX, n),
            Action::Skip => CommandId::RATE_SKIP.to_string(),
            Action::Move(Direction::Left) => CommandId::NAV_LEFT.to_string(),
            Action::Move(Direction::Right) => CommandId::NAV_RIGHT.to_string(),
            Action::Move(Direction::Up) => CommandId::NAV_UP.to_string(),
            Action::Move(Direction::Down) => CommandId::NAV_DOWN.to_string(),
            Action::Activate => CommandId::NAV_ACTIVATE.to_string(),
            Action::Close => CommandId::NAV_CLOSE.to_string(),
            Action::ToggleViewMode => CommandId::VIEW_TOGGLE_MODE.to_string(),
            Action::ToggleRatings => CommandId::VIEW_TOGGLE_RATINGS.to_string(),
            Action::ShowDeck => CommandId::APP_DECK.to_string(),
            Action::ShowReview => CommandId::APP_REVIEW.to_string(),
            Action::Reload => CommandId::APP_RELOAD.to_string(),
        };
        CommandId(id)
    }
}

/// Key -> action lookup, built once from the keybinding configuration.
///
/// The table holds plain data; actions are applied to whatever state is
/// current when they are dispatched.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    bindings: HashMap<String, Action>,
}

impl CommandTable {
    /// Build from a command id -> keys map
    pub fn from_bindings(bindings: &HashMap<String, Vec<String>>) -> Self {
        // Sorted so conflicts resolve the same way on every run
        let mut commands: Vec<_> = bindings.iter().collect();
        commands.sort_by(|a, b| a.0.cmp(b.0));

        let mut table: HashMap<String, Action> = HashMap::new();
        for (command, keys) in commands {
            let Some(action) = Action::from_command_id(command) else {
                tracing::warn!("Unknown command in keybindings: {}", command);
                continue;
            };

            for key in keys {
                let key = key.to_lowercase();
                if let Some(existing) = table.get(&key) {
                    tracing::warn!(
                        "Key {} bound to both {} and {}, keeping the former",
                        key,
                        existing.command_id().as_str(),
                        command
                    );
                    continue;
                }
                table.insert(key, action);
            }
        }

        tracing::debug!("Command table built with {} keys", table.len());
        Self { bindings: table }
    }

    /// Action bound to a key. Keys typed into a text input are never
    /// commands.
    pub fn lookup(&self, key: &str, in_text_input: bool) -> Option<Action> {
        if in_text_input {
            return None;
        }
        let action = self.bindings.get(&key.to_lowercase()).copied();
        if action.is_none() {
            tracing::trace!("Unbound key: {}", key);
        }
        action
    }
}
