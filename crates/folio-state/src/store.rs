//! Reactive store snapshot and its update channel.
//!
//! The server only ever produces the initial [`StoreState`]. Anything that
//! changes it afterwards travels as a serializable [`StoreUpdate`] applied
//! on the client.

use serde::{Deserialize, Serialize};

const DEFAULT_TITLE: &str = "Default Title";

/// Title the server seeds into every render.
pub const SERVER_TITLE: &str = "Server Rendered Title";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Store slice, serialized as `window.__INITIAL_VALTIO_STATE__`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    pub theme: Theme,
    pub title: String,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Partial values merged over the store defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl StoreOverrides {
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl StoreState {
    /// Defaults with `overrides` applied on top.
    pub fn initial(overrides: StoreOverrides) -> Self {
        let defaults = Self::default();
        Self {
            theme: overrides.theme.unwrap_or(defaults.theme),
            title: overrides.title.unwrap_or(defaults.title),
        }
    }

    /// The snapshot a server render starts from.
    pub fn server_seed() -> Self {
        Self::initial(StoreOverrides::default().with_title(SERVER_TITLE))
    }

    /// Apply one update, returning the next snapshot.
    pub fn apply(self, update: StoreUpdate) -> Self {
        match update {
            StoreUpdate::SetTheme(theme) => Self { theme, ..self },
            StoreUpdate::SetTitle(title) => Self { title, ..self },
        }
    }
}

/// A single client-side store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum StoreUpdate {
    SetTheme(Theme),
    SetTitle(String),
}

impl StoreUpdate {
    /// Updates that turn `from` into `to`.
    pub fn diff(from: &StoreState, to: &StoreState) -> Vec<StoreUpdate> {
        let mut updates = Vec::new();
        if from.theme != to.theme {
            updates.push(StoreUpdate::SetTheme(to.theme));
        }
        if from.title != to.title {
            updates.push(StoreUpdate::SetTitle(to.title.clone()));
        }
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Initial State Tests ===

    #[test]
    fn test_initial_defaults() {
        let state = StoreState::initial(StoreOverrides::default());
        assert_eq!(state.theme, Theme::Light);
        assert_eq!(state.title, "Default Title");
    }

    #[test]
    fn test_server_seed() {
        let state = StoreState::server_seed();
        assert_eq!(state.title, "Server Rendered Title");
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            serde_json::json!({ "theme": "light", "title": "Server Rendered Title" })
        );
    }

    // === Update Tests ===

    #[test]
    fn test_diff_then_apply_reaches_target() {
        let from = StoreState::server_seed();
        let to = StoreState::initial(
            StoreOverrides::default()
                .with_theme(Theme::Dark)
                .with_title("Reading"),
        );

        let updates = StoreUpdate::diff(&from, &to);
        assert_eq!(updates.len(), 2);

        let applied = updates.into_iter().fold(from, StoreState::apply);
        assert_eq!(applied, to);
    }

    #[test]
    fn test_diff_of_equal_states_is_empty() {
        let state = StoreState::default();
        assert!(StoreUpdate::diff(&state, &state).is_empty());
    }

    #[test]
    fn test_update_wire_shape() {
        let json = serde_json::to_value(StoreUpdate::SetTheme(Theme::Dark)).unwrap();
        assert_eq!(json, serde_json::json!({ "op": "setTheme", "value": "dark" }));
    }
}
