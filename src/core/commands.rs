use crate::core::app_state::{ACCENT_COLORS, Theme};
use crate::core::search::{EditDistanceMatcher, Matcher};

/// What running a palette action does to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    OpenSettings,
    SetTheme(Theme),
    SetAccent(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub id: String,
    pub name: String,
    pub keywords: String,
    pub parent: Option<String>,
    pub shortcut: Option<&'static str>,
    /// Group actions carry no effect; choosing one navigates into it.
    pub effect: Option<CommandEffect>,
}

impl Action {
    fn new(id: impl Into<String>, name: impl Into<String>, keywords: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            keywords: keywords.into(),
            parent: None,
            shortcut: None,
            effect: None,
        }
    }

    fn under(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    fn performs(mut self, effect: CommandEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn is_group(&self) -> bool {
        self.effect.is_none()
    }
}

/// The command bar's action registry.
#[derive(Debug, Clone)]
pub struct CommandPalette {
    actions: Vec<Action>,
    matcher: EditDistanceMatcher,
}

impl Default for CommandPalette {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandPalette {
    pub fn new() -> Self {
        let mut actions = vec![Action {
            shortcut: Some("s"),
            ..Action::new("settings", "Settings", "settings preferences options")
                .performs(CommandEffect::OpenSettings)
        }];

        actions.push(Action::new("themes", "Change theme...", "background color"));
        for theme in Theme::ALL {
            actions.push(
                Action::new(theme.as_str(), theme.as_str(), format!("theme {}", theme.as_str()))
                    .under("themes")
                    .performs(CommandEffect::SetTheme(theme)),
            );
        }

        actions.push(Action::new("accent-colors", "Change accent color...", "interface color"));
        for color in ACCENT_COLORS {
            actions.push(
                Action::new(color, color, format!("accent {color}"))
                    .under("accent-colors")
                    .performs(CommandEffect::SetAccent(color)),
            );
        }

        Self {
            actions,
            matcher: EditDistanceMatcher::default(),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn get(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Parents of `id`, outermost first.
    pub fn ancestors(&self, id: &str) -> Vec<&Action> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|a| a.parent.as_deref());
        while let Some(parent) = current.and_then(|p| self.get(p)) {
            if chain.iter().any(|a: &&Action| a.id == parent.id) {
                break;
            }
            chain.push(parent);
            current = parent.parent.as_deref();
        }
        chain.reverse();
        chain
    }

    fn is_under(&self, action: &Action, root: Option<&str>) -> bool {
        match root {
            None => true,
            Some(root) => self.ancestors(&action.id).iter().any(|a| a.id == root),
        }
    }

    /// Actions to list for `query` while the palette is opened at `root`.
    ///
    /// An empty query lists the direct children of `root` in registration
    /// order. Otherwise every action below `root` whose name or keywords
    /// match is returned, best match first.
    pub fn matches(&self, query: &str, root: Option<&str>) -> Vec<&Action> {
        let query = query.trim();
        if query.is_empty() {
            return self
                .actions
                .iter()
                .filter(|a| a.parent.as_deref() == root)
                .collect();
        }

        let mut scored: Vec<(f64, &Action)> = self
            .actions
            .iter()
            .filter(|a| self.is_under(a, root))
            .filter_map(|a| {
                let by_name = self.matcher.score(query, &a.name);
                let by_keywords = self.matcher.score(query, &a.keywords);
                let best = match (by_name, by_keywords) {
                    (Some(x), Some(y)) => Some(x.min(y)),
                    (x, y) => x.or(y),
                };
                best.map(|s| (s, a))
            })
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.into_iter().map(|(_, a)| a).collect()
    }

    /// The action bound to a single-key `shortcut`, if any.
    pub fn by_shortcut(&self, key: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.shortcut == Some(key))
    }

    /// Effect of running `id`. Groups and unknown ids have none.
    pub fn perform(&self, id: &str) -> Option<CommandEffect> {
        let effect = self.get(id).and_then(|a| a.effect);
        log::debug!("Command {} -> {:?}", id, effect);
        effect
    }
}
