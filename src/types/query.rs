use std::fmt;

use super::rule::Rule;

/// Selects rules by field.
///
/// Matching is **OR** across the fields that are set: a rule matches if
/// *any* set field equals the rule's corresponding field. Use a single-field
/// query when an exact match is required. Unset fields are ignored, so an
/// empty query matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleQuery {
    id: Option<String>,
    name: Option<String>,
    priority: Option<i64>,
    enabled: Option<bool>,
}

impl RuleQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// `true` if any set field of this query equals the rule's field.
    #[must_use]
    pub fn matches(&self, rule: &Rule) -> bool {
        let id = self
            .id
            .as_deref()
            .is_some_and(|id| rule.id.as_deref() == Some(id));
        let name = self
            .name
            .as_deref()
            .is_some_and(|name| rule.name.as_deref() == Some(name));
        let priority = self.priority.is_some_and(|p| rule.priority == Some(p));
        let enabled = self.enabled.is_some_and(|e| rule.enabled == e);
        id || name || priority || enabled
    }
}

/// Target state for [`RuleRegistry::set_enabled`](super::RuleRegistry::set_enabled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    On,
    Off,
}

impl From<bool> for RuleState {
    fn from(on: bool) -> Self {
        if on {
            RuleState::On
        } else {
            RuleState::Off
        }
    }
}

/// `"on"` in any letter case is [`RuleState::On`]; anything else is `Off`.
impl From<&str> for RuleState {
    fn from(state: &str) -> Self {
        RuleState::from(state.eq_ignore_ascii_case("on"))
    }
}

impl From<RuleState> for bool {
    fn from(state: RuleState) -> Self {
        state == RuleState::On
    }
}

impl fmt::Display for RuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleState::On => write!(f, "on"),
            RuleState::Off => write!(f, "off"),
        }
    }
}
