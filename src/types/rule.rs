use std::fmt;
use std::sync::Arc;

use super::control::Control;
use super::error::RuleError;
use super::fact::Fact;

/// Decides whether a rule fires by calling [`Control::when`] exactly once.
///
/// Any `Fn(&mut Control, &[Fact])` closure is a `Condition`.
pub trait Condition: Send + Sync {
    fn evaluate(&self, control: &mut Control<'_>, facts: &[Fact]);
}

/// The action taken when a rule fires. May mutate the working set.
///
/// Any `Fn(&mut Control, &mut [Fact])` closure is a `Consequence`.
pub trait Consequence: Send + Sync {
    fn apply(&self, control: &mut Control<'_>, facts: &mut [Fact]);
}

impl<F> Condition for F
where
    F: Fn(&mut Control<'_>, &[Fact]) + Send + Sync,
{
    fn evaluate(&self, control: &mut Control<'_>, facts: &[Fact]) {
        self(control, facts);
    }
}

impl<F> Consequence for F
where
    F: Fn(&mut Control<'_>, &mut [Fact]) + Send + Sync,
{
    fn apply(&self, control: &mut Control<'_>, facts: &mut [Fact]) {
        self(control, facts);
    }
}

/// A condition/consequence pair with optional identity and priority.
///
/// Rules are enabled by default. Cloning a rule is cheap: the condition and
/// consequence are shared.
#[derive(Clone)]
pub struct Rule {
    pub(crate) id: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) priority: Option<i64>,
    pub(crate) enabled: bool,
    pub(crate) condition: Arc<dyn Condition>,
    pub(crate) consequence: Arc<dyn Consequence>,
    pub(crate) fired_as: Option<String>,
}

impl Rule {
    /// Create an anonymous, unprioritized rule from two closures.
    ///
    /// ```
    /// use rulechain::Rule;
    ///
    /// let rule = Rule::new(
    ///     |r, facts| r.when(facts.iter().any(|f| f.get("flag").is_some())),
    ///     |_r, facts| {
    ///         for fact in facts.iter_mut() {
    ///             fact.insert("seen", true);
    ///         }
    ///     },
    /// )
    /// .with_id("mark_seen");
    /// assert_eq!(rule.id(), Some("mark_seen"));
    /// ```
    #[must_use]
    pub fn new<C, Q>(condition: C, consequence: Q) -> Self
    where
        C: Fn(&mut Control<'_>, &[Fact]) + Send + Sync + 'static,
        Q: Fn(&mut Control<'_>, &mut [Fact]) + Send + Sync + 'static,
    {
        Self::from_parts(Arc::new(condition), Arc::new(consequence))
    }

    /// Create a rule from already-boxed trait objects.
    #[must_use]
    pub fn from_parts(condition: Arc<dyn Condition>, consequence: Arc<dyn Consequence>) -> Self {
        Self {
            id: None,
            name: None,
            priority: None,
            enabled: true,
            condition,
            consequence,
            fired_as: None,
        }
    }

    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Higher priorities are evaluated first. Rules without a priority sort
    /// after every prioritized rule. Priorities are integers; scale
    /// fractional schemes (`2.5` as `25`) to keep their order.
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn priority(&self) -> Option<i64> {
        self.priority
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The reference this rule's consequence was tagged with the first time
    /// it fired, or `None` if it has never fired.
    #[must_use]
    pub fn fired_as(&self) -> Option<&str> {
        self.fired_as.as_deref()
    }

    /// Resolve the match-path reference for this rule at the given
    /// active-list index: `id`, else `name`, else `index_<n>`.
    /// Empty identifiers are skipped.
    #[must_use]
    pub fn reference(&self, index: usize) -> String {
        self.id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
            .map_or_else(|| format!("index_{index}"), str::to_owned)
    }

    pub(crate) fn label(&self) -> String {
        self.id
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| "<anonymous>".to_owned())
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("fired_as", &self.fired_as)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({}", self.label())?;
        if let Some(priority) = self.priority {
            write!(f, ", priority {priority}")?;
        }
        if !self.enabled {
            write!(f, ", off")?;
        }
        write!(f, ")")
    }
}

/// Builder for a [`Rule`]. Both `.when()` and `.then()` must be called
/// before [`build()`](Self::build).
#[derive(Default)]
pub struct RuleBuilder {
    id: Option<String>,
    name: Option<String>,
    priority: Option<i64>,
    enabled: Option<bool>,
    condition: Option<Arc<dyn Condition>>,
    consequence: Option<Arc<dyn Consequence>>,
}

impl RuleBuilder {
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

    /// Set the condition closure.
    #[must_use]
    pub fn when<F>(self, condition: F) -> Self
    where
        F: Fn(&mut Control<'_>, &[Fact]) + Send + Sync + 'static,
    {
        self.condition(condition)
    }

    /// Set the consequence closure.
    #[must_use]
    pub fn then<F>(self, consequence: F) -> Self
    where
        F: Fn(&mut Control<'_>, &mut [Fact]) + Send + Sync + 'static,
    {
        self.consequence(consequence)
    }

    /// Set the condition from any [`Condition`] implementor.
    #[must_use]
    pub fn condition(mut self, condition: impl Condition + 'static) -> Self {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Set the consequence from any [`Consequence`] implementor.
    #[must_use]
    pub fn consequence(mut self, consequence: impl Consequence + 'static) -> Self {
        self.consequence = Some(Arc::new(consequence));
        self
    }

    /// # Errors
    ///
    /// Returns [`RuleError`] if the condition or consequence was never set.
    pub fn build(self) -> Result<Rule, RuleError> {
        let label = self
            .id
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| "<anonymous>".to_owned());
        let condition = self
            .condition
            .ok_or_else(|| RuleError::MissingCondition { rule: label.clone() })?;
        let consequence = self
            .consequence
            .ok_or(RuleError::MissingConsequence { rule: label })?;

        let mut rule = Rule::from_parts(condition, consequence);
        rule.id = self.id;
        rule.name = self.name;
        rule.priority = self.priority;
        rule.enabled = self.enabled.unwrap_or(true);
        Ok(rule)
    }
}

impl fmt::Debug for RuleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("has_condition", &self.condition.is_some())
            .field("has_consequence", &self.consequence.is_some())
            .finish()
    }
}
