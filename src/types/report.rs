use std::fmt;
use std::time::Duration;

use super::fact::Fact;

/// Detailed execution report returned by
/// [`Engine::run_detailed()`](crate::Engine::run_detailed).
///
/// Contains the annotated facts, the match path, how many times evaluation
/// restarted from the first rule, how many scheduler steps were taken,
/// whether a rule halted the run, and the wall-clock duration.
#[derive(Debug, Clone)]
#[must_use]
pub struct ExecutionReport {
    facts: Vec<Fact>,
    match_path: Vec<String>,
    restarts: usize,
    steps: usize,
    halted: bool,
    duration: Duration,
}

impl ExecutionReport {
    pub(crate) fn new(
        facts: Vec<Fact>,
        match_path: Vec<String>,
        restarts: usize,
        steps: usize,
        halted: bool,
        duration: Duration,
    ) -> Self {
        Self {
            facts,
            match_path,
            restarts,
            steps,
            halted,
            duration,
        }
    }

    /// The final working set. Every fact carries the match path.
    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    #[must_use]
    pub fn into_facts(self) -> Vec<Fact> {
        self.facts
    }

    /// References of the rules that fired, in firing order.
    #[must_use]
    pub fn match_path(&self) -> &[String] {
        &self.match_path
    }

    /// Number of times evaluation went back to the first active rule.
    #[must_use]
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    /// Number of scheduler steps taken.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// `true` if a rule called `stop()`.
    #[must_use]
    pub fn halted(&self) -> bool {
        self.halted
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fired: [{}]", self.match_path.join(", "))?;
        write!(f, ", restarts: {}", self.restarts)?;
        write!(f, ", steps: {}", self.steps)?;
        if self.halted {
            write!(f, ", halted")?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accessors() {
        let report = ExecutionReport::new(
            vec![Fact::new().set("x", 1)],
            vec!["r1".into(), "r2".into()],
            1,
            7,
            false,
            Duration::from_nanos(500),
        );

        assert_eq!(report.facts().len(), 1);
        assert_eq!(report.match_path(), &["r1", "r2"]);
        assert_eq!(report.restarts(), 1);
        assert_eq!(report.steps(), 7);
        assert!(!report.halted());
        assert_eq!(report.duration(), Duration::from_nanos(500));
    }

    #[test]
    fn report_display() {
        let report = ExecutionReport::new(
            vec![],
            vec!["r1".into(), "r2".into()],
            2,
            9,
            true,
            Duration::from_nanos(100),
        );
        let s = report.to_string();
        assert!(s.contains("fired: [r1, r2]"));
        assert!(s.contains("restarts: 2"));
        assert!(s.contains("halted"));
    }

    #[test]
    fn report_display_nothing_fired() {
        let report =
            ExecutionReport::new(vec![], vec![], 0, 1, false, Duration::from_nanos(100));
        let s = report.to_string();
        assert!(s.contains("fired: []"));
        assert!(!s.contains("halted"));
    }
}
