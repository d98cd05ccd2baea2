//! Single-step scheduler for the execution state machine.
//!
//! Each transition enqueues its successor instead of calling it, and the
//! driver loop pops one step at a time. Native stack depth therefore stays
//! constant no matter how long the rule chain is or how often evaluation
//! restarts.

use std::collections::VecDeque;

use crate::EngineError;

#[derive(Debug)]
pub(crate) struct Trampoline<S> {
    queue: VecDeque<S>,
    steps: usize,
    budget: Option<usize>,
}

impl<S> Trampoline<S> {
    pub(crate) fn new(budget: Option<usize>) -> Self {
        Self {
            queue: VecDeque::new(),
            steps: 0,
            budget,
        }
    }

    /// Defer `step` to the next tick.
    pub(crate) fn schedule(&mut self, step: S) {
        self.queue.push_back(step);
    }

    /// Pop the next step. `Ok(None)` means nothing is pending.
    pub(crate) fn tick(&mut self) -> Result<Option<S>, EngineError> {
        if self.queue.is_empty() {
            return Ok(None);
        }
        if let Some(budget) = self.budget {
            if self.steps >= budget {
                return Err(EngineError::StepBudgetExceeded { budget });
            }
        }
        self.steps += 1;
        Ok(self.queue.pop_front())
    }

    pub(crate) fn steps(&self) -> usize {
        self.steps
    }
}
