//! Execution limits for untrusted scripts.
//!
//! Scripts may loop forever (`while true: pass`), so every run is metered:
//! each executed statement, loop iteration and call costs one step, and the
//! meter also watches an optional wall-clock deadline and a cancellation flag
//! the host can raise from another thread (e.g. a Ctrl-C handler).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ExecError;

pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

#[derive(Debug, Clone)]
pub struct ExecutionBudget {
    pub max_steps: Option<u64>,
    pub timeout: Option<Duration>,
    pub max_call_depth: usize,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ExecutionBudget {
    fn default() -> Self {
        Self {
            max_steps: Some(DEFAULT_MAX_STEPS),
            timeout: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            cancel: None,
        }
    }
}

impl ExecutionBudget {
    /// No step or time limit. Call depth is still bounded.
    pub fn unlimited() -> Self {
        Self {
            max_steps: None,
            ..Self::default()
        }
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }
}

/// Running counters for one top-level invocation.
#[derive(Debug)]
pub struct BudgetMeter {
    budget: ExecutionBudget,
    steps: u64,
    started: Instant,
    depth: usize,
}

impl BudgetMeter {
    pub fn new(budget: ExecutionBudget) -> Self {
        Self {
            budget,
            steps: 0,
            started: Instant::now(),
            depth: 0,
        }
    }

    pub fn budget(&self) -> &ExecutionBudget {
        &self.budget
    }

    /// Start a fresh run: counters back to zero, clock restarted.
    pub fn reset(&mut self) {
        self.steps = 0;
        self.depth = 0;
        self.started = Instant::now();
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Charge one step and check every limit.
    pub fn tick(&mut self) -> Result<(), ExecError> {
        self.steps += 1;

        if let Some(max) = self.budget.max_steps {
            if self.steps > max {
                tracing::warn!(steps = self.steps, "execution budget exhausted");
                return Err(ExecError::BudgetExhausted(max));
            }
        }

        if let Some(flag) = &self.budget.cancel {
            if flag.load(Ordering::Relaxed) {
                tracing::warn!(steps = self.steps, "execution cancelled");
                return Err(ExecError::Cancelled);
            }
        }

        if let Some(timeout) = self.budget.timeout {
            if self.started.elapsed() > timeout {
                tracing::warn!(steps = self.steps, "execution timed out");
                return Err(ExecError::Timeout(timeout.as_millis()));
            }
        }

        Ok(())
    }

    pub fn enter_call(&mut self) -> Result<(), ExecError> {
        if self.depth >= self.budget.max_call_depth {
            return Err(ExecError::RecursionLimit(self.budget.max_call_depth));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
