// Idle -> Pending -> Succeeded | Failed state machine shared by every page action.

use std::future::Future;

use crate::domain::{Action, ClientError};

// Coarse state of a lifecycle, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStatus {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

// Each variant carries exactly the data visible in that state.
#[derive(Debug)]
enum LifecycleState<I, O> {
    Idle,
    Pending {
        input: I,
    },
    Succeeded {
        input: I,
        result: O,
    },
    Failed {
        input: I,
        message: String,
    },
}

/// Proof that a submission was admitted; settles exactly the cycle it opened.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct Ticket {
    generation: u64,
}

/// One controller per user action. At most one call is in flight per instance.
#[derive(Debug)]
pub struct RequestLifecycle<I, O> {
    action: Action,
    state: LifecycleState<I, O>,
    generation: u64,
}

impl<I, O> RequestLifecycle<I, O> {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            state: LifecycleState::Idle,
            generation: 0,
        }
    }

    pub fn status(&self) -> LifecycleStatus {
        match self.state {
            LifecycleState::Idle => LifecycleStatus::Idle,
            LifecycleState::Pending { .. } => LifecycleStatus::Pending,
            LifecycleState::Succeeded { .. } => LifecycleStatus::Succeeded,
            LifecycleState::Failed { .. } => LifecycleStatus::Failed,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, LifecycleState::Pending { .. })
    }

    // The triggering control is disabled while a call is in flight.
    pub fn is_control_enabled(&self) -> bool {
        !self.is_pending()
    }

    pub fn input(&self) -> Option<&I> {
        match &self.state {
            LifecycleState::Idle => None,
            LifecycleState::Pending { input }
            | LifecycleState::Succeeded { input, .. }
            | LifecycleState::Failed { input, .. } => Some(input),
        }
    }

    pub fn result(&self) -> Option<&O> {
        match &self.state {
            LifecycleState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            LifecycleState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Enter Pending. A second submission while Pending is refused.
    pub fn begin(&mut self, input: I) -> Result<Ticket, ClientError> {
        if self.is_pending() {
            tracing::debug!(action = ?self.action, "submission ignored while pending");
            return Err(ClientError::GuardViolation);
        }
        self.generation += 1;
        self.state = LifecycleState::Pending { input };
        Ok(Ticket {
            generation: self.generation,
        })
    }

    /// Apply the outcome of the call opened by `ticket`.
    ///
    /// Returns false and drops the outcome when the cycle was reset in between.
    pub fn settle(&mut self, ticket: Ticket, outcome: Result<O, ClientError>) -> bool {
        if ticket.generation != self.generation || !self.is_pending() {
            tracing::debug!(action = ?self.action, "late response dropped");
            return false;
        }
        let LifecycleState::Pending { input } =
            std::mem::replace(&mut self.state, LifecycleState::Idle)
        else {
            return false;
        };

        self.state = match outcome {
            Ok(result) => LifecycleState::Succeeded { input, result },
            Err(error) => {
                let message = error.user_message(self.action);
                tracing::debug!(action = ?self.action, error = %error, "request failed");
                LifecycleState::Failed { input, message }
            }
        };
        true
    }

    /// Fail a submission before dispatch, e.g. on client-side validation.
    /// Returns the error to hand back to the caller.
    pub fn reject(&mut self, input: I, error: ClientError) -> ClientError {
        match self.begin(input) {
            Ok(ticket) => {
                self.settle(ticket, Err(error.clone()));
                error
            }
            Err(guard) => guard,
        }
    }

    pub fn reset(&mut self) {
        if self.is_pending() {
            // Any in-flight call now holds a stale ticket.
            self.generation += 1;
        }
        self.state = LifecycleState::Idle;
    }
}

impl<I: Clone, O: Clone> RequestLifecycle<I, O> {
    /// Run `call` for `input` through a full cycle and return its outcome.
    pub async fn submit<F, Fut>(&mut self, input: I, call: F) -> Result<O, ClientError>
    where
        F: FnOnce(I) -> Fut,
        Fut: Future<Output = Result<O, ClientError>>,
    {
        let ticket = self.begin(input.clone())?;
        let outcome = call(input).await;
        self.settle(ticket, outcome.clone());
        outcome
    }
}
