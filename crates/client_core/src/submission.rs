//! One submission strategy shared by every form that talks to the API.
//!
//! A form action supplies its validator (which also builds the request payload)
//! and its endpoint call; [`SubmitGuard`] runs them in the fixed order
//! guard -> validate -> single request, and the page projects the
//! [`SubmitOutcome`] into its own view state.

use async_trait::async_trait;
use shared::error::FieldErrors;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{error::RequestError, WalletContext};

#[async_trait]
pub trait FormAction: Send + Sync {
    type Form: Send + Sync;
    type Payload: Send + Sync;
    type Output: Send;

    /// Endpoint path, for logs.
    fn endpoint(&self) -> &'static str;

    /// Runs the validator; a clean form yields the request payload.
    fn prepare(&self, form: &Self::Form) -> Result<Self::Payload, FieldErrors>;

    async fn send(
        &self,
        ctx: &WalletContext,
        payload: &Self::Payload,
    ) -> Result<Self::Output, RequestError>;
}

#[derive(Debug)]
pub enum SubmitOutcome<T> {
    /// Another submission of this form is still running.
    InFlight,
    /// Local validation failed; nothing was sent.
    Invalid(FieldErrors),
    Sent(T),
    Failed(RequestError),
}

/// Per-form "submitting" flag, observable through [`SubmitGuard::subscribe`]
/// while a request is running.
#[derive(Debug)]
pub struct SubmitGuard {
    submitting: watch::Sender<bool>,
}

impl Default for SubmitGuard {
    fn default() -> Self {
        Self {
            submitting: watch::channel(false).0,
        }
    }
}

struct Submitting<'a>(&'a watch::Sender<bool>);

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

impl SubmitGuard {
    pub fn is_submitting(&self) -> bool {
        *self.submitting.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.submitting.subscribe()
    }

    /// Validates `form` and, when clean, issues exactly one request. The flag is
    /// cleared on every exit path, including cancellation of the returned future.
    pub async fn run<A: FormAction>(
        &self,
        ctx: &WalletContext,
        action: &A,
        form: &A::Form,
    ) -> SubmitOutcome<A::Output> {
        let endpoint = action.endpoint();
        if self.is_submitting() {
            debug!(endpoint, "submission already in flight");
            return SubmitOutcome::InFlight;
        }

        let payload = match action.prepare(form) {
            Ok(payload) => payload,
            Err(errors) => {
                debug!(
                    endpoint,
                    invalid_fields = errors.len(),
                    "submission blocked by validation"
                );
                return SubmitOutcome::Invalid(errors);
            }
        };

        let acquired = self.submitting.send_if_modified(|submitting| {
            let was_idle = !*submitting;
            *submitting = true;
            was_idle
        });
        if !acquired {
            debug!(endpoint, "submission already in flight");
            return SubmitOutcome::InFlight;
        }
        let _submitting = Submitting(&self.submitting);
        match action.send(ctx, &payload).await {
            Ok(output) => {
                info!(endpoint, "submission accepted");
                SubmitOutcome::Sent(output)
            }
            Err(err) => {
                warn!(endpoint, error = %err, "submission failed");
                SubmitOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
