use anyhow::Result;
use async_trait::async_trait;
use shared::{error::FieldErrors, protocol::RegisterRequest};
use tokio::sync::watch;

use crate::{
    error::RequestError,
    form::FormDraft,
    gateway,
    navigation::{Navigation, Route},
    pages::Notice,
    submission::{FormAction, SubmitGuard, SubmitOutcome},
    validation::{self, EMAIL, NAME, PASSWORD, PHONE},
    WalletContext,
};

const REGISTRATION_FAILED: &str = "Une erreur est survenue lors de l'inscription";

struct RegisterAction;

#[async_trait]
impl FormAction for RegisterAction {
    type Form = FormDraft;
    type Payload = RegisterRequest;
    type Output = ();

    fn endpoint(&self) -> &'static str {
        gateway::REGISTER
    }

    fn prepare(&self, form: &FormDraft) -> Result<RegisterRequest, FieldErrors> {
        let errors = validation::validate_registration(form);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(RegisterRequest {
            name: form.value(NAME).to_string(),
            email: form.value(EMAIL).to_string(),
            phone: form.value(PHONE).to_string(),
            password: form.value(PASSWORD).to_string(),
        })
    }

    async fn send(
        &self,
        ctx: &WalletContext,
        request: &RegisterRequest,
    ) -> Result<(), RequestError> {
        ctx.gateway.register(request).await
    }
}

pub struct RegisterPage {
    ctx: WalletContext,
    form: FormDraft,
    error: Option<Notice>,
    guard: SubmitGuard,
}

impl RegisterPage {
    pub fn new(ctx: WalletContext) -> Self {
        Self {
            ctx,
            form: FormDraft::new(&[NAME, EMAIL, PHONE, PASSWORD]),
            error: None,
            guard: SubmitGuard::default(),
        }
    }

    pub fn form(&self) -> &FormDraft {
        &self.form
    }

    pub fn set_field(&mut self, field: &str, value: impl Into<String>) {
        self.form.set(field, value);
    }

    pub fn error(&self) -> Option<&Notice> {
        self.error.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.guard.is_submitting()
    }

    /// Follows the submitting flag while a request runs.
    pub fn watch_submitting(&self) -> watch::Receiver<bool> {
        self.guard.subscribe()
    }

    /// Success leads to the login screen with the "registered" banner.
    pub async fn submit(&mut self) -> Result<Option<Navigation>> {
        let outcome = self.guard.run(&self.ctx, &RegisterAction, &self.form).await;
        match outcome {
            SubmitOutcome::InFlight => Ok(None),
            SubmitOutcome::Invalid(errors) => {
                self.form.replace_errors(errors);
                Ok(None)
            }
            SubmitOutcome::Sent(()) => {
                self.error = None;
                self.form.replace_errors(FieldErrors::new());
                Ok(Some(Navigation::now(Route::Login { registered: true })))
            }
            SubmitOutcome::Failed(err) => {
                self.form.replace_errors(FieldErrors::new());
                match err.field_errors() {
                    Some(errors) => {
                        self.error = None;
                        self.form.merge_errors(errors);
                    }
                    None => self.error = Some(Notice::error(REGISTRATION_FAILED)),
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/register_tests.rs"]
mod tests;
