use anyhow::Result;
use async_trait::async_trait;
use shared::{
    error::FieldErrors,
    protocol::{LoginRequest, LoginResponse},
};
use tokio::sync::watch;

use crate::{
    error::RequestError,
    form::FormDraft,
    gateway,
    navigation::{Navigation, Route},
    pages::Notice,
    submission::{FormAction, SubmitGuard, SubmitOutcome},
    validation::{self, PASSWORD, PHONE},
    WalletContext,
};

const LOGIN_FAILED: &str = "Erreur de connexion";
const REGISTERED_NOTICE: &str = "Inscription réussie ! Vous pouvez maintenant vous connecter.";

struct LoginAction;

#[async_trait]
impl FormAction for LoginAction {
    type Form = FormDraft;
    type Payload = LoginRequest;
    type Output = LoginResponse;

    fn endpoint(&self) -> &'static str {
        gateway::LOGIN
    }

    fn prepare(&self, form: &FormDraft) -> Result<LoginRequest, FieldErrors> {
        let errors = validation::validate_login(form);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(LoginRequest {
            phone: form.value(PHONE).to_string(),
            password: form.value(PASSWORD).to_string(),
        })
    }

    async fn send(
        &self,
        ctx: &WalletContext,
        request: &LoginRequest,
    ) -> Result<LoginResponse, RequestError> {
        ctx.gateway.login(request).await
    }
}

pub struct LoginPage {
    ctx: WalletContext,
    form: FormDraft,
    error: Option<Notice>,
    registered: bool,
    guard: SubmitGuard,
}

impl LoginPage {
    /// `registered` is set when arriving from a successful registration.
    pub fn new(ctx: WalletContext, registered: bool) -> Self {
        Self {
            ctx,
            form: FormDraft::new(&[PHONE, PASSWORD]),
            error: None,
            registered,
            guard: SubmitGuard::default(),
        }
    }

    /// Already signed in: skip the form.
    pub async fn mount(&self) -> Option<Navigation> {
        self.ctx
            .session
            .is_authenticated()
            .await
            .then(|| Navigation::now(Route::dashboard()))
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

    pub fn registered_notice(&self) -> Option<Notice> {
        self.registered.then(|| Notice::success(REGISTERED_NOTICE))
    }

    pub fn is_submitting(&self) -> bool {
        self.guard.is_submitting()
    }

    /// Follows the submitting flag while a request runs.
    pub fn watch_submitting(&self) -> watch::Receiver<bool> {
        self.guard.subscribe()
    }

    pub async fn submit(&mut self) -> Result<Option<Navigation>> {
        let outcome = self.guard.run(&self.ctx, &LoginAction, &self.form).await;
        match outcome {
            SubmitOutcome::InFlight => Ok(None),
            SubmitOutcome::Invalid(errors) => {
                self.form.replace_errors(errors);
                Ok(None)
            }
            SubmitOutcome::Sent(response) => {
                self.error = None;
                self.form.replace_errors(FieldErrors::new());
                self.ctx.session.establish(&response).await?;
                Ok(Some(Navigation::now(Route::dashboard())))
            }
            SubmitOutcome::Failed(err) => {
                self.error = Some(Notice::error(err.user_message(LOGIN_FAILED)));
                self.form.replace_errors(FieldErrors::new());
                if let Some(errors) = err.field_errors() {
                    self.form.merge_errors(errors);
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/login_tests.rs"]
mod tests;
