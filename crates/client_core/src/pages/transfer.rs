//! Money transfer to another phone number.

use async_trait::async_trait;
use shared::{
    error::FieldErrors,
    protocol::{MessageResponse, TransferRequest},
};
use tokio::sync::watch;

use crate::{
    error::RequestError,
    form::FormDraft,
    gateway,
    navigation::{Navigation, Route},
    pages::{on_session_loss, require_session, Notice},
    submission::{FormAction, SubmitGuard, SubmitOutcome},
    validation::{self, AMOUNT, RECEIVER_PHONE, RECIPIENT_MIN_DIGITS},
    WalletContext,
};

const TRANSFER_DONE: &str = "Transfert effectué avec succès";
const TRANSFER_FAILED: &str = "Erreur lors du transfert";
const TRANSFER_FAILED_DETAILS: &str = "Veuillez vérifier les informations";
const UNEXPECTED: &str = "Une erreur est survenue";
const UNAVAILABLE: &str = "Service temporairement indisponible";

struct TransferAction;

#[async_trait]
impl FormAction for TransferAction {
    type Form = FormDraft;
    type Payload = TransferRequest;
    type Output = MessageResponse;

    fn endpoint(&self) -> &'static str {
        gateway::TRANSFER
    }

    fn prepare(&self, form: &FormDraft) -> Result<TransferRequest, FieldErrors> {
        let errors = validation::validate_transfer(form);
        match validation::parse_amount(form.value(AMOUNT)) {
            Some(amount) if errors.is_empty() => Ok(TransferRequest {
                receiver_phone: form.value(RECEIVER_PHONE).to_string(),
                amount,
            }),
            _ => Err(errors),
        }
    }

    async fn send(
        &self,
        ctx: &WalletContext,
        request: &TransferRequest,
    ) -> Result<MessageResponse, RequestError> {
        ctx.session
            .authorized(gateway::TRANSFER, |token| async move {
                ctx.gateway.transfer(&token, request).await
            })
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferResult {
    Blocked,
    Done,
    Failed,
}

pub struct TransferPage {
    ctx: WalletContext,
    form: FormDraft,
    notice: Option<Notice>,
    guard: SubmitGuard,
}

impl TransferPage {
    pub fn new(ctx: WalletContext) -> Self {
        Self {
            ctx,
            form: FormDraft::new(&[RECEIVER_PHONE, AMOUNT]),
            notice: None,
            guard: SubmitGuard::default(),
        }
    }

    pub async fn mount(&self) -> Option<Navigation> {
        require_session(&self.ctx, Route::Transfer).await
    }

    pub fn form(&self) -> &FormDraft {
        &self.form
    }

    pub fn set_receiver_phone(&mut self, phone: impl Into<String>) {
        self.form.set(RECEIVER_PHONE, phone);
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.form.set(AMOUNT, amount);
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Follows the submitting flag while a request runs.
    pub fn watch_submitting(&self) -> watch::Receiver<bool> {
        self.guard.subscribe()
    }

    /// State of the submit control: enabled only with a plausible recipient and a
    /// strictly positive amount.
    pub fn can_submit(&self) -> bool {
        let phone = self.form.value(RECEIVER_PHONE);
        let amount = self.form.value(AMOUNT);
        !self.guard.is_submitting()
            && !phone.is_empty()
            && !amount.is_empty()
            && phone.len() >= RECIPIENT_MIN_DIGITS
            && validation::parse_amount(amount).is_some()
    }

    /// Sends the transfer. A disabled control sends nothing and only surfaces the
    /// field errors.
    pub async fn submit(&mut self) -> (TransferResult, Option<Navigation>) {
        if !self.can_submit() {
            if !self.guard.is_submitting() {
                self.form
                    .replace_errors(validation::validate_transfer(&self.form));
            }
            return (TransferResult::Blocked, None);
        }
        self.notice = None;

        let outcome = self.guard.run(&self.ctx, &TransferAction, &self.form).await;
        match outcome {
            SubmitOutcome::InFlight => (TransferResult::Blocked, None),
            SubmitOutcome::Invalid(errors) => {
                self.form.replace_errors(errors);
                (TransferResult::Blocked, None)
            }
            SubmitOutcome::Sent(response) => {
                let details = format!(
                    "{} USD envoyés à {}",
                    self.form.value(AMOUNT),
                    self.form.value(RECEIVER_PHONE)
                );
                let text = response.message.unwrap_or_else(|| TRANSFER_DONE.to_string());
                self.notice = Some(Notice::success(text).with_details(details));
                self.form.clear_values();
                self.form.replace_errors(FieldErrors::new());
                (TransferResult::Done, None)
            }
            SubmitOutcome::Failed(err) => {
                self.form.replace_errors(FieldErrors::new());
                self.notice = Some(failure_notice(&err));
                (TransferResult::Failed, on_session_loss(&err))
            }
        }
    }
}

fn failure_notice(err: &RequestError) -> Notice {
    if err.is_transient() {
        return Notice::error(UNEXPECTED).with_details(UNAVAILABLE);
    }
    let body = err.body().cloned().unwrap_or_default();
    let text = body
        .error
        .as_deref()
        .or(body.message.as_deref())
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(TRANSFER_FAILED)
        .to_string();
    let details = body
        .details
        .unwrap_or_else(|| TRANSFER_FAILED_DETAILS.to_string());
    Notice::error(text).with_details(details)
}

#[cfg(test)]
#[path = "../tests/transfer_tests.rs"]
mod tests;
