//! Two-step wizard: pick a plan, then give it to another number.

use std::time::Duration;

use async_trait::async_trait;
use shared::{
    domain::{Plan, PlanId},
    error::FieldErrors,
    protocol::{MessageResponse, PlanTransferRequest},
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    error::RequestError,
    gateway,
    navigation::{Navigation, Route},
    pages::{on_session_loss, require_session, Notice},
    submission::{FormAction, SubmitGuard, SubmitOutcome},
    validation::{self, PLAN, RECEIVER_PHONE, RECIPIENT_MAX_DIGITS},
    WalletContext,
};

const PLANS_UNAVAILABLE: &str = "Erreur lors du chargement des forfaits";
const TRANSFER_DONE: &str = "Transfert effectué avec succès";
const TRANSFER_FAILED: &str = "Erreur lors du transfert";

/// Pause between the success banner and the return to the dashboard.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    SelectPlan,
    EnterRecipient,
}

struct Recipient {
    plan_id: Option<PlanId>,
    receiver_phone: String,
}

struct PlanTransferAction;

#[async_trait]
impl FormAction for PlanTransferAction {
    type Form = Recipient;
    type Payload = PlanTransferRequest;
    type Output = MessageResponse;

    fn endpoint(&self) -> &'static str {
        gateway::TRANSFER_PLAN
    }

    fn prepare(&self, form: &Recipient) -> Result<PlanTransferRequest, FieldErrors> {
        let errors =
            validation::validate_plan_transfer(form.plan_id.is_some(), &form.receiver_phone);
        match form.plan_id {
            Some(plan_id) if errors.is_empty() => Ok(PlanTransferRequest {
                receiver_phone: form.receiver_phone.clone(),
                plan_id,
            }),
            _ => Err(errors),
        }
    }

    async fn send(
        &self,
        ctx: &WalletContext,
        request: &PlanTransferRequest,
    ) -> Result<MessageResponse, RequestError> {
        ctx.session
            .authorized(gateway::TRANSFER_PLAN, |token| async move {
                ctx.gateway.transfer_plan(&token, request).await
            })
            .await
    }
}

pub struct PlanTransferPage {
    ctx: WalletContext,
    step: WizardStep,
    plans: Option<Vec<Plan>>,
    selected: Option<Plan>,
    receiver_phone: String,
    notice: Option<Notice>,
    field_errors: FieldErrors,
    guard: SubmitGuard,
}

impl PlanTransferPage {
    pub fn new(ctx: WalletContext) -> Self {
        Self {
            ctx,
            step: WizardStep::SelectPlan,
            plans: None,
            selected: None,
            receiver_phone: String::new(),
            notice: None,
            field_errors: FieldErrors::new(),
            guard: SubmitGuard::default(),
        }
    }

    /// Fetches the plan list unless it is already held.
    pub async fn mount(&mut self) -> Option<Navigation> {
        if let Some(redirect) = require_session(&self.ctx, Route::PlanTransfer).await {
            return Some(redirect);
        }
        if self.plans.is_some() {
            return None;
        }
        let ctx = &self.ctx;
        let result = ctx
            .session
            .authorized(gateway::PLANS, |token| async move {
                ctx.gateway.fetch_plans(&token).await
            })
            .await;
        match result {
            Ok(plans) => {
                self.plans = Some(plans);
                None
            }
            Err(err) => {
                warn!(error = %err, "failed to load transferable plans");
                self.plans = Some(Vec::new());
                self.notice = Some(Notice::error(PLANS_UNAVAILABLE));
                on_session_loss(&err)
            }
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn plans(&self) -> &[Plan] {
        self.plans.as_deref().unwrap_or_default()
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        self.selected.as_ref()
    }

    pub fn receiver_phone(&self) -> &str {
        &self.receiver_phone
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Inline error left by the last submit for `field`.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    /// Follows the submitting flag while a request runs.
    pub fn watch_submitting(&self) -> watch::Receiver<bool> {
        self.guard.subscribe()
    }

    /// Picks a plan from the fetched list and moves to the recipient step.
    pub fn select_plan(&mut self, plan_id: PlanId) -> bool {
        let Some(plan) = self.plans().iter().find(|plan| plan.id == plan_id).cloned() else {
            debug!(plan_id = plan_id.0, "ignoring selection of unknown plan");
            return false;
        };
        self.selected = Some(plan);
        self.field_errors.remove(PLAN);
        self.step = WizardStep::EnterRecipient;
        true
    }

    /// Recipient step goes back to plan selection, keeping the list; plan
    /// selection leaves the wizard.
    pub fn back(&mut self) -> Option<Navigation> {
        match self.step {
            WizardStep::EnterRecipient => {
                self.step = WizardStep::SelectPlan;
                None
            }
            WizardStep::SelectPlan => Some(Navigation::now(Route::dashboard())),
        }
    }

    /// Keeps digits only, at most 15 of them.
    pub fn set_receiver_phone(&mut self, raw: &str) {
        self.receiver_phone = raw
            .chars()
            .filter(char::is_ascii_digit)
            .take(RECIPIENT_MAX_DIGITS)
            .collect();
        self.field_errors.remove(RECEIVER_PHONE);
    }

    pub fn can_submit(&self) -> bool {
        !self.guard.is_submitting()
            && self.step == WizardStep::EnterRecipient
            && self.selected.is_some()
            && validation::check_recipient(&self.receiver_phone).is_none()
    }

    /// Success shows the banner, then returns to the dashboard after [`REDIRECT_DELAY`].
    pub async fn submit(&mut self) -> Option<Navigation> {
        if self.step != WizardStep::EnterRecipient {
            return None;
        }
        self.notice = None;
        let form = Recipient {
            plan_id: self.selected.as_ref().map(|plan| plan.id),
            receiver_phone: self.receiver_phone.clone(),
        };

        let outcome = self.guard.run(&self.ctx, &PlanTransferAction, &form).await;
        match outcome {
            SubmitOutcome::InFlight => None,
            SubmitOutcome::Invalid(errors) => {
                self.field_errors = errors;
                None
            }
            SubmitOutcome::Sent(response) => {
                self.field_errors.clear();
                let text = response.message.unwrap_or_else(|| TRANSFER_DONE.to_string());
                self.notice = Some(Notice::success(text));
                Some(Navigation::after(Route::dashboard(), REDIRECT_DELAY))
            }
            SubmitOutcome::Failed(err) => {
                self.field_errors = err.field_errors().cloned().unwrap_or_default();
                self.notice = Some(Notice::error(err.user_message(TRANSFER_FAILED)));
                on_session_loss(&err)
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/plan_transfer_tests.rs"]
mod tests;
