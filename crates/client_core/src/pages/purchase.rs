use async_trait::async_trait;
use shared::{
    domain::{Plan, PlanId},
    error::FieldErrors,
    protocol::PurchaseRequest,
};
use tokio::sync::watch;
use tracing::warn;

use crate::{
    error::RequestError,
    gateway,
    navigation::{Navigation, Route},
    pages::{on_session_loss, require_session, Notice},
    submission::{FormAction, SubmitGuard, SubmitOutcome},
    WalletContext,
};

const PLANS_UNAVAILABLE: &str = "Impossible de charger les forfaits. Veuillez réessayer.";
const PURCHASE_FAILED: &str = "Erreur lors de l'achat";

struct PurchaseAction;

#[async_trait]
impl FormAction for PurchaseAction {
    type Form = PlanId;
    type Payload = PurchaseRequest;
    type Output = ();

    fn endpoint(&self) -> &'static str {
        gateway::PURCHASE
    }

    fn prepare(&self, plan_id: &PlanId) -> Result<PurchaseRequest, FieldErrors> {
        Ok(PurchaseRequest { plan_id: *plan_id })
    }

    async fn send(
        &self,
        ctx: &WalletContext,
        request: &PurchaseRequest,
    ) -> Result<(), RequestError> {
        ctx.session
            .authorized(gateway::PURCHASE, |token| async move {
                ctx.gateway.purchase(&token, request).await
            })
            .await
    }
}

pub struct PurchasePage {
    ctx: WalletContext,
    plans: Vec<Plan>,
    error: Option<Notice>,
    purchasing: watch::Sender<Option<PlanId>>,
    guard: SubmitGuard,
}

impl PurchasePage {
    pub fn new(ctx: WalletContext) -> Self {
        Self {
            ctx,
            plans: Vec::new(),
            error: None,
            purchasing: watch::channel(None).0,
            guard: SubmitGuard::default(),
        }
    }

    /// Loads the catalogue once. Redirects to login when there is no usable session.
    pub async fn mount(&mut self) -> Option<Navigation> {
        if let Some(redirect) = require_session(&self.ctx, Route::Purchase).await {
            return Some(redirect);
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
                self.plans = plans;
                None
            }
            Err(err) => {
                warn!(error = %err, "failed to load plans");
                self.error = Some(Notice::error(PLANS_UNAVAILABLE));
                on_session_loss(&err)
            }
        }
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn error(&self) -> Option<&Notice> {
        self.error.as_ref()
    }

    /// Plan whose purchase is running; its button stays disabled meanwhile.
    pub fn purchasing(&self) -> Option<PlanId> {
        *self.purchasing.borrow()
    }

    pub fn watch_purchasing(&self) -> watch::Receiver<Option<PlanId>> {
        self.purchasing.subscribe()
    }

    pub async fn purchase(&mut self, plan_id: PlanId) -> Option<Navigation> {
        if self.purchasing().is_some() {
            return None;
        }
        self.purchasing.send_replace(Some(plan_id));
        let outcome = self.guard.run(&self.ctx, &PurchaseAction, &plan_id).await;
        self.purchasing.send_replace(None);

        match outcome {
            SubmitOutcome::InFlight | SubmitOutcome::Invalid(_) => None,
            SubmitOutcome::Sent(()) => {
                self.error = None;
                Some(Navigation::now(Route::Dashboard {
                    purchase_success: true,
                }))
            }
            SubmitOutcome::Failed(err) => {
                self.error = Some(Notice::error(err.user_message(PURCHASE_FAILED)));
                on_session_loss(&err)
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/purchase_tests.rs"]
mod tests;
