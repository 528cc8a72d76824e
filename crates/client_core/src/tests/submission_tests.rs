use std::sync::atomic::{AtomicUsize, Ordering};

use shared::error::ApiErrorBody;
use tokio::sync::Notify;

use super::*;
use crate::test_support::signed_out;

#[derive(Default)]
struct EchoAction {
    sends: AtomicUsize,
    fail: bool,
    gate: Option<Notify>,
}

#[async_trait]
impl FormAction for EchoAction {
    type Form = String;
    type Payload = String;
    type Output = String;

    fn endpoint(&self) -> &'static str {
        "/api/echo"
    }

    fn prepare(&self, form: &String) -> Result<String, FieldErrors> {
        if form.is_empty() {
            return Err(FieldErrors::from([(
                "text".to_string(),
                "requis".to_string(),
            )]));
        }
        Ok(form.to_uppercase())
    }

    async fn send(&self, _ctx: &WalletContext, payload: &String) -> Result<String, RequestError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(RequestError::Rejected {
                endpoint: "/api/echo",
                status: 500,
                body: ApiErrorBody::default(),
            });
        }
        Ok(payload.clone())
    }
}

#[tokio::test]
async fn invalid_form_never_reaches_send() {
    let (_api, ctx, _store) = signed_out().await;
    let action = EchoAction::default();
    let guard = SubmitGuard::default();

    let outcome = guard.run(&ctx, &action, &String::new()).await;

    assert!(matches!(outcome, SubmitOutcome::Invalid(errors) if errors.contains_key("text")));
    assert_eq!(action.sends.load(Ordering::SeqCst), 0);
    assert!(!guard.is_submitting());
}

#[tokio::test]
async fn clean_form_sends_exactly_once() {
    let (_api, ctx, _store) = signed_out().await;
    let action = EchoAction::default();
    let guard = SubmitGuard::default();

    let outcome = guard.run(&ctx, &action, &"hello".to_string()).await;

    assert!(matches!(outcome, SubmitOutcome::Sent(text) if text == "HELLO"));
    assert_eq!(action.sends.load(Ordering::SeqCst), 1);
    assert!(!guard.is_submitting());
}

#[tokio::test]
async fn failure_clears_the_flag() {
    let (_api, ctx, _store) = signed_out().await;
    let action = EchoAction {
        fail: true,
        ..EchoAction::default()
    };
    let guard = SubmitGuard::default();

    let outcome = guard.run(&ctx, &action, &"hello".to_string()).await;

    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert!(!guard.is_submitting());
}

#[tokio::test]
async fn second_submission_while_in_flight_is_refused() {
    let (_api, ctx, _store) = signed_out().await;
    let action = EchoAction {
        gate: Some(Notify::new()),
        ..EchoAction::default()
    };
    let guard = SubmitGuard::default();
    let mut submitting = guard.subscribe();
    let form = "hello".to_string();

    let (first, second) = tokio::join!(guard.run(&ctx, &action, &form), async {
        submitting.changed().await.expect("guard alive");
        assert!(*submitting.borrow_and_update());
        let second = guard.run(&ctx, &action, &form).await;
        if let Some(gate) = &action.gate {
            gate.notify_one();
        }
        second
    });

    assert!(matches!(first, SubmitOutcome::Sent(text) if text == "HELLO"));
    assert!(matches!(second, SubmitOutcome::InFlight));
    assert_eq!(action.sends.load(Ordering::SeqCst), 1);
    assert!(!guard.is_submitting());
    assert!(!*submitting.borrow());
}
