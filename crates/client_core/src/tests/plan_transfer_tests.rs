use axum::http::{Method, StatusCode};
use serde_json::json;

use super::*;
use crate::test_support::{sample_plans, signed_in, signed_out};

async fn mounted() -> (crate::test_support::FakeApi, PlanTransferPage) {
    let (api, ctx, _store) = signed_in().await;
    api.respond(Method::GET, gateway::PLANS, StatusCode::OK, sample_plans());
    let mut page = PlanTransferPage::new(ctx);
    assert_eq!(page.mount().await, None);
    (api, page)
}

#[tokio::test]
async fn mount_without_token_fetches_nothing() {
    let (api, ctx, _store) = signed_out().await;
    let mut page = PlanTransferPage::new(ctx);

    assert_eq!(page.mount().await, Some(Navigation::now(Route::login())));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn selecting_then_going_back_keeps_the_plan_list() {
    let (api, mut page) = mounted().await;
    assert_eq!(page.step(), WizardStep::SelectPlan);

    assert!(page.select_plan(PlanId(7)));
    assert_eq!(page.step(), WizardStep::EnterRecipient);
    assert_eq!(page.selected_plan().map(|p| p.id), Some(PlanId(7)));

    assert_eq!(page.back(), None);
    assert_eq!(page.step(), WizardStep::SelectPlan);
    assert_eq!(page.plans().len(), 2);

    assert_eq!(page.mount().await, None);
    assert_eq!(api.hits(gateway::PLANS), 1);
}

#[tokio::test]
async fn back_from_plan_selection_leaves_the_wizard() {
    let (_api, mut page) = mounted().await;
    assert_eq!(page.back(), Some(Navigation::now(Route::dashboard())));
}

#[tokio::test]
async fn unknown_plan_cannot_be_selected() {
    let (_api, mut page) = mounted().await;
    assert!(!page.select_plan(PlanId(99)));
    assert_eq!(page.step(), WizardStep::SelectPlan);
}

#[tokio::test]
async fn recipient_input_is_sanitised() {
    let (_api, mut page) = mounted().await;
    page.select_plan(PlanId(7));

    page.set_receiver_phone("+243 81-234-5678");
    assert_eq!(page.receiver_phone(), "243812345678");

    page.set_receiver_phone("12345678901234567890");
    assert_eq!(page.receiver_phone(), "123456789012345");
}

#[tokio::test]
async fn submit_requires_recipient_of_nine_digits() {
    let (api, mut page) = mounted().await;
    page.select_plan(PlanId(7));
    page.set_receiver_phone("12345678");
    assert!(!page.can_submit());

    assert_eq!(page.submit().await, None);
    assert_eq!(api.hits(gateway::TRANSFER_PLAN), 0);
    assert!(page.field_error(RECEIVER_PHONE).is_some());

    page.set_receiver_phone("123456789");
    assert_eq!(page.field_error(RECEIVER_PHONE), None);
    assert!(page.can_submit());
}

#[tokio::test]
async fn short_recipient_is_reported_inline() {
    let (api, mut page) = mounted().await;
    page.select_plan(PlanId(7));
    page.set_receiver_phone("1234");

    assert_eq!(page.submit().await, None);

    assert_eq!(page.step(), WizardStep::EnterRecipient);
    assert_eq!(
        page.field_error(RECEIVER_PHONE),
        validation::check_recipient("1234")
    );
    assert!(page.field_error(RECEIVER_PHONE).is_some());
    assert!(api.requests().iter().all(|r| r.path != gateway::TRANSFER_PLAN));
}

#[tokio::test]
async fn submit_is_unreachable_from_plan_selection() {
    let (api, mut page) = mounted().await;
    page.set_receiver_phone("0812345678");

    assert!(!page.can_submit());
    assert_eq!(page.submit().await, None);
    assert_eq!(api.hits(gateway::TRANSFER_PLAN), 0);
}

#[tokio::test]
async fn success_redirects_after_three_seconds() {
    let (api, mut page) = mounted().await;
    api.respond(Method::POST, gateway::TRANSFER_PLAN, StatusCode::OK, json!({}));
    page.select_plan(PlanId(7));
    page.set_receiver_phone("0812345678");

    let navigation = page.submit().await;

    assert_eq!(
        navigation,
        Some(Navigation::after(Route::dashboard(), REDIRECT_DELAY))
    );
    assert_eq!(REDIRECT_DELAY, Duration::from_secs(3));
    assert_eq!(
        page.notice().map(|n| n.text.as_str()),
        Some("Transfert effectué avec succès")
    );
    assert_eq!(
        api.last_body(gateway::TRANSFER_PLAN),
        Some(json!({ "receiver_phone": "0812345678", "plan_id": 7 }))
    );
}

#[tokio::test]
async fn failure_stays_on_the_recipient_step() {
    let (api, mut page) = mounted().await;
    api.respond(
        Method::POST,
        gateway::TRANSFER_PLAN,
        StatusCode::BAD_REQUEST,
        json!({ "message": "Forfait indisponible" }),
    );
    page.select_plan(PlanId(3));
    page.set_receiver_phone("0812345678");

    assert_eq!(page.submit().await, None);
    assert_eq!(page.step(), WizardStep::EnterRecipient);
    let notice = page.notice().expect("notice");
    assert!(notice.is_error());
    assert_eq!(notice.text, "Forfait indisponible");
}

#[tokio::test]
async fn plan_load_failure_is_reported() {
    let (api, ctx, _store) = signed_in().await;
    api.respond_raw(Method::GET, gateway::PLANS, StatusCode::SERVICE_UNAVAILABLE, "");
    let mut page = PlanTransferPage::new(ctx);

    assert_eq!(page.mount().await, None);
    assert!(page.plans().is_empty());
    assert_eq!(
        page.notice().map(|n| n.text.as_str()),
        Some("Erreur lors du chargement des forfaits")
    );
}
