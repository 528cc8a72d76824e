use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use storage::{MemoryStore, SessionStore};

use super::*;
use crate::test_support::{context_for, signed_in, signed_out, spawn_fake_api};

fn transactions(count: i64) -> Value {
    Value::Array(
        (1..=count)
            .map(|id| {
                let kind = if id % 2 == 0 { "credit" } else { "debit" };
                json!({
                    "id": id,
                    "type": kind,
                    "amount": "2.50",
                    "description": format!("Opération {id}"),
                    "created_at": "2024-05-01 10:00:00",
                })
            })
            .collect(),
    )
}

fn profile() -> Value {
    json!({ "name": "Jean", "balance": "120.5", "airtime_balance": 30, "data_balance": 2048 })
}

#[tokio::test]
async fn mount_without_token_issues_no_request() {
    let (api, ctx, _store) = signed_out().await;
    let mut page = DashboardPage::new(ctx, false);

    assert_eq!(page.mount().await, Some(Navigation::now(Route::login())));
    assert_eq!(api.hits(gateway::USER), 0);
    assert_eq!(api.hits(gateway::TRANSACTIONS), 0);
}

#[tokio::test]
async fn overview_shows_five_recent_and_history_shows_all() {
    let (api, ctx, _store) = signed_in().await;
    api.respond(Method::GET, gateway::USER, StatusCode::OK, profile());
    api.respond(Method::GET, gateway::TRANSACTIONS, StatusCode::OK, transactions(8));
    let mut page = DashboardPage::new(ctx, false);

    assert_eq!(page.mount().await, None);

    assert_eq!(page.tab(), DashboardTab::Overview);
    assert_eq!(page.visible_transactions().len(), RECENT_LIMIT);
    page.select_tab(DashboardTab::History);
    assert_eq!(page.visible_transactions().len(), 8);
    assert_eq!(api.hits(gateway::TRANSACTIONS), 1);
}

#[tokio::test]
async fn balances_are_rendered_per_unit() {
    let (api, ctx, store) = signed_in().await;
    api.respond(Method::GET, gateway::USER, StatusCode::OK, profile());
    api.respond(Method::GET, gateway::TRANSACTIONS, StatusCode::OK, json!([]));
    let mut page = DashboardPage::new(ctx, false);

    page.mount().await;

    let cards = page.balance_cards();
    let values: Vec<&str> = cards.iter().map(|c| c.value.as_str()).collect();
    assert_eq!(values, vec!["120.50 USD", "30 unités", "2048 MB"]);
    assert!(page.recent_transactions().is_empty());
    assert_eq!(
        store.cached_user().await.expect("user").map(|u| u.name),
        Some("Jean".to_string())
    );
}

#[tokio::test]
async fn refused_token_clears_session_and_redirects() {
    let (api, ctx, store) = signed_in().await;
    api.respond(
        Method::GET,
        gateway::USER,
        StatusCode::UNAUTHORIZED,
        json!({ "message": "Unauthenticated." }),
    );
    api.respond(Method::GET, gateway::TRANSACTIONS, StatusCode::OK, json!([]));
    let mut page = DashboardPage::new(ctx.clone(), false);

    assert_eq!(page.mount().await, Some(Navigation::now(Route::login())));
    assert_eq!(store.token().await.expect("token"), None);
    assert!(!ctx.session.is_authenticated().await);
}

#[tokio::test]
async fn server_error_keeps_session_and_uses_cached_profile() {
    let (url, api) = spawn_fake_api().await;
    let store = Arc::new(MemoryStore::with_token("abc"));
    store
        .save_user(&UserProfile {
            name: "Jean (cache)".into(),
            balance: 1.0,
            airtime_balance: 0.0,
            data_balance: 0.0,
        })
        .await
        .expect("seed cache");
    let ctx = context_for(&url, store.clone()).await;
    api.respond(Method::GET, gateway::USER, StatusCode::INTERNAL_SERVER_ERROR, json!({}));
    api.respond(
        Method::GET,
        gateway::TRANSACTIONS,
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({}),
    );
    let mut page = DashboardPage::new(ctx.clone(), false);

    assert_eq!(page.mount().await, None);
    assert!(ctx.session.is_authenticated().await);
    assert_eq!(store.token().await.expect("token").as_deref(), Some("abc"));
    assert_eq!(page.profile().map(|p| p.name.as_str()), Some("Jean (cache)"));
    assert!(page.notice().expect("notice").is_error());
    assert!(page.history().is_empty());
}

#[tokio::test]
async fn purchase_flag_shows_success_banner() {
    let (_api, ctx, _store) = signed_in().await;
    let page = DashboardPage::new(ctx, true);
    let notice = page.notice().expect("banner");
    assert!(!notice.is_error());
}

#[tokio::test]
async fn logout_clears_session() {
    let (api, ctx, store) = signed_in().await;
    api.respond(Method::GET, gateway::USER, StatusCode::OK, profile());
    api.respond(Method::GET, gateway::TRANSACTIONS, StatusCode::OK, transactions(2));
    let mut page = DashboardPage::new(ctx.clone(), false);
    page.mount().await;

    let navigation = page.logout().await.expect("logout");

    assert_eq!(navigation, Navigation::now(Route::login()));
    assert_eq!(store.token().await.expect("token"), None);
    assert!(page.history().is_empty());
    assert!(!ctx.session.is_authenticated().await);
}
