use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    pages::{
        dashboard::QUICK_ACTIONS, DashboardPage, DashboardTab, LoginPage, Notice,
        PlanTransferPage, PurchasePage, RegisterPage, TransferPage, TransferResult,
    },
    validation, FormDraft, Navigation, Route, WalletContext,
};
use shared::domain::{Plan, PlanId};
use storage::Storage;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(name = "wallet", about = "Mobile money wallet client")]
struct Cli {
    /// Base url of the wallet API.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Where the session token and cached profile are kept.
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Dashboard {
        /// Full history instead of the latest transactions.
        #[arg(long)]
        history: bool,
    },
    Transfer {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },
    Plans,
    Purchase {
        #[arg(long)]
        plan: i64,
    },
    TransferPlan {
        #[arg(long)]
        plan: i64,
        #[arg(long)]
        to: String,
    },
    /// Opens a page by location, e.g. `/dashboard?purchase_success=true`.
    Open { location: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }
    info!(
        api = %settings.api_base_url,
        database = %settings.database_url,
        "starting wallet client"
    );

    let storage = Storage::new(&settings.database_url).await?;
    storage.health_check().await?;
    let ctx = WalletContext::connect(
        &settings.api_base_url,
        settings.request_timeout(),
        Arc::new(storage),
    )
    .await?;

    run(&ctx, cli.command).await
}

async fn run(ctx: &WalletContext, command: Command) -> Result<()> {
    match command {
        Command::Login { phone, password } => login(ctx, phone, password).await,
        Command::Register {
            name,
            email,
            phone,
            password,
        } => {
            let fields = [
                (validation::NAME, name),
                (validation::EMAIL, email),
                (validation::PHONE, phone),
                (validation::PASSWORD, password),
            ];
            register(ctx, fields).await
        }
        Command::Logout => {
            let mut page = DashboardPage::new(ctx.clone(), false);
            let navigation = page.logout().await?;
            println!("Déconnecté.");
            follow(ctx, navigation).await
        }
        Command::Dashboard { history } => {
            let tab = if history {
                DashboardTab::History
            } else {
                DashboardTab::Overview
            };
            show_dashboard(ctx, false, tab).await
        }
        Command::Transfer { to, amount } => transfer(ctx, to, amount).await,
        Command::Plans => {
            let mut page = PurchasePage::new(ctx.clone());
            if let Some(navigation) = page.mount().await {
                return follow(ctx, navigation).await;
            }
            if let Some(notice) = page.error() {
                print_notice(notice);
                bail!("plans unavailable");
            }
            print_plans(page.plans());
            Ok(())
        }
        Command::Purchase { plan } => {
            let mut page = PurchasePage::new(ctx.clone());
            if let Some(navigation) = page.mount().await {
                return follow(ctx, navigation).await;
            }
            match page.purchase(PlanId(plan)).await {
                Some(navigation) => follow(ctx, navigation).await,
                None => fail_with(page.error(), "purchase failed"),
            }
        }
        Command::TransferPlan { plan, to } => transfer_plan(ctx, PlanId(plan), &to).await,
        Command::Open { location } => match Route::parse(&location) {
            Some(route) => open(ctx, route).await,
            None => bail!("unknown page '{location}'"),
        },
    }
}

async fn login(ctx: &WalletContext, phone: String, password: String) -> Result<()> {
    let mut page = LoginPage::new(ctx.clone(), false);
    if let Some(navigation) = page.mount().await {
        println!("Session déjà ouverte.");
        return follow(ctx, navigation).await;
    }
    page.set_field(validation::PHONE, phone);
    page.set_field(validation::PASSWORD, password);

    match page.submit().await? {
        Some(navigation) => follow(ctx, navigation).await,
        None => {
            print_field_errors(page.form());
            fail_with(page.error(), "login failed")
        }
    }
}

async fn register(ctx: &WalletContext, fields: [(&str, String); 4]) -> Result<()> {
    let mut page = RegisterPage::new(ctx.clone());
    for (field, value) in fields {
        page.set_field(field, value);
    }

    match page.submit().await? {
        Some(navigation) => follow(ctx, navigation).await,
        None => {
            print_field_errors(page.form());
            fail_with(page.error(), "registration failed")
        }
    }
}

async fn transfer(ctx: &WalletContext, to: String, amount: String) -> Result<()> {
    let mut page = TransferPage::new(ctx.clone());
    if let Some(navigation) = page.mount().await {
        return follow(ctx, navigation).await;
    }
    page.set_receiver_phone(to);
    page.set_amount(amount);

    let (result, navigation) = page.submit().await;
    if let Some(notice) = page.notice() {
        print_notice(notice);
    }
    match result {
        TransferResult::Done => Ok(()),
        TransferResult::Blocked => {
            print_field_errors(page.form());
            bail!("transfer form is invalid")
        }
        TransferResult::Failed => match navigation {
            Some(navigation) => follow(ctx, navigation).await,
            None => bail!("transfer failed"),
        },
    }
}

async fn transfer_plan(ctx: &WalletContext, plan_id: PlanId, to: &str) -> Result<()> {
    let mut page = PlanTransferPage::new(ctx.clone());
    if let Some(navigation) = page.mount().await {
        return follow(ctx, navigation).await;
    }
    if !page.select_plan(plan_id) {
        if let Some(notice) = page.notice() {
            print_notice(notice);
        }
        print_plans(page.plans());
        bail!("plan {plan_id} is not available");
    }
    page.set_receiver_phone(to);
    if let Some(message) = validation::check_recipient(page.receiver_phone()) {
        bail!("{message}");
    }

    let navigation = page.submit().await;
    if let Some(notice) = page.notice() {
        print_notice(notice);
    }
    match navigation {
        Some(navigation) if navigation.route != Route::login() => follow(ctx, navigation).await,
        Some(navigation) => {
            follow(ctx, navigation).await?;
            bail!("plan transfer failed")
        }
        None => bail!("plan transfer failed"),
    }
}

async fn show_dashboard(
    ctx: &WalletContext,
    purchase_success: bool,
    tab: DashboardTab,
) -> Result<()> {
    let mut page = DashboardPage::new(ctx.clone(), purchase_success);
    if let Some(navigation) = page.mount().await {
        println!("Session expirée. Veuillez vous connecter (wallet login).");
        debug!(route = %navigation.route, "dashboard redirected");
        return Ok(());
    }
    page.select_tab(tab);

    if let Some(notice) = page.notice() {
        print_notice(notice);
    }
    if let Some(profile) = page.profile() {
        println!("Bonjour, {}", profile.name);
    }
    for card in page.balance_cards() {
        println!("{:<16} {}", card.label, card.value);
    }

    let title = match page.tab() {
        DashboardTab::Overview => "Transactions récentes",
        DashboardTab::History => "Historique",
    };
    println!("\n{title}");
    let transactions = page.visible_transactions();
    if transactions.is_empty() {
        println!("  Aucune transaction");
    }
    for tx in transactions {
        let counterparty = tx.counterparty().unwrap_or_default();
        println!(
            "  {}  {:<32} {:>14}  {counterparty}",
            tx.timestamp_label(),
            tx.description,
            tx.signed_amount()
        );
    }

    println!("\nActions rapides");
    for (label, route) in QUICK_ACTIONS {
        println!("  {label} ({})", route.path());
    }
    Ok(())
}

/// Mounts the page behind `route`; pages that need input only report their gate.
async fn open(ctx: &WalletContext, route: Route) -> Result<()> {
    let redirect = match route {
        Route::Transfer => TransferPage::new(ctx.clone()).mount().await,
        Route::Purchase => {
            let mut page = PurchasePage::new(ctx.clone());
            let redirect = page.mount().await;
            if redirect.is_none() {
                print_plans(page.plans());
            }
            redirect
        }
        Route::PlanTransfer => {
            let mut page = PlanTransferPage::new(ctx.clone());
            let redirect = page.mount().await;
            if redirect.is_none() {
                print_plans(page.plans());
            }
            redirect
        }
        Route::Register => None,
        Route::Login { .. } | Route::Dashboard { .. } => {
            return follow(ctx, Navigation::now(route)).await;
        }
    };
    match redirect {
        Some(navigation) => follow(ctx, navigation).await,
        None => {
            println!("-> {route}");
            Ok(())
        }
    }
}

/// Honors the navigation delay, then renders the destination where a view exists.
async fn follow(ctx: &WalletContext, navigation: Navigation) -> Result<()> {
    if let Some(delay) = navigation.delay {
        tokio::time::sleep(delay).await;
    }
    debug!(route = %navigation.route, "navigating");
    match navigation.route {
        Route::Dashboard { purchase_success } => {
            show_dashboard(ctx, purchase_success, DashboardTab::Overview).await
        }
        Route::Login { registered } => {
            let page = LoginPage::new(ctx.clone(), registered);
            if let Some(notice) = page.registered_notice() {
                print_notice(&notice);
            } else {
                println!("Veuillez vous connecter (wallet login).");
            }
            Ok(())
        }
        route => {
            println!("-> {route}");
            Ok(())
        }
    }
}

fn print_plans(plans: &[Plan]) {
    if plans.is_empty() {
        println!("Aucun forfait disponible");
    }
    for plan in plans {
        println!(
            "{:>4}  {:<24} {:<8} {:<12} {}",
            plan.id.0,
            plan.name,
            plan.kind.label(),
            plan.value_label(),
            plan.price_label()
        );
    }
}

fn print_field_errors(form: &FormDraft) {
    for (field, message) in form.errors() {
        eprintln!("  {field}: {message}");
    }
}

fn print_notice(notice: &Notice) {
    let line = match &notice.details {
        Some(details) => format!("{} ({details})", notice.text),
        None => notice.text.clone(),
    };
    if notice.is_error() {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

fn fail_with(notice: Option<&Notice>, context: &str) -> Result<()> {
    if let Some(notice) = notice {
        print_notice(notice);
    }
    bail!("{context}")
}
