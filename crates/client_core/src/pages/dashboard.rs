use anyhow::Result;
use shared::domain::{PlanKind, Transaction, UserProfile};
use tracing::{info, warn};

use crate::{
    gateway,
    navigation::{Navigation, Route},
    pages::{on_session_loss, require_session, Notice},
    WalletContext,
};

/// Transactions shown on the overview tab.
pub const RECENT_LIMIT: usize = 5;

const PROFILE_UNAVAILABLE: &str = "Impossible de charger votre profil. Veuillez réessayer.";
const PURCHASE_DONE: &str = "Forfait acheté avec succès";

pub const QUICK_ACTIONS: [(&str, Route); 3] = [
    ("Transférer de l'argent", Route::Transfer),
    ("Acheter un forfait", Route::Purchase),
    ("Transférer un forfait", Route::PlanTransfer),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardTab {
    #[default]
    Overview,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceCard {
    pub label: &'static str,
    pub value: String,
}

pub struct DashboardPage {
    ctx: WalletContext,
    tab: DashboardTab,
    profile: Option<UserProfile>,
    transactions: Vec<Transaction>,
    notice: Option<Notice>,
}

impl DashboardPage {
    /// `purchase_success` is set when arriving from a completed plan purchase.
    pub fn new(ctx: WalletContext, purchase_success: bool) -> Self {
        Self {
            ctx,
            tab: DashboardTab::default(),
            profile: None,
            transactions: Vec::new(),
            notice: purchase_success.then(|| Notice::success(PURCHASE_DONE)),
        }
    }

    /// Fetches profile and transactions side by side.
    ///
    /// Without a token nothing is requested. A refused token on either call
    /// drops the session and redirects; other failures keep the user here, with
    /// the cached profile standing in and an empty transaction list.
    pub async fn mount(&mut self) -> Option<Navigation> {
        if let Some(redirect) = require_session(&self.ctx, Route::dashboard()).await {
            return Some(redirect);
        }

        let ctx = &self.ctx;
        let (profile, transactions) = tokio::join!(
            ctx.session.authorized(gateway::USER, |token| async move {
                ctx.gateway.fetch_user(&token).await
            }),
            ctx.session
                .authorized(gateway::TRANSACTIONS, |token| async move {
                    ctx.gateway.fetch_transactions(&token).await
                }),
        );

        match profile {
            Ok(profile) => {
                if let Err(err) = self.ctx.session.remember_user(&profile).await {
                    warn!(error = %err, "failed to cache user profile");
                }
                self.profile = Some(profile);
            }
            Err(err) => {
                if let Some(redirect) = on_session_loss(&err) {
                    return Some(redirect);
                }
                warn!(error = %err, "failed to load user profile");
                self.profile = self.ctx.session.cached_user().await;
                self.notice = Some(Notice::error(PROFILE_UNAVAILABLE));
            }
        }

        match transactions {
            Ok(transactions) => self.transactions = transactions,
            Err(err) => {
                if let Some(redirect) = on_session_loss(&err) {
                    return Some(redirect);
                }
                warn!(error = %err, "failed to load transactions");
                self.transactions.clear();
            }
        }
        None
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn tab(&self) -> DashboardTab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: DashboardTab) {
        self.tab = tab;
    }

    pub fn recent_transactions(&self) -> &[Transaction] {
        &self.transactions[..self.transactions.len().min(RECENT_LIMIT)]
    }

    pub fn history(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Transactions for the active tab; both tabs read the same fetched list.
    pub fn visible_transactions(&self) -> &[Transaction] {
        match self.tab {
            DashboardTab::Overview => self.recent_transactions(),
            DashboardTab::History => self.history(),
        }
    }

    pub fn balance_cards(&self) -> Vec<BalanceCard> {
        let Some(profile) = &self.profile else {
            return Vec::new();
        };
        vec![
            BalanceCard {
                label: "Solde principal",
                value: format!("{:.2} USD", profile.balance),
            },
            BalanceCard {
                label: "Solde Airtime",
                value: format!("{} {}", profile.airtime_balance, PlanKind::Airtime.unit()),
            },
            BalanceCard {
                label: "Solde Data",
                value: format!("{} {}", profile.data_balance, PlanKind::Data.unit()),
            },
        ]
    }

    pub async fn logout(&mut self) -> Result<Navigation> {
        self.ctx.session.logout().await?;
        self.profile = None;
        self.transactions.clear();
        info!("logged out from dashboard");
        Ok(Navigation::now(Route::login()))
    }
}

#[cfg(test)]
#[path = "../tests/dashboard_tests.rs"]
mod tests;
