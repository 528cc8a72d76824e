//! Page controllers: one state holder per screen of the wallet.

pub mod dashboard;
pub mod login;
pub mod plan_transfer;
pub mod purchase;
pub mod register;
pub mod transfer;

pub use dashboard::{DashboardPage, DashboardTab};
pub use login::LoginPage;
pub use plan_transfer::{PlanTransferPage, WizardStep};
pub use purchase::PurchasePage;
pub use register::RegisterPage;
pub use transfer::{TransferPage, TransferResult};

use tracing::info;

use crate::{
    error::RequestError,
    navigation::{Navigation, Route},
    WalletContext,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Banner shown above a form or list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub details: Option<String>,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
            details: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Gate for protected screens: without a token go to login before anything is fetched.
async fn require_session(ctx: &WalletContext, page: Route) -> Option<Navigation> {
    if ctx.session.is_authenticated().await {
        return None;
    }
    info!(page = %page, "no session token, redirecting to login");
    Some(Navigation::now(Route::login()))
}

/// Redirect to login when the interceptor has already dropped the session.
fn on_session_loss(err: &RequestError) -> Option<Navigation> {
    err.is_session_invalid()
        .then(|| Navigation::now(Route::login()))
}
