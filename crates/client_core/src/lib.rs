use std::{sync::Arc, time::Duration};

use anyhow::Result;
use storage::SessionStore;

pub mod error;
pub mod form;
pub mod gateway;
pub mod navigation;
pub mod pages;
pub mod session;
pub mod submission;
pub mod validation;

pub use error::RequestError;
pub use form::FormDraft;
pub use gateway::{HttpGateway, WalletGateway, DEFAULT_API_BASE_URL};
pub use navigation::{Navigation, Route};
pub use session::{BearerToken, Session, SessionState};
pub use submission::{FormAction, SubmitGuard, SubmitOutcome};

/// Everything a page controller needs: the API gateway and the session context.
#[derive(Clone)]
pub struct WalletContext {
    pub gateway: Arc<dyn WalletGateway>,
    pub session: Arc<Session>,
}

impl WalletContext {
    pub fn new(gateway: Arc<dyn WalletGateway>, session: Arc<Session>) -> Self {
        Self { gateway, session }
    }

    /// HTTP gateway on `api_base_url` plus a session restored from `store`.
    pub async fn connect(
        api_base_url: &str,
        timeout: Option<Duration>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let gateway = HttpGateway::with_timeout(api_base_url, timeout)?;
        let session = Session::restore(store).await?;
        Ok(Self::new(Arc::new(gateway), Arc::new(session)))
    }
}

#[cfg(test)]
mod test_support;
