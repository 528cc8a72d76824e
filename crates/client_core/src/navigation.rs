use std::{fmt, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login { registered: bool },
    Register,
    Dashboard { purchase_success: bool },
    Transfer,
    Purchase,
    PlanTransfer,
}

impl Route {
    pub const fn login() -> Self {
        Self::Login { registered: false }
    }

    pub const fn dashboard() -> Self {
        Self::Dashboard {
            purchase_success: false,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Login { .. } => "/login",
            Self::Register => "/register",
            Self::Dashboard { .. } => "/dashboard",
            Self::Transfer => "/transfert",
            Self::Purchase => "/purchase",
            Self::PlanTransfer => "/transfertPurchase",
        }
    }

    /// Parses `/path?query`. The site root redirects to login.
    pub fn parse(location: &str) -> Option<Self> {
        let (path, query) = location.split_once('?').unwrap_or((location, ""));
        let flag = |name: &str| {
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .any(|(key, value)| key == name && value == "true")
        };
        let route = match path.trim_end_matches('/') {
            "" | "/login" => Self::Login {
                registered: flag("registered"),
            },
            "/register" => Self::Register,
            "/dashboard" => Self::Dashboard {
                purchase_success: flag("purchaseSuccess"),
            },
            "/transfert" => Self::Transfer,
            "/purchase" => Self::Purchase,
            "/transfertPurchase" => Self::PlanTransfer,
            _ => return None,
        };
        Some(route)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())?;
        match self {
            Self::Login { registered: true } => f.write_str("?registered=true"),
            Self::Dashboard {
                purchase_success: true,
            } => f.write_str("?purchaseSuccess=true"),
            _ => Ok(()),
        }
    }
}

/// Where a controller wants the user to go next, optionally after a pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub route: Route,
    pub delay: Option<Duration>,
}

impl Navigation {
    pub const fn now(route: Route) -> Self {
        Self { route, delay: None }
    }

    pub const fn after(route: Route, delay: Duration) -> Self {
        Self {
            route,
            delay: Some(delay),
        }
    }
}
