use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PlanId);
id_newtype!(TransactionId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Data,
    Airtime,
}

impl PlanKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Data => "Data",
            Self::Airtime => "Airtime",
        }
    }

    /// Unit suffix used when rendering a plan value or a balance of this kind.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Data => "MB",
            Self::Airtime => "unités",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Debit,
    Credit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(deserialize_with = "lenient_number")]
    pub balance: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub airtime_balance: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub data_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PlanKind,
    #[serde(deserialize_with = "lenient_number")]
    pub value: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub price: f64,
}

impl Plan {
    /// "500 MB" for data bundles, "100 unités" for airtime.
    pub fn value_label(&self) -> String {
        format!("{} {}", self.value, self.kind.unit())
    }

    pub fn price_label(&self) -> String {
        format!("{} USD", self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(deserialize_with = "lenient_number")]
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_phone: Option<String>,
}

impl Transaction {
    /// Signed amount with two decimals: `-12.50 USD` for a debit, `+12.50 USD` for a credit.
    pub fn signed_amount(&self) -> String {
        let sign = match self.kind {
            TransactionKind::Debit => '-',
            TransactionKind::Credit => '+',
        };
        format!("{sign}{:.2} USD", self.amount)
    }

    pub fn counterparty(&self) -> Option<String> {
        let phone = self.recipient_phone.as_deref()?;
        let direction = match self.kind {
            TransactionKind::Debit => "Vers",
            TransactionKind::Credit => "De",
        };
        Some(format!("{direction} {phone}"))
    }

    pub fn timestamp_label(&self) -> String {
        self.created_at.format("%d/%m/%Y %H:%M").to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Accepts `12.5` as well as `"12.50"`; decimal columns usually arrive as strings.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid numeric value '{raw}'"))),
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_accepts_string_encoded_price() {
        let plan: Plan = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Pass 1GB",
            "type": "data",
            "value": 1024,
            "price": "2.50"
        }))
        .expect("plan");
        assert_eq!(plan.id, PlanId(7));
        assert_eq!(plan.kind, PlanKind::Data);
        assert_eq!(plan.price, 2.5);
        assert_eq!(plan.value_label(), "1024 MB");
    }

    #[test]
    fn airtime_plan_value_is_rendered_in_units() {
        let plan = Plan {
            id: PlanId(1),
            name: "Airtime 100".into(),
            kind: PlanKind::Airtime,
            value: 100.0,
            price: 1.0,
        };
        assert_eq!(plan.value_label(), "100 unités");
        assert_eq!(plan.price_label(), "1 USD");
    }

    #[test]
    fn transaction_renders_sign_and_counterparty() {
        let tx: Transaction = serde_json::from_value(serde_json::json!({
            "id": 3,
            "type": "debit",
            "amount": "12.5",
            "description": "Transfert",
            "created_at": "2024-05-01 10:30:00",
            "recipient_phone": "0812345678"
        }))
        .expect("transaction");
        assert_eq!(tx.signed_amount(), "-12.50 USD");
        assert_eq!(tx.counterparty().as_deref(), Some("Vers 0812345678"));
        assert_eq!(tx.timestamp_label(), "01/05/2024 10:30");
    }

    #[test]
    fn credit_without_recipient_has_no_counterparty() {
        let tx: Transaction = serde_json::from_value(serde_json::json!({
            "id": 4,
            "type": "credit",
            "amount": 3,
            "description": "Recharge",
            "created_at": "2024-05-01T10:30:00.000000Z"
        }))
        .expect("transaction");
        assert_eq!(tx.signed_amount(), "+3.00 USD");
        assert!(tx.counterparty().is_none());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_timestamp("yesterday").is_none());
    }
}
