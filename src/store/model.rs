//! Persisted entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    /// Lower-cased, unique among users.
    pub email: String,
    /// Argon2 PHC string, never the raw password.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Inactive users are invisible to lookups.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a [`User`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Direction of a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Buy,
    Sell,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Buy => "buy",
            OperationType::Sell => "sell",
        }
    }
}

impl std::str::FromStr for OperationType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(OperationType::Buy),
            "sell" => Ok(OperationType::Sell),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded buy or sell.
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: Uuid,
    pub kind: OperationType,
    /// Two decimal places, strictly positive.
    pub amount: f64,
    /// Upper-cased currency code.
    pub currency: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create an [`Operation`].
#[derive(Debug, Clone)]
pub struct NewOperation {
    pub kind: OperationType,
    pub amount: f64,
    pub currency: String,
    pub user_id: Uuid,
}
