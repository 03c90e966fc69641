//! Operation creation and retrieval.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{DomainError, ServiceResult};
use crate::store::{NewOperation, Operation, OperationType, Store};

/// Largest page size a caller may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Public view of an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub amount: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<Operation> for OperationView {
    fn from(op: Operation) -> Self {
        Self {
            id: op.id,
            kind: op.kind,
            amount: op.amount,
            currency: op.currency,
            created_at: op.created_at,
        }
    }
}

/// Page coordinates returned alongside a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(u64::from(limit.max(1))),
        }
    }
}

/// One page of a user's operations.
#[derive(Debug, Clone, Serialize)]
pub struct OperationPage {
    pub operations: Vec<OperationView>,
    pub pagination: Pagination,
}

/// Request to record an operation. `kind` arrives as text and is checked here.
#[derive(Debug, Clone)]
pub struct OperationDraft {
    pub kind: String,
    pub amount: f64,
    pub currency: String,
}

/// Operation service.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn Store>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate and record an operation for `user_id`.
    pub async fn create_operation(
        &self,
        draft: OperationDraft,
        user_id: Uuid,
    ) -> ServiceResult<OperationView> {
        if self.store.find_user_by_id(user_id).await?.is_none() {
            return Err(DomainError::NotFound("User not found".into()).into());
        }

        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(DomainError::InvalidInput("Amount must be greater than 0".into()).into());
        }

        let kind: OperationType = draft.kind.parse().map_err(|_| {
            DomainError::InvalidInput("Operation type must be \"buy\" or \"sell\"".into())
        })?;

        let currency = draft.currency.trim();
        if currency.is_empty() {
            return Err(DomainError::InvalidInput("Currency is required".into()).into());
        }

        let operation = self
            .store
            .insert_operation(NewOperation {
                kind,
                amount: draft.amount,
                currency: currency.to_string(),
                user_id,
            })
            .await?;

        tracing::info!(
            operation_id = %operation.id,
            user_id = %user_id,
            kind = %operation.kind,
            "Operation recorded"
        );
        Ok(operation.into())
    }

    /// Page through a user's operations, newest first.
    pub async fn list_operations(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> ServiceResult<OperationPage> {
        if page < 1 || limit < 1 || limit > MAX_PAGE_SIZE {
            return Err(DomainError::InvalidInput(format!(
                "Invalid pagination parameters. Page >= 1, limit between 1 and {}",
                MAX_PAGE_SIZE
            ))
            .into());
        }

        if self.store.find_user_by_id(user_id).await?.is_none() {
            return Err(DomainError::NotFound("User not found".into()).into());
        }

        let offset = u64::from(page - 1) * u64::from(limit);
        let operations = self.store.list_operations(user_id, limit, offset).await?;
        let total = self.store.count_operations(user_id).await?;

        Ok(OperationPage {
            operations: operations.into_iter().map(OperationView::from).collect(),
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// Fetch an operation owned by `user_id`.
    pub async fn get_operation(&self, id: Uuid, user_id: Uuid) -> ServiceResult<OperationView> {
        let operation = self
            .store
            .find_operation(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Operation not found".into()))?;

        if operation.user_id != user_id {
            return Err(DomainError::Forbidden(
                "You do not have permission to view this operation".into(),
            )
            .into());
        }

        Ok(operation.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::store::{InMemoryStore, NewUser};

    async fn setup() -> (LedgerService, Uuid, Uuid) {
        let store = InMemoryStore::new();
        let mut ids = Vec::new();
        for email in ["a@example.com", "b@example.com"] {
            let user = store
                .insert_user(NewUser {
                    email: email.into(),
                    password_hash: "hash".into(),
                    first_name: "Ada".into(),
                    last_name: "Lovelace".into(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        (LedgerService::new(Arc::new(store)), ids[0], ids[1])
    }

    fn draft(kind: &str, amount: f64, currency: &str) -> OperationDraft {
        OperationDraft {
            kind: kind.into(),
            amount,
            currency: currency.into(),
        }
    }

    fn domain(err: ServiceError) -> DomainError {
        match err {
            ServiceError::Domain(e) => e,
            other => panic!("expected domain error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (ledger, alice, bob) = setup().await;

        let op = ledger.create_operation(draft("buy", 12.5, "usd"), alice).await.unwrap();
        assert_eq!(op.kind, OperationType::Buy);
        assert_eq!(op.currency, "USD");

        assert_eq!(ledger.get_operation(op.id, alice).await.unwrap(), op);

        let err = domain(ledger.get_operation(op.id, bob).await.unwrap_err());
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = domain(ledger.get_operation(Uuid::new_v4(), alice).await.unwrap_err());
        assert_eq!(err, DomainError::NotFound("Operation not found".into()));
    }

    #[tokio::test]
    async fn test_create_rules() {
        let (ledger, alice, _) = setup().await;

        let cases = [
            (draft("buy", 0.0, "USD"), "Amount must be greater than 0"),
            (draft("hold", 1.0, "USD"), "Operation type must be \"buy\" or \"sell\""),
            (draft("sell", 1.0, "  "), "Currency is required"),
        ];
        for (input, message) in cases {
            let err = domain(ledger.create_operation(input, alice).await.unwrap_err());
            assert_eq!(err, DomainError::InvalidInput(message.into()));
        }

        let err = domain(ledger.create_operation(draft("buy", 1.0, "USD"), Uuid::new_v4()).await.unwrap_err());
        assert_eq!(err, DomainError::NotFound("User not found".into()));
    }

    #[tokio::test]
    async fn test_pagination() {
        let (ledger, alice, _) = setup().await;
        for i in 0..23 {
            ledger.create_operation(draft("sell", 1.0 + i as f64, "EUR"), alice).await.unwrap();
        }

        let page = ledger.list_operations(alice, 3, 10).await.unwrap();
        assert_eq!(page.operations.len(), 3);
        assert_eq!(page.pagination, Pagination { page: 3, limit: 10, total: 23, total_pages: 3 });

        let err = domain(ledger.list_operations(alice, 1, 101).await.unwrap_err());
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
