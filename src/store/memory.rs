//! In-memory store backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::store::model::{NewOperation, NewUser, Operation, User};
use crate::store::{Store, StoreError, StoreResult};

/// A thread-safe store keeping users and operations in memory.
///
/// Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    users: Arc<DashMap<Uuid, User>>,
    /// e-mail -> user id. Doubles as the unique constraint.
    emails: Arc<DashMap<String, Uuid>>,
    operations: Arc<DashMap<Uuid, Operation>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users, active or not.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn active_user(&self, id: &Uuid) -> Option<User> {
        self.users
            .get(id)
            .filter(|u| u.is_active)
            .map(|u| u.value().clone())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.active_user(&id))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.active_user(&id))
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        // Holding the vacant entry locks the e-mail shard until the user exists
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation {
                constraint: "users_email_key",
            }),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let record = User {
                    id: Uuid::new_v4(),
                    email: user.email,
                    password_hash: user.password_hash,
                    first_name: user.first_name,
                    last_name: user.last_name,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(record.id, record.clone());
                slot.insert(record.id);
                Ok(record)
            }
        }
    }

    async fn insert_operation(&self, operation: NewOperation) -> StoreResult<Operation> {
        if self.active_user(&operation.user_id).is_none() {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "operations_user_id_fkey",
            });
        }

        let amount = (operation.amount * 100.0).round() / 100.0;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(StoreError::CheckViolation {
                constraint: "operations_amount_check",
            });
        }

        let record = Operation {
            id: Uuid::new_v4(),
            kind: operation.kind,
            amount,
            currency: operation.currency.to_uppercase(),
            user_id: operation.user_id,
            created_at: Utc::now(),
        };
        self.operations.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_operation(&self, id: Uuid) -> StoreResult<Option<Operation>> {
        Ok(self.operations.get(&id).map(|r| r.value().clone()))
    }

    async fn list_operations(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Operation>> {
        let mut owned: Vec<Operation> = self
            .operations
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();

        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(owned
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn count_operations(&self, user_id: Uuid) -> StoreResult<u64> {
        Ok(self.operations.iter().filter(|r| r.user_id == user_id).count() as u64)
    }
}
