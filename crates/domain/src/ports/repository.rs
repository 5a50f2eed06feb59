//! Order persistence port and in-memory implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, LineId, OrderId};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::order::{Order, OrderNumber, OrderStatus};

/// Errors reported by order repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Another order already uses this order number.
    #[error("Order number already exists: {0}")]
    DuplicateOrderNumber(String),

    /// The storage backend failed.
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wraps a backend-specific error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        RepositoryError::Backend(Box::new(err))
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Persistence contract for order aggregates.
///
/// Implementations assign ids and timestamps on `save` and enforce the
/// uniqueness of order numbers. All implementations must be thread-safe.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a new order or overwrites an existing one, returning the stored state.
    ///
    /// Lines are replaced wholesale on update.
    async fn save(&self, order: Order) -> Result<Order>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    async fn find_by_order_number(&self, number: &OrderNumber) -> Result<Option<Order>>;

    /// Returns every order, oldest first.
    async fn find_all(&self) -> Result<Vec<Order>>;

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>>;

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>>;

    /// Deletes an order and its lines. Deleting a missing order is not an error.
    async fn delete_by_id(&self, id: OrderId) -> Result<()>;

    async fn exists_by_order_number(&self, number: &OrderNumber) -> Result<bool>;
}

#[derive(Debug, Default)]
struct InMemoryState {
    orders: BTreeMap<OrderId, Order>,
    last_order_id: i64,
    last_line_id: i64,
}

/// In-memory order repository for tests and zero-configuration runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    async fn filtered(&self, predicate: impl Fn(&Order) -> bool) -> Vec<Order> {
        self.state
            .read()
            .await
            .orders
            .values()
            .filter(|order| predicate(order))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: Order) -> Result<Order> {
        let mut state = self.state.write().await;

        // Unique constraint simulation
        if let Some(number) = order.order_number() {
            let taken = state
                .orders
                .values()
                .any(|other| other.id() != order.id() && other.order_number() == Some(number));
            if taken {
                return Err(RepositoryError::DuplicateOrderNumber(number.to_string()));
            }
        }

        let now = Utc::now();
        let mut record = order.into_record();

        let id = match record.id {
            Some(id) => id,
            None => {
                state.last_order_id += 1;
                OrderId::new(state.last_order_id)
            }
        };
        record.id = Some(id);
        record.created_at = state
            .orders
            .get(&id)
            .and_then(Order::created_at)
            .or(record.created_at)
            .or(Some(now));
        record.updated_at = Some(now);

        for line in &mut record.lines {
            if line.id.is_none() {
                state.last_line_id += 1;
                line.id = Some(LineId::new(state.last_line_id));
            }
        }

        let stored = Order::from_record(record).map_err(RepositoryError::backend)?;
        state.orders.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn find_by_order_number(&self, number: &OrderNumber) -> Result<Option<Order>> {
        Ok(self
            .filtered(|order| order.order_number() == Some(number))
            .await
            .into_iter()
            .next())
    }

    async fn find_all(&self) -> Result<Vec<Order>> {
        Ok(self.filtered(|_| true).await)
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        Ok(self
            .filtered(|order| order.customer_id() == customer_id)
            .await)
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        Ok(self.filtered(|order| order.status() == status).await)
    }

    async fn delete_by_id(&self, id: OrderId) -> Result<()> {
        self.state.write().await.orders.remove(&id);
        Ok(())
    }

    async fn exists_by_order_number(&self, number: &OrderNumber) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .values()
            .any(|order| order.order_number() == Some(number)))
    }
}
