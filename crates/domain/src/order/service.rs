//! Order service implementing the order use cases.

use std::sync::Arc;

use common::{CustomerId, OrderId};
use futures_util::future::join_all;
use serde::Serialize;

use crate::error::DomainError;
use crate::ports::{OrderRepository, UserEnrichmentClient, UserSummary};

use super::{
    DateStampedGenerator, Order, OrderLine, OrderNumber, OrderNumberGenerator, OrderStatus,
};

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<OrderLine>,
}

impl NewOrder {
    /// Creates an order input for a customer with no lines.
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            shipping_address: None,
            notes: None,
            lines: Vec::new(),
        }
    }

    pub fn with_shipping_address(mut self, address: impl Into<String>) -> Self {
        self.shipping_address = Some(address.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_line(mut self, line: OrderLine) -> Self {
        self.lines.push(line);
        self
    }
}

/// An order decorated with its user, when the user service could provide one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub order: Order,
    pub user: Option<UserSummary>,
}

/// Service for managing orders.
///
/// Loads and saves aggregates through the repository port, routes every
/// status change through the lifecycle rules and enriches read results with
/// user data on a best-effort basis.
pub struct OrderService<R, U> {
    repository: R,
    users: U,
    numbers: Arc<dyn OrderNumberGenerator>,
}

impl<R, U> OrderService<R, U>
where
    R: OrderRepository,
    U: UserEnrichmentClient,
{
    /// Creates a new order service with date-stamped order numbers.
    pub fn new(repository: R, users: U) -> Self {
        Self {
            repository,
            users,
            numbers: Arc::new(DateStampedGenerator),
        }
    }

    /// Replaces the order number generator.
    pub fn with_number_generator(mut self, numbers: Arc<dyn OrderNumberGenerator>) -> Self {
        self.numbers = numbers;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Creates a new order in `Pending` status with a fresh order number.
    ///
    /// A clashing order number is reported as `DuplicateIdentifier` and not retried.
    #[tracing::instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create_order(&self, input: NewOrder) -> Result<Order, DomainError> {
        let mut order = Order::new(input.customer_id)
            .with_shipping_address(input.shipping_address)
            .with_notes(input.notes);
        order.replace_lines(input.lines)?;
        order.set_status(OrderStatus::Pending);
        order.assign_order_number(self.numbers.next_number());

        let saved = self.repository.save(order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = ?saved.id(),
            order_number = ?saved.order_number().map(OrderNumber::as_str),
            total = %saved.total_amount(),
            lines = saved.line_count(),
            "order created"
        );
        Ok(saved)
    }

    /// Loads an order by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::order_not_found("id", id))
    }

    /// Loads an order by its external order number.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_by_number(&self, number: &OrderNumber) -> Result<Order, DomainError> {
        self.repository
            .find_by_order_number(number)
            .await?
            .ok_or_else(|| DomainError::order_not_found("orderNumber", number))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.repository.find_all().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_orders_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, DomainError> {
        Ok(self.repository.find_by_customer(customer_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, DomainError> {
        Ok(self.repository.find_by_status(status).await?)
    }

    /// Moves an order to a new status if the transition table allows it.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let mut order = self.get_order(id).await?;
        let previous = order.status();

        if let Err(err) = order.transition_to(status) {
            tracing::warn!(%previous, requested = %status, "status transition rejected");
            return Err(err.into());
        }

        let saved = self.repository.save(order).await?;

        metrics::counter!(
            "order_status_transitions_total",
            "from" => previous.as_str(),
            "to" => status.as_str()
        )
        .increment(1);
        tracing::info!(%previous, current = %status, "order status updated");
        Ok(saved)
    }

    /// Cancels an order that has not progressed past `Confirmed`.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, DomainError> {
        let mut order = self.get_order(id).await?;
        order.cancel()?;

        let saved = self.repository.save(order).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!("order cancelled");
        Ok(saved)
    }

    /// Deletes an order regardless of its status.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), DomainError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(DomainError::order_not_found("id", id));
        }
        self.repository.delete_by_id(id).await?;

        metrics::counter!("orders_deleted_total").increment(1);
        tracing::info!("order deleted");
        Ok(())
    }

    /// Attaches the ordering user to an order.
    ///
    /// A failed lookup leaves `user` empty; it never fails the read.
    pub async fn view(&self, order: Order) -> OrderView {
        let customer_id = order.customer_id();
        let user = self.users.lookup(customer_id).await;
        if user.is_none() {
            metrics::counter!("order_enrichment_misses_total").increment(1);
            tracing::debug!(%customer_id, "order returned without user details");
        }
        OrderView { order, user }
    }

    /// Enriches several orders, issuing the lookups together.
    pub async fn view_all(&self, orders: Vec<Order>) -> Vec<OrderView> {
        join_all(orders.into_iter().map(|order| self.view(order))).await
    }

    /// Loads and enriches an order by ID.
    pub async fn get_order_view(&self, id: OrderId) -> Result<OrderView, DomainError> {
        let order = self.get_order(id).await?;
        Ok(self.view(order).await)
    }
}
