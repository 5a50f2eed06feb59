//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{
    CustomerId, LineId, Money, NewOrder, OrderId, OrderLine, OrderNumber, OrderRepository,
    OrderService, OrderStatus, OrderView, ProductId, ProductSnapshot, UserEnrichmentClient,
    UserSummary,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const MAX_SHIPPING_ADDRESS: usize = 500;
const MAX_NOTES: usize = 1000;
const MAX_PRODUCT_NAME: usize = 100;
const MAX_PRODUCT_SKU: usize = 50;
/// Largest quantity the order store can hold.
const MAX_QUANTITY: i64 = i32::MAX as i64;

/// Shared application state accessible from all handlers.
pub struct AppState<R, U> {
    pub order_service: OrderService<R, U>,
}

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: Option<i64>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub product_sku: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

impl CreateOrderRequest {
    /// Validates the request and converts it into the use-case input.
    pub fn into_new_order(self) -> Result<NewOrder, ApiError> {
        let user_id = self.user_id.ok_or_else(|| bad_request("userId is required"))?;

        let shipping_address = self
            .shipping_address
            .filter(|address| !address.trim().is_empty())
            .ok_or_else(|| bad_request("shippingAddress is required"))?;
        check_length("shippingAddress", &shipping_address, MAX_SHIPPING_ADDRESS)?;

        if let Some(notes) = &self.notes {
            check_length("notes", notes, MAX_NOTES)?;
        }

        if self.items.is_empty() {
            return Err(bad_request("Order must contain at least one item"));
        }

        let mut order = NewOrder::for_customer(CustomerId::new(user_id))
            .with_shipping_address(shipping_address);
        order.notes = self.notes;

        for (index, item) in self.items.into_iter().enumerate() {
            order = order.with_line(item.into_line(index)?);
        }
        Ok(order)
    }
}

impl OrderItemRequest {
    fn into_line(self, index: usize) -> Result<OrderLine, ApiError> {
        let field = |name: &str| format!("items[{index}].{name}");

        let product_id = self
            .product_id
            .ok_or_else(|| bad_request(format!("{} is required", field("productId"))))?;

        let product_name = non_blank(self.product_name, &field("productName"))?;
        check_length(&field("productName"), &product_name, MAX_PRODUCT_NAME)?;

        let product_sku = non_blank(self.product_sku, &field("productSku"))?;
        check_length(&field("productSku"), &product_sku, MAX_PRODUCT_SKU)?;

        let quantity = self
            .quantity
            .filter(|quantity| *quantity >= 1)
            .ok_or_else(|| bad_request(format!("{} must be at least 1", field("quantity"))))?;
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| i64::from(*q) <= MAX_QUANTITY)
            .ok_or_else(|| {
                bad_request(format!(
                    "{} must not exceed {MAX_QUANTITY}",
                    field("quantity")
                ))
            })?;

        let unit_price = self
            .unit_price
            .filter(|cents| *cents >= 1)
            .ok_or_else(|| bad_request(format!("{} must be at least 1", field("unitPrice"))))?;

        OrderLine::new(
            ProductSnapshot::new(ProductId::new(product_id), product_name, product_sku),
            quantity,
            Money::from_cents(unit_price),
        )
        .map_err(|_| {
            bad_request(format!(
                "{} times {} exceeds the supported amount",
                field("unitPrice"),
                field("quantity")
            ))
        })
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError::BadRequest(message.into())
}

fn non_blank(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| bad_request(format!("{field} is required")))
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(bad_request(format!(
            "{field} must not exceed {max} characters"
        )));
    }
    Ok(())
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Option<OrderId>,
    pub order_number: Option<OrderNumber>,
    pub user_id: CustomerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub item_count: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Option<LineId>,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Option<Money>,
}

impl From<&OrderLine> for OrderItemResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            id: line.id(),
            product_id: line.product_id(),
            product_name: line.product_name().to_string(),
            product_sku: line.product_sku().to_string(),
            quantity: line.quantity(),
            unit_price: line.unit_price(),
            total_price: line.total_price(),
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(view: OrderView) -> Self {
        let order = view.order;
        let items: Vec<OrderItemResponse> = order.lines().iter().map(Into::into).collect();
        Self {
            id: order.id(),
            order_number: order.order_number().cloned(),
            user_id: order.customer_id(),
            user: view.user,
            status: order.status(),
            total_amount: order.total_amount(),
            shipping_address: order.shipping_address().map(String::from),
            notes: order.notes().map(String::from),
            item_count: items.len(),
            items,
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /orders — create a new order.
#[tracing::instrument(skip(state, payload))]
pub async fn create<R, U>(
    State(state): State<Arc<AppState<R, U>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    let Json(req) = payload?;
    let input = req.into_new_order()?;

    let order = state.order_service.create_order(input).await?;
    let view = state.order_service.view(order).await;

    Ok((StatusCode::CREATED, Json(view.into())))
}

/// GET /orders — list every order.
#[tracing::instrument(skip(state))]
pub async fn list<R, U>(
    State(state): State<Arc<AppState<R, U>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    let orders = state.order_service.list_orders().await?;
    Ok(Json(into_responses(&state, orders).await))
}

/// GET /orders/{id} — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<R, U>(
    State(state): State<Arc<AppState<R, U>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    let id = parse_order_id(&id)?;
    let view = state.order_service.get_order_view(id).await?;
    Ok(Json(view.into()))
}

/// GET /orders/number/{number} — load an order by its order number.
#[tracing::instrument(skip(state))]
pub async fn get_by_number<R, U>(
    State(state): State<Arc<AppState<R, U>>>,
    Path(number): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    let order = state
        .order_service
        .get_order_by_number(&OrderNumber::new(number))
        .await?;
    Ok(Json(state.order_service.view(order).await.into()))
}

/// GET /orders/user/{userId} — list the orders of one user.
#[tracing::instrument(skip(state))]
pub async fn list_by_user<R, U>(
    State(state): State<Arc<AppState<R, U>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    let customer_id: CustomerId = user_id
        .parse()
        .map_err(|e| bad_request(format!("Invalid user ID: {e}")))?;
    let orders = state
        .order_service
        .list_orders_by_customer(customer_id)
        .await?;
    Ok(Json(into_responses(&state, orders).await))
}

/// GET /orders/status/{status} — list the orders in one status.
#[tracing::instrument(skip(state))]
pub async fn list_by_status<R, U>(
    State(state): State<Arc<AppState<R, U>>>,
    Path(status): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    let status = parse_status(&status)?;
    let orders = state.order_service.list_orders_by_status(status).await?;
    Ok(Json(into_responses(&state, orders).await))
}

/// PATCH /orders/{id}/status — move an order to a new status.
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<R, U>(
    State(state): State<Arc<AppState<R, U>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError>
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    let id = parse_order_id(&id)?;
    let Json(req) = payload?;
    let status = req
        .status
        .ok_or_else(|| bad_request("status is required"))
        .and_then(|status| parse_status(&status))?;

    let order = state.order_service.update_status(id, status).await?;
    Ok(Json(state.order_service.view(order).await.into()))
}

/// POST /orders/{id}/cancel — cancel an order that has not started processing.
#[tracing::instrument(skip(state))]
pub async fn cancel<R, U>(
    State(state): State<Arc<AppState<R, U>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    let id = parse_order_id(&id)?;
    let order = state.order_service.cancel_order(id).await?;
    Ok(Json(state.order_service.view(order).await.into()))
}

/// DELETE /orders/{id} — delete an order in any status.
#[tracing::instrument(skip(state))]
pub async fn delete<R, U>(
    State(state): State<Arc<AppState<R, U>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    R: OrderRepository + 'static,
    U: UserEnrichmentClient + 'static,
{
    let id = parse_order_id(&id)?;
    state.order_service.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn into_responses<R, U>(
    state: &AppState<R, U>,
    orders: Vec<domain::Order>,
) -> Vec<OrderResponse>
where
    R: OrderRepository,
    U: UserEnrichmentClient,
{
    state
        .order_service
        .view_all(orders)
        .await
        .into_iter()
        .map(Into::into)
        .collect()
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| bad_request(format!("Invalid ID format: {e}")))
}

fn parse_status(status: &str) -> Result<OrderStatus, ApiError> {
    status.parse().map_err(|e: domain::ParseStatusError| bad_request(e.to_string()))
}
