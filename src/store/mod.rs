//! Persistence seam for the service layer.
//!
//! Operations that must load, decide and write atomically take the decision as a closure
//! so the business rule runs inside the store's transaction while staying owned by the
//! service that defines it.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    app_error::AppError,
    models::{
        CartItemEntity, CreateCartItemEntity, CreateOrderEntity, OrderEntity, OrderStatus,
        ProductEntity, UpdateCartItemEntity,
    },
    pagination::{OrderFilter, PageRequest},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Decides the next status for a locked order, or rejects the change.
pub type StatusDecision =
    Box<dyn FnOnce(&OrderEntity) -> Result<OrderStatus, AppError> + Send>;

/// Turns the locked live cart lines into the order they will be assigned to.
pub type CheckoutPlan =
    Box<dyn FnOnce(&[CartItemEntity]) -> Result<CreateOrderEntity, AppError> + Send>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_product(&self, id: i64) -> Result<Option<ProductEntity>, AppError>;

    /// Every cart line, live and frozen, by ascending id.
    async fn list_cart_items(&self) -> Result<Vec<CartItemEntity>, AppError>;

    async fn find_cart_item(&self, id: i64) -> Result<Option<CartItemEntity>, AppError>;

    async fn insert_cart_item(&self, item: CreateCartItemEntity)
    -> Result<CartItemEntity, AppError>;

    /// Overwrites a cart line only while it is still live. `None` when no live line has `id`.
    async fn update_live_cart_item(
        &self,
        id: i64,
        changes: UpdateCartItemEntity,
    ) -> Result<Option<CartItemEntity>, AppError>;

    /// Removes a cart line only while it is still live. `false` when no live line has `id`.
    async fn delete_live_cart_item(&self, id: i64) -> Result<bool, AppError>;

    async fn insert_order(&self, order: CreateOrderEntity) -> Result<OrderEntity, AppError>;

    async fn find_order(&self, id: i64) -> Result<Option<OrderEntity>, AppError>;

    /// One page of matching orders plus the total number of matches.
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> Result<(Vec<OrderEntity>, i64), AppError>;

    /// Locks the order, applies `decide` and writes the chosen status. `None` when the order
    /// does not exist.
    async fn transition_order(
        &self,
        id: i64,
        decide: StatusDecision,
    ) -> Result<Option<OrderEntity>, AppError>;

    /// Locks the live cart lines, inserts the order produced by `plan` and assigns every
    /// locked line to it, all in one transaction.
    async fn checkout(&self, plan: CheckoutPlan) -> Result<OrderEntity, AppError>;
}
