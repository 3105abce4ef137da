use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    app_error::AppError,
    clock::Clock,
    models::{CartItemEntity, CreateOrderEntity, OrderEntity, OrderStatus},
    money::round2,
    pagination::{OrderFilter, Page, PageRequest},
    store::Store,
    transitions::{self, Transition},
};

/// Owns the order aggregate: creation, lookup, listing, lifecycle transitions and checkout.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create_order(
        &self,
        customer_id: i64,
        customer_name: Option<String>,
        total_amount: f64,
    ) -> Result<OrderEntity, AppError> {
        if !(total_amount > 0.0) {
            return Err(AppError::validation(
                "totalAmount",
                "Total amount must be positive",
            ));
        }

        let order = self
            .store
            .insert_order(CreateOrderEntity {
                customer_id,
                customer_name,
                order_date: self.clock.now(),
                status: OrderStatus::Created,
                total_amount,
            })
            .await?;

        info!("Order #{} has been created", order.id);
        Ok(order)
    }

    pub async fn get_order(&self, id: i64) -> Result<OrderEntity, AppError> {
        self.store
            .find_order(id)
            .await?
            .ok_or(AppError::not_found("Order", id))
    }

    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> Result<Page<OrderEntity>, AppError> {
        let (items, total) = self.store.list_orders(filter, page).await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn update_order_status(
        &self,
        id: i64,
        new_status: OrderStatus,
    ) -> Result<OrderEntity, AppError> {
        let decide = Box::new(
            move |order: &OrderEntity| -> Result<OrderStatus, AppError> {
                match transitions::validate(order.status, new_status) {
                    Transition::Allowed => Ok(new_status),
                    Transition::Rejected(reason) => Err(AppError::BusinessRule(reason)),
                }
            },
        );

        let order = self
            .store
            .transition_order(id, decide)
            .await
            .inspect_err(|err| {
                if let AppError::BusinessRule(reason) = err {
                    warn!("Order #{} status change rejected: {}", id, reason);
                }
            })?
            .ok_or(AppError::not_found("Order", id))?;

        info!("Order #{} has been moved to {}", order.id, order.status);
        Ok(order)
    }

    pub async fn cancel_order(&self, id: i64) -> Result<OrderEntity, AppError> {
        let decide = Box::new(|order: &OrderEntity| -> Result<OrderStatus, AppError> {
            if transitions::can_cancel(order.status) {
                Ok(OrderStatus::Cancelled)
            } else {
                Err(AppError::BusinessRule(format!(
                    "Cannot cancel order in status {}",
                    order.status
                )))
            }
        });

        let order = self
            .store
            .transition_order(id, decide)
            .await
            .inspect_err(|err| {
                if let AppError::BusinessRule(reason) = err {
                    warn!("Order #{} cancellation rejected: {}", id, reason);
                }
            })?
            .ok_or(AppError::not_found("Order", id))?;

        info!("Order #{} has been cancelled", order.id);
        Ok(order)
    }

    /// Promotes every live cart line into a new order in a single transaction.
    pub async fn checkout(
        &self,
        customer_id: i64,
        customer_name: Option<String>,
    ) -> Result<OrderEntity, AppError> {
        let order_date = self.clock.now();

        let plan = Box::new(
            move |items: &[CartItemEntity]| -> Result<CreateOrderEntity, AppError> {
                if items.is_empty() {
                    return Err(AppError::BusinessRule("cart is empty".into()));
                }
                let total_amount = checkout_total(items);
                if !(total_amount > 0.0) {
                    return Err(AppError::BusinessRule(format!(
                        "Order total must be positive, cart totals {total_amount:.2}"
                    )));
                }
                Ok(CreateOrderEntity {
                    customer_id,
                    customer_name,
                    order_date,
                    status: OrderStatus::Created,
                    total_amount,
                })
            },
        );

        let order = self.store.checkout(plan).await?;
        info!(
            "Order #{} has been checked out for customer #{} ({:.2})",
            order.id, order.customer_id, order.total_amount
        );
        Ok(order)
    }
}

pub fn checkout_total(items: &[CartItemEntity]) -> f64 {
    round2(
        items
            .iter()
            .map(|item| f64::from(item.quantity) * item.price)
            .sum(),
    )
}
