use anyhow::Context;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper, pg::Pg};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl, pooled_connection::bb8::Pool};

use crate::{
    app_error::AppError,
    models::{
        CartItemEntity, CreateCartItemEntity, CreateOrderEntity, OrderEntity, ProductEntity,
        UpdateCartItemEntity,
    },
    pagination::{OrderFilter, OrderSortField, PageRequest, SortDirection},
    schema::{cart_items, orders, products},
};

use super::{CheckoutPlan, StatusDecision, Store};

pub type DbPool = Pool<AsyncPgConnection>;

/// [`Store`] backed by PostgreSQL through a bb8 pool of async diesel connections.
#[derive(Clone)]
pub struct PgStore {
    db_pool: DbPool,
}

impl PgStore {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

fn filtered_orders(filter: &OrderFilter) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(orders::status.eq(status));
    }
    if let Some(start_date) = filter.start_date {
        query = query.filter(orders::order_date.ge(start_date));
    }
    if let Some(end_date) = filter.end_date {
        query = query.filter(orders::order_date.le(end_date));
    }
    query
}

macro_rules! sort_by {
    ($query:expr, $column:expr, $direction:expr) => {
        match $direction {
            SortDirection::Asc => $query.order_by($column.asc()),
            SortDirection::Desc => $query.order_by($column.desc()),
        }
    };
}

#[async_trait]
impl Store for PgStore {
    async fn find_product(&self, id: i64) -> Result<Option<ProductEntity>, AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let product = products::table
            .find(id)
            .select(ProductEntity::as_select())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to get product")?;

        Ok(product)
    }

    async fn list_cart_items(&self) -> Result<Vec<CartItemEntity>, AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let items = cart_items::table
            .order_by(cart_items::id.asc())
            .select(CartItemEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get cart items")?;

        Ok(items)
    }

    async fn find_cart_item(&self, id: i64) -> Result<Option<CartItemEntity>, AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let item = cart_items::table
            .find(id)
            .select(CartItemEntity::as_select())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to get cart item")?;

        Ok(item)
    }

    async fn insert_cart_item(
        &self,
        item: CreateCartItemEntity,
    ) -> Result<CartItemEntity, AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let item = diesel::insert_into(cart_items::table)
            .values(item)
            .returning(CartItemEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to create cart item")?;

        Ok(item)
    }

    async fn update_live_cart_item(
        &self,
        id: i64,
        changes: UpdateCartItemEntity,
    ) -> Result<Option<CartItemEntity>, AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let item = diesel::update(
            cart_items::table
                .find(id)
                .filter(cart_items::order_id.is_null()),
        )
        .set(changes)
        .returning(CartItemEntity::as_returning())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to update cart item")?;

        Ok(item)
    }

    async fn delete_live_cart_item(&self, id: i64) -> Result<bool, AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let deleted = diesel::delete(
            cart_items::table
                .find(id)
                .filter(cart_items::order_id.is_null()),
        )
        .execute(conn)
        .await
        .context("Failed to delete cart item")?;

        Ok(deleted > 0)
    }

    async fn insert_order(&self, order: CreateOrderEntity) -> Result<OrderEntity, AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let order = diesel::insert_into(orders::table)
            .values(order)
            .returning(OrderEntity::as_returning())
            .get_result(conn)
            .await
            .context("Failed to create order")?;

        Ok(order)
    }

    async fn find_order(&self, id: i64) -> Result<Option<OrderEntity>, AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let order = orders::table
            .find(id)
            .select(OrderEntity::as_select())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to get order")?;

        Ok(order)
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> Result<(Vec<OrderEntity>, i64), AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let total: i64 = filtered_orders(filter)
            .count()
            .get_result(conn)
            .await
            .context("Failed to count orders")?;

        let query = filtered_orders(filter);
        let direction = page.sort.direction;
        let query = match page.sort.field {
            OrderSortField::Id => sort_by!(query, orders::id, direction),
            OrderSortField::CustomerId => sort_by!(query, orders::customer_id, direction),
            OrderSortField::CustomerName => sort_by!(query, orders::customer_name, direction),
            OrderSortField::OrderDate => sort_by!(query, orders::order_date, direction),
            OrderSortField::Status => sort_by!(query, orders::status, direction),
            OrderSortField::TotalAmount => sort_by!(query, orders::total_amount, direction),
        };

        let items = query
            .then_order_by(orders::id.asc())
            .limit(page.size)
            .offset(page.offset())
            .select(OrderEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get orders")?;

        Ok((items, total))
    }

    async fn transition_order(
        &self,
        id: i64,
        decide: StatusDecision,
    ) -> Result<Option<OrderEntity>, AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        conn.transaction(move |conn| {
            Box::pin(async move {
                let order: Option<OrderEntity> = orders::table
                    .find(id)
                    .select(OrderEntity::as_select())
                    .for_update()
                    .get_result(conn)
                    .await
                    .optional()
                    .context("Failed to lock order")?;

                let Some(order) = order else {
                    return Ok(None);
                };

                let next_status = decide(&order)?;

                let updated = diesel::update(orders::table.find(order.id))
                    .set(orders::status.eq(next_status))
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to update order status")?;

                Ok::<Option<OrderEntity>, AppError>(Some(updated))
            })
        })
        .await
    }

    async fn checkout(&self, plan: CheckoutPlan) -> Result<OrderEntity, AppError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        conn.transaction(move |conn| {
            Box::pin(async move {
                let live_items: Vec<CartItemEntity> = cart_items::table
                    .filter(cart_items::order_id.is_null())
                    .order_by(cart_items::id.asc())
                    .select(CartItemEntity::as_select())
                    .for_update()
                    .get_results(conn)
                    .await
                    .context("Failed to lock cart items")?;

                let new_order = plan(&live_items)?;

                let order = diesel::insert_into(orders::table)
                    .values(new_order)
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .context("Failed to create order")?;

                let item_ids: Vec<i64> = live_items.iter().map(|item| item.id).collect();
                diesel::update(cart_items::table.filter(cart_items::id.eq_any(&item_ids)))
                    .set(cart_items::order_id.eq(order.id))
                    .execute(conn)
                    .await
                    .context("Failed to assign cart items to order")?;

                Ok::<OrderEntity, AppError>(order)
            })
        })
        .await
    }
}
