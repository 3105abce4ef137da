use std::{cmp::Ordering, collections::BTreeMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    app_error::AppError,
    models::{
        CartItemEntity, CreateCartItemEntity, CreateOrderEntity, CreateProductEntity, OrderEntity,
        ProductEntity, UpdateCartItemEntity,
    },
    pagination::{OrderFilter, OrderSortField, PageRequest, SortDirection},
};

use super::{CheckoutPlan, StatusDecision, Store};

/// A table keyed by a monotonically assigned id.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn get(&self, id: i64) -> Option<T> {
        self.rows.get(&id).cloned()
    }
}

#[derive(Debug, Default)]
struct Tables {
    products: Table<ProductEntity>,
    cart_items: Table<CartItemEntity>,
    orders: Table<OrderEntity>,
}

/// In-process [`Store`]. Every operation holds one lock over all tables, so multi-row
/// operations are atomic and per-order writes are linearizable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the products the seed migration installs.
    pub async fn with_demo_catalog() -> Self {
        let store = Self::new();
        for (name, price, description) in [
            ("Laptop", 999.99, "High-performance laptop"),
            ("Mouse", 29.99, "Wireless mouse"),
            ("Keyboard", 79.99, "Mechanical keyboard"),
            ("Monitor", 299.99, "27-inch 4K monitor"),
            ("Headphones", 149.99, "Noise-cancelling headphones"),
        ] {
            store
                .add_product(CreateProductEntity {
                    name: name.into(),
                    price,
                    description: Some(description.into()),
                })
                .await;
        }
        store
    }

    pub async fn add_product(&self, product: CreateProductEntity) -> ProductEntity {
        let mut tables = self.tables.lock().await;
        tables.products.insert_with(|id| ProductEntity {
            id,
            name: product.name,
            price: product.price,
            description: product.description,
        })
    }
}

fn compare_orders(a: &OrderEntity, b: &OrderEntity, page: &PageRequest) -> Ordering {
    let primary = match page.sort.field {
        OrderSortField::Id => a.id.cmp(&b.id),
        OrderSortField::CustomerId => a.customer_id.cmp(&b.customer_id),
        // NULLs sort last ascending, as PostgreSQL does.
        OrderSortField::CustomerName => match (&a.customer_name, &b.customer_name) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        OrderSortField::OrderDate => a.order_date.cmp(&b.order_date),
        OrderSortField::Status => a.status.as_str().cmp(b.status.as_str()),
        OrderSortField::TotalAmount => a.total_amount.total_cmp(&b.total_amount),
    };
    let primary = match page.sort.direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then(a.id.cmp(&b.id))
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_product(&self, id: i64) -> Result<Option<ProductEntity>, AppError> {
        Ok(self.tables.lock().await.products.get(id))
    }

    async fn list_cart_items(&self) -> Result<Vec<CartItemEntity>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.cart_items.rows.values().cloned().collect())
    }

    async fn find_cart_item(&self, id: i64) -> Result<Option<CartItemEntity>, AppError> {
        Ok(self.tables.lock().await.cart_items.get(id))
    }

    async fn insert_cart_item(
        &self,
        item: CreateCartItemEntity,
    ) -> Result<CartItemEntity, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.cart_items.insert_with(|id| CartItemEntity {
            id,
            order_id: None,
            product_id: item.product_id,
            product_name: item.product_name,
            price: item.price,
            quantity: item.quantity,
        }))
    }

    async fn update_live_cart_item(
        &self,
        id: i64,
        changes: UpdateCartItemEntity,
    ) -> Result<Option<CartItemEntity>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(item) = tables
            .cart_items
            .rows
            .get_mut(&id)
            .filter(|item| !item.is_frozen())
        else {
            return Ok(None);
        };

        item.product_id = changes.product_id;
        item.product_name = changes.product_name;
        item.price = changes.price;
        item.quantity = changes.quantity;
        Ok(Some(item.clone()))
    }

    async fn delete_live_cart_item(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let live = tables
            .cart_items
            .rows
            .get(&id)
            .is_some_and(|item| !item.is_frozen());
        if live {
            tables.cart_items.rows.remove(&id);
        }
        Ok(live)
    }

    async fn insert_order(&self, order: CreateOrderEntity) -> Result<OrderEntity, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.orders.insert_with(|id| OrderEntity {
            id,
            customer_id: order.customer_id,
            customer_name: order.customer_name,
            order_date: order.order_date,
            status: order.status,
            total_amount: order.total_amount,
        }))
    }

    async fn find_order(&self, id: i64) -> Result<Option<OrderEntity>, AppError> {
        Ok(self.tables.lock().await.orders.get(id))
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> Result<(Vec<OrderEntity>, i64), AppError> {
        let tables = self.tables.lock().await;
        let mut matching: Vec<OrderEntity> = tables
            .orders
            .rows
            .values()
            .filter(|order| filter.matches(order.status, order.order_date))
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare_orders(a, b, page));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.size).unwrap_or(usize::MAX))
            .collect();
        Ok((items, total))
    }

    async fn transition_order(
        &self,
        id: i64,
        decide: StatusDecision,
    ) -> Result<Option<OrderEntity>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(order) = tables.orders.rows.get_mut(&id) else {
            return Ok(None);
        };

        let next_status = decide(order)?;
        order.status = next_status;
        Ok(Some(order.clone()))
    }

    async fn checkout(&self, plan: CheckoutPlan) -> Result<OrderEntity, AppError> {
        let mut tables = self.tables.lock().await;
        let live_items: Vec<CartItemEntity> = tables
            .cart_items
            .rows
            .values()
            .filter(|item| !item.is_frozen())
            .cloned()
            .collect();

        let new_order = plan(&live_items)?;
        let order = tables.orders.insert_with(|id| OrderEntity {
            id,
            customer_id: new_order.customer_id,
            customer_name: new_order.customer_name,
            order_date: new_order.order_date,
            status: new_order.status,
            total_amount: new_order.total_amount,
        });

        for item in &live_items {
            if let Some(row) = tables.cart_items.rows.get_mut(&item.id) {
                row.order_id = Some(order.id);
            }
        }
        Ok(order)
    }
}
