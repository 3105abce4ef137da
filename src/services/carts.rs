use std::sync::Arc;

use tracing::info;

use crate::{
    app_error::AppError,
    models::{CartItemEntity, CreateCartItemEntity, ProductEntity, UpdateCartItemEntity},
    store::Store,
};

/// Cart line CRUD over the single shared cart.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn Store>,
}

impl CartService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn product(&self, product_id: i64) -> Result<ProductEntity, AppError> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or(AppError::not_found("Product", product_id))
    }

    fn frozen(item_id: i64) -> AppError {
        AppError::BusinessRule(format!(
            "Cart item {} belongs to a placed order and cannot be modified",
            item_id
        ))
    }

    /// Explains a conditional write that matched no live line: the line is now either
    /// frozen or gone.
    async fn lost_write(&self, id: i64) -> AppError {
        match self.store.find_cart_item(id).await {
            Ok(Some(_)) => Self::frozen(id),
            Ok(None) => AppError::not_found("Cart item", id),
            Err(err) => err,
        }
    }

    /// Live and frozen lines alike.
    pub async fn list_cart(&self) -> Result<Vec<CartItemEntity>, AppError> {
        self.store.list_cart_items().await
    }

    pub async fn add_line(&self, product_id: i64, quantity: i32) -> Result<CartItemEntity, AppError> {
        if quantity <= 0 {
            return Err(AppError::validation("quantity", "Quantity must be positive"));
        }

        let product = self.product(product_id).await?;
        let item = self
            .store
            .insert_cart_item(CreateCartItemEntity {
                product_id: product.id,
                product_name: product.name,
                price: product.price,
                quantity,
            })
            .await?;

        info!(
            "Cart item #{} added ({} x product #{})",
            item.id, item.quantity, item.product_id
        );
        Ok(item)
    }

    pub async fn update_line(
        &self,
        id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<CartItemEntity, AppError> {
        if quantity <= 0 {
            return Err(AppError::validation("quantity", "Quantity must be positive"));
        }

        let existing = self
            .store
            .find_cart_item(id)
            .await?
            .ok_or(AppError::not_found("Cart item", id))?;
        if existing.is_frozen() {
            return Err(Self::frozen(id));
        }

        let product = self.product(product_id).await?;
        let changes = UpdateCartItemEntity {
            product_id: product.id,
            product_name: product.name,
            price: product.price,
            quantity,
        };

        // Checkout or a concurrent delete may have changed the line since it was read.
        let Some(item) = self.store.update_live_cart_item(id, changes).await? else {
            return Err(self.lost_write(id).await);
        };

        info!("Cart item #{} updated", item.id);
        Ok(item)
    }

    pub async fn delete_line(&self, id: i64) -> Result<(), AppError> {
        let existing = self
            .store
            .find_cart_item(id)
            .await?
            .ok_or(AppError::not_found("Cart item", id))?;
        if existing.is_frozen() {
            return Err(Self::frozen(id));
        }
        if !self.store.delete_live_cart_item(id).await? {
            return Err(self.lost_write(id).await);
        }

        info!("Cart item #{} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        models::{CreateOrderEntity, CreateProductEntity, OrderEntity, OrderStatus},
        pagination::{OrderFilter, PageRequest},
        store::{CheckoutPlan, MemoryStore, StatusDecision},
    };

    /// Removes the targeted line right before every conditional write, as a concurrent
    /// delete landing between the service's read and its write would.
    struct DeletedBeforeWrite(Arc<MemoryStore>);

    #[async_trait]
    impl Store for DeletedBeforeWrite {
        async fn find_product(&self, id: i64) -> Result<Option<ProductEntity>, AppError> {
            self.0.find_product(id).await
        }

        async fn list_cart_items(&self) -> Result<Vec<CartItemEntity>, AppError> {
            self.0.list_cart_items().await
        }

        async fn find_cart_item(&self, id: i64) -> Result<Option<CartItemEntity>, AppError> {
            self.0.find_cart_item(id).await
        }

        async fn insert_cart_item(
            &self,
            item: CreateCartItemEntity,
        ) -> Result<CartItemEntity, AppError> {
            self.0.insert_cart_item(item).await
        }

        async fn update_live_cart_item(
            &self,
            id: i64,
            changes: UpdateCartItemEntity,
        ) -> Result<Option<CartItemEntity>, AppError> {
            self.0.delete_live_cart_item(id).await?;
            self.0.update_live_cart_item(id, changes).await
        }

        async fn delete_live_cart_item(&self, id: i64) -> Result<bool, AppError> {
            self.0.delete_live_cart_item(id).await?;
            self.0.delete_live_cart_item(id).await
        }

        async fn insert_order(&self, order: CreateOrderEntity) -> Result<OrderEntity, AppError> {
            self.0.insert_order(order).await
        }

        async fn find_order(&self, id: i64) -> Result<Option<OrderEntity>, AppError> {
            self.0.find_order(id).await
        }

        async fn list_orders(
            &self,
            filter: &OrderFilter,
            page: &PageRequest,
        ) -> Result<(Vec<OrderEntity>, i64), AppError> {
            self.0.list_orders(filter, page).await
        }

        async fn transition_order(
            &self,
            id: i64,
            decide: StatusDecision,
        ) -> Result<Option<OrderEntity>, AppError> {
            self.0.transition_order(id, decide).await
        }

        async fn checkout(&self, plan: CheckoutPlan) -> Result<OrderEntity, AppError> {
            self.0.checkout(plan).await
        }
    }

    async fn store_with_catalog() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store
            .add_product(CreateProductEntity {
                name: "Laptop".into(),
                price: 999.99,
                description: None,
            })
            .await;
        store
            .add_product(CreateProductEntity {
                name: "Mouse".into(),
                price: 29.99,
                description: Some("Wireless mouse".into()),
            })
            .await;
        Arc::new(store)
    }

    async fn freeze_cart(store: &MemoryStore) {
        store
            .checkout(Box::new(
                |_: &[CartItemEntity]| -> Result<CreateOrderEntity, AppError> {
                    Ok(CreateOrderEntity {
                        customer_id: 1,
                        customer_name: None,
                        order_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                            .unwrap()
                            .and_hms_opt(0, 0, 0)
                            .unwrap(),
                        status: OrderStatus::Created,
                        total_amount: 1.0,
                    })
                },
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn add_snapshots_product_name_and_price() {
        let carts = CartService::new(store_with_catalog().await);
        let item = carts.add_line(2, 3).await.unwrap();

        assert_eq!(item.product_name, "Mouse");
        assert_eq!(item.price, 29.99);
        assert_eq!(item.quantity, 3);
        assert_eq!(item.order_id, None);
    }

    #[tokio::test]
    async fn add_with_unknown_product_is_not_found() {
        let carts = CartService::new(store_with_catalog().await);
        let err = carts.add_line(99, 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Product not found with id: 99");
    }

    #[tokio::test]
    async fn update_takes_a_fresh_snapshot() {
        let carts = CartService::new(store_with_catalog().await);
        let item = carts.add_line(1, 1).await.unwrap();

        let updated = carts.update_line(item.id, 2, 4).await.unwrap();
        assert_eq!(updated.id, item.id);
        assert_eq!(updated.product_id, 2);
        assert_eq!(updated.product_name, "Mouse");
        assert_eq!(updated.price, 29.99);
        assert_eq!(updated.quantity, 4);
    }

    #[tokio::test]
    async fn missing_line_is_not_found() {
        let carts = CartService::new(store_with_catalog().await);
        assert_eq!(
            carts.update_line(5, 1, 1).await.unwrap_err().to_string(),
            "Cart item not found with id: 5"
        );
        assert!(matches!(
            carts.delete_line(5).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn frozen_lines_reject_update_and_delete() {
        let store = store_with_catalog().await;
        let carts = CartService::new(store.clone());
        let item = carts.add_line(1, 1).await.unwrap();
        freeze_cart(&store).await;

        assert!(matches!(
            carts.update_line(item.id, 2, 2).await,
            Err(AppError::BusinessRule(_))
        ));
        assert!(matches!(
            carts.delete_line(item.id).await,
            Err(AppError::BusinessRule(_))
        ));
        assert_eq!(carts.list_cart().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_live_line() {
        let carts = CartService::new(store_with_catalog().await);
        let item = carts.add_line(1, 1).await.unwrap();

        carts.delete_line(item.id).await.unwrap();
        assert!(carts.list_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn line_deleted_concurrently_is_not_found() {
        let store = store_with_catalog().await;
        let item = CartService::new(store.clone()).add_line(1, 1).await.unwrap();
        let carts = CartService::new(Arc::new(DeletedBeforeWrite(store.clone())));

        assert!(matches!(
            carts.update_line(item.id, 2, 2).await,
            Err(AppError::NotFound { kind: "Cart item", .. })
        ));

        let item = CartService::new(store.clone()).add_line(1, 1).await.unwrap();
        assert!(matches!(
            carts.delete_line(item.id).await,
            Err(AppError::NotFound { kind: "Cart item", .. })
        ));
    }
}
