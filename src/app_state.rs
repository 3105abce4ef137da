use std::sync::Arc;

use crate::{
    clock::Clock,
    services::{CartService, OrderService},
    store::Store,
};

/// Shared handler state. Cloning is cheap; everything behind it is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.store.clone(), self.clock.clone())
    }

    pub fn carts(&self) -> CartService {
        CartService::new(self.store.clone())
    }
}
