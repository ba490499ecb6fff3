use std::sync::Arc;

use crate::{
    cart::{CartEngine, CartStore, ProductCatalog, SeaCartStore, SeaProductCatalog},
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub cart_store: Arc<dyn CartStore>,
    pub catalog: Arc<dyn ProductCatalog>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let orm = orm_from_pool(pool);
        Self {
            cart_store: Arc::new(SeaCartStore::new(orm.clone())),
            catalog: Arc::new(SeaProductCatalog::new(orm.clone())),
            orm,
            config: Arc::new(config),
        }
    }

    /// A fresh cart session for one request.
    pub fn cart_engine(&self) -> CartEngine {
        CartEngine::new(self.cart_store.clone(), self.catalog.clone())
    }
}
