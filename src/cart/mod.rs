//! Shopping cart: line storage, the per-session mirror and derived totals.

pub mod engine;
pub mod error;
pub mod memory;
pub mod model;
pub mod sea_store;
pub mod store;
pub mod totals;

pub use engine::{AddLine, CartEngine, FollowHandle, MAX_LINE_QUANTITY};
pub use error::{CartError, CartResult, PersistenceError};
pub use memory::{MemoryCartStore, MemoryCatalog};
pub use model::{CartLine, CartSnapshot, CartView, LineKey, ProductSnapshot};
pub use sea_store::{SeaCartStore, SeaProductCatalog};
pub use store::{CartStore, ProductCatalog};
