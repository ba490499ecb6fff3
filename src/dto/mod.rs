pub mod auth;
pub mod cart;
pub mod categories;
pub mod delivery;
pub mod orders;
pub mod products;
