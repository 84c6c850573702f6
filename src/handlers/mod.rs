pub mod categories;
pub mod common;
pub mod inventory;
pub mod lots;
pub mod movements;
pub mod products;
pub mod warehouses;
