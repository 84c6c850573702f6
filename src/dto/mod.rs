//! Request and response bodies of the REST API.

pub mod category;
pub mod inventory;
pub mod lot;
pub mod movement;
pub mod product;
pub mod warehouse;
