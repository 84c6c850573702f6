pub mod catalog;
pub mod inventory;
pub mod lot_availability;
pub mod valuation;
