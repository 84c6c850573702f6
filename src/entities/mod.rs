pub mod category;
pub mod inventory_record;
pub mod lot;
pub mod movement;
pub mod movement_detail;
pub mod product;
pub mod stock_out_detail;
pub mod warehouse;
