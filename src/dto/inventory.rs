use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::inventory_record;
use crate::services::valuation;
use crate::validation::{Checks, Validate, ValidationOutcome};

/// Registers a product in a warehouse with no stock.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateInventoryRecordRequest {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    /// Reorder threshold
    #[schema(value_type = Option<String>, example = "10")]
    pub minimum_stock: Option<Decimal>,
}

impl Validate for CreateInventoryRecordRequest {
    fn validate(&self) -> ValidationOutcome {
        let mut checks = Checks::new();
        if let Some(minimum) = self.minimum_stock {
            checks
                .non_negative(minimum, "minimum_stock")
                .max_scale(minimum, "minimum_stock");
        }
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct InventoryFilters {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
}

/// Inventory record with its derived stock figures.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryRecordResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    #[schema(value_type = String, example = "10")]
    pub minimum_stock: Decimal,
    /// Running weighted-average unit cost
    #[schema(value_type = String, example = "11.0000")]
    pub current_weighted_average_cost: Decimal,
    /// Sum of the derived quantities of the record's lots
    #[schema(value_type = String, example = "150")]
    pub on_hand: Decimal,
    /// `on_hand * current_weighted_average_cost`
    #[schema(value_type = String, example = "1650.0000")]
    pub stock_value: Decimal,
    pub below_minimum: bool,
    pub lot_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecordResponse {
    pub fn new(model: inventory_record::Model, on_hand: Decimal, lot_count: u64) -> Self {
        Self {
            stock_value: valuation::stock_value(on_hand, model.current_weighted_average_cost),
            below_minimum: on_hand < model.minimum_stock,
            id: model.id,
            product_id: model.product_id,
            warehouse_id: model.warehouse_id,
            minimum_stock: model.minimum_stock,
            current_weighted_average_cost: model.current_weighted_average_cost,
            on_hand,
            lot_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
