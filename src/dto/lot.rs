use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{lot, stock_out_detail};
use crate::validation::{Checks, Validate, ValidationOutcome};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LotResponse {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub lot_number: String,
    pub received_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    #[schema(value_type = String, example = "100")]
    pub initial_quantity: Decimal,
    /// Initial quantity minus everything drawn from the lot
    #[schema(value_type = String, example = "70")]
    pub current_quantity: Decimal,
    #[schema(value_type = String, example = "10.0000")]
    pub unit_cost: Decimal,
    pub notes: Option<String>,
    pub expired: bool,
    pub created_at: DateTime<Utc>,
}

impl LotResponse {
    pub fn new(model: lot::Model, current_quantity: Decimal, today: NaiveDate) -> Self {
        Self {
            expired: model.is_expired_on(today),
            id: model.id,
            inventory_id: model.inventory_id,
            lot_number: model.lot_number,
            received_date: model.received_date,
            expiry_date: model.expiry_date,
            initial_quantity: model.initial_quantity,
            current_quantity,
            unit_cost: model.unit_cost,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}

/// Only the notes of a lot are editable.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateLotNotesRequest {
    pub notes: Option<String>,
}

impl Validate for UpdateLotNotesRequest {
    fn validate(&self) -> ValidationOutcome {
        Checks::new()
            .optional_len(self.notes.as_deref(), "notes", 2000)
            .finish()
    }
}

/// One stock-out draw recorded against a lot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LotConsumptionResponse {
    pub id: Uuid,
    /// The stock-out movement
    pub movement_id: Uuid,
    /// The IN movement detail that received the lot
    pub movement_detail_id: Uuid,
    #[schema(value_type = String, example = "30")]
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<stock_out_detail::Model> for LotConsumptionResponse {
    fn from(model: stock_out_detail::Model) -> Self {
        Self {
            id: model.id,
            movement_id: model.movement_id,
            movement_detail_id: model.movement_detail_id,
            quantity: model.quantity,
            created_at: model.created_at,
        }
    }
}
