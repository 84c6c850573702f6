use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::dto::lot::LotResponse;
use crate::entities::{
    movement::{self, MovementKind},
    movement_detail::{self, Direction},
};
use crate::services::lot_availability::LotPolicy;
use crate::validation::{Checks, Validate, ValidationOutcome};

fn check_text(checks: &mut Checks, reference: Option<&str>, notes: Option<&str>) {
    checks
        .optional_len(reference, "reference", 100)
        .optional_len(notes, "notes", 2000);
}

/// Receives a new lot into a warehouse.
///
/// Quantity must be positive and unit cost non-negative; both are checked
/// by the valuation rules before anything is written.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StockInRequest {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    #[schema(value_type = String, example = "50")]
    pub quantity: Decimal,
    #[schema(value_type = String, example = "13.00")]
    pub unit_cost: Decimal,
    /// Generated from the receipt date when omitted
    pub lot_number: Option<String>,
    /// Defaults to today
    pub received_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub lot_notes: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl Validate for StockInRequest {
    fn validate(&self) -> ValidationOutcome {
        let mut checks = Checks::new();
        checks
            .max_scale(self.quantity, "quantity")
            .max_scale(self.unit_cost, "unit_cost")
            .optional_len(self.lot_notes.as_deref(), "lot_notes", 2000);
        if let Some(number) = &self.lot_number {
            checks.not_blank(number, "lot_number", 64);
        }
        if let (Some(received), Some(expiry)) = (self.received_date, self.expiry_date) {
            checks.check(
                expiry >= received,
                "expiry_date",
                "must not be before received_date",
            );
        }
        check_text(&mut checks, self.reference.as_deref(), self.notes.as_deref());
        checks.finish()
    }
}

/// A caller-chosen lot and the quantity to take from it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LotDrawRequest {
    pub lot_id: Uuid,
    #[schema(value_type = String, example = "30")]
    pub quantity: Decimal,
}

/// Issues stock either from named lots or, when `lots` is empty, by
/// drawing `quantity` in lot-policy order.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StockOutRequest {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    #[serde(default)]
    pub lots: Vec<LotDrawRequest>,
    #[schema(value_type = Option<String>, example = "25")]
    pub quantity: Option<Decimal>,
    /// Overrides the configured default policy
    pub policy: Option<LotPolicy>,
    /// Overrides the configured expired-lot rule
    pub allow_expired: Option<bool>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl Validate for StockOutRequest {
    fn validate(&self) -> ValidationOutcome {
        let mut checks = Checks::new();
        match (self.lots.is_empty(), self.quantity) {
            (true, None) => {
                checks.check(false, "quantity", "required when no lots are named");
            }
            (false, Some(_)) => {
                checks.check(false, "quantity", "must be omitted when lots are named");
            }
            (true, Some(quantity)) => {
                checks.max_scale(quantity, "quantity");
            }
            (false, None) => {
                let mut seen = HashSet::new();
                let unique = self.lots.iter().all(|draw| seen.insert(draw.lot_id));
                checks.check(unique, "lots", "each lot may be named once");
                for draw in &self.lots {
                    checks.max_scale(draw.quantity, "lots.quantity");
                }
                checks.check(
                    self.policy.is_none(),
                    "policy",
                    "only applies when lots are not named",
                );
            }
        }
        check_text(&mut checks, self.reference.as_deref(), self.notes.as_deref());
        checks.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentDirection {
    /// Found stock; received as a new lot
    Increase,
    /// Lost or damaged stock; drawn from lots
    Decrease,
}

/// Corrects stock after a count.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdjustmentRequest {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub direction: AdjustmentDirection,
    #[schema(value_type = String, example = "2")]
    pub quantity: Decimal,
    #[schema(example = "cycle count")]
    pub reason: String,
    /// Increase only; defaults to the current average cost
    #[schema(value_type = Option<String>)]
    pub unit_cost: Option<Decimal>,
    /// Increase only
    pub lot_number: Option<String>,
    /// Increase only
    pub expiry_date: Option<NaiveDate>,
    /// Decrease only; automatic selection when omitted
    pub lot_id: Option<Uuid>,
    pub reference: Option<String>,
}

impl Validate for AdjustmentRequest {
    fn validate(&self) -> ValidationOutcome {
        let mut checks = Checks::new();
        checks
            .not_blank(&self.reason, "reason", 255)
            .max_scale(self.quantity, "quantity");
        match self.direction {
            AdjustmentDirection::Increase => {
                checks.check(self.lot_id.is_none(), "lot_id", "only applies to DECREASE");
                if let Some(cost) = self.unit_cost {
                    checks.max_scale(cost, "unit_cost");
                }
                if let Some(number) = &self.lot_number {
                    checks.not_blank(number, "lot_number", 64);
                }
            }
            AdjustmentDirection::Decrease => {
                checks
                    .check(self.unit_cost.is_none(), "unit_cost", "only applies to INCREASE")
                    .check(
                        self.lot_number.is_none(),
                        "lot_number",
                        "only applies to INCREASE",
                    )
                    .check(
                        self.expiry_date.is_none(),
                        "expiry_date",
                        "only applies to INCREASE",
                    );
            }
        }
        check_text(&mut checks, self.reference.as_deref(), None);
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct MovementFilters {
    pub warehouse_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub kind: Option<MovementKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovementDetailResponse {
    pub id: Uuid,
    pub lot_id: Uuid,
    #[schema(value_type = String, example = "30")]
    pub quantity: Decimal,
    pub direction: Direction,
}

impl From<movement_detail::Model> for MovementDetailResponse {
    fn from(model: movement_detail::Model) -> Self {
        Self {
            id: model.id,
            lot_id: model.lot_id,
            quantity: model.quantity,
            direction: model.direction,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovementResponse {
    pub id: Uuid,
    pub kind: MovementKind,
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub details: Vec<MovementDetailResponse>,
}

impl MovementResponse {
    pub fn new(model: movement::Model, details: Vec<movement_detail::Model>) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            warehouse_id: model.warehouse_id,
            product_id: model.product_id,
            reference: model.reference,
            notes: model.notes,
            created_at: model.created_at,
            details: details.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of a stock-in or an upward adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockInResponse {
    pub movement: MovementResponse,
    pub inventory_id: Uuid,
    pub lot: LotResponse,
    #[schema(value_type = String, example = "10.0000")]
    pub previous_average_cost: Decimal,
    #[schema(value_type = String, example = "11.0000")]
    pub current_average_cost: Decimal,
}

/// Result of a stock-out or a downward adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockOutResponse {
    pub movement: MovementResponse,
    pub inventory_id: Uuid,
    #[schema(value_type = String, example = "30")]
    pub quantity: Decimal,
    /// Unchanged by the stock-out
    #[schema(value_type = String, example = "11.0000")]
    pub current_average_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "direction", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentResponse {
    Increase(StockInResponse),
    Decrease(StockOutResponse),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn stock_out(lots: Vec<LotDrawRequest>, quantity: Option<Decimal>) -> StockOutRequest {
        StockOutRequest {
            warehouse_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            lots,
            quantity,
            policy: None,
            allow_expired: None,
            reference: None,
            notes: None,
        }
    }

    #[test]
    fn stock_out_needs_exactly_one_mode() {
        assert_matches!(
            stock_out(vec![], None).validate(),
            ValidationOutcome::Invalid(_)
        );
        let lot_id = Uuid::new_v4();
        let named = vec![LotDrawRequest {
            lot_id,
            quantity: dec!(1),
        }];
        assert_matches!(
            stock_out(named.clone(), Some(dec!(1))).validate(),
            ValidationOutcome::Invalid(_)
        );
        assert!(stock_out(named, None).validate().is_valid());
        assert!(stock_out(vec![], Some(dec!(3))).validate().is_valid());
    }

    #[test]
    fn stock_out_rejects_repeated_lot() {
        let lot_id = Uuid::new_v4();
        let lots = vec![
            LotDrawRequest {
                lot_id,
                quantity: dec!(1),
            },
            LotDrawRequest {
                lot_id,
                quantity: dec!(2),
            },
        ];
        assert_matches!(
            stock_out(lots, None).validate(),
            ValidationOutcome::Invalid(errors) if errors[0].field == "lots"
        );
    }

    #[test]
    fn stock_in_sign_checks_are_left_to_valuation() {
        let req: StockInRequest = serde_json::from_value(serde_json::json!({
            "warehouse_id": Uuid::new_v4(),
            "product_id": Uuid::new_v4(),
            "quantity": "-5",
            "unit_cost": "-1"
        }))
        .unwrap();
        assert!(req.validate().is_valid());
    }

    #[test]
    fn stock_in_expiry_before_receipt_is_rejected() {
        let req: StockInRequest = serde_json::from_value(serde_json::json!({
            "warehouse_id": Uuid::new_v4(),
            "product_id": Uuid::new_v4(),
            "quantity": "5",
            "unit_cost": "1",
            "received_date": "2024-05-10",
            "expiry_date": "2024-05-01"
        }))
        .unwrap();
        assert_matches!(req.validate(), ValidationOutcome::Invalid(errors) if errors[0].field == "expiry_date");
    }

    #[test]
    fn decrease_adjustment_cannot_carry_cost() {
        let req: AdjustmentRequest = serde_json::from_value(serde_json::json!({
            "warehouse_id": Uuid::new_v4(),
            "product_id": Uuid::new_v4(),
            "direction": "DECREASE",
            "quantity": "1",
            "reason": "",
            "unit_cost": "2"
        }))
        .unwrap();
        assert_matches!(req.validate(), ValidationOutcome::Invalid(errors) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["reason", "unit_cost"]);
        });
    }
}
