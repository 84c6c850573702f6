//! Lot quantity derivation and stock-out planning.
//!
//! A lot's current quantity is never stored: it is the initial quantity
//! minus every OUT movement detail recorded against the lot.

use std::cmp::Ordering;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{lot, movement_detail::Direction};
use crate::errors::ServiceError;

/// Order in which lots are drawn when a stock-out does not name them.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive)]
pub enum LotPolicy {
    /// Earliest receipt first
    #[default]
    #[strum(serialize = "FIFO")]
    Fifo,
    /// Earliest expiry first; lots without expiry last
    #[strum(serialize = "FEFO")]
    Fefo,
}

/// Derived quantity of a lot from its movement details.
///
/// IN details are the lot's own receipt and are already counted in
/// `initial_quantity`. A detail set that over-draws the lot is reported as
/// a data-integrity error.
pub fn current_quantity<I>(
    lot_id: Uuid,
    initial_quantity: Decimal,
    details: I,
) -> Result<Decimal, ServiceError>
where
    I: IntoIterator<Item = (Direction, Decimal)>,
{
    let consumed: Decimal = details
        .into_iter()
        .filter(|(direction, _)| *direction == Direction::Out)
        .map(|(_, quantity)| quantity)
        .sum();

    let remaining = initial_quantity - consumed;
    if remaining < Decimal::ZERO {
        return Err(ServiceError::DataIntegrity(format!(
            "lot {} has {} drawn against an initial quantity of {}",
            lot_id, consumed, initial_quantity
        )));
    }
    Ok(remaining)
}

/// A lot together with its derived quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct LotStock {
    pub lot: lot::Model,
    pub available: Decimal,
}

/// Quantity to take from one lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub lot_id: Uuid,
    pub quantity: Decimal,
}

/// Checks a caller-named draw against the lot's derived quantity.
pub fn plan_named_draw(stock: &LotStock, requested: Decimal) -> Result<Draw, ServiceError> {
    if requested <= Decimal::ZERO {
        return Err(ServiceError::InvalidMovementQuantity(format!(
            "quantity must be greater than zero, got {}",
            requested
        )));
    }
    if stock.available < requested {
        return Err(ServiceError::InsufficientLotQuantity {
            lot_id: stock.lot.id,
            available: stock.available,
            requested,
        });
    }
    Ok(Draw {
        lot_id: stock.lot.id,
        quantity: requested,
    })
}

fn fifo_order(a: &lot::Model, b: &lot::Model) -> Ordering {
    a.received_date
        .cmp(&b.received_date)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn fefo_order(a: &lot::Model, b: &lot::Model) -> Ordering {
    match (a.expiry_date, b.expiry_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| fifo_order(a, b))
}

/// Spreads `requested` over `lots` in policy order.
///
/// Lots with nothing left are skipped, as are lots expired before `today`
/// unless `allow_expired` is set. Either the whole quantity is covered or
/// nothing is drawn.
pub fn plan_automatic_draws(
    lots: &[LotStock],
    requested: Decimal,
    policy: LotPolicy,
    today: NaiveDate,
    allow_expired: bool,
) -> Result<Vec<Draw>, ServiceError> {
    if requested <= Decimal::ZERO {
        return Err(ServiceError::InvalidMovementQuantity(format!(
            "quantity must be greater than zero, got {}",
            requested
        )));
    }

    let mut eligible: Vec<&LotStock> = lots
        .iter()
        .filter(|s| s.available > Decimal::ZERO)
        .filter(|s| allow_expired || !s.lot.is_expired_on(today))
        .collect();
    eligible.sort_by(|a, b| match policy {
        LotPolicy::Fifo => fifo_order(&a.lot, &b.lot),
        LotPolicy::Fefo => fefo_order(&a.lot, &b.lot),
    });

    let mut remaining = requested;
    let mut draws = Vec::new();
    for stock in eligible {
        if remaining.is_zero() {
            break;
        }
        let take = remaining.min(stock.available);
        draws.push(Draw {
            lot_id: stock.lot.id,
            quantity: take,
        });
        remaining -= take;
    }

    if !remaining.is_zero() {
        let available = requested - remaining;
        return Err(ServiceError::InsufficientStock(format!(
            "{} requested but only {} available in eligible lots",
            requested, available
        )));
    }

    Ok(draws)
}
