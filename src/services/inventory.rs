//! Transactional stock movements over inventory records and lots.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
    TransactionTrait,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::{self, DbPool},
    dto::{
        inventory::{CreateInventoryRecordRequest, InventoryFilters, InventoryRecordResponse},
        lot::{LotConsumptionResponse, LotResponse},
        movement::{
            AdjustmentDirection, AdjustmentRequest, AdjustmentResponse, MovementFilters,
            MovementResponse, StockInRequest, StockInResponse, StockOutRequest, StockOutResponse,
        },
    },
    entities::{
        inventory_record, lot,
        movement::{self, MovementKind},
        movement_detail::{self, Direction},
        product, stock_out_detail, warehouse,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        lot_availability::{self, Draw, LotPolicy, LotStock},
        valuation,
    },
};

/// Defaults applied when a stock-out leaves lot selection to the service.
#[derive(Debug, Clone, Copy, Default)]
pub struct LotRules {
    pub default_policy: LotPolicy,
    pub allow_expired: bool,
}

/// One inbound line: a new lot received by a stock-in or an upward
/// adjustment.
#[derive(Debug, Clone)]
struct Inbound {
    kind: MovementKind,
    warehouse_id: Uuid,
    product_id: Uuid,
    quantity: Decimal,
    /// `None` receives at the record's current average.
    unit_cost: Option<Decimal>,
    lot_number: Option<String>,
    received_date: NaiveDate,
    expiry_date: Option<NaiveDate>,
    lot_notes: Option<String>,
    reference: Option<String>,
    notes: Option<String>,
}

#[derive(Debug)]
struct Received {
    movement: movement::Model,
    detail: movement_detail::Model,
    lot: lot::Model,
    record: inventory_record::Model,
    previous_average: Decimal,
}

#[derive(Debug, Clone)]
enum LotSelection {
    Named(Vec<(Uuid, Decimal)>),
    Automatic {
        quantity: Decimal,
        policy: LotPolicy,
        allow_expired: bool,
    },
}

#[derive(Debug, Clone)]
struct Outbound {
    kind: MovementKind,
    warehouse_id: Uuid,
    product_id: Uuid,
    selection: LotSelection,
    reference: Option<String>,
    notes: Option<String>,
}

#[derive(Debug)]
struct Issued {
    movement: movement::Model,
    details: Vec<movement_detail::Model>,
    record: inventory_record::Model,
    quantity: Decimal,
}

/// Service for stock movements and the read side of inventory records,
/// lots and movements.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    lot_rules: LotRules,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, lot_rules: LotRules) -> Self {
        Self {
            db_pool,
            event_sender,
            lot_rules,
        }
    }

    /// Receives a new lot and recomputes the record's weighted-average cost.
    ///
    /// The inventory record is created on the first receipt of the product
    /// in the warehouse.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, warehouse_id = %request.warehouse_id))]
    pub async fn stock_in(&self, request: StockInRequest) -> Result<StockInResponse, ServiceError> {
        valuation::validate_inbound(request.quantity, request.unit_cost)?;

        let today = Utc::now().date_naive();
        let inbound = Inbound {
            kind: MovementKind::StockIn,
            warehouse_id: request.warehouse_id,
            product_id: request.product_id,
            quantity: request.quantity,
            unit_cost: Some(request.unit_cost),
            lot_number: request.lot_number,
            received_date: request.received_date.unwrap_or(today),
            expiry_date: request.expiry_date,
            lot_notes: request.lot_notes,
            reference: request.reference,
            notes: request.notes,
        };

        let start = std::time::Instant::now();
        let received = db::with_transaction(&self.db_pool, move |txn| {
            Box::pin(async move { receive(txn, inbound).await })
        })
        .await?;
        histogram!("stockroom_inventory.stock_in.duration", start.elapsed());
        counter!("stockroom_inventory.stock_in", 1);

        info!(
            movement_id = %received.movement.id,
            lot_id = %received.lot.id,
            average_cost = %received.record.current_weighted_average_cost,
            "Stock received"
        );
        self.event_sender
            .send_or_log(Event::StockReceived {
                movement_id: received.movement.id,
                inventory_id: received.record.id,
                lot_id: received.lot.id,
                quantity: received.detail.quantity,
                unit_cost: received.lot.unit_cost,
                at: received.movement.created_at,
            })
            .await;
        self.publish_average_change(&received).await;

        Ok(stock_in_response(received, today))
    }

    /// Issues stock from named lots or in lot-policy order.
    ///
    /// The weighted-average cost is left untouched.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, warehouse_id = %request.warehouse_id))]
    pub async fn stock_out(&self, request: StockOutRequest) -> Result<StockOutResponse, ServiceError> {
        let selection = if request.lots.is_empty() {
            let quantity = request
                .quantity
                .ok_or_else(|| ServiceError::invalid_field("quantity", "required when no lots are named"))?;
            LotSelection::Automatic {
                quantity,
                policy: request.policy.unwrap_or(self.lot_rules.default_policy),
                allow_expired: request.allow_expired.unwrap_or(self.lot_rules.allow_expired),
            }
        } else {
            LotSelection::Named(
                request
                    .lots
                    .iter()
                    .map(|draw| (draw.lot_id, draw.quantity))
                    .collect(),
            )
        };
        let outbound = Outbound {
            kind: MovementKind::StockOut,
            warehouse_id: request.warehouse_id,
            product_id: request.product_id,
            selection,
            reference: request.reference,
            notes: request.notes,
        };

        let issued = self.issue_outbound(outbound).await?;
        counter!("stockroom_inventory.stock_out", 1);

        self.event_sender
            .send_or_log(Event::StockIssued {
                movement_id: issued.movement.id,
                inventory_id: issued.record.id,
                lot_ids: issued.details.iter().map(|d| d.lot_id).collect(),
                quantity: issued.quantity,
                at: issued.movement.created_at,
            })
            .await;

        Ok(stock_out_response(issued))
    }

    /// Corrects stock after a count.
    ///
    /// An increase receives a new lot at the given cost, or at the current
    /// average when none is given. A decrease draws from the named lot or in
    /// the default lot order, and never changes the average.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, direction = ?request.direction))]
    pub async fn adjust(&self, request: AdjustmentRequest) -> Result<AdjustmentResponse, ServiceError> {
        let reason = request.reason.trim().to_string();
        match request.direction {
            AdjustmentDirection::Increase => {
                match request.unit_cost {
                    Some(cost) => valuation::validate_inbound(request.quantity, cost)?,
                    None => valuation::validate_inbound(request.quantity, Decimal::ZERO)?,
                }

                let today = Utc::now().date_naive();
                let inbound = Inbound {
                    kind: MovementKind::AdjustmentIn,
                    warehouse_id: request.warehouse_id,
                    product_id: request.product_id,
                    quantity: request.quantity,
                    unit_cost: request.unit_cost,
                    lot_number: request.lot_number,
                    received_date: today,
                    expiry_date: request.expiry_date,
                    lot_notes: None,
                    reference: request.reference,
                    notes: Some(reason.clone()),
                };
                let received = db::with_transaction(&self.db_pool, move |txn| {
                    Box::pin(async move { receive(txn, inbound).await })
                })
                .await?;
                counter!("stockroom_inventory.adjustment", 1, "direction" => "increase");

                self.event_sender
                    .send_or_log(Event::InventoryAdjusted {
                        movement_id: received.movement.id,
                        inventory_id: received.record.id,
                        quantity_delta: received.detail.quantity,
                        reason: Some(reason),
                        at: received.movement.created_at,
                    })
                    .await;
                self.publish_average_change(&received).await;

                Ok(AdjustmentResponse::Increase(stock_in_response(received, today)))
            }
            AdjustmentDirection::Decrease => {
                let selection = match request.lot_id {
                    Some(lot_id) => LotSelection::Named(vec![(lot_id, request.quantity)]),
                    None => LotSelection::Automatic {
                        quantity: request.quantity,
                        policy: self.lot_rules.default_policy,
                        allow_expired: true,
                    },
                };
                let outbound = Outbound {
                    kind: MovementKind::AdjustmentOut,
                    warehouse_id: request.warehouse_id,
                    product_id: request.product_id,
                    selection,
                    reference: request.reference,
                    notes: Some(reason.clone()),
                };

                let issued = self.issue_outbound(outbound).await?;
                counter!("stockroom_inventory.adjustment", 1, "direction" => "decrease");

                self.event_sender
                    .send_or_log(Event::InventoryAdjusted {
                        movement_id: issued.movement.id,
                        inventory_id: issued.record.id,
                        quantity_delta: -issued.quantity,
                        reason: Some(reason),
                        at: issued.movement.created_at,
                    })
                    .await;

                Ok(AdjustmentResponse::Decrease(stock_out_response(issued)))
            }
        }
    }

    async fn issue_outbound(&self, outbound: Outbound) -> Result<Issued, ServiceError> {
        let today = Utc::now().date_naive();
        let start = std::time::Instant::now();
        let result = db::with_transaction(&self.db_pool, move |txn| {
            Box::pin(async move { issue(txn, outbound, today).await })
        })
        .await;
        histogram!("stockroom_inventory.stock_out.duration", start.elapsed());

        match &result {
            Ok(issued) => info!(
                movement_id = %issued.movement.id,
                quantity = %issued.quantity,
                lots = issued.details.len(),
                "Stock issued"
            ),
            Err(
                e @ (ServiceError::InsufficientLotQuantity { .. }
                | ServiceError::InsufficientStock(_)),
            ) => {
                counter!("stockroom_inventory.stock_out.rejected", 1);
                warn!(error = %e, "Stock-out rejected");
            }
            Err(_) => {}
        }
        result
    }

    async fn publish_average_change(&self, received: &Received) {
        let new_cost = received.record.current_weighted_average_cost;
        if new_cost != received.previous_average {
            self.event_sender
                .send_or_log(Event::AverageCostChanged {
                    inventory_id: received.record.id,
                    old_cost: received.previous_average,
                    new_cost,
                })
                .await;
        }
    }

    /// Registers a product in a warehouse with no stock and a zero average.
    #[instrument(skip(self, request))]
    pub async fn create_record(
        &self,
        request: CreateInventoryRecordRequest,
    ) -> Result<InventoryRecordResponse, ServiceError> {
        let db = self.db_pool.as_ref();
        require_product(db, request.product_id).await?;
        require_warehouse(db, request.warehouse_id).await?;

        if find_record(db, request.product_id, request.warehouse_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::ConstraintViolation(format!(
                "Inventory record for product {} in warehouse {} already exists",
                request.product_id, request.warehouse_id
            )));
        }

        let now = Utc::now();
        let record = inventory_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(request.product_id),
            warehouse_id: Set(request.warehouse_id),
            minimum_stock: Set(request.minimum_stock.unwrap_or(Decimal::ZERO)),
            current_weighted_average_cost: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write_err(e, "Inventory record"))?;

        info!(inventory_id = %record.id, "Inventory record created");
        Ok(InventoryRecordResponse::new(record, Decimal::ZERO, 0))
    }

    /// Inventory record with on-hand quantity and valuation.
    #[instrument(skip(self))]
    pub async fn get_record(&self, id: Uuid) -> Result<InventoryRecordResponse, ServiceError> {
        let db = self.db_pool.as_ref();
        let record = inventory_record::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory record {} not found", id)))?;

        let mut summaries = summarize_records(db, &[record.id]).await?;
        let (on_hand, lot_count) = summaries.remove(&record.id).unwrap_or_default();
        Ok(InventoryRecordResponse::new(record, on_hand, lot_count))
    }

    /// Lists inventory records, newest first.
    #[instrument(skip(self))]
    pub async fn list_records(
        &self,
        filters: InventoryFilters,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<InventoryRecordResponse>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query =
            inventory_record::Entity::find().order_by_desc(inventory_record::Column::CreatedAt);
        if let Some(product_id) = filters.product_id {
            query = query.filter(inventory_record::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = filters.warehouse_id {
            query = query.filter(inventory_record::Column::WarehouseId.eq(warehouse_id));
        }

        let paginator = query.paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let records = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut summaries = summarize_records(db, &ids).await?;
        let items = records
            .into_iter()
            .map(|record| {
                let (on_hand, lot_count) = summaries.remove(&record.id).unwrap_or_default();
                InventoryRecordResponse::new(record, on_hand, lot_count)
            })
            .collect();

        Ok((items, total))
    }

    /// Deletes a record that never received stock.
    #[instrument(skip(self))]
    pub async fn delete_record(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let record = inventory_record::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory record {} not found", id)))?;

        let lot_count = lot::Entity::find()
            .filter(lot::Column::InventoryId.eq(record.id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if lot_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "Inventory record {} still has {} lot(s)",
                id, lot_count
            )));
        }

        inventory_record::Entity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(|e| ServiceError::from_write_err(e, "Inventory record"))?;
        info!(inventory_id = %id, "Inventory record deleted");
        Ok(())
    }

    /// Lots of a record in receipt order, with their derived quantities.
    #[instrument(skip(self))]
    pub async fn list_lots(&self, inventory_id: Uuid) -> Result<Vec<LotResponse>, ServiceError> {
        let db = self.db_pool.as_ref();
        inventory_record::Entity::find_by_id(inventory_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory record {} not found", inventory_id))
            })?;

        let lots = lot::Entity::find()
            .filter(lot::Column::InventoryId.eq(inventory_id))
            .order_by_asc(lot::Column::ReceivedDate)
            .order_by_asc(lot::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let today = Utc::now().date_naive();
        Ok(derive_lot_stock(db, lots)
            .await?
            .into_iter()
            .map(|stock| LotResponse::new(stock.lot, stock.available, today))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_lot(&self, id: Uuid) -> Result<LotResponse, ServiceError> {
        let db = self.db_pool.as_ref();
        let lot = find_lot(db, id).await?;
        let stock = single_lot_stock(db, lot).await?;
        Ok(LotResponse::new(stock.lot, stock.available, Utc::now().date_naive()))
    }

    /// Replaces the notes of a lot. Quantity and cost are immutable.
    #[instrument(skip(self, notes))]
    pub async fn update_lot_notes(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<LotResponse, ServiceError> {
        let db = self.db_pool.as_ref();
        let lot = find_lot(db, id).await?;

        let mut active: lot::ActiveModel = lot.into();
        active.notes = Set(notes);
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        let stock = single_lot_stock(db, updated).await?;
        Ok(LotResponse::new(stock.lot, stock.available, Utc::now().date_naive()))
    }

    /// Stock-out trace rows recorded against a lot, oldest first.
    #[instrument(skip(self))]
    pub async fn lot_consumptions(
        &self,
        id: Uuid,
    ) -> Result<Vec<LotConsumptionResponse>, ServiceError> {
        let db = self.db_pool.as_ref();
        find_lot(db, id).await?;

        let rows = stock_out_detail::Entity::find()
            .join(
                JoinType::InnerJoin,
                stock_out_detail::Relation::MovementDetail.def(),
            )
            .filter(movement_detail::Column::LotId.eq(id))
            .order_by_asc(stock_out_detail::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Lists movement headers with their lines, newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        filters: MovementFilters,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<MovementResponse>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = movement::Entity::find().order_by_desc(movement::Column::CreatedAt);
        if let Some(warehouse_id) = filters.warehouse_id {
            query = query.filter(movement::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(product_id) = filters.product_id {
            query = query.filter(movement::Column::ProductId.eq(product_id));
        }
        if let Some(kind) = filters.kind {
            query = query.filter(movement::Column::Kind.eq(kind));
        }

        let paginator = query.paginate(db, per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let headers = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        let ids: Vec<Uuid> = headers.iter().map(|m| m.id).collect();
        let mut details_by_movement: HashMap<Uuid, Vec<movement_detail::Model>> = HashMap::new();
        if !ids.is_empty() {
            let details = movement_detail::Entity::find()
                .filter(movement_detail::Column::MovementId.is_in(ids))
                .order_by_asc(movement_detail::Column::CreatedAt)
                .all(db)
                .await
                .map_err(ServiceError::db_error)?;
            for detail in details {
                details_by_movement
                    .entry(detail.movement_id)
                    .or_default()
                    .push(detail);
            }
        }

        let items = headers
            .into_iter()
            .map(|header| {
                let details = details_by_movement.remove(&header.id).unwrap_or_default();
                MovementResponse::new(header, details)
            })
            .collect();
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get_movement(&self, id: Uuid) -> Result<MovementResponse, ServiceError> {
        let db = self.db_pool.as_ref();
        let header = movement::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Movement {} not found", id)))?;
        let details = movement_detail::Entity::find()
            .filter(movement_detail::Column::MovementId.eq(id))
            .order_by_asc(movement_detail::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(MovementResponse::new(header, details))
    }
}

fn stock_in_response(received: Received, today: NaiveDate) -> StockInResponse {
    let current_quantity = received.lot.initial_quantity;
    StockInResponse {
        inventory_id: received.record.id,
        previous_average_cost: received.previous_average,
        current_average_cost: received.record.current_weighted_average_cost,
        lot: LotResponse::new(received.lot, current_quantity, today),
        movement: MovementResponse::new(received.movement, vec![received.detail]),
    }
}

fn stock_out_response(issued: Issued) -> StockOutResponse {
    StockOutResponse {
        inventory_id: issued.record.id,
        quantity: issued.quantity,
        current_average_cost: issued.record.current_weighted_average_cost,
        movement: MovementResponse::new(issued.movement, issued.details),
    }
}

/// Lot number used when a receipt does not carry one.
fn generated_lot_number(received: NaiveDate, lot_id: Uuid) -> String {
    let suffix: String = lot_id.simple().to_string().chars().take(8).collect();
    format!("L{}-{}", received.format("%Y%m%d"), suffix.to_uppercase())
}

async fn receive(txn: &DatabaseTransaction, inbound: Inbound) -> Result<Received, ServiceError> {
    require_product(txn, inbound.product_id).await?;
    require_warehouse(txn, inbound.warehouse_id).await?;

    let now = Utc::now();
    let record = match find_record_for_update(txn, inbound.product_id, inbound.warehouse_id).await?
    {
        Some(record) => record,
        None => insert_or_lock_record(txn, inbound.product_id, inbound.warehouse_id).await?,
    };

    let prior_inbound: Decimal = lot::Entity::find()
        .filter(lot::Column::InventoryId.eq(record.id))
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?
        .iter()
        .map(|l| l.initial_quantity)
        .sum();

    let previous_average = record.current_weighted_average_cost;
    let unit_cost = inbound.unit_cost.unwrap_or(previous_average);
    let new_average =
        valuation::recalculate_average(prior_inbound, previous_average, inbound.quantity, unit_cost)?;

    let lot_id = Uuid::new_v4();
    let lot_number = inbound
        .lot_number
        .map(|n| n.trim().to_string())
        .unwrap_or_else(|| generated_lot_number(inbound.received_date, lot_id));
    let lot = lot::ActiveModel {
        id: Set(lot_id),
        inventory_id: Set(record.id),
        lot_number: Set(lot_number),
        received_date: Set(inbound.received_date),
        initial_quantity: Set(inbound.quantity),
        unit_cost: Set(unit_cost),
        expiry_date: Set(inbound.expiry_date),
        notes: Set(inbound.lot_notes),
        created_at: Set(now),
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)?;

    let movement = insert_movement(
        txn,
        inbound.kind,
        inbound.warehouse_id,
        inbound.product_id,
        inbound.reference,
        inbound.notes,
    )
    .await?;
    let detail = insert_detail(txn, movement.id, lot.id, inbound.quantity, Direction::In).await?;

    let mut active: inventory_record::ActiveModel = record.into();
    active.current_weighted_average_cost = Set(new_average);
    active.updated_at = Set(now);
    let record = active.update(txn).await.map_err(ServiceError::db_error)?;

    Ok(Received {
        movement,
        detail,
        lot,
        record,
        previous_average,
    })
}

async fn issue(
    txn: &DatabaseTransaction,
    outbound: Outbound,
    today: NaiveDate,
) -> Result<Issued, ServiceError> {
    let record = find_record_for_update(txn, outbound.product_id, outbound.warehouse_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No inventory for product {} in warehouse {}",
                outbound.product_id, outbound.warehouse_id
            ))
        })?;

    let lots_query = lot::Entity::find()
        .filter(lot::Column::InventoryId.eq(record.id))
        .order_by_asc(lot::Column::ReceivedDate);
    let lots = db::lock_for_update(lots_query, txn.get_database_backend())
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?;
    let stock = derive_lot_stock(txn, lots).await?;

    let draws = match outbound.selection {
        LotSelection::Named(requests) => {
            // Draws are planned against one snapshot; a repeated lot would overdraw.
            let mut seen = HashSet::new();
            if !requests.iter().all(|(lot_id, _)| seen.insert(*lot_id)) {
                return Err(ServiceError::invalid_field("lots", "each lot may be named once"));
            }
            requests
                .into_iter()
                .map(|(lot_id, quantity)| {
                    let lot_stock = stock.iter().find(|s| s.lot.id == lot_id).ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Lot {} not found in inventory record {}",
                            lot_id, record.id
                        ))
                    })?;
                    lot_availability::plan_named_draw(lot_stock, quantity)
                })
                .collect::<Result<Vec<Draw>, ServiceError>>()?
        }
        LotSelection::Automatic {
            quantity,
            policy,
            allow_expired,
        } => lot_availability::plan_automatic_draws(&stock, quantity, policy, today, allow_expired)?,
    };

    let receipts = receipt_details(txn, draws.iter().map(|d| d.lot_id).collect()).await?;

    let movement = insert_movement(
        txn,
        outbound.kind,
        outbound.warehouse_id,
        outbound.product_id,
        outbound.reference,
        outbound.notes,
    )
    .await?;

    let mut details = Vec::with_capacity(draws.len());
    let mut quantity = Decimal::ZERO;
    for draw in draws {
        let receipt_id = receipts.get(&draw.lot_id).copied().ok_or_else(|| {
            ServiceError::DataIntegrity(format!("lot {} has no receiving movement detail", draw.lot_id))
        })?;
        let detail = insert_detail(txn, movement.id, draw.lot_id, draw.quantity, Direction::Out).await?;

        stock_out_detail::ActiveModel {
            id: Set(Uuid::new_v4()),
            movement_detail_id: Set(receipt_id),
            movement_id: Set(movement.id),
            quantity: Set(draw.quantity),
            created_at: Set(Utc::now()),
        }
        .insert(txn)
        .await
        .map_err(|e| ServiceError::from_write_err(e, "Stock-out detail"))?;

        quantity += draw.quantity;
        details.push(detail);
    }

    Ok(Issued {
        movement,
        details,
        record,
        quantity,
    })
}

/// The IN movement detail that received each lot.
async fn receipt_details(
    txn: &DatabaseTransaction,
    lot_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Uuid>, ServiceError> {
    if lot_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = movement_detail::Entity::find()
        .filter(movement_detail::Column::LotId.is_in(lot_ids))
        .filter(movement_detail::Column::Direction.eq(Direction::In))
        .order_by_asc(movement_detail::Column::CreatedAt)
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut receipts = HashMap::new();
    for row in rows {
        receipts.entry(row.lot_id).or_insert(row.id);
    }
    Ok(receipts)
}

async fn insert_movement(
    txn: &DatabaseTransaction,
    kind: MovementKind,
    warehouse_id: Uuid,
    product_id: Uuid,
    reference: Option<String>,
    notes: Option<String>,
) -> Result<movement::Model, ServiceError> {
    movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(kind),
        warehouse_id: Set(warehouse_id),
        product_id: Set(product_id),
        reference: Set(reference),
        notes: Set(notes),
        created_at: Set(Utc::now()),
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)
}

async fn insert_detail(
    txn: &DatabaseTransaction,
    movement_id: Uuid,
    lot_id: Uuid,
    quantity: Decimal,
    direction: Direction,
) -> Result<movement_detail::Model, ServiceError> {
    movement_detail::ActiveModel {
        id: Set(Uuid::new_v4()),
        movement_id: Set(movement_id),
        lot_id: Set(lot_id),
        quantity: Set(quantity),
        direction: Set(direction),
        created_at: Set(Utc::now()),
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)
}

async fn require_product<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<product::Model, ServiceError> {
    product::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
}

async fn require_warehouse<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<warehouse::Model, ServiceError> {
    warehouse::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", id)))
}

async fn find_record<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<Option<inventory_record::Model>, ServiceError> {
    inventory_record::Entity::find()
        .filter(inventory_record::Column::ProductId.eq(product_id))
        .filter(inventory_record::Column::WarehouseId.eq(warehouse_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

async fn find_record_for_update(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<Option<inventory_record::Model>, ServiceError> {
    let query = inventory_record::Entity::find()
        .filter(inventory_record::Column::ProductId.eq(product_id))
        .filter(inventory_record::Column::WarehouseId.eq(warehouse_id));
    db::lock_for_update(query, txn.get_database_backend())
        .one(txn)
        .await
        .map_err(ServiceError::db_error)
}

/// Creates the record for a first receipt.
///
/// Two first receipts of the same pair can both find no row to lock. The
/// insert runs under a savepoint so the one that loses the unique index
/// rolls back only the insert, then waits on the winner's row.
async fn insert_or_lock_record(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<inventory_record::Model, ServiceError> {
    let now = Utc::now();
    let savepoint = txn.begin().await.map_err(ServiceError::db_error)?;
    let inserted = inventory_record::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        warehouse_id: Set(warehouse_id),
        minimum_stock: Set(Decimal::ZERO),
        current_weighted_average_cost: Set(Decimal::ZERO),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&savepoint)
    .await;

    match inserted {
        Ok(record) => {
            savepoint.commit().await.map_err(ServiceError::db_error)?;
            Ok(record)
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            savepoint.rollback().await.map_err(ServiceError::db_error)?;
            debug!(%product_id, %warehouse_id, "inventory record created concurrently, locking it");
            find_record_for_update(txn, product_id, warehouse_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "inventory record for product {} in warehouse {} vanished after a conflict",
                        product_id, warehouse_id
                    ))
                })
        }
        Err(err) => Err(ServiceError::from_write_err(err, "Inventory record")),
    }
}

async fn find_lot<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<lot::Model, ServiceError> {
    lot::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Lot {} not found", id)))
}

async fn single_lot_stock<C: ConnectionTrait>(
    conn: &C,
    lot: lot::Model,
) -> Result<LotStock, ServiceError> {
    derive_lot_stock(conn, vec![lot])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::InternalError("lot stock derivation returned nothing".into()))
}

/// Attaches the derived quantity to each lot from its movement details.
async fn derive_lot_stock<C: ConnectionTrait>(
    conn: &C,
    lots: Vec<lot::Model>,
) -> Result<Vec<LotStock>, ServiceError> {
    if lots.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = lots.iter().map(|l| l.id).collect();
    let details = movement_detail::Entity::find()
        .filter(movement_detail::Column::LotId.is_in(ids))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut by_lot: HashMap<Uuid, Vec<(Direction, Decimal)>> = HashMap::new();
    for detail in details {
        by_lot
            .entry(detail.lot_id)
            .or_default()
            .push((detail.direction, detail.quantity));
    }

    lots.into_iter()
        .map(|lot| {
            let lines = by_lot.remove(&lot.id).unwrap_or_default();
            let available = lot_availability::current_quantity(lot.id, lot.initial_quantity, lines)?;
            Ok(LotStock { lot, available })
        })
        .collect()
}

/// On-hand quantity and lot count per record.
async fn summarize_records<C: ConnectionTrait>(
    conn: &C,
    record_ids: &[Uuid],
) -> Result<HashMap<Uuid, (Decimal, u64)>, ServiceError> {
    if record_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let lots = lot::Entity::find()
        .filter(lot::Column::InventoryId.is_in(record_ids.to_vec()))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut summaries: HashMap<Uuid, (Decimal, u64)> = HashMap::new();
    for stock in derive_lot_stock(conn, lots).await? {
        let entry = summaries.entry(stock.lot.inventory_id).or_default();
        entry.0 += stock.available;
        entry.1 += 1;
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_lot_number_carries_date_and_id_prefix() {
        let lot_id = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 7, 3).unwrap();
        assert_eq!(generated_lot_number(day, lot_id), "L20240703-A1B2C3D4");
    }

    async fn pool_with_pair() -> (DbPool, inventory_record::Model) {
        let cfg = db::DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&cfg).await.unwrap();
        db::run_migrations(&pool).await.unwrap();

        let now = Utc::now();
        let warehouse = warehouse::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Central".into()),
            address: Set(None),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&pool)
        .await
        .unwrap();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set("SKU-1".into()),
            name: Set("Widget".into()),
            description: Set(None),
            category_id: Set(None),
            unit_of_measure: Set("UND".into()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&pool)
        .await
        .unwrap();

        let txn = pool.begin().await.unwrap();
        let record = insert_or_lock_record(&txn, product.id, warehouse.id)
            .await
            .unwrap();
        txn.commit().await.unwrap();
        (pool, record)
    }

    #[tokio::test]
    async fn losing_first_receipt_reuses_the_existing_record() {
        let (pool, existing) = pool_with_pair().await;

        let txn = pool.begin().await.unwrap();
        let record = insert_or_lock_record(&txn, existing.product_id, existing.warehouse_id)
            .await
            .unwrap();
        assert_eq!(record.id, existing.id);

        // The outer transaction is still usable after the rolled-back insert.
        let records = inventory_record::Entity::find().all(&txn).await.unwrap();
        txn.commit().await.unwrap();
        assert_eq!(records.len(), 1);
    }
}
