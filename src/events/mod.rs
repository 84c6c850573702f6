use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends after a committed write. A closed channel is logged, never
    /// surfaced, because the movement it describes is already durable.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            counter!("stockroom_events.dropped", 1);
            warn!("{}", e);
        }
    }
}

/// Domain events published after stock movements commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    StockReceived {
        movement_id: Uuid,
        inventory_id: Uuid,
        lot_id: Uuid,
        quantity: Decimal,
        unit_cost: Decimal,
        at: DateTime<Utc>,
    },
    StockIssued {
        movement_id: Uuid,
        inventory_id: Uuid,
        lot_ids: Vec<Uuid>,
        quantity: Decimal,
        at: DateTime<Utc>,
    },
    InventoryAdjusted {
        movement_id: Uuid,
        inventory_id: Uuid,
        quantity_delta: Decimal,
        reason: Option<String>,
        at: DateTime<Utc>,
    },
    AverageCostChanged {
        inventory_id: Uuid,
        old_cost: Decimal,
        new_cost: Decimal,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::StockReceived { .. } => "stock_received",
            Event::StockIssued { .. } => "stock_issued",
            Event::InventoryAdjusted { .. } => "inventory_adjusted",
            Event::AverageCostChanged { .. } => "average_cost_changed",
        }
    }
}

/// Drains the event channel, logging each event until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("stockroom_events.processed", 1, "event" => event.name());

        match &event {
            Event::StockReceived {
                movement_id,
                inventory_id,
                lot_id,
                quantity,
                unit_cost,
                ..
            } => {
                info!(
                    %movement_id, %inventory_id, %lot_id, %quantity, %unit_cost,
                    "Stock received"
                );
            }
            Event::StockIssued {
                movement_id,
                inventory_id,
                lot_ids,
                quantity,
                ..
            } => {
                info!(
                    %movement_id, %inventory_id, lots = lot_ids.len(), %quantity,
                    "Stock issued"
                );
            }
            Event::InventoryAdjusted {
                movement_id,
                inventory_id,
                quantity_delta,
                reason,
                ..
            } => {
                info!(
                    %movement_id, %inventory_id, %quantity_delta, reason = ?reason,
                    "Inventory adjusted"
                );
            }
            Event::AverageCostChanged {
                inventory_id,
                old_cost,
                new_cost,
            } => {
                info!(%inventory_id, %old_cost, %new_cost, "Weighted-average cost changed");
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let event = Event::AverageCostChanged {
            inventory_id: Uuid::nil(),
            old_cost: dec!(10),
            new_cost: dec!(11),
        };

        sender.send(event.clone()).await.unwrap();
        assert_eq!(rx.recv().await, Some(event));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender
            .send(Event::AverageCostChanged {
                inventory_id: Uuid::nil(),
                old_cost: dec!(0),
                new_cost: dec!(1),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn process_events_ends_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send_or_log(Event::InventoryAdjusted {
                movement_id: Uuid::new_v4(),
                inventory_id: Uuid::new_v4(),
                quantity_delta: dec!(-2),
                reason: Some("damaged".into()),
                at: Utc::now(),
            })
            .await;
        drop(sender);

        process_events(rx).await;
    }
}
