use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A batch received at one point in time.
///
/// `initial_quantity` and `unit_cost` never change after insert; the
/// current quantity is derived from the lot's OUT movement details.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lotes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "id_inventario")]
    pub inventory_id: Uuid,
    #[sea_orm(column_name = "numero_lote")]
    pub lot_number: String,
    #[sea_orm(column_name = "fecha_recepcion")]
    pub received_date: NaiveDate,
    #[sea_orm(column_name = "cantidad_inicial", column_type = "Decimal(Some((14, 4)))")]
    pub initial_quantity: Decimal,
    #[sea_orm(column_name = "costo_unitario", column_type = "Decimal(Some((12, 4)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_name = "fecha_vencimiento", nullable)]
    pub expiry_date: Option<NaiveDate>,
    #[sea_orm(column_name = "notas", column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_record::Entity",
        from = "Column::InventoryId",
        to = "super::inventory_record::Column::Id",
        on_delete = "Restrict"
    )]
    InventoryRecord,
    #[sea_orm(has_many = "super::movement_detail::Entity")]
    MovementDetails,
}

impl Related<super::inventory_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryRecord.def()
    }
}

impl Related<super::movement_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_expired_on(&self, day: NaiveDate) -> bool {
        self.expiry_date.map(|d| d < day).unwrap_or(false)
    }
}
