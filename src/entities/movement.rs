use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    #[sea_orm(string_value = "ENTRADA")]
    StockIn,
    #[sea_orm(string_value = "SALIDA")]
    StockOut,
    #[sea_orm(string_value = "AJUSTE_ENTRADA")]
    AdjustmentIn,
    #[sea_orm(string_value = "AJUSTE_SALIDA")]
    AdjustmentOut,
}

impl MovementKind {
    /// Whether lines of this movement add stock.
    pub fn is_inbound(self) -> bool {
        matches!(self, MovementKind::StockIn | MovementKind::AdjustmentIn)
    }
}

/// Header shared by the line items of one stock movement.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movimientos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "tipo")]
    pub kind: MovementKind,
    #[sea_orm(column_name = "id_almacen")]
    pub warehouse_id: Uuid,
    #[sea_orm(column_name = "id_producto")]
    pub product_id: Uuid,
    #[sea_orm(column_name = "referencia", nullable)]
    pub reference: Option<String>,
    #[sea_orm(column_name = "observaciones", column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id",
        on_delete = "Restrict"
    )]
    Warehouse,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Restrict"
    )]
    Product,
    #[sea_orm(has_many = "super::movement_detail::Entity")]
    MovementDetails,
    #[sea_orm(has_many = "super::stock_out_detail::Entity")]
    StockOutDetails,
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::movement_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementDetails.def()
    }
}

impl Related<super::stock_out_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockOutDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
