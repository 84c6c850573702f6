use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[sea_orm(string_value = "ENTRADA")]
    In,
    #[sea_orm(string_value = "SALIDA")]
    Out,
}

/// One line of a movement: a quantity moved into or out of a single lot.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movimiento_detalles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "id_movimiento")]
    pub movement_id: Uuid,
    #[sea_orm(column_name = "id_lote", indexed)]
    pub lot_id: Uuid,
    #[sea_orm(column_name = "cantidad", column_type = "Decimal(Some((14, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_name = "direccion")]
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::movement::Entity",
        from = "Column::MovementId",
        to = "super::movement::Column::Id",
        on_delete = "Cascade"
    )]
    Movement,
    #[sea_orm(
        belongs_to = "super::lot::Entity",
        from = "Column::LotId",
        to = "super::lot::Column::Id",
        on_delete = "Restrict"
    )]
    Lot,
    #[sea_orm(has_many = "super::stock_out_detail::Entity")]
    StockOutDetails,
}

impl Related<super::movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movement.def()
    }
}

impl Related<super::lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lot.def()
    }
}

impl Related<super::stock_out_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockOutDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
