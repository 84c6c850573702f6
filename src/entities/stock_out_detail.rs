use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Trace row for one lot draw of a stock-out.
///
/// `movement_detail_id` is the IN detail that brought the drawn lot into
/// stock; any number of stock-outs may point at the same one.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "detalle_salidas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "id_movimiento_detalle", indexed)]
    pub movement_detail_id: Uuid,
    #[sea_orm(column_name = "id_movimiento")]
    pub movement_id: Uuid,
    #[sea_orm(column_name = "cantidad", column_type = "Decimal(Some((14, 4)))")]
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::movement_detail::Entity",
        from = "Column::MovementDetailId",
        to = "super::movement_detail::Column::Id",
        on_delete = "Restrict"
    )]
    MovementDetail,
    #[sea_orm(
        belongs_to = "super::movement::Entity",
        from = "Column::MovementId",
        to = "super::movement::Column::Id",
        on_delete = "Cascade"
    )]
    Movement,
}

impl Related<super::movement_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementDetail.def()
    }
}

impl Related<super::movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
