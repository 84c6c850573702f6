use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per product-per-warehouse aggregate.
///
/// On-hand quantity is not stored here; it is the sum of the derived
/// quantities of the record's lots.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventarios")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "id_producto")]
    pub product_id: Uuid,
    #[sea_orm(column_name = "id_almacen")]
    pub warehouse_id: Uuid,
    #[sea_orm(column_name = "stock_minimo", column_type = "Decimal(Some((14, 4)))")]
    pub minimum_stock: Decimal,
    /// Running weighted-average unit cost, changed only by stock-ins.
    #[sea_orm(
        column_name = "costo_promedio_actual",
        column_type = "Decimal(Some((12, 4)))"
    )]
    pub current_weighted_average_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Restrict"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id",
        on_delete = "Restrict"
    )]
    Warehouse,
    #[sea_orm(has_many = "super::lot::Entity")]
    Lots,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl Related<super::lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
