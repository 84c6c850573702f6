use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "productos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub sku: String,
    #[sea_orm(column_name = "nombre")]
    pub name: String,
    #[sea_orm(column_name = "descripcion", column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_name = "id_categoria", nullable)]
    pub category_id: Option<Uuid>,
    #[sea_orm(column_name = "unidad_medida")]
    pub unit_of_measure: String,
    #[sea_orm(column_name = "activo")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(has_many = "super::inventory_record::Entity")]
    InventoryRecords,
    #[sea_orm(has_many = "super::movement::Entity")]
    Movements,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::inventory_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryRecords.def()
    }
}

impl Related<super::movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
