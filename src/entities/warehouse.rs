use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "almacenes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "nombre", unique)]
    pub name: String,
    #[sea_orm(column_name = "direccion", nullable)]
    pub address: Option<String>,
    #[sea_orm(column_name = "activo")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_record::Entity")]
    InventoryRecords,
    #[sea_orm(has_many = "super::movement::Entity")]
    Movements,
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
