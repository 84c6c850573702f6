use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::warehouse;
use crate::validation::{Checks, Validate, ValidationOutcome};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWarehouseRequest {
    #[schema(example = "Central")]
    pub name: String,
    pub address: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Validate for CreateWarehouseRequest {
    fn validate(&self) -> ValidationOutcome {
        Checks::new()
            .not_blank(&self.name, "name", 100)
            .optional_len(self.address.as_deref(), "address", 255)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateWarehouseRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub active: Option<bool>,
}

impl Validate for UpdateWarehouseRequest {
    fn validate(&self) -> ValidationOutcome {
        let mut checks = Checks::new();
        if let Some(name) = &self.name {
            checks.not_blank(name, "name", 100);
        }
        checks
            .optional_len(self.address.as_deref(), "address", 255)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WarehouseResponse {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<warehouse::Model> for WarehouseResponse {
    fn from(model: warehouse::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
