use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::product;
use crate::validation::{Checks, Validate, ValidationOutcome};

pub const DEFAULT_UNIT_OF_MEASURE: &str = "UND";

fn valid_sku(sku: &str) -> bool {
    sku.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    #[schema(example = "SKU-0001")]
    pub sku: String,
    #[schema(example = "Sparkling water 500ml")]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[schema(example = "UND")]
    pub unit_of_measure: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> ValidationOutcome {
        let mut checks = Checks::new();
        checks
            .not_blank(&self.sku, "sku", 64)
            .check(
                valid_sku(self.sku.trim()),
                "sku",
                "may only contain letters, digits, '-', '_' and '.'",
            )
            .not_blank(&self.name, "name", 255)
            .optional_len(self.description.as_deref(), "description", 2000);
        if let Some(unit) = &self.unit_of_measure {
            checks.not_blank(unit, "unit_of_measure", 16);
        }
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub unit_of_measure: Option<String>,
    pub active: Option<bool>,
}

impl Validate for UpdateProductRequest {
    fn validate(&self) -> ValidationOutcome {
        let mut checks = Checks::new();
        if let Some(name) = &self.name {
            checks.not_blank(name, "name", 255);
        }
        if let Some(unit) = &self.unit_of_measure {
            checks.not_blank(unit, "unit_of_measure", 16);
        }
        checks
            .optional_len(self.description.as_deref(), "description", 2000)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ProductFilters {
    pub category_id: Option<Uuid>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub unit_of_measure: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            sku: model.sku,
            name: model.name,
            description: model.description,
            category_id: model.category_id,
            unit_of_measure: model.unit_of_measure,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn reports_every_bad_field() {
        let req = CreateProductRequest {
            sku: "bad sku!".into(),
            name: "".into(),
            description: None,
            category_id: None,
            unit_of_measure: Some("".into()),
            active: true,
        };
        assert_matches!(req.validate(), ValidationOutcome::Invalid(errors) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["sku", "name", "unit_of_measure"]);
        });
    }

    #[test]
    fn accepts_minimal_product() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"sku":"SKU-1","name":"Widget"}"#).unwrap();
        assert!(req.validate().is_valid());
        assert!(req.active);
    }
}
