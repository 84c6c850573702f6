use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::category::{self, CategoryType};
use crate::validation::{Checks, Validate, ValidationOutcome};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "Beverages")]
    pub name: String,
    pub description: Option<String>,
    /// Defaults to PRODUCT
    #[serde(rename = "type", default)]
    pub category_type: CategoryType,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Validate for CreateCategoryRequest {
    fn validate(&self) -> ValidationOutcome {
        Checks::new()
            .not_blank(&self.name, "name", 100)
            .optional_len(self.description.as_deref(), "description", 1000)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,
    pub active: Option<bool>,
}

impl Validate for UpdateCategoryRequest {
    fn validate(&self) -> ValidationOutcome {
        let mut checks = Checks::new();
        if let Some(name) = &self.name {
            checks.not_blank(name, "name", 100);
        }
        checks
            .optional_len(self.description.as_deref(), "description", 1000)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category_type: model.category_type,
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
    fn type_defaults_to_product() {
        let req: CreateCategoryRequest = serde_json::from_str(r#"{"name":"Tools"}"#).unwrap();
        assert_eq!(req.category_type, CategoryType::Product);
        assert!(req.active);
        assert!(req.validate().is_valid());
    }

    #[test]
    fn service_type_is_accepted() {
        let req: CreateCategoryRequest =
            serde_json::from_str(r#"{"name":"Repairs","type":"SERVICE"}"#).unwrap();
        assert_eq!(req.category_type, CategoryType::Service);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let parsed = serde_json::from_str::<CreateCategoryRequest>(
            r#"{"name":"Repairs","type":"SUBSCRIPTION"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn blank_name_on_update_is_rejected() {
        let req = UpdateCategoryRequest {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert_matches!(req.validate(), ValidationOutcome::Invalid(errors) if errors[0].field == "name");
    }
}
