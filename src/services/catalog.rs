//! Categories, warehouses and products.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        category::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest},
        product::{
            CreateProductRequest, ProductFilters, ProductResponse, UpdateProductRequest,
            DEFAULT_UNIT_OF_MEASURE,
        },
        warehouse::{CreateWarehouseRequest, UpdateWarehouseRequest, WarehouseResponse},
    },
    entities::{category, inventory_record, product, warehouse},
    errors::ServiceError,
};

#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        let db = self.db_pool.as_ref();
        let now = Utc::now();
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            active: Set(request.active),
            category_type: Set(request.category_type),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write_err(e, "Category"))?;

        info!(category_id = %model.id, "Category created");
        Ok(model.into())
    }

    pub async fn get_category(&self, id: Uuid) -> Result<CategoryResponse, ServiceError> {
        Ok(self.find_category(id).await?.into())
    }

    pub async fn list_categories(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CategoryResponse>, u64), ServiceError> {
        let paginator = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .paginate(self.db_pool.as_ref(), per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items.into_iter().map(Into::into).collect(), total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_category(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        let existing = self.find_category(id).await?;
        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(category_type) = request.category_type {
            active.category_type = Set(category_type);
        }
        if let Some(is_active) = request.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(|e| ServiceError::from_write_err(e, "Category"))?;
        Ok(updated.into())
    }

    /// Fails with `Conflict` while products reference the category.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        self.find_category(id).await?;

        let products = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if products > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category {} is used by {} product(s)",
                id, products
            )));
        }

        category::Entity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(|e| ServiceError::from_write_err(e, "Category"))?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    async fn find_category(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_warehouse(
        &self,
        request: CreateWarehouseRequest,
    ) -> Result<WarehouseResponse, ServiceError> {
        let now = Utc::now();
        let model = warehouse::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            address: Set(request.address),
            active: Set(request.active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db_pool.as_ref())
        .await
        .map_err(|e| ServiceError::from_write_err(e, "Warehouse"))?;

        info!(warehouse_id = %model.id, "Warehouse created");
        Ok(model.into())
    }

    pub async fn get_warehouse(&self, id: Uuid) -> Result<WarehouseResponse, ServiceError> {
        Ok(self.find_warehouse(id).await?.into())
    }

    pub async fn list_warehouses(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<WarehouseResponse>, u64), ServiceError> {
        let paginator = warehouse::Entity::find()
            .order_by_asc(warehouse::Column::Name)
            .paginate(self.db_pool.as_ref(), per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items.into_iter().map(Into::into).collect(), total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_warehouse(
        &self,
        id: Uuid,
        request: UpdateWarehouseRequest,
    ) -> Result<WarehouseResponse, ServiceError> {
        let existing = self.find_warehouse(id).await?;
        let mut active: warehouse::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        if let Some(is_active) = request.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(|e| ServiceError::from_write_err(e, "Warehouse"))?;
        Ok(updated.into())
    }

    /// Fails with `Conflict` while the warehouse holds inventory records.
    #[instrument(skip(self))]
    pub async fn delete_warehouse(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        self.find_warehouse(id).await?;

        let records = inventory_record::Entity::find()
            .filter(inventory_record::Column::WarehouseId.eq(id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if records > 0 {
            return Err(ServiceError::Conflict(format!(
                "Warehouse {} still has {} inventory record(s)",
                id, records
            )));
        }

        warehouse::Entity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(|e| ServiceError::from_write_err(e, "Warehouse"))?;
        info!(warehouse_id = %id, "Warehouse deleted");
        Ok(())
    }

    async fn find_warehouse(&self, id: Uuid) -> Result<warehouse::Model, ServiceError> {
        warehouse::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", id)))
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        let db = self.db_pool.as_ref();
        let sku = request.sku.trim().to_string();

        let duplicate = product::Entity::find()
            .filter(product::Column::Sku.eq(sku.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::ConstraintViolation(format!(
                "Product with SKU {} already exists",
                sku
            )));
        }
        if let Some(category_id) = request.category_id {
            self.find_category(category_id).await?;
        }

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(sku),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            category_id: Set(request.category_id),
            unit_of_measure: Set(request
                .unit_of_measure
                .map(|u| u.trim().to_string())
                .unwrap_or_else(|| DEFAULT_UNIT_OF_MEASURE.to_string())),
            active: Set(request.active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write_err(e, "Product"))?;

        info!(product_id = %model.id, "Product created");
        Ok(model.into())
    }

    pub async fn get_product(&self, id: Uuid) -> Result<ProductResponse, ServiceError> {
        Ok(self.find_product(id).await?.into())
    }

    pub async fn list_products(
        &self,
        filters: ProductFilters,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProductResponse>, u64), ServiceError> {
        let mut query = product::Entity::find().order_by_asc(product::Column::Sku);
        if let Some(category_id) = filters.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(active) = filters.active {
            query = query.filter(product::Column::Active.eq(active));
        }

        let paginator = query.paginate(self.db_pool.as_ref(), per_page);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items.into_iter().map(Into::into).collect(), total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        let existing = self.find_product(id).await?;
        if let Some(category_id) = request.category_id {
            self.find_category(category_id).await?;
        }

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(category_id) = request.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(unit) = request.unit_of_measure {
            active.unit_of_measure = Set(unit.trim().to_string());
        }
        if let Some(is_active) = request.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(|e| ServiceError::from_write_err(e, "Product"))?;
        Ok(updated.into())
    }

    /// Fails with `Conflict` while the product is stocked anywhere.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        self.find_product(id).await?;

        let records = inventory_record::Entity::find()
            .filter(inventory_record::Column::ProductId.eq(id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;
        if records > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} still has {} inventory record(s)",
                id, records
            )));
        }

        product::Entity::delete_by_id(id)
            .exec(db)
            .await
            .map_err(|e| ServiceError::from_write_err(e, "Product"))?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn find_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }
}
