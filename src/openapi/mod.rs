use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "1.0.0",
        description = r#"
# Stockroom Inventory Valuation API

Warehouse stock tracked by lot, valued at a running weighted-average cost.

## Concepts

- **Inventory record**: one product in one warehouse, carrying the current weighted-average unit cost
- **Lot**: a batch received at one time with its own quantity, unit cost and optional expiry
- **Movement**: a stock-in, stock-out or adjustment, with one line per lot touched

Lot quantities are never stored; they are derived from the movement lines.
A stock-in recomputes the average cost, a stock-out never does.

## Error Handling

Failures use one body shape:

```json
{
  "error": "Conflict",
  "message": "Insufficient quantity in lot ...: available 20, requested 30",
  "request_id": "req-abc123xyz",
  "timestamp": "2024-07-03T10:30:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "categories", description = "Product categories"),
        (name = "warehouses", description = "Warehouses"),
        (name = "products", description = "Products"),
        (name = "inventory", description = "Inventory records and valuation"),
        (name = "movements", description = "Stock-in, stock-out and adjustments"),
        (name = "lots", description = "Lots and their consumption")
    ),
    paths(
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        crate::handlers::warehouses::list_warehouses,
        crate::handlers::warehouses::create_warehouse,
        crate::handlers::warehouses::get_warehouse,
        crate::handlers::warehouses::update_warehouse,
        crate::handlers::warehouses::delete_warehouse,

        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::create_inventory_record,
        crate::handlers::inventory::get_inventory_record,
        crate::handlers::inventory::delete_inventory_record,
        crate::handlers::inventory::list_record_lots,

        crate::handlers::movements::stock_in,
        crate::handlers::movements::stock_out,
        crate::handlers::movements::adjust_stock,
        crate::handlers::movements::list_movements,
        crate::handlers::movements::get_movement,

        crate::handlers::lots::get_lot,
        crate::handlers::lots::update_lot_notes,
        crate::handlers::lots::list_lot_consumptions,
    ),
    components(
        schemas(
            crate::dto::category::CreateCategoryRequest,
            crate::dto::category::UpdateCategoryRequest,
            crate::dto::category::CategoryResponse,
            crate::entities::category::CategoryType,

            crate::dto::warehouse::CreateWarehouseRequest,
            crate::dto::warehouse::UpdateWarehouseRequest,
            crate::dto::warehouse::WarehouseResponse,

            crate::dto::product::CreateProductRequest,
            crate::dto::product::UpdateProductRequest,
            crate::dto::product::ProductResponse,

            crate::dto::inventory::CreateInventoryRecordRequest,
            crate::dto::inventory::InventoryRecordResponse,

            crate::dto::lot::LotResponse,
            crate::dto::lot::UpdateLotNotesRequest,
            crate::dto::lot::LotConsumptionResponse,

            crate::dto::movement::StockInRequest,
            crate::dto::movement::StockOutRequest,
            crate::dto::movement::LotDrawRequest,
            crate::dto::movement::AdjustmentRequest,
            crate::dto::movement::AdjustmentDirection,
            crate::dto::movement::MovementResponse,
            crate::dto::movement::MovementDetailResponse,
            crate::dto::movement::StockInResponse,
            crate::dto::movement::StockOutResponse,
            crate::dto::movement::AdjustmentResponse,
            crate::entities::movement::MovementKind,
            crate::entities::movement_detail::Direction,
            crate::services::lot_availability::LotPolicy,

            crate::validation::FieldError,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_movement_endpoints() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Stockroom API"));
        assert!(json.contains("/api/v1/movements/stock-in"));
        assert!(json.contains("/api/v1/lots/{id}/consumptions"));
    }
}
