mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Utc;
use migrations::{Migrator, STOCK_OUT_DETAIL_INDEX, STOCK_OUT_DETAIL_UNIQUE_INDEX};
use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, DbBackend, EntityTrait, Statement, Value};
use sea_orm_migration::MigratorTrait;
use stockroom_api::{
    db::{self, DbPool},
    dto::{
        movement::{LotDrawRequest, StockInRequest, StockOutRequest},
        product::CreateProductRequest,
        warehouse::CreateWarehouseRequest,
    },
    entities::category::{self, CategoryType},
    errors::ServiceError,
    events::EventSender,
    services::{
        catalog::CatalogService,
        inventory::{InventoryService, LotRules},
    },
};
use tokio::sync::mpsc;
use uuid::Uuid;

use common::unmigrated_pool;

type Column = (String, String, i32, Option<String>);

async fn columns(db: &DbPool, table: &str) -> Vec<Column> {
    let rows = db
        .query_all(Statement::from_string(
            DbBackend::Sqlite,
            format!("PRAGMA table_info('{table}')"),
        ))
        .await
        .unwrap();
    rows.iter()
        .map(|row| {
            (
                row.try_get::<String>("", "name").unwrap(),
                row.try_get::<String>("", "type").unwrap(),
                row.try_get::<i32>("", "notnull").unwrap(),
                row.try_get::<Option<String>>("", "dflt_value").unwrap(),
            )
        })
        .collect()
}

async fn indexes(db: &DbPool, table: &str) -> Vec<(String, bool)> {
    let rows = db
        .query_all(Statement::from_string(
            DbBackend::Sqlite,
            format!("PRAGMA index_list('{table}')"),
        ))
        .await
        .unwrap();
    let mut indexes: Vec<(String, bool)> = rows
        .iter()
        .map(|row| {
            (
                row.try_get::<String>("", "name").unwrap(),
                row.try_get::<i32>("", "unique").unwrap() == 1,
            )
        })
        .filter(|(name, _)| !name.starts_with("sqlite_autoindex"))
        .collect();
    indexes.sort();
    indexes
}

/// Every user table with its columns and indexes.
async fn schema(db: &DbPool) -> Vec<(String, Vec<Column>, Vec<(String, bool)>)> {
    let rows = db
        .query_all(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'table' \
             AND name NOT LIKE 'sqlite_%' AND name <> 'seaql_migrations' ORDER BY name"
                .to_string(),
        ))
        .await
        .unwrap();

    let mut snapshot = Vec::new();
    for row in rows {
        let table = row.try_get::<String>("", "name").unwrap();
        let cols = columns(db, &table).await;
        let idx = indexes(db, &table).await;
        snapshot.push((table, cols, idx));
    }
    snapshot
}

async fn stock_out_detail_rows(db: &DbPool) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT COUNT(*) AS n FROM detalle_salidas".to_string(),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}

#[tokio::test]
async fn every_migration_reverts_to_the_prior_schema() {
    let pool = unmigrated_pool().await;
    let total = Migrator::migrations().len() as u32;

    for _ in 0..total {
        let before = schema(&pool).await;
        Migrator::up(&pool, Some(1)).await.unwrap();
        assert_ne!(schema(&pool).await, before);

        Migrator::down(&pool, Some(1)).await.unwrap();
        assert_eq!(schema(&pool).await, before);

        Migrator::up(&pool, Some(1)).await.unwrap();
    }

    Migrator::down(&pool, None).await.unwrap();
    assert!(schema(&pool).await.is_empty());
}

#[tokio::test]
async fn rolling_back_the_latest_migrations_restores_the_schema() {
    let pool = unmigrated_pool().await;
    Migrator::up(&pool, Some(7)).await.unwrap();
    let categories_before = columns(&pool, "categoria").await;
    let indexes_before = indexes(&pool, "detalle_salidas").await;
    assert!(indexes_before.contains(&(STOCK_OUT_DETAIL_UNIQUE_INDEX.to_string(), true)));

    Migrator::up(&pool, None).await.unwrap();
    assert!(columns(&pool, "categoria")
        .await
        .iter()
        .any(|(name, _, not_null, _)| name == "tipo" && *not_null == 1));
    let relaxed = indexes(&pool, "detalle_salidas").await;
    assert!(relaxed.contains(&(STOCK_OUT_DETAIL_INDEX.to_string(), false)));
    assert!(!relaxed.iter().any(|(name, _)| name == STOCK_OUT_DETAIL_UNIQUE_INDEX));

    Migrator::down(&pool, Some(2)).await.unwrap();
    assert_eq!(columns(&pool, "categoria").await, categories_before);
    assert_eq!(indexes(&pool, "detalle_salidas").await, indexes_before);
}

#[tokio::test]
async fn repeated_draws_on_one_receipt_block_restoring_the_unique_index() {
    let pool = Arc::new(unmigrated_pool().await);
    db::run_migrations(&pool).await.unwrap();

    let (tx, _rx) = mpsc::channel(64);
    let inventory = InventoryService::new(
        pool.clone(),
        Arc::new(EventSender::new(tx)),
        LotRules::default(),
    );
    let catalog = CatalogService::new(pool.clone());

    let warehouse = catalog
        .create_warehouse(CreateWarehouseRequest {
            name: "Central".into(),
            address: None,
            active: true,
        })
        .await
        .unwrap();
    let product = catalog
        .create_product(CreateProductRequest {
            sku: "SKU-1".into(),
            name: "Widget".into(),
            description: None,
            category_id: None,
            unit_of_measure: None,
            active: true,
        })
        .await
        .unwrap();

    let received = inventory
        .stock_in(StockInRequest {
            warehouse_id: warehouse.id,
            product_id: product.id,
            quantity: dec!(10),
            unit_cost: dec!(3),
            lot_number: None,
            received_date: None,
            expiry_date: None,
            lot_notes: None,
            reference: None,
            notes: None,
        })
        .await
        .unwrap();

    for quantity in [dec!(2), dec!(3)] {
        inventory
            .stock_out(StockOutRequest {
                warehouse_id: warehouse.id,
                product_id: product.id,
                lots: vec![LotDrawRequest {
                    lot_id: received.lot.id,
                    quantity,
                }],
                quantity: None,
                policy: None,
                allow_expired: None,
                reference: None,
                notes: None,
            })
            .await
            .unwrap();
    }
    assert_eq!(stock_out_detail_rows(&pool).await, 2);

    db::rollback_migrations(&pool, Some(1)).await.unwrap();
    let refused = db::rollback_migrations(&pool, Some(1)).await;
    assert_matches!(refused, Err(ServiceError::ConstraintViolation(message)) => {
        assert!(message.contains("detalle_salidas"));
    });

    assert_eq!(stock_out_detail_rows(&pool).await, 2);
    assert!(indexes(&pool, "detalle_salidas")
        .await
        .contains(&(STOCK_OUT_DETAIL_INDEX.to_string(), false)));
}

#[tokio::test]
async fn categories_created_before_the_type_column_read_as_product() {
    let pool = unmigrated_pool().await;
    Migrator::up(&pool, Some(8)).await.unwrap();

    let id = Uuid::new_v4();
    let now = Utc::now();
    let values: [Value; 5] = [
        id.into(),
        "Legacy".into(),
        true.into(),
        now.into(),
        now.into(),
    ];
    pool.execute(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        "INSERT INTO categoria (id, nombre, activo, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        values,
    ))
    .await
    .unwrap();

    Migrator::up(&pool, None).await.unwrap();

    let legacy = category::Entity::find_by_id(id)
        .one(&pool)
        .await
        .unwrap()
        .expect("category survives the migration");
    assert_eq!(legacy.name, "Legacy");
    assert_eq!(legacy.category_type, CategoryType::Product);
}
