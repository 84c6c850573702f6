pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_categoria_table;
mod m20240301_000002_create_almacenes_table;
mod m20240301_000003_create_productos_table;
mod m20240301_000004_create_inventarios_table;
mod m20240301_000005_create_lotes_table;
mod m20240301_000006_create_movimientos_tables;
mod m20240612_000007_add_costo_promedio_to_inventarios;
mod m20240703_000008_relax_detalle_salidas_unique_index;
mod m20240819_000009_add_tipo_to_categoria;

/// Prefix of the `DbErr::Migration` message raised when a down path cannot
/// restore a constraint without discarding rows.
pub const CONSTRAINT_VIOLATION_PREFIX: &str = "constraint violation";

/// Name of the non-unique index that replaced the one-to-one constraint.
pub const STOCK_OUT_DETAIL_INDEX: &str = "idx_detalle_salidas_id_movimiento_detalle";

/// Name of the original unique index on `detalle_salidas.id_movimiento_detalle`.
pub const STOCK_OUT_DETAIL_UNIQUE_INDEX: &str = "uq_detalle_salidas_id_movimiento_detalle";

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_categoria_table::Migration),
            Box::new(m20240301_000002_create_almacenes_table::Migration),
            Box::new(m20240301_000003_create_productos_table::Migration),
            Box::new(m20240301_000004_create_inventarios_table::Migration),
            Box::new(m20240301_000005_create_lotes_table::Migration),
            Box::new(m20240301_000006_create_movimientos_tables::Migration),
            Box::new(m20240612_000007_add_costo_promedio_to_inventarios::Migration),
            Box::new(m20240703_000008_relax_detalle_salidas_unique_index::Migration),
            Box::new(m20240819_000009_add_tipo_to_categoria::Migration),
        ]
    }
}
