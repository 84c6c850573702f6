use sea_orm_migration::prelude::*;

use crate::{CONSTRAINT_VIOLATION_PREFIX, STOCK_OUT_DETAIL_INDEX, STOCK_OUT_DETAIL_UNIQUE_INDEX};

/// A lot brought in by one movement detail may be drawn by many stock-outs,
/// so the one-to-one index on `id_movimiento_detalle` becomes a plain lookup index.
pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240703_000008_relax_detalle_salidas_unique_index"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(STOCK_OUT_DETAIL_UNIQUE_INDEX)
                    .table(DetalleSalidas::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(STOCK_OUT_DETAIL_INDEX)
                    .table(DetalleSalidas::Table)
                    .col(DetalleSalidas::IdMovimientoDetalle)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let duplicates = Query::select()
            .column(DetalleSalidas::IdMovimientoDetalle)
            .expr(Expr::col(DetalleSalidas::Id).count())
            .from(DetalleSalidas::Table)
            .group_by_col(DetalleSalidas::IdMovimientoDetalle)
            .and_having(Expr::expr(Expr::col(DetalleSalidas::Id).count()).gt(1))
            .to_owned();

        let rows = manager
            .get_connection()
            .query_all(backend.build(&duplicates))
            .await?;

        if !rows.is_empty() {
            tracing::warn!(
                duplicated = rows.len(),
                "refusing to restore unique index on detalle_salidas.id_movimiento_detalle"
            );
            return Err(DbErr::Migration(format!(
                "{}: {} movement detail(s) referenced by more than one detalle_salidas row; \
                 resolve them before rolling back",
                CONSTRAINT_VIOLATION_PREFIX,
                rows.len()
            )));
        }

        manager
            .drop_index(
                Index::drop()
                    .name(STOCK_OUT_DETAIL_INDEX)
                    .table(DetalleSalidas::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(STOCK_OUT_DETAIL_UNIQUE_INDEX)
                    .table(DetalleSalidas::Table)
                    .col(DetalleSalidas::IdMovimientoDetalle)
                    .unique()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum DetalleSalidas {
    Table,
    Id,
    IdMovimientoDetalle,
}
