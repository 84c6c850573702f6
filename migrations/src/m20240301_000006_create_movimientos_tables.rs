use sea_orm_migration::prelude::*;

use crate::STOCK_OUT_DETAIL_UNIQUE_INDEX;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000006_create_movimientos_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movimientos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movimientos::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Movimientos::Tipo).string_len(20).not_null())
                    .col(ColumnDef::new(Movimientos::IdAlmacen).uuid().not_null())
                    .col(ColumnDef::new(Movimientos::IdProducto).uuid().not_null())
                    .col(ColumnDef::new(Movimientos::Referencia).string_len(100).null())
                    .col(ColumnDef::new(Movimientos::Observaciones).text().null())
                    .col(
                        ColumnDef::new(Movimientos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movimientos_id_almacen")
                            .from(Movimientos::Table, Movimientos::IdAlmacen)
                            .to(Almacenes::Table, Almacenes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movimientos_id_producto")
                            .from(Movimientos::Table, Movimientos::IdProducto)
                            .to(Productos::Table, Productos::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_movimientos_almacen_producto")
                    .table(Movimientos::Table)
                    .col(Movimientos::IdAlmacen)
                    .col(Movimientos::IdProducto)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovimientoDetalles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MovimientoDetalles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MovimientoDetalles::IdMovimiento)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MovimientoDetalles::IdLote).uuid().not_null())
                    .col(
                        ColumnDef::new(MovimientoDetalles::Cantidad)
                            .decimal_len(14, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MovimientoDetalles::Direccion)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MovimientoDetalles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movimiento_detalles_id_movimiento")
                            .from(MovimientoDetalles::Table, MovimientoDetalles::IdMovimiento)
                            .to(Movimientos::Table, Movimientos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movimiento_detalles_id_lote")
                            .from(MovimientoDetalles::Table, MovimientoDetalles::IdLote)
                            .to(Lotes::Table, Lotes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_movimiento_detalles_id_lote")
                    .table(MovimientoDetalles::Table)
                    .col(MovimientoDetalles::IdLote)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_movimiento_detalles_id_movimiento")
                    .table(MovimientoDetalles::Table)
                    .col(MovimientoDetalles::IdMovimiento)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DetalleSalidas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DetalleSalidas::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DetalleSalidas::IdMovimientoDetalle)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DetalleSalidas::IdMovimiento).uuid().not_null())
                    .col(
                        ColumnDef::new(DetalleSalidas::Cantidad)
                            .decimal_len(14, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DetalleSalidas::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_detalle_salidas_id_movimiento_detalle")
                            .from(DetalleSalidas::Table, DetalleSalidas::IdMovimientoDetalle)
                            .to(MovimientoDetalles::Table, MovimientoDetalles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_detalle_salidas_id_movimiento")
                            .from(DetalleSalidas::Table, DetalleSalidas::IdMovimiento)
                            .to(Movimientos::Table, Movimientos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(STOCK_OUT_DETAIL_UNIQUE_INDEX)
                    .table(DetalleSalidas::Table)
                    .col(DetalleSalidas::IdMovimientoDetalle)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DetalleSalidas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MovimientoDetalles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movimientos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Movimientos {
    Table,
    Id,
    Tipo,
    IdAlmacen,
    IdProducto,
    Referencia,
    Observaciones,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum MovimientoDetalles {
    Table,
    Id,
    IdMovimiento,
    IdLote,
    Cantidad,
    Direccion,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum DetalleSalidas {
    Table,
    Id,
    IdMovimientoDetalle,
    IdMovimiento,
    Cantidad,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Almacenes {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Productos {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Lotes {
    Table,
    Id,
}
