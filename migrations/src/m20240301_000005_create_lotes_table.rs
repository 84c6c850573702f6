use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000005_create_lotes_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Lots carry no running quantity column: availability is derived
        // from movimiento_detalles at read time.
        manager
            .create_table(
                Table::create()
                    .table(Lotes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lotes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Lotes::IdInventario).uuid().not_null())
                    .col(ColumnDef::new(Lotes::NumeroLote).string_len(64).not_null())
                    .col(ColumnDef::new(Lotes::FechaRecepcion).date().not_null())
                    .col(
                        ColumnDef::new(Lotes::CantidadInicial)
                            .decimal_len(14, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Lotes::CostoUnitario)
                            .decimal_len(12, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Lotes::FechaVencimiento).date().null())
                    .col(ColumnDef::new(Lotes::Notas).text().null())
                    .col(
                        ColumnDef::new(Lotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lotes_id_inventario")
                            .from(Lotes::Table, Lotes::IdInventario)
                            .to(Inventarios::Table, Inventarios::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_lotes_id_inventario")
                    .table(Lotes::Table)
                    .col(Lotes::IdInventario)
                    .col(Lotes::FechaRecepcion)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Lotes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Lotes {
    Table,
    Id,
    IdInventario,
    NumeroLote,
    FechaRecepcion,
    CantidadInicial,
    CostoUnitario,
    FechaVencimiento,
    Notas,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Inventarios {
    Table,
    Id,
}
