use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000003_create_productos_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Productos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Productos::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Productos::Sku)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Productos::Nombre).string_len(255).not_null())
                    .col(ColumnDef::new(Productos::Descripcion).text().null())
                    .col(ColumnDef::new(Productos::IdCategoria).uuid().null())
                    .col(
                        ColumnDef::new(Productos::UnidadMedida)
                            .string_len(16)
                            .not_null()
                            .default("UND"),
                    )
                    .col(
                        ColumnDef::new(Productos::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Productos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Productos::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_productos_id_categoria")
                            .from(Productos::Table, Productos::IdCategoria)
                            .to(Categoria::Table, Categoria::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_productos_id_categoria")
                    .table(Productos::Table)
                    .col(Productos::IdCategoria)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Productos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Productos {
    Table,
    Id,
    Sku,
    Nombre,
    Descripcion,
    IdCategoria,
    UnidadMedida,
    Activo,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Categoria {
    Table,
    Id,
}
