use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000001_create_categoria_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categoria::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Categoria::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Categoria::Nombre).string_len(100).not_null())
                    .col(ColumnDef::new(Categoria::Descripcion).text().null())
                    .col(
                        ColumnDef::new(Categoria::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Categoria::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Categoria::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_categoria_nombre")
                    .table(Categoria::Table)
                    .col(Categoria::Nombre)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Categoria::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Categoria {
    Table,
    Id,
    Nombre,
    Descripcion,
    Activo,
    CreatedAt,
    UpdatedAt,
}
