use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000002_create_almacenes_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Almacenes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Almacenes::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Almacenes::Nombre)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Almacenes::Direccion).string_len(255).null())
                    .col(
                        ColumnDef::new(Almacenes::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Almacenes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Almacenes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Almacenes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Almacenes {
    Table,
    Id,
    Nombre,
    Direccion,
    Activo,
    CreatedAt,
    UpdatedAt,
}
