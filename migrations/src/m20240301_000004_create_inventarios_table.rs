use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000004_create_inventarios_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Inventarios::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Inventarios::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Inventarios::IdProducto).uuid().not_null())
                    .col(ColumnDef::new(Inventarios::IdAlmacen).uuid().not_null())
                    .col(
                        ColumnDef::new(Inventarios::StockMinimo)
                            .decimal_len(14, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Inventarios::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Inventarios::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventarios_id_producto")
                            .from(Inventarios::Table, Inventarios::IdProducto)
                            .to(Productos::Table, Productos::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventarios_id_almacen")
                            .from(Inventarios::Table, Inventarios::IdAlmacen)
                            .to(Almacenes::Table, Almacenes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // One inventory record per product and warehouse
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_inventarios_producto_almacen")
                    .table(Inventarios::Table)
                    .col(Inventarios::IdProducto)
                    .col(Inventarios::IdAlmacen)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_inventarios_id_almacen")
                    .table(Inventarios::Table)
                    .col(Inventarios::IdAlmacen)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Inventarios::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Inventarios {
    Table,
    Id,
    IdProducto,
    IdAlmacen,
    StockMinimo,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Productos {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Almacenes {
    Table,
    Id,
}
