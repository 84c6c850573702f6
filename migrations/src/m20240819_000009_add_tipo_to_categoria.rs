use sea_orm_migration::prelude::*;
use sea_orm_migration::prelude::sea_orm::DatabaseBackend;
use sea_orm_migration::prelude::sea_query::extension::postgres::Type;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240819_000009_add_tipo_to_categoria"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        if backend == DatabaseBackend::Postgres {
            manager
                .create_type(
                    Type::create()
                        .as_enum(CategoriaTipo::Enum)
                        .values([CategoriaTipo::Producto, CategoriaTipo::Servicio])
                        .to_owned(),
                )
                .await?;
        }

        // Existing categories are backfilled through the column default.
        let mut tipo = ColumnDef::new(Categoria::Tipo);
        if backend == DatabaseBackend::Postgres {
            tipo.custom(CategoriaTipo::Enum);
        } else {
            tipo.string_len(10);
        }
        tipo.not_null().default("PRODUCTO");

        manager
            .alter_table(
                Table::alter()
                    .table(Categoria::Table)
                    .add_column(&mut tipo)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Categoria::Table)
                    .drop_column(Categoria::Tipo)
                    .to_owned(),
            )
            .await?;

        if manager.get_database_backend() == DatabaseBackend::Postgres {
            manager
                .drop_type(Type::drop().if_exists().name(CategoriaTipo::Enum).to_owned())
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Categoria {
    Table,
    Tipo,
}

#[derive(DeriveIden)]
enum CategoriaTipo {
    #[sea_orm(iden = "categoria_tipo_enum")]
    Enum,
    #[sea_orm(iden = "PRODUCTO")]
    Producto,
    #[sea_orm(iden = "SERVICIO")]
    Servicio,
}
