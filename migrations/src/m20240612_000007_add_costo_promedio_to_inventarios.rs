use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240612_000007_add_costo_promedio_to_inventarios"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Existing rows start at zero and pick up a real average on their next stock-in.
        manager
            .alter_table(
                Table::alter()
                    .table(Inventarios::Table)
                    .add_column(
                        ColumnDef::new(Inventarios::CostoPromedioActual)
                            .decimal_len(12, 4)
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Inventarios::Table)
                    .drop_column(Inventarios::CostoPromedioActual)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Inventarios {
    Table,
    CostoPromedioActual,
}
