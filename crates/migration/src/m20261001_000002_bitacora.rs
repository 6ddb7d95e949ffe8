use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bitacora::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bitacora::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bitacora::Tabla).string().not_null())
                    .col(ColumnDef::new(Bitacora::Accion).string().not_null())
                    .col(ColumnDef::new(Bitacora::IdRegistro).integer().not_null())
                    // text, not jsonb: rows written by external triggers may hold malformed JSON
                    .col(ColumnDef::new(Bitacora::Detalle).text().null())
                    .col(
                        ColumnDef::new(Bitacora::RealizadoEn)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("bitacora_realizado_en_idx")
                    .table(Bitacora::Table)
                    .col(Bitacora::RealizadoEn)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bitacora::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Bitacora {
    Table,
    Id,
    Tabla,
    Accion,
    IdRegistro,
    Detalle,
    RealizadoEn,
}
