//! Statement import and reconciliation tables.
//!
//! - `extrato_importacoes`: one row per uploaded statement batch
//! - `extrato_itens`: normalized statement lines, keeping import order
//! - `conciliacao_itens`: at most one reconciliation mark per line
//!   (unique index on `extrato_item_id`)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ExtratoImportacoes {
    Table,
    Id,
    MunicipioId,
    ContaId,
    ExercicioId,
    Formato,
    NomeArquivo,
    TotalItens,
    TotalCreditos,
    TotalDebitos,
    DataInicial,
    DataFinal,
    CriadoEm,
}

#[derive(Iden)]
enum ExtratoItens {
    Table,
    Id,
    ImportacaoId,
    Ordem,
    DataMovimento,
    Valor,
    Documento,
    Historico,
    IdExterno,
}

#[derive(Iden)]
enum ConciliacaoItens {
    Table,
    Id,
    MunicipioId,
    ExtratoItemId,
    Tipo,
    EntidadeId,
    Observacao,
    CriadoEm,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExtratoImportacoes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExtratoImportacoes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::MunicipioId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::ContaId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::ExercicioId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::Formato)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::NomeArquivo)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::TotalItens)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::TotalCreditos)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::TotalDebitos)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::DataInicial)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::DataFinal)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtratoImportacoes::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExtratoItens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExtratoItens::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExtratoItens::ImportacaoId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExtratoItens::Ordem).integer().not_null())
                    .col(
                        ColumnDef::new(ExtratoItens::DataMovimento)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExtratoItens::Valor).big_integer().not_null())
                    .col(ColumnDef::new(ExtratoItens::Documento).string())
                    .col(ColumnDef::new(ExtratoItens::Historico).string())
                    .col(ColumnDef::new(ExtratoItens::IdExterno).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-extrato_itens-importacao_id")
                            .from(ExtratoItens::Table, ExtratoItens::ImportacaoId)
                            .to(ExtratoImportacoes::Table, ExtratoImportacoes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-extrato_itens-importacao_id-ordem")
                    .table(ExtratoItens::Table)
                    .col(ExtratoItens::ImportacaoId)
                    .col(ExtratoItens::Ordem)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ConciliacaoItens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConciliacaoItens::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ConciliacaoItens::MunicipioId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConciliacaoItens::ExtratoItemId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ConciliacaoItens::Tipo).string().not_null())
                    .col(ColumnDef::new(ConciliacaoItens::EntidadeId).string())
                    .col(ColumnDef::new(ConciliacaoItens::Observacao).string())
                    .col(
                        ColumnDef::new(ConciliacaoItens::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-conciliacao_itens-extrato_item_id")
                            .from(ConciliacaoItens::Table, ConciliacaoItens::ExtratoItemId)
                            .to(ExtratoItens::Table, ExtratoItens::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One mark per statement line; concurrent duplicate matches fail at
        // insert instead of double-reconciling.
        manager
            .create_index(
                Index::create()
                    .name("idx-conciliacao_itens-extrato_item_id-unique")
                    .table(ConciliacaoItens::Table)
                    .col(ConciliacaoItens::ExtratoItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConciliacaoItens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExtratoItens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExtratoImportacoes::Table).to_owned())
            .await?;
        Ok(())
    }
}
