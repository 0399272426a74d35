//! Initial schema migration - creates the execution-ledger tables.
//!
//! - `exercicios`: fiscal years per municipio
//! - `contas_bancarias`: bank accounts with running balance
//! - `dotacoes`: budget lines and their execution roll-ups
//! - `creditos_adicionais`: immutable ceiling increases
//! - `empenhos`: commitments against a dotação
//! - `liquidacoes`: accruals against an empenho
//! - `pagamentos`: disbursements against a liquidação
//! - `restos_pagar`: payables carried into a later fiscal year
//! - `pagamentos_resto`: disbursements against a carried-over payable
//! - `arrecadacoes`: revenue postings
//! - `log_eventos`: append-only audit trail

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Exercicios {
    Table,
    Id,
    MunicipioId,
    Ano,
    Aberto,
}

#[derive(Iden)]
enum ContasBancarias {
    Table,
    Id,
    MunicipioId,
    Nome,
    Banco,
    Agencia,
    Numero,
    SaldoAtual,
}

#[derive(Iden)]
enum Dotacoes {
    Table,
    Id,
    MunicipioId,
    ExercicioId,
    UnidadeGestora,
    FonteRecurso,
    Descricao,
    ValorInicial,
    ValorAtualizado,
    ValorEmpenhado,
    ValorLiquidado,
    ValorPago,
}

#[derive(Iden)]
enum CreditosAdicionais {
    Table,
    Id,
    MunicipioId,
    DotacaoId,
    Valor,
    Observacao,
    CriadoEm,
}

#[derive(Iden)]
enum Empenhos {
    Table,
    Id,
    MunicipioId,
    DotacaoId,
    Numero,
    Credor,
    Descricao,
    ValorEmpenhado,
    ValorLiquidado,
    ValorPago,
    Status,
    CriadoEm,
}

#[derive(Iden)]
enum Liquidacoes {
    Table,
    Id,
    MunicipioId,
    EmpenhoId,
    Valor,
    Data,
    CriadoEm,
}

#[derive(Iden)]
enum Pagamentos {
    Table,
    Id,
    MunicipioId,
    LiquidacaoId,
    ContaId,
    Valor,
    Data,
    Status,
    CriadoEm,
}

#[derive(Iden)]
enum RestosPagar {
    Table,
    Id,
    MunicipioId,
    EmpenhoId,
    ExercicioDestinoId,
    Numero,
    ValorInscrito,
    ValorPago,
    Status,
    CriadoEm,
}

#[derive(Iden)]
enum PagamentosResto {
    Table,
    Id,
    MunicipioId,
    RestoId,
    ContaId,
    Valor,
    Data,
    Status,
    CriadoEm,
}

#[derive(Iden)]
enum Arrecadacoes {
    Table,
    Id,
    MunicipioId,
    ExercicioId,
    ContaId,
    Rubrica,
    Valor,
    Data,
    CriadoEm,
}

#[derive(Iden)]
enum LogEventos {
    Table,
    Id,
    MunicipioId,
    Modulo,
    Evento,
    Entidade,
    EntidadeId,
    Antes,
    Depois,
    Usuario,
    Observacao,
    CriadoEm,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Exercicios
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Exercicios::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Exercicios::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Exercicios::MunicipioId).string().not_null())
                    .col(ColumnDef::new(Exercicios::Ano).integer().not_null())
                    .col(ColumnDef::new(Exercicios::Aberto).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-exercicios-municipio_id-ano-unique")
                    .table(Exercicios::Table)
                    .col(Exercicios::MunicipioId)
                    .col(Exercicios::Ano)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Contas bancarias
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ContasBancarias::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContasBancarias::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ContasBancarias::MunicipioId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContasBancarias::Nome).string().not_null())
                    .col(ColumnDef::new(ContasBancarias::Banco).string().not_null())
                    .col(ColumnDef::new(ContasBancarias::Agencia).string().not_null())
                    .col(ColumnDef::new(ContasBancarias::Numero).string().not_null())
                    .col(
                        ColumnDef::new(ContasBancarias::SaldoAtual)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Dotacoes
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Dotacoes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dotacoes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Dotacoes::MunicipioId).string().not_null())
                    .col(ColumnDef::new(Dotacoes::ExercicioId).string().not_null())
                    .col(ColumnDef::new(Dotacoes::UnidadeGestora).string().not_null())
                    .col(ColumnDef::new(Dotacoes::FonteRecurso).string().not_null())
                    .col(ColumnDef::new(Dotacoes::Descricao).string().not_null())
                    .col(
                        ColumnDef::new(Dotacoes::ValorInicial)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Dotacoes::ValorAtualizado)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Dotacoes::ValorEmpenhado)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Dotacoes::ValorLiquidado)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Dotacoes::ValorPago).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-dotacoes-exercicio_id")
                            .from(Dotacoes::Table, Dotacoes::ExercicioId)
                            .to(Exercicios::Table, Exercicios::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Creditos adicionais
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CreditosAdicionais::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditosAdicionais::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CreditosAdicionais::MunicipioId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditosAdicionais::DotacaoId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditosAdicionais::Valor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreditosAdicionais::Observacao).string())
                    .col(
                        ColumnDef::new(CreditosAdicionais::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-creditos_adicionais-dotacao_id")
                            .from(CreditosAdicionais::Table, CreditosAdicionais::DotacaoId)
                            .to(Dotacoes::Table, Dotacoes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Empenhos
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Empenhos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Empenhos::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Empenhos::MunicipioId).string().not_null())
                    .col(ColumnDef::new(Empenhos::DotacaoId).string().not_null())
                    .col(ColumnDef::new(Empenhos::Numero).string().not_null())
                    .col(ColumnDef::new(Empenhos::Credor).string().not_null())
                    .col(ColumnDef::new(Empenhos::Descricao).string().not_null())
                    .col(
                        ColumnDef::new(Empenhos::ValorEmpenhado)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Empenhos::ValorLiquidado)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Empenhos::ValorPago).big_integer().not_null())
                    .col(ColumnDef::new(Empenhos::Status).string().not_null())
                    .col(
                        ColumnDef::new(Empenhos::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-empenhos-dotacao_id")
                            .from(Empenhos::Table, Empenhos::DotacaoId)
                            .to(Dotacoes::Table, Dotacoes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-empenhos-municipio_id-numero-unique")
                    .table(Empenhos::Table)
                    .col(Empenhos::MunicipioId)
                    .col(Empenhos::Numero)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Liquidacoes
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Liquidacoes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Liquidacoes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Liquidacoes::MunicipioId).string().not_null())
                    .col(ColumnDef::new(Liquidacoes::EmpenhoId).string().not_null())
                    .col(ColumnDef::new(Liquidacoes::Valor).big_integer().not_null())
                    .col(ColumnDef::new(Liquidacoes::Data).date().not_null())
                    .col(
                        ColumnDef::new(Liquidacoes::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-liquidacoes-empenho_id")
                            .from(Liquidacoes::Table, Liquidacoes::EmpenhoId)
                            .to(Empenhos::Table, Empenhos::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Pagamentos
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Pagamentos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pagamentos::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Pagamentos::MunicipioId).string().not_null())
                    .col(
                        ColumnDef::new(Pagamentos::LiquidacaoId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Pagamentos::ContaId).string())
                    .col(ColumnDef::new(Pagamentos::Valor).big_integer().not_null())
                    .col(ColumnDef::new(Pagamentos::Data).date().not_null())
                    .col(ColumnDef::new(Pagamentos::Status).string().not_null())
                    .col(
                        ColumnDef::new(Pagamentos::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pagamentos-liquidacao_id")
                            .from(Pagamentos::Table, Pagamentos::LiquidacaoId)
                            .to(Liquidacoes::Table, Liquidacoes::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pagamentos-conta_id")
                            .from(Pagamentos::Table, Pagamentos::ContaId)
                            .to(ContasBancarias::Table, ContasBancarias::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Restos a pagar
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(RestosPagar::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RestosPagar::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RestosPagar::MunicipioId).string().not_null())
                    .col(ColumnDef::new(RestosPagar::EmpenhoId).string().not_null())
                    .col(
                        ColumnDef::new(RestosPagar::ExercicioDestinoId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RestosPagar::Numero).string().not_null())
                    .col(
                        ColumnDef::new(RestosPagar::ValorInscrito)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RestosPagar::ValorPago)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RestosPagar::Status).string().not_null())
                    .col(
                        ColumnDef::new(RestosPagar::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-restos_pagar-empenho_id")
                            .from(RestosPagar::Table, RestosPagar::EmpenhoId)
                            .to(Empenhos::Table, Empenhos::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-restos_pagar-exercicio_destino_id")
                            .from(RestosPagar::Table, RestosPagar::ExercicioDestinoId)
                            .to(Exercicios::Table, Exercicios::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Pagamentos de restos
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PagamentosResto::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PagamentosResto::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PagamentosResto::MunicipioId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PagamentosResto::RestoId).string().not_null())
                    .col(ColumnDef::new(PagamentosResto::ContaId).string())
                    .col(
                        ColumnDef::new(PagamentosResto::Valor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PagamentosResto::Data).date().not_null())
                    .col(ColumnDef::new(PagamentosResto::Status).string().not_null())
                    .col(
                        ColumnDef::new(PagamentosResto::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pagamentos_resto-resto_id")
                            .from(PagamentosResto::Table, PagamentosResto::RestoId)
                            .to(RestosPagar::Table, RestosPagar::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pagamentos_resto-conta_id")
                            .from(PagamentosResto::Table, PagamentosResto::ContaId)
                            .to(ContasBancarias::Table, ContasBancarias::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Arrecadacoes
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Arrecadacoes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Arrecadacoes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Arrecadacoes::MunicipioId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Arrecadacoes::ExercicioId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Arrecadacoes::ContaId).string().not_null())
                    .col(ColumnDef::new(Arrecadacoes::Rubrica).string().not_null())
                    .col(ColumnDef::new(Arrecadacoes::Valor).big_integer().not_null())
                    .col(ColumnDef::new(Arrecadacoes::Data).date().not_null())
                    .col(
                        ColumnDef::new(Arrecadacoes::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-arrecadacoes-exercicio_id")
                            .from(Arrecadacoes::Table, Arrecadacoes::ExercicioId)
                            .to(Exercicios::Table, Exercicios::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-arrecadacoes-conta_id")
                            .from(Arrecadacoes::Table, Arrecadacoes::ContaId)
                            .to(ContasBancarias::Table, ContasBancarias::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 11. Log de eventos
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LogEventos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LogEventos::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LogEventos::MunicipioId).string().not_null())
                    .col(ColumnDef::new(LogEventos::Modulo).string().not_null())
                    .col(ColumnDef::new(LogEventos::Evento).string().not_null())
                    .col(ColumnDef::new(LogEventos::Entidade).string().not_null())
                    .col(ColumnDef::new(LogEventos::EntidadeId).string().not_null())
                    .col(ColumnDef::new(LogEventos::Antes).json())
                    .col(ColumnDef::new(LogEventos::Depois).json())
                    .col(ColumnDef::new(LogEventos::Usuario).string().not_null())
                    .col(ColumnDef::new(LogEventos::Observacao).string())
                    .col(
                        ColumnDef::new(LogEventos::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-log_eventos-entidade-entidade_id")
                    .table(LogEventos::Table)
                    .col(LogEventos::Entidade)
                    .col(LogEventos::EntidadeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LogEventos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Arrecadacoes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PagamentosResto::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RestosPagar::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pagamentos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Liquidacoes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Empenhos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditosAdicionais::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Dotacoes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContasBancarias::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exercicios::Table).to_owned())
            .await?;
        Ok(())
    }
}
