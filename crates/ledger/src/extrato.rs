//! Bank statement import batch and its normalized line items.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money};

/// Declared wire format of an uploaded statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatoExtrato {
    Csv,
    Ofx,
}

impl FormatoExtrato {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Ofx => "OFX",
        }
    }
}

impl TryFrom<&str> for FormatoExtrato {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CSV" => Ok(Self::Csv),
            "OFX" => Ok(Self::Ofx),
            other => Err(LedgerError::NotFound(format!(
                "invalid statement format: {other}"
            ))),
        }
    }
}

/// One normalized statement line, before persistence.
///
/// `valor` is signed: positive for credits, negative for debits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemExtrato {
    pub data_movimento: NaiveDate,
    pub valor: Money,
    pub documento: Option<String>,
    pub historico: Option<String>,
    pub id_externo: Option<String>,
}

/// Aggregates computed over a parsed batch for the import header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResumoExtrato {
    pub total_itens: i32,
    pub total_creditos: Money,
    pub total_debitos: Money,
    pub data_inicial: NaiveDate,
    pub data_final: NaiveDate,
}

impl ResumoExtrato {
    /// Computes the header aggregates. `itens` must be non-empty.
    pub fn from_itens(itens: &[ItemExtrato]) -> Result<Self, LedgerError> {
        let first = itens.first().ok_or(LedgerError::NoTransactionsFound)?;
        let mut resumo = Self {
            total_itens: itens.len() as i32,
            total_creditos: Money::ZERO,
            total_debitos: Money::ZERO,
            data_inicial: first.data_movimento,
            data_final: first.data_movimento,
        };
        for item in itens {
            if item.valor.is_positive() {
                resumo.total_creditos += item.valor;
            } else {
                resumo.total_debitos += item.valor.abs();
            }
            resumo.data_inicial = resumo.data_inicial.min(item.data_movimento);
            resumo.data_final = resumo.data_final.max(item.data_movimento);
        }
        Ok(resumo)
    }
}

pub mod importacao {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "extrato_importacoes")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub municipio_id: String,
        pub conta_id: String,
        pub exercicio_id: String,
        pub formato: String,
        pub nome_arquivo: String,
        pub total_itens: i32,
        pub total_creditos: i64,
        pub total_debitos: i64,
        pub data_inicial: Date,
        pub data_final: Date,
        pub criado_em: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::item::Entity")]
        Itens,
    }

    impl Related<super::item::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Itens.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod item {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "extrato_itens")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub importacao_id: String,
        pub ordem: i32,
        pub data_movimento: Date,
        pub valor: i64,
        pub documento: Option<String>,
        pub historico: Option<String>,
        pub id_externo: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::importacao::Entity",
            from = "Column::ImportacaoId",
            to = "super::importacao::Column::Id",
            on_update = "NoAction",
            on_delete = "Cascade"
        )]
        Importacoes,
        #[sea_orm(has_one = "crate::conciliacao::Entity")]
        Conciliacoes,
    }

    impl Related<super::importacao::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Importacoes.def()
        }
    }

    impl Related<crate::conciliacao::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Conciliacoes.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Builds the ActiveModels for one import (header + items) from parsed rows.
pub fn montar_importacao(
    municipio_id: &str,
    conta_id: Uuid,
    exercicio_id: Uuid,
    formato: FormatoExtrato,
    nome_arquivo: &str,
    itens: &[ItemExtrato],
    criado_em: DateTime<Utc>,
) -> Result<(Uuid, importacao::ActiveModel, Vec<item::ActiveModel>), LedgerError> {
    let resumo = ResumoExtrato::from_itens(itens)?;
    let importacao_id = Uuid::new_v4();

    let header = importacao::ActiveModel {
        id: ActiveValue::Set(importacao_id.to_string()),
        municipio_id: ActiveValue::Set(municipio_id.to_string()),
        conta_id: ActiveValue::Set(conta_id.to_string()),
        exercicio_id: ActiveValue::Set(exercicio_id.to_string()),
        formato: ActiveValue::Set(formato.as_str().to_string()),
        nome_arquivo: ActiveValue::Set(nome_arquivo.to_string()),
        total_itens: ActiveValue::Set(resumo.total_itens),
        total_creditos: ActiveValue::Set(resumo.total_creditos.centavos()),
        total_debitos: ActiveValue::Set(resumo.total_debitos.centavos()),
        data_inicial: ActiveValue::Set(resumo.data_inicial),
        data_final: ActiveValue::Set(resumo.data_final),
        criado_em: ActiveValue::Set(criado_em),
    };

    let rows = itens
        .iter()
        .enumerate()
        .map(|(ordem, item)| item::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            importacao_id: ActiveValue::Set(importacao_id.to_string()),
            ordem: ActiveValue::Set(ordem as i32),
            data_movimento: ActiveValue::Set(item.data_movimento),
            valor: ActiveValue::Set(item.valor.centavos()),
            documento: ActiveValue::Set(item.documento.clone()),
            historico: ActiveValue::Set(item.historico.clone()),
            id_externo: ActiveValue::Set(item.id_externo.clone()),
        })
        .collect();

    Ok((importacao_id, header, rows))
}
