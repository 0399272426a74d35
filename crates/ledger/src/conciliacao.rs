//! Reconciliation marks linking statement items to ledger postings.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

/// What a statement item was matched against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipoConciliacao {
    Receita,
    Pagamento,
    PagamentoRp,
    Ajuste,
}

impl TipoConciliacao {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Receita => "RECEITA",
            Self::Pagamento => "PAGAMENTO",
            Self::PagamentoRp => "PAGAMENTO_RP",
            Self::Ajuste => "AJUSTE",
        }
    }
}

impl TryFrom<&str> for TipoConciliacao {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "RECEITA" => Ok(Self::Receita),
            "PAGAMENTO" => Ok(Self::Pagamento),
            "PAGAMENTO_RP" => Ok(Self::PagamentoRp),
            "AJUSTE" => Ok(Self::Ajuste),
            other => Err(LedgerError::NotFound(format!(
                "invalid reconciliation kind: {other}"
            ))),
        }
    }
}

/// One reconciliation mark. At most one per statement item, enforced by a
/// unique index on `extrato_item_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConciliacaoItem {
    pub id: Uuid,
    pub municipio_id: String,
    pub extrato_item_id: Uuid,
    pub tipo: TipoConciliacao,
    pub entidade_id: Option<Uuid>,
    pub observacao: Option<String>,
    pub criado_em: DateTime<Utc>,
}

impl ConciliacaoItem {
    pub fn new(
        municipio_id: &str,
        extrato_item_id: Uuid,
        tipo: TipoConciliacao,
        entidade_id: Option<Uuid>,
        observacao: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            extrato_item_id,
            tipo,
            entidade_id,
            observacao,
            criado_em: Utc::now(),
        }
    }
}

/// Outcome counters for one auto-reconciliation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumoConciliacao {
    pub processados: u32,
    pub conciliados: u32,
    pub receitas: u32,
    pub pagamentos: u32,
    pub pagamentos_rp: u32,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "conciliacao_itens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    #[sea_orm(unique)]
    pub extrato_item_id: String,
    pub tipo: String,
    pub entidade_id: Option<String>,
    pub observacao: Option<String>,
    pub criado_em: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::extrato::item::Entity",
        from = "Column::ExtratoItemId",
        to = "crate::extrato::item::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ExtratoItens,
}

impl Related<crate::extrato::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExtratoItens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ConciliacaoItem> for ActiveModel {
    fn from(item: &ConciliacaoItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            municipio_id: ActiveValue::Set(item.municipio_id.clone()),
            extrato_item_id: ActiveValue::Set(item.extrato_item_id.to_string()),
            tipo: ActiveValue::Set(item.tipo.as_str().to_string()),
            entidade_id: ActiveValue::Set(item.entidade_id.map(|id| id.to_string())),
            observacao: ActiveValue::Set(item.observacao.clone()),
            criado_em: ActiveValue::Set(item.criado_em),
        }
    }
}

impl TryFrom<Model> for ConciliacaoItem {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("conciliacao".to_string()))?,
            municipio_id: model.municipio_id,
            extrato_item_id: Uuid::parse_str(&model.extrato_item_id)
                .map_err(|_| LedgerError::NotFound("item de extrato".to_string()))?,
            tipo: TipoConciliacao::try_from(model.tipo.as_str())?,
            entidade_id: model.entidade_id.and_then(|s| Uuid::parse_str(&s).ok()),
            observacao: model.observacao,
            criado_em: model.criado_em,
        })
    }
}
