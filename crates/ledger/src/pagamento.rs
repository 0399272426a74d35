//! Cash disbursement against an accrued amount.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money};

/// Payment status. Only `Pago` debits the bank account.
///
/// `Estornado` marks a reversed disbursement; the aggregates it incremented
/// are left untouched (source behavior, see DESIGN.md).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPagamento {
    Pendente,
    Pago,
    Estornado,
}

impl StatusPagamento {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pendente => "PENDENTE",
            Self::Pago => "PAGO",
            Self::Estornado => "ESTORNADO",
        }
    }
}

impl TryFrom<&str> for StatusPagamento {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PENDENTE" => Ok(Self::Pendente),
            "PAGO" => Ok(Self::Pago),
            "ESTORNADO" => Ok(Self::Estornado),
            other => Err(LedgerError::NotFound(format!(
                "invalid pagamento status: {other}"
            ))),
        }
    }
}

/// A payment drawn from one liquidação (the payable pool is the empenho's).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagamento {
    pub id: Uuid,
    pub municipio_id: String,
    pub liquidacao_id: Uuid,
    pub conta_id: Option<Uuid>,
    pub valor: Money,
    pub data: NaiveDate,
    pub status: StatusPagamento,
    pub criado_em: DateTime<Utc>,
}

impl Pagamento {
    pub fn new(
        municipio_id: &str,
        liquidacao_id: Uuid,
        conta_id: Option<Uuid>,
        valor: Money,
        data: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            liquidacao_id,
            conta_id,
            valor,
            data,
            status: StatusPagamento::Pago,
            criado_em: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pagamentos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub liquidacao_id: String,
    pub conta_id: Option<String>,
    pub valor: i64,
    pub data: Date,
    pub status: String,
    pub criado_em: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::liquidacao::Entity",
        from = "Column::LiquidacaoId",
        to = "super::liquidacao::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Liquidacoes,
    #[sea_orm(
        belongs_to = "super::conta_bancaria::Entity",
        from = "Column::ContaId",
        to = "super::conta_bancaria::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    ContasBancarias,
}

impl Related<super::liquidacao::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Liquidacoes.def()
    }
}

impl Related<super::conta_bancaria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContasBancarias.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Pagamento> for ActiveModel {
    fn from(pagamento: &Pagamento) -> Self {
        Self {
            id: ActiveValue::Set(pagamento.id.to_string()),
            municipio_id: ActiveValue::Set(pagamento.municipio_id.clone()),
            liquidacao_id: ActiveValue::Set(pagamento.liquidacao_id.to_string()),
            conta_id: ActiveValue::Set(pagamento.conta_id.map(|id| id.to_string())),
            valor: ActiveValue::Set(pagamento.valor.centavos()),
            data: ActiveValue::Set(pagamento.data),
            status: ActiveValue::Set(pagamento.status.as_str().to_string()),
            criado_em: ActiveValue::Set(pagamento.criado_em),
        }
    }
}

impl TryFrom<Model> for Pagamento {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("pagamento".to_string()))?,
            municipio_id: model.municipio_id,
            liquidacao_id: Uuid::parse_str(&model.liquidacao_id)
                .map_err(|_| LedgerError::NotFound("liquidacao".to_string()))?,
            conta_id: model.conta_id.and_then(|s| Uuid::parse_str(&s).ok()),
            valor: Money::new(model.valor),
            data: model.data,
            status: StatusPagamento::try_from(model.status.as_str())?,
            criado_em: model.criado_em,
        })
    }
}
