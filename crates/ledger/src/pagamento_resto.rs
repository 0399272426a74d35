//! Payment against a carried-over payable. Same debit semantics as a
//! regular pagamento.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money, pagamento::StatusPagamento};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagamentoResto {
    pub id: Uuid,
    pub municipio_id: String,
    pub resto_id: Uuid,
    pub conta_id: Option<Uuid>,
    pub valor: Money,
    pub data: NaiveDate,
    pub status: StatusPagamento,
    pub criado_em: DateTime<Utc>,
}

impl PagamentoResto {
    pub fn new(
        municipio_id: &str,
        resto_id: Uuid,
        conta_id: Option<Uuid>,
        valor: Money,
        data: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            resto_id,
            conta_id,
            valor,
            data,
            status: StatusPagamento::Pago,
            criado_em: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pagamentos_resto")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub resto_id: String,
    pub conta_id: Option<String>,
    pub valor: i64,
    pub data: Date,
    pub status: String,
    pub criado_em: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restos_pagar::Entity",
        from = "Column::RestoId",
        to = "super::restos_pagar::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    RestosPagar,
    #[sea_orm(
        belongs_to = "super::conta_bancaria::Entity",
        from = "Column::ContaId",
        to = "super::conta_bancaria::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    ContasBancarias,
}

impl Related<super::restos_pagar::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RestosPagar.def()
    }
}

impl Related<super::conta_bancaria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContasBancarias.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&PagamentoResto> for ActiveModel {
    fn from(pagamento: &PagamentoResto) -> Self {
        Self {
            id: ActiveValue::Set(pagamento.id.to_string()),
            municipio_id: ActiveValue::Set(pagamento.municipio_id.clone()),
            resto_id: ActiveValue::Set(pagamento.resto_id.to_string()),
            conta_id: ActiveValue::Set(pagamento.conta_id.map(|id| id.to_string())),
            valor: ActiveValue::Set(pagamento.valor.centavos()),
            data: ActiveValue::Set(pagamento.data),
            status: ActiveValue::Set(pagamento.status.as_str().to_string()),
            criado_em: ActiveValue::Set(pagamento.criado_em),
        }
    }
}

impl TryFrom<Model> for PagamentoResto {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("pagamento de resto".to_string()))?,
            municipio_id: model.municipio_id,
            resto_id: Uuid::parse_str(&model.resto_id)
                .map_err(|_| LedgerError::NotFound("resto".to_string()))?,
            conta_id: model.conta_id.and_then(|s| Uuid::parse_str(&s).ok()),
            valor: Money::new(model.valor),
            data: model.data,
            status: StatusPagamento::try_from(model.status.as_str())?,
            criado_em: model.criado_em,
        })
    }
}
