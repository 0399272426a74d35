//! Accrual (liquidação): certification that goods/services were delivered.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money};

/// An immutable accrual increment against one empenho.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liquidacao {
    pub id: Uuid,
    pub municipio_id: String,
    pub empenho_id: Uuid,
    pub valor: Money,
    pub data: NaiveDate,
    pub criado_em: DateTime<Utc>,
}

impl Liquidacao {
    pub fn new(municipio_id: &str, empenho_id: Uuid, valor: Money, data: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            empenho_id,
            valor,
            data,
            criado_em: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "liquidacoes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub empenho_id: String,
    pub valor: i64,
    pub data: Date,
    pub criado_em: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::empenho::Entity",
        from = "Column::EmpenhoId",
        to = "super::empenho::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Empenhos,
    #[sea_orm(has_many = "super::pagamento::Entity")]
    Pagamentos,
}

impl Related<super::empenho::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Empenhos.def()
    }
}

impl Related<super::pagamento::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pagamentos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Liquidacao> for ActiveModel {
    fn from(liquidacao: &Liquidacao) -> Self {
        Self {
            id: ActiveValue::Set(liquidacao.id.to_string()),
            municipio_id: ActiveValue::Set(liquidacao.municipio_id.clone()),
            empenho_id: ActiveValue::Set(liquidacao.empenho_id.to_string()),
            valor: ActiveValue::Set(liquidacao.valor.centavos()),
            data: ActiveValue::Set(liquidacao.data),
            criado_em: ActiveValue::Set(liquidacao.criado_em),
        }
    }
}

impl TryFrom<Model> for Liquidacao {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("liquidacao".to_string()))?,
            municipio_id: model.municipio_id,
            empenho_id: Uuid::parse_str(&model.empenho_id)
                .map_err(|_| LedgerError::NotFound("empenho".to_string()))?,
            valor: Money::new(model.valor),
            data: model.data,
            criado_em: model.criado_em,
        })
    }
}
