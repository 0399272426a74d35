//! Immutable record of a ceiling increase applied to a dotação.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money};

/// A supplementary credit. Ceilings only ever go up in this model; there is
/// no contingenciamento record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditoAdicional {
    pub id: Uuid,
    pub municipio_id: String,
    pub dotacao_id: Uuid,
    pub valor: Money,
    pub observacao: Option<String>,
    pub criado_em: DateTime<Utc>,
}

impl CreditoAdicional {
    pub fn new(
        municipio_id: &str,
        dotacao_id: Uuid,
        valor: Money,
        observacao: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            dotacao_id,
            valor,
            observacao,
            criado_em: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "creditos_adicionais")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub dotacao_id: String,
    pub valor: i64,
    pub observacao: Option<String>,
    pub criado_em: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dotacao::Entity",
        from = "Column::DotacaoId",
        to = "super::dotacao::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Dotacoes,
}

impl Related<super::dotacao::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dotacoes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CreditoAdicional> for ActiveModel {
    fn from(credito: &CreditoAdicional) -> Self {
        Self {
            id: ActiveValue::Set(credito.id.to_string()),
            municipio_id: ActiveValue::Set(credito.municipio_id.clone()),
            dotacao_id: ActiveValue::Set(credito.dotacao_id.to_string()),
            valor: ActiveValue::Set(credito.valor.centavos()),
            observacao: ActiveValue::Set(credito.observacao.clone()),
            criado_em: ActiveValue::Set(credito.criado_em),
        }
    }
}

impl TryFrom<Model> for CreditoAdicional {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("credito adicional".to_string()))?,
            municipio_id: model.municipio_id,
            dotacao_id: Uuid::parse_str(&model.dotacao_id)
                .map_err(|_| LedgerError::NotFound("dotacao".to_string()))?,
            valor: Money::new(model.valor),
            observacao: model.observacao,
            criado_em: model.criado_em,
        })
    }
}
