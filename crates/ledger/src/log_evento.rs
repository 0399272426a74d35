//! Append-only audit trail. Written by every mutating operation, never
//! read back by the ledger itself.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvento {
    pub id: Uuid,
    pub municipio_id: String,
    pub modulo: String,
    pub evento: String,
    pub entidade: String,
    pub entidade_id: String,
    pub antes: Option<serde_json::Value>,
    pub depois: Option<serde_json::Value>,
    pub usuario: String,
    pub observacao: Option<String>,
    pub criado_em: DateTime<Utc>,
}

impl LogEvento {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        municipio_id: &str,
        modulo: &str,
        evento: &str,
        entidade: &str,
        entidade_id: impl ToString,
        antes: Option<serde_json::Value>,
        depois: Option<serde_json::Value>,
        usuario: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            modulo: modulo.to_string(),
            evento: evento.to_string(),
            entidade: entidade.to_string(),
            entidade_id: entidade_id.to_string(),
            antes,
            depois,
            usuario: usuario.to_string(),
            observacao: None,
            criado_em: Utc::now(),
        }
    }

    pub fn com_observacao(mut self, observacao: impl Into<String>) -> Self {
        self.observacao = Some(observacao.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "log_eventos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub modulo: String,
    pub evento: String,
    pub entidade: String,
    pub entidade_id: String,
    pub antes: Option<Json>,
    pub depois: Option<Json>,
    pub usuario: String,
    pub observacao: Option<String>,
    pub criado_em: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LogEvento> for ActiveModel {
    fn from(log: &LogEvento) -> Self {
        Self {
            id: ActiveValue::Set(log.id.to_string()),
            municipio_id: ActiveValue::Set(log.municipio_id.clone()),
            modulo: ActiveValue::Set(log.modulo.clone()),
            evento: ActiveValue::Set(log.evento.clone()),
            entidade: ActiveValue::Set(log.entidade.clone()),
            entidade_id: ActiveValue::Set(log.entidade_id.clone()),
            antes: ActiveValue::Set(log.antes.clone()),
            depois: ActiveValue::Set(log.depois.clone()),
            usuario: ActiveValue::Set(log.usuario.clone()),
            observacao: ActiveValue::Set(log.observacao.clone()),
            criado_em: ActiveValue::Set(log.criado_em),
        }
    }
}

impl TryFrom<Model> for LogEvento {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("log".to_string()))?,
            municipio_id: model.municipio_id,
            modulo: model.modulo,
            evento: model.evento,
            entidade: model.entidade,
            entidade_id: model.entidade_id,
            antes: model.antes,
            depois: model.depois,
            usuario: model.usuario,
            observacao: model.observacao,
            criado_em: model.criado_em,
        })
    }
}
