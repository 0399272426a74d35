//! Fiscal year (exercício) the ledger entities are scoped to.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

/// A fiscal year of one municipio.
///
/// Postings are only accepted while the exercicio is open; closing it is a
/// one-way administrative act.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercicio {
    pub id: Uuid,
    pub municipio_id: String,
    pub ano: i32,
    pub aberto: bool,
}

impl Exercicio {
    pub fn new(municipio_id: &str, ano: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            ano,
            aberto: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exercicios")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub ano: i32,
    pub aberto: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dotacao::Entity")]
    Dotacoes,
}

impl Related<super::dotacao::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dotacoes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Exercicio> for ActiveModel {
    fn from(exercicio: &Exercicio) -> Self {
        Self {
            id: ActiveValue::Set(exercicio.id.to_string()),
            municipio_id: ActiveValue::Set(exercicio.municipio_id.clone()),
            ano: ActiveValue::Set(exercicio.ano),
            aberto: ActiveValue::Set(exercicio.aberto),
        }
    }
}

impl TryFrom<Model> for Exercicio {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("exercicio".to_string()))?,
            municipio_id: model.municipio_id,
            ano: model.ano,
            aberto: model.aberto,
        })
    }
}
