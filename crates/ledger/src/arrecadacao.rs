//! Revenue posting (arrecadação) credited to a bank account.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money, ResultLedger};

/// A cash inflow. Revenue has no ceiling; it is never checked against a
/// budget line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrecadacao {
    pub id: Uuid,
    pub municipio_id: String,
    pub exercicio_id: Uuid,
    pub conta_id: Uuid,
    pub rubrica: String,
    pub valor: Money,
    pub data: NaiveDate,
    pub criado_em: DateTime<Utc>,
}

impl Arrecadacao {
    pub fn new(
        municipio_id: &str,
        exercicio_id: Uuid,
        conta_id: Uuid,
        rubrica: String,
        valor: Money,
        data: NaiveDate,
    ) -> ResultLedger<Self> {
        if !valor.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "arrecadacao must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            exercicio_id,
            conta_id,
            rubrica,
            valor,
            data,
            criado_em: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "arrecadacoes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub exercicio_id: String,
    pub conta_id: String,
    pub rubrica: String,
    pub valor: i64,
    pub data: Date,
    pub criado_em: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::conta_bancaria::Entity",
        from = "Column::ContaId",
        to = "super::conta_bancaria::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    ContasBancarias,
}

impl Related<super::conta_bancaria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContasBancarias.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Arrecadacao> for ActiveModel {
    fn from(arrecadacao: &Arrecadacao) -> Self {
        Self {
            id: ActiveValue::Set(arrecadacao.id.to_string()),
            municipio_id: ActiveValue::Set(arrecadacao.municipio_id.clone()),
            exercicio_id: ActiveValue::Set(arrecadacao.exercicio_id.to_string()),
            conta_id: ActiveValue::Set(arrecadacao.conta_id.to_string()),
            rubrica: ActiveValue::Set(arrecadacao.rubrica.clone()),
            valor: ActiveValue::Set(arrecadacao.valor.centavos()),
            data: ActiveValue::Set(arrecadacao.data),
            criado_em: ActiveValue::Set(arrecadacao.criado_em),
        }
    }
}

impl TryFrom<Model> for Arrecadacao {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("arrecadacao".to_string()))?,
            municipio_id: model.municipio_id,
            exercicio_id: Uuid::parse_str(&model.exercicio_id)
                .map_err(|_| LedgerError::NotFound("exercicio".to_string()))?,
            conta_id: Uuid::parse_str(&model.conta_id)
                .map_err(|_| LedgerError::NotFound("conta bancaria".to_string()))?,
            rubrica: model.rubrica,
            valor: Money::new(model.valor),
            data: model.data,
            criado_em: model.criado_em,
        })
    }
}
