//! Commitment (empenho) and its execution state machine.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money, ResultLedger};

/// Supremum of the execution stages reached by an empenho.
///
/// Partial postings re-enter a state; the transition is monotonic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEmpenho {
    Empenhado,
    Liquidado,
    Pago,
}

impl StatusEmpenho {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empenhado => "EMPENHADO",
            Self::Liquidado => "LIQUIDADO",
            Self::Pago => "PAGO",
        }
    }
}

impl TryFrom<&str> for StatusEmpenho {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "EMPENHADO" => Ok(Self::Empenhado),
            "LIQUIDADO" => Ok(Self::Liquidado),
            "PAGO" => Ok(Self::Pago),
            other => Err(LedgerError::NotFound(format!(
                "invalid empenho status: {other}"
            ))),
        }
    }
}

/// A reservation of budget authority against one dotação.
///
/// `valor_empenhado` is fixed at creation; accruals and payments increment
/// the running totals and never decrement them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empenho {
    pub id: Uuid,
    pub municipio_id: String,
    pub dotacao_id: Uuid,
    pub numero: String,
    pub credor: String,
    pub descricao: String,
    pub valor_empenhado: Money,
    pub valor_liquidado: Money,
    pub valor_pago: Money,
    pub status: StatusEmpenho,
    pub criado_em: DateTime<Utc>,
}

impl Empenho {
    pub fn new(
        municipio_id: &str,
        dotacao_id: Uuid,
        numero: String,
        credor: String,
        descricao: String,
        valor: Money,
    ) -> ResultLedger<Self> {
        if !valor.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "empenho must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            dotacao_id,
            numero,
            credor,
            descricao,
            valor_empenhado: valor,
            valor_liquidado: Money::ZERO,
            valor_pago: Money::ZERO,
            status: StatusEmpenho::Empenhado,
            criado_em: Utc::now(),
        })
    }

    /// Committed amount not yet accrued.
    #[must_use]
    pub fn saldo_a_liquidar(&self) -> Money {
        self.valor_empenhado - self.valor_liquidado
    }

    /// Accrued amount not yet paid. Pooled across all liquidações of the
    /// empenho, so payments against any of them draw from this one balance.
    #[must_use]
    pub fn saldo_a_pagar(&self) -> Money {
        self.valor_liquidado - self.valor_pago
    }

    /// Registers an accrual against the commitment.
    pub fn liquidar(&mut self, valor: Money) -> ResultLedger<()> {
        if !valor.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "liquidacao must be > 0".to_string(),
            ));
        }
        if valor > self.saldo_a_liquidar() {
            return Err(LedgerError::ExceedsBalance(format!(
                "saldo a liquidar {} insufficient for {}",
                self.saldo_a_liquidar(),
                valor
            )));
        }
        self.valor_liquidado += valor;
        self.recompute_status();
        Ok(())
    }

    /// Registers a payment against the accrued pool.
    pub fn pagar(&mut self, valor: Money) -> ResultLedger<()> {
        if !valor.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "pagamento must be > 0".to_string(),
            ));
        }
        if valor > self.saldo_a_pagar() {
            return Err(LedgerError::ExceedsBalance(format!(
                "saldo a pagar {} insufficient for {}",
                self.saldo_a_pagar(),
                valor
            )));
        }
        self.valor_pago += valor;
        self.recompute_status();
        Ok(())
    }

    fn recompute_status(&mut self) {
        self.status = if self.valor_pago >= self.valor_liquidado && self.valor_pago.is_positive() {
            StatusEmpenho::Pago
        } else if self.valor_liquidado.is_positive() {
            StatusEmpenho::Liquidado
        } else {
            StatusEmpenho::Empenhado
        };
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "empenhos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub dotacao_id: String,
    pub numero: String,
    pub credor: String,
    pub descricao: String,
    pub valor_empenhado: i64,
    pub valor_liquidado: i64,
    pub valor_pago: i64,
    pub status: String,
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
    #[sea_orm(has_many = "super::liquidacao::Entity")]
    Liquidacoes,
}

impl Related<super::dotacao::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dotacoes.def()
    }
}

impl Related<super::liquidacao::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Liquidacoes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Empenho> for ActiveModel {
    fn from(empenho: &Empenho) -> Self {
        Self {
            id: ActiveValue::Set(empenho.id.to_string()),
            municipio_id: ActiveValue::Set(empenho.municipio_id.clone()),
            dotacao_id: ActiveValue::Set(empenho.dotacao_id.to_string()),
            numero: ActiveValue::Set(empenho.numero.clone()),
            credor: ActiveValue::Set(empenho.credor.clone()),
            descricao: ActiveValue::Set(empenho.descricao.clone()),
            valor_empenhado: ActiveValue::Set(empenho.valor_empenhado.centavos()),
            valor_liquidado: ActiveValue::Set(empenho.valor_liquidado.centavos()),
            valor_pago: ActiveValue::Set(empenho.valor_pago.centavos()),
            status: ActiveValue::Set(empenho.status.as_str().to_string()),
            criado_em: ActiveValue::Set(empenho.criado_em),
        }
    }
}

impl TryFrom<Model> for Empenho {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("empenho".to_string()))?,
            municipio_id: model.municipio_id,
            dotacao_id: Uuid::parse_str(&model.dotacao_id)
                .map_err(|_| LedgerError::NotFound("dotacao".to_string()))?,
            numero: model.numero,
            credor: model.credor,
            descricao: model.descricao,
            valor_empenhado: Money::new(model.valor_empenhado),
            valor_liquidado: Money::new(model.valor_liquidado),
            valor_pago: Money::new(model.valor_pago),
            status: StatusEmpenho::try_from(model.status.as_str())?,
            criado_em: model.criado_em,
        })
    }
}
