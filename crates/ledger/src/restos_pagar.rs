//! Carried-over payables (restos a pagar).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money, ResultLedger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusResto {
    Inscrito,
    Parcial,
    Pago,
    Cancelado,
}

impl StatusResto {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inscrito => "INSCRITO",
            Self::Parcial => "PARCIAL",
            Self::Pago => "PAGO",
            Self::Cancelado => "CANCELADO",
        }
    }
}

impl TryFrom<&str> for StatusResto {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "INSCRITO" => Ok(Self::Inscrito),
            "PARCIAL" => Ok(Self::Parcial),
            "PAGO" => Ok(Self::Pago),
            "CANCELADO" => Ok(Self::Cancelado),
            other => Err(LedgerError::NotFound(format!(
                "invalid resto status: {other}"
            ))),
        }
    }
}

/// An unpaid balance re-inscribed into a later exercicio.
///
/// The inscription does not mutate the originating empenho; this is a
/// parallel ledger keyed by its own `valor_inscrito` / `valor_pago` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestosPagar {
    pub id: Uuid,
    pub municipio_id: String,
    pub empenho_id: Uuid,
    pub exercicio_destino_id: Uuid,
    pub numero: String,
    pub valor_inscrito: Money,
    pub valor_pago: Money,
    pub status: StatusResto,
    pub criado_em: DateTime<Utc>,
}

impl RestosPagar {
    pub fn new(
        municipio_id: &str,
        empenho_id: Uuid,
        exercicio_destino_id: Uuid,
        numero: String,
        valor_inscrito: Money,
    ) -> ResultLedger<Self> {
        if !valor_inscrito.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "valor_inscrito must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            empenho_id,
            exercicio_destino_id,
            numero,
            valor_inscrito,
            valor_pago: Money::ZERO,
            status: StatusResto::Inscrito,
            criado_em: Utc::now(),
        })
    }

    #[must_use]
    pub fn saldo_a_pagar(&self) -> Money {
        self.valor_inscrito - self.valor_pago
    }

    /// Registers a payment and recomputes the status.
    pub fn pagar(&mut self, valor: Money) -> ResultLedger<()> {
        if !valor.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "pagamento must be > 0".to_string(),
            ));
        }
        if self.status == StatusResto::Cancelado {
            return Err(LedgerError::ExceedsBalance(
                "resto is cancelled".to_string(),
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
        self.status = if self.valor_pago >= self.valor_inscrito {
            StatusResto::Pago
        } else if self.valor_pago.is_positive() {
            StatusResto::Parcial
        } else {
            StatusResto::Inscrito
        };
        Ok(())
    }

    /// Cancels the remaining inscription. Already-paid amounts stay paid.
    pub fn cancelar(&mut self) -> ResultLedger<()> {
        if self.status == StatusResto::Pago {
            return Err(LedgerError::ExceedsBalance(
                "resto already fully paid".to_string(),
            ));
        }
        self.status = StatusResto::Cancelado;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "restos_pagar")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub empenho_id: String,
    pub exercicio_destino_id: String,
    pub numero: String,
    pub valor_inscrito: i64,
    pub valor_pago: i64,
    pub status: String,
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
    #[sea_orm(has_many = "super::pagamento_resto::Entity")]
    PagamentosResto,
}

impl Related<super::empenho::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Empenhos.def()
    }
}

impl Related<super::pagamento_resto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PagamentosResto.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RestosPagar> for ActiveModel {
    fn from(resto: &RestosPagar) -> Self {
        Self {
            id: ActiveValue::Set(resto.id.to_string()),
            municipio_id: ActiveValue::Set(resto.municipio_id.clone()),
            empenho_id: ActiveValue::Set(resto.empenho_id.to_string()),
            exercicio_destino_id: ActiveValue::Set(resto.exercicio_destino_id.to_string()),
            numero: ActiveValue::Set(resto.numero.clone()),
            valor_inscrito: ActiveValue::Set(resto.valor_inscrito.centavos()),
            valor_pago: ActiveValue::Set(resto.valor_pago.centavos()),
            status: ActiveValue::Set(resto.status.as_str().to_string()),
            criado_em: ActiveValue::Set(resto.criado_em),
        }
    }
}

impl TryFrom<Model> for RestosPagar {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("resto".to_string()))?,
            municipio_id: model.municipio_id,
            empenho_id: Uuid::parse_str(&model.empenho_id)
                .map_err(|_| LedgerError::NotFound("empenho".to_string()))?,
            exercicio_destino_id: Uuid::parse_str(&model.exercicio_destino_id)
                .map_err(|_| LedgerError::NotFound("exercicio".to_string()))?,
            numero: model.numero,
            valor_inscrito: Money::new(model.valor_inscrito),
            valor_pago: Money::new(model.valor_pago),
            status: StatusResto::try_from(model.status.as_str())?,
            criado_em: model.criado_em,
        })
    }
}
