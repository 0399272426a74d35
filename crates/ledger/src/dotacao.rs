//! Budget line (dotação orçamentária) and its running execution totals.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money, ResultLedger};

/// A spending authorization owned by a managing unit and funding source
/// within one exercicio.
///
/// The ceiling is `valor_atualizado`; `valor_inicial` is kept only as the
/// historical record of the approved budget law. Execution rolls up here:
///
/// `valor_empenhado <= valor_atualizado`
/// `valor_liquidado <= valor_empenhado`
/// `valor_pago <= valor_liquidado`
///
/// The available balance is always derived, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dotacao {
    pub id: Uuid,
    pub municipio_id: String,
    pub exercicio_id: Uuid,
    pub unidade_gestora: String,
    pub fonte_recurso: String,
    pub descricao: String,
    pub valor_inicial: Money,
    pub valor_atualizado: Money,
    pub valor_empenhado: Money,
    pub valor_liquidado: Money,
    pub valor_pago: Money,
}

impl Dotacao {
    pub fn new(
        municipio_id: &str,
        exercicio_id: Uuid,
        unidade_gestora: String,
        fonte_recurso: String,
        descricao: String,
        valor_inicial: Money,
    ) -> ResultLedger<Self> {
        if valor_inicial.is_negative() {
            return Err(LedgerError::InvalidAmount(
                "valor_inicial must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            exercicio_id,
            unidade_gestora,
            fonte_recurso,
            descricao,
            valor_inicial,
            valor_atualizado: valor_inicial,
            valor_empenhado: Money::ZERO,
            valor_liquidado: Money::ZERO,
            valor_pago: Money::ZERO,
        })
    }

    /// Ceiling minus committed amount.
    #[must_use]
    pub fn saldo_disponivel(&self) -> Money {
        self.valor_atualizado - self.valor_empenhado
    }

    /// Raises the ceiling by a supplementary credit.
    pub fn aplicar_credito(&mut self, valor: Money) -> ResultLedger<()> {
        if !valor.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "credito adicional must be > 0".to_string(),
            ));
        }
        self.valor_atualizado += valor;
        Ok(())
    }

    /// Reserves budget authority for a new empenho.
    pub fn empenhar(&mut self, valor: Money) -> ResultLedger<()> {
        if !valor.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "empenho must be > 0".to_string(),
            ));
        }
        if valor > self.saldo_disponivel() {
            return Err(LedgerError::BudgetExceeded(format!(
                "saldo disponivel {} insufficient for {}",
                self.saldo_disponivel(),
                valor
            )));
        }
        self.valor_empenhado += valor;
        Ok(())
    }

    /// Rolls an accrual up into the dotação totals.
    pub fn liquidar(&mut self, valor: Money) -> ResultLedger<()> {
        if self.valor_liquidado + valor > self.valor_empenhado {
            return Err(LedgerError::ExceedsBalance(
                "liquidacao exceeds valor_empenhado".to_string(),
            ));
        }
        self.valor_liquidado += valor;
        Ok(())
    }

    /// Rolls a payment up into the dotação totals.
    pub fn pagar(&mut self, valor: Money) -> ResultLedger<()> {
        if self.valor_pago + valor > self.valor_liquidado {
            return Err(LedgerError::ExceedsBalance(
                "pagamento exceeds valor_liquidado".to_string(),
            ));
        }
        self.valor_pago += valor;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "dotacoes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub exercicio_id: String,
    pub unidade_gestora: String,
    pub fonte_recurso: String,
    pub descricao: String,
    pub valor_inicial: i64,
    pub valor_atualizado: i64,
    pub valor_empenhado: i64,
    pub valor_liquidado: i64,
    pub valor_pago: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exercicio::Entity",
        from = "Column::ExercicioId",
        to = "super::exercicio::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Exercicios,
    #[sea_orm(has_many = "super::empenho::Entity")]
    Empenhos,
}

impl Related<super::exercicio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exercicios.def()
    }
}

impl Related<super::empenho::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Empenhos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Dotacao> for ActiveModel {
    fn from(dotacao: &Dotacao) -> Self {
        Self {
            id: ActiveValue::Set(dotacao.id.to_string()),
            municipio_id: ActiveValue::Set(dotacao.municipio_id.clone()),
            exercicio_id: ActiveValue::Set(dotacao.exercicio_id.to_string()),
            unidade_gestora: ActiveValue::Set(dotacao.unidade_gestora.clone()),
            fonte_recurso: ActiveValue::Set(dotacao.fonte_recurso.clone()),
            descricao: ActiveValue::Set(dotacao.descricao.clone()),
            valor_inicial: ActiveValue::Set(dotacao.valor_inicial.centavos()),
            valor_atualizado: ActiveValue::Set(dotacao.valor_atualizado.centavos()),
            valor_empenhado: ActiveValue::Set(dotacao.valor_empenhado.centavos()),
            valor_liquidado: ActiveValue::Set(dotacao.valor_liquidado.centavos()),
            valor_pago: ActiveValue::Set(dotacao.valor_pago.centavos()),
        }
    }
}

impl TryFrom<Model> for Dotacao {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("dotacao".to_string()))?,
            municipio_id: model.municipio_id,
            exercicio_id: Uuid::parse_str(&model.exercicio_id)
                .map_err(|_| LedgerError::NotFound("exercicio".to_string()))?,
            unidade_gestora: model.unidade_gestora,
            fonte_recurso: model.fonte_recurso,
            descricao: model.descricao,
            valor_inicial: Money::new(model.valor_inicial),
            valor_atualizado: Money::new(model.valor_atualizado),
            valor_empenhado: Money::new(model.valor_empenhado),
            valor_liquidado: Money::new(model.valor_liquidado),
            valor_pago: Money::new(model.valor_pago),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dotacao(valor: i64) -> Dotacao {
        Dotacao::new(
            "saomiguel",
            Uuid::new_v4(),
            "02.01".to_string(),
            "1500".to_string(),
            "Material de consumo".to_string(),
            Money::new(valor),
        )
        .unwrap()
    }

    #[test]
    fn credito_raises_ceiling() {
        let mut d = dotacao(100_000);
        d.aplicar_credito(Money::new(50_000)).unwrap();
        assert_eq!(d.valor_atualizado, Money::new(150_000));
        assert_eq!(d.valor_inicial, Money::new(100_000));
        assert_eq!(d.saldo_disponivel(), Money::new(150_000));
    }

    #[test]
    fn credito_rejects_non_positive() {
        let mut d = dotacao(100_000);
        assert!(matches!(
            d.aplicar_credito(Money::ZERO),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            d.aplicar_credito(Money::new(-1)),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn empenho_consumes_saldo() {
        let mut d = dotacao(100_000);
        d.empenhar(Money::new(60_000)).unwrap();
        assert_eq!(d.saldo_disponivel(), Money::new(40_000));

        let err = d.empenhar(Money::new(40_001)).unwrap_err();
        assert!(matches!(err, LedgerError::BudgetExceeded(_)));
        assert_eq!(d.valor_empenhado, Money::new(60_000));
    }

    #[test]
    fn rollups_keep_invariants() {
        let mut d = dotacao(100_000);
        d.empenhar(Money::new(50_000)).unwrap();
        d.liquidar(Money::new(40_000)).unwrap();
        assert!(matches!(
            d.liquidar(Money::new(10_001)),
            Err(LedgerError::ExceedsBalance(_))
        ));
        d.pagar(Money::new(40_000)).unwrap();
        assert!(matches!(
            d.pagar(Money::new(1)),
            Err(LedgerError::ExceedsBalance(_))
        ));
    }
}
