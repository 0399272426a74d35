//! Multi-tenant municipal public-finance execution ledger.
//!
//! The crate tracks budget authorizations (dotações), the expense pipeline
//! empenho → liquidação → pagamento, carried-over payables (restos a
//! pagar), revenue postings, bank statement import (CSV/OFX) and
//! auto-reconciliation. Every mutating operation runs in one database
//! transaction and appends to an audit log.
//!
//! The caller resolves tenant, fiscal year and actor; the ledger trusts the
//! `(municipio_id, exercicio_id, usuario)` triple it is given.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction, prelude::*};
use uuid::Uuid;

pub use arrecadacao::Arrecadacao;
pub use conciliacao::{ConciliacaoItem, ResumoConciliacao, TipoConciliacao};
pub use conta_bancaria::ContaBancaria;
pub use credito_adicional::CreditoAdicional;
pub use dotacao::Dotacao;
pub use empenho::{Empenho, StatusEmpenho};
pub use error::LedgerError;
pub use exercicio::Exercicio;
pub use extrato::{FormatoExtrato, ItemExtrato, ResumoExtrato};
pub use liquidacao::Liquidacao;
pub use log_evento::LogEvento;
pub use money::Money;
pub use pagamento::{Pagamento, StatusPagamento};
pub use pagamento_resto::PagamentoResto;
pub use restos_pagar::{RestosPagar, StatusResto};
pub use transparencia::{EventoTransparencia, TransparenciaSink};

pub mod arrecadacao;
pub mod conciliacao;
pub mod conta_bancaria;
pub mod credito_adicional;
pub mod dotacao;
pub mod empenho;
mod error;
pub mod exercicio;
pub mod extrato;
pub mod liquidacao;
pub mod log_evento;
mod money;
mod ops;
pub mod pagamento;
pub mod pagamento_resto;
pub mod parse;
pub mod restos_pagar;
pub mod transparencia;

pub type ResultLedger<T> = Result<T, LedgerError>;

/// Entry point for every operation.
///
/// Holds the database handle and the optional transparency sink. All state
/// lives in the database; operations read the aggregates they touch fresh
/// inside their own transaction.
pub struct Ledger {
    database: DatabaseConnection,
    transparencia: Option<Arc<dyn TransparenciaSink>>,
}

impl Ledger {
    /// Return a builder for `Ledger`.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// Fires a transparency event. No-op without a configured sink; the
    /// ledger never waits on or reads back from it.
    fn publicar(&self, evento: &EventoTransparencia) {
        if let Some(sink) = &self.transparencia {
            sink.publicar(evento);
        }
    }

    /// Loads an exercicio and checks it belongs to the tenant.
    async fn exercicio_guardado(
        &self,
        txn: &DatabaseTransaction,
        municipio_id: &str,
        exercicio_id: Uuid,
    ) -> ResultLedger<Exercicio> {
        let model = exercicio::Entity::find_by_id(exercicio_id.to_string())
            .one(txn)
            .await?
            .ok_or_else(|| LedgerError::NotFound("exercicio".to_string()))?;
        let exercicio = Exercicio::try_from(model)?;
        if exercicio.municipio_id != municipio_id {
            return Err(LedgerError::CrossTenantReference(
                "exercicio belongs to another municipio".to_string(),
            ));
        }
        Ok(exercicio)
    }

    /// Same as [`Self::exercicio_guardado`] but also requires it open.
    async fn exercicio_aberto(
        &self,
        txn: &DatabaseTransaction,
        municipio_id: &str,
        exercicio_id: Uuid,
    ) -> ResultLedger<Exercicio> {
        let exercicio = self
            .exercicio_guardado(txn, municipio_id, exercicio_id)
            .await?;
        if !exercicio.aberto {
            return Err(LedgerError::ExercicioFechado(format!(
                "exercicio {}",
                exercicio.ano
            )));
        }
        Ok(exercicio)
    }

    async fn dotacao_guardada(
        &self,
        txn: &DatabaseTransaction,
        municipio_id: &str,
        dotacao_id: Uuid,
    ) -> ResultLedger<Dotacao> {
        let model = dotacao::Entity::find_by_id(dotacao_id.to_string())
            .one(txn)
            .await?
            .ok_or_else(|| LedgerError::NotFound("dotacao".to_string()))?;
        let dotacao = Dotacao::try_from(model)?;
        if dotacao.municipio_id != municipio_id {
            return Err(LedgerError::CrossTenantReference(
                "dotacao belongs to another municipio".to_string(),
            ));
        }
        Ok(dotacao)
    }

    async fn empenho_guardado(
        &self,
        txn: &DatabaseTransaction,
        municipio_id: &str,
        empenho_id: Uuid,
    ) -> ResultLedger<Empenho> {
        let model = empenho::Entity::find_by_id(empenho_id.to_string())
            .one(txn)
            .await?
            .ok_or_else(|| LedgerError::NotFound("empenho".to_string()))?;
        let empenho = Empenho::try_from(model)?;
        if empenho.municipio_id != municipio_id {
            return Err(LedgerError::CrossTenantReference(
                "empenho belongs to another municipio".to_string(),
            ));
        }
        Ok(empenho)
    }

    async fn conta_guardada(
        &self,
        txn: &DatabaseTransaction,
        municipio_id: &str,
        conta_id: Uuid,
    ) -> ResultLedger<ContaBancaria> {
        let model = conta_bancaria::Entity::find_by_id(conta_id.to_string())
            .one(txn)
            .await?
            .ok_or_else(|| LedgerError::NotFound("conta bancaria".to_string()))?;
        let conta = ContaBancaria::try_from(model)?;
        if conta.municipio_id != municipio_id {
            return Err(LedgerError::CrossTenantReference(
                "conta belongs to another municipio".to_string(),
            ));
        }
        Ok(conta)
    }

    /// Appends one audit row inside the caller's transaction.
    async fn registrar_log(
        &self,
        txn: &DatabaseTransaction,
        log: &LogEvento,
    ) -> ResultLedger<()> {
        log_evento::ActiveModel::from(log).insert(txn).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
    transparencia: Option<Arc<dyn TransparenciaSink>>,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Optional transparency sink for publicly relevant mutations.
    pub fn transparencia(mut self, sink: Arc<dyn TransparenciaSink>) -> LedgerBuilder {
        self.transparencia = Some(sink);
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> Ledger {
        Ledger {
            database: self.database,
            transparencia: self.transparencia,
        }
    }
}
