//! Read side of the audit log, for audit/transparency consumers.

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{Ledger, LogEvento, ResultLedger, log_evento};

use super::with_tx;

impl Ledger {
    /// Returns the audit trail of one entity, oldest first.
    pub async fn logs_por_entidade(
        &self,
        municipio_id: &str,
        entidade: &str,
        entidade_id: &str,
    ) -> ResultLedger<Vec<LogEvento>> {
        with_tx!(self, |db_tx| {
            let modelos = log_evento::Entity::find()
                .filter(log_evento::Column::MunicipioId.eq(municipio_id))
                .filter(log_evento::Column::Entidade.eq(entidade))
                .filter(log_evento::Column::EntidadeId.eq(entidade_id))
                .order_by_asc(log_evento::Column::CriadoEm)
                .order_by_asc(log_evento::Column::Id)
                .all(&db_tx)
                .await?;
            modelos.into_iter().map(LogEvento::try_from).collect()
        })
    }
}
