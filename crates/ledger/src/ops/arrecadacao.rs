//! Revenue ledger: cash inflows credited to a bank account.

use chrono::NaiveDate;
use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Arrecadacao, EventoTransparencia, Ledger, LogEvento, Money, ResultLedger, arrecadacao,
    conta_bancaria,
};

use super::{snapshot, with_tx};

impl Ledger {
    /// Posts revenue against a bank account. No budget ceiling applies.
    pub async fn registrar_arrecadacao(
        &self,
        municipio_id: &str,
        exercicio_id: Uuid,
        conta_id: Uuid,
        rubrica: &str,
        valor: Money,
        data: NaiveDate,
        usuario: &str,
    ) -> ResultLedger<Arrecadacao> {
        let nova = Arrecadacao::new(
            municipio_id,
            exercicio_id,
            conta_id,
            rubrica.to_string(),
            valor,
            data,
        )?;
        let resultado: ResultLedger<Arrecadacao> = with_tx!(self, |db_tx| {
            self.exercicio_aberto(&db_tx, municipio_id, exercicio_id)
                .await?;
            let mut conta = self.conta_guardada(&db_tx, municipio_id, conta_id).await?;

            conta.creditar(valor);
            conta_bancaria::ActiveModel::from(&conta)
                .update(&db_tx)
                .await?;
            arrecadacao::ActiveModel::from(&nova).insert(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "receita",
                    "registrar_arrecadacao",
                    "arrecadacao",
                    nova.id,
                    None,
                    snapshot(&nova),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, rubrica, %valor, "arrecadacao registrada");
            Ok(nova)
        });
        let nova = resultado?;

        self.publicar(&EventoTransparencia {
            municipio_id: municipio_id.to_string(),
            titulo: "Arrecadação".to_string(),
            descricao: nova.rubrica.clone(),
            referencia: nova.conta_id.to_string(),
            valor: nova.valor,
            dados: snapshot(&nova).unwrap_or_default(),
        });
        Ok(nova)
    }
}
