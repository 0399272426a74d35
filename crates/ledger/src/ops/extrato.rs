//! Statement import: parse, aggregate and persist one batch.

use chrono::Utc;
use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    FormatoExtrato, Ledger, LogEvento, ResultLedger,
    extrato::{self, montar_importacao},
    parse::parse_extrato,
};

use super::with_tx;

impl Ledger {
    /// Parses a raw CSV/OFX payload and persists the import header plus its
    /// line items in one transaction. Returns the import id.
    pub async fn importar_extrato(
        &self,
        municipio_id: &str,
        conta_id: Uuid,
        exercicio_id: Uuid,
        formato: FormatoExtrato,
        nome_arquivo: &str,
        bytes: &[u8],
        usuario: &str,
    ) -> ResultLedger<Uuid> {
        // Parsing is pure; fail before touching the database.
        let itens = parse_extrato(formato, bytes)?;

        with_tx!(self, |db_tx| {
            self.exercicio_aberto(&db_tx, municipio_id, exercicio_id)
                .await?;
            self.conta_guardada(&db_tx, municipio_id, conta_id).await?;

            let (importacao_id, header, linhas) = montar_importacao(
                municipio_id,
                conta_id,
                exercicio_id,
                formato,
                nome_arquivo,
                &itens,
                Utc::now(),
            )?;
            let total_itens = linhas.len();

            header.insert(&db_tx).await?;
            extrato::item::Entity::insert_many(linhas)
                .exec(&db_tx)
                .await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "extrato",
                    "importar_extrato",
                    "extrato_importacao",
                    importacao_id,
                    None,
                    Some(serde_json::json!({
                        "formato": formato.as_str(),
                        "nome_arquivo": nome_arquivo,
                        "total_itens": total_itens,
                    })),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(
                municipio_id,
                nome_arquivo,
                total_itens,
                formato = formato.as_str(),
                "extrato importado"
            );
            Ok(importacao_id)
        })
    }
}
