//! Auto-reconciliation of statement items against ledger postings, plus
//! manual adjustment marks and undo.

use std::collections::HashSet;

use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    ConciliacaoItem, Ledger, LedgerError, LogEvento, ResultLedger, ResumoConciliacao,
    TipoConciliacao, arrecadacao, conciliacao, extrato, pagamento, pagamento_resto,
};

use super::{snapshot, with_tx};

impl Ledger {
    async fn importacao_guardada(
        &self,
        txn: &DatabaseTransaction,
        municipio_id: &str,
        importacao_id: Uuid,
    ) -> ResultLedger<extrato::importacao::Model> {
        let modelo = extrato::importacao::Entity::find_by_id(importacao_id.to_string())
            .one(txn)
            .await?
            .ok_or_else(|| LedgerError::NotFound("importacao".to_string()))?;
        if modelo.municipio_id != municipio_id {
            return Err(LedgerError::CrossTenantReference(
                "importacao belongs to another municipio".to_string(),
            ));
        }
        Ok(modelo)
    }

    /// Loads a statement item and checks, through its import header, that it
    /// belongs to the tenant.
    async fn item_guardado(
        &self,
        txn: &DatabaseTransaction,
        municipio_id: &str,
        extrato_item_id: Uuid,
    ) -> ResultLedger<extrato::item::Model> {
        let modelo = extrato::item::Entity::find_by_id(extrato_item_id.to_string())
            .one(txn)
            .await?
            .ok_or_else(|| LedgerError::NotFound("item de extrato".to_string()))?;
        let importacao_id = Uuid::parse_str(&modelo.importacao_id)
            .map_err(|_| LedgerError::NotFound("importacao".to_string()))?;
        self.importacao_guardada(txn, municipio_id, importacao_id)
            .await?;
        Ok(modelo)
    }

    /// Matches every unconciled item of one import against ledger postings.
    ///
    /// Match predicate: same account, same date, exact value; the oldest
    /// candidate wins and is consumed for the rest of this call. Credits
    /// look at arrecadações, debits at pagamentos then pagamentos de resto.
    /// An unmatched item is not an error.
    pub async fn conciliar_automatico(
        &self,
        municipio_id: &str,
        importacao_id: Uuid,
        usuario: &str,
    ) -> ResultLedger<ResumoConciliacao> {
        with_tx!(self, |db_tx| {
            let importacao = self
                .importacao_guardada(&db_tx, municipio_id, importacao_id)
                .await?;

            let itens = extrato::item::Entity::find()
                .filter(extrato::item::Column::ImportacaoId.eq(importacao.id.clone()))
                .order_by_asc(extrato::item::Column::Ordem)
                .all(&db_tx)
                .await?;
            let ja_conciliados: HashSet<String> = conciliacao::Entity::find()
                .filter(
                    conciliacao::Column::ExtratoItemId
                        .is_in(itens.iter().map(|i| i.id.clone()).collect::<Vec<_>>()),
                )
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|c| c.extrato_item_id)
                .collect();

            let receitas = arrecadacao::Entity::find()
                .filter(arrecadacao::Column::MunicipioId.eq(municipio_id))
                .filter(arrecadacao::Column::ContaId.eq(importacao.conta_id.clone()))
                .order_by_asc(arrecadacao::Column::CriadoEm)
                .order_by_asc(arrecadacao::Column::Id)
                .all(&db_tx)
                .await?;
            let pagamentos = pagamento::Entity::find()
                .filter(pagamento::Column::MunicipioId.eq(municipio_id))
                .filter(pagamento::Column::ContaId.eq(importacao.conta_id.clone()))
                .filter(pagamento::Column::Status.eq("PAGO"))
                .order_by_asc(pagamento::Column::CriadoEm)
                .order_by_asc(pagamento::Column::Id)
                .all(&db_tx)
                .await?;
            let pagamentos_rp = pagamento_resto::Entity::find()
                .filter(pagamento_resto::Column::MunicipioId.eq(municipio_id))
                .filter(pagamento_resto::Column::ContaId.eq(importacao.conta_id.clone()))
                .filter(pagamento_resto::Column::Status.eq("PAGO"))
                .order_by_asc(pagamento_resto::Column::CriadoEm)
                .order_by_asc(pagamento_resto::Column::Id)
                .all(&db_tx)
                .await?;

            // Consumed postings are tracked for this call only; the unique
            // index on extrato_item_id guards the item side across calls.
            let mut consumidos: HashSet<String> = HashSet::new();
            let mut resumo = ResumoConciliacao::default();

            for item in &itens {
                if ja_conciliados.contains(&item.id) || item.valor == 0 {
                    continue;
                }
                resumo.processados += 1;

                let combinado = if item.valor > 0 {
                    receitas
                        .iter()
                        .find(|r| {
                            r.data == item.data_movimento
                                && r.valor == item.valor
                                && !consumidos.contains(&r.id)
                        })
                        .map(|r| (TipoConciliacao::Receita, r.id.clone()))
                } else {
                    let valor_abs = -item.valor;
                    pagamentos
                        .iter()
                        .find(|p| {
                            p.data == item.data_movimento
                                && p.valor == valor_abs
                                && !consumidos.contains(&p.id)
                        })
                        .map(|p| (TipoConciliacao::Pagamento, p.id.clone()))
                        .or_else(|| {
                            pagamentos_rp
                                .iter()
                                .find(|p| {
                                    p.data == item.data_movimento
                                        && p.valor == valor_abs
                                        && !consumidos.contains(&p.id)
                                })
                                .map(|p| (TipoConciliacao::PagamentoRp, p.id.clone()))
                        })
                };

                let Some((tipo, entidade_id)) = combinado else {
                    continue;
                };
                consumidos.insert(entidade_id.clone());

                let item_id = Uuid::parse_str(&item.id)
                    .map_err(|_| LedgerError::NotFound("item de extrato".to_string()))?;
                let entidade_uuid = Uuid::parse_str(&entidade_id)
                    .map_err(|_| LedgerError::NotFound("lancamento".to_string()))?;
                let marca =
                    ConciliacaoItem::new(municipio_id, item_id, tipo, Some(entidade_uuid), None);
                conciliacao::ActiveModel::from(&marca).insert(&db_tx).await?;
                self.registrar_log(
                    &db_tx,
                    &LogEvento::new(
                        municipio_id,
                        "conciliacao",
                        "conciliar_automatico",
                        "conciliacao_item",
                        marca.id,
                        None,
                        snapshot(&marca),
                        usuario,
                    ),
                )
                .await?;

                resumo.conciliados += 1;
                match tipo {
                    TipoConciliacao::Receita => resumo.receitas += 1,
                    TipoConciliacao::Pagamento => resumo.pagamentos += 1,
                    TipoConciliacao::PagamentoRp => resumo.pagamentos_rp += 1,
                    TipoConciliacao::Ajuste => {}
                }
            }

            tracing::info!(
                municipio_id,
                processados = resumo.processados,
                conciliados = resumo.conciliados,
                "conciliacao automatica concluida"
            );
            Ok(resumo)
        })
    }

    /// Marks a statement item as a manual adjustment.
    ///
    /// Idempotent: a second call returns the existing mark unchanged.
    pub async fn marcar_ajuste(
        &self,
        municipio_id: &str,
        extrato_item_id: Uuid,
        observacao: Option<&str>,
        usuario: &str,
    ) -> ResultLedger<ConciliacaoItem> {
        with_tx!(self, |db_tx| {
            let item = self
                .item_guardado(&db_tx, municipio_id, extrato_item_id)
                .await?;

            if let Some(existente) = conciliacao::Entity::find()
                .filter(conciliacao::Column::ExtratoItemId.eq(item.id.clone()))
                .one(&db_tx)
                .await?
            {
                return Ok(ConciliacaoItem::try_from(existente)?);
            }

            let marca = ConciliacaoItem::new(
                municipio_id,
                extrato_item_id,
                TipoConciliacao::Ajuste,
                None,
                observacao.map(str::to_string),
            );
            conciliacao::ActiveModel::from(&marca).insert(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "conciliacao",
                    "marcar_ajuste",
                    "conciliacao_item",
                    marca.id,
                    None,
                    snapshot(&marca),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, item = %extrato_item_id, "item marcado como ajuste");
            Ok(marca)
        })
    }

    /// Removes the reconciliation mark of an item, if any.
    ///
    /// Returns whether a mark existed. Posting balances are never reversed
    /// by an undo.
    pub async fn desfazer_conciliacao(
        &self,
        municipio_id: &str,
        extrato_item_id: Uuid,
        usuario: &str,
    ) -> ResultLedger<bool> {
        with_tx!(self, |db_tx| {
            let item = self
                .item_guardado(&db_tx, municipio_id, extrato_item_id)
                .await?;

            let Some(existente) = conciliacao::Entity::find()
                .filter(conciliacao::Column::ExtratoItemId.eq(item.id.clone()))
                .one(&db_tx)
                .await?
            else {
                return Ok(false);
            };

            let marca = ConciliacaoItem::try_from(existente.clone())?;
            conciliacao::Entity::delete_by_id(existente.id)
                .exec(&db_tx)
                .await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "conciliacao",
                    "desfazer_conciliacao",
                    "conciliacao_item",
                    marca.id,
                    snapshot(&marca),
                    None,
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, item = %extrato_item_id, "conciliacao desfeita");
            Ok(true)
        })
    }
}
