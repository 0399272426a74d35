//! Restos a pagar: inscription, payment, estorno and cancellation.

use chrono::NaiveDate;
use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EventoTransparencia, Ledger, LedgerError, LogEvento, Money, PagamentoResto, RestosPagar,
    ResultLedger, StatusPagamento, conta_bancaria, pagamento_resto, restos_pagar,
};

use super::{snapshot, with_tx};

impl Ledger {
    async fn resto_guardado(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        municipio_id: &str,
        resto_id: Uuid,
    ) -> ResultLedger<RestosPagar> {
        let modelo = restos_pagar::Entity::find_by_id(resto_id.to_string())
            .one(txn)
            .await?
            .ok_or_else(|| LedgerError::NotFound("resto".to_string()))?;
        let resto = RestosPagar::try_from(modelo)?;
        if resto.municipio_id != municipio_id {
            return Err(LedgerError::CrossTenantReference(
                "resto belongs to another municipio".to_string(),
            ));
        }
        Ok(resto)
    }

    /// Re-inscribes an unpaid empenho balance into a later fiscal year.
    ///
    /// The originating empenho is not mutated; the inscription opens its own
    /// parallel payable.
    pub async fn inscrever_resto(
        &self,
        municipio_id: &str,
        empenho_id: Uuid,
        exercicio_destino_id: Uuid,
        valor: Money,
        numero: &str,
        usuario: &str,
    ) -> ResultLedger<RestosPagar> {
        let resultado: ResultLedger<RestosPagar> = with_tx!(self, |db_tx| {
            let emp = self.empenho_guardado(&db_tx, municipio_id, empenho_id).await?;
            self.exercicio_aberto(&db_tx, municipio_id, exercicio_destino_id)
                .await?;
            if valor > emp.saldo_a_pagar() {
                return Err(LedgerError::ExceedsBalance(format!(
                    "saldo a pagar {} insufficient for inscricao {}",
                    emp.saldo_a_pagar(),
                    valor
                )));
            }

            let novo = RestosPagar::new(
                municipio_id,
                empenho_id,
                exercicio_destino_id,
                numero.to_string(),
                valor,
            )?;
            restos_pagar::ActiveModel::from(&novo).insert(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "restos",
                    "inscrever_resto",
                    "restos_pagar",
                    novo.id,
                    None,
                    snapshot(&novo),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, numero, %valor, "resto inscrito");
            Ok(novo)
        });
        let novo = resultado?;

        self.publicar(&EventoTransparencia {
            municipio_id: municipio_id.to_string(),
            titulo: "Inscrição em restos a pagar".to_string(),
            descricao: String::new(),
            referencia: novo.numero.clone(),
            valor: novo.valor_inscrito,
            dados: snapshot(&novo).unwrap_or_default(),
        });
        Ok(novo)
    }

    /// Pays against an inscription, optionally debiting a bank account.
    pub async fn pagar_resto(
        &self,
        municipio_id: &str,
        resto_id: Uuid,
        valor: Money,
        data: NaiveDate,
        conta_id: Option<Uuid>,
        usuario: &str,
    ) -> ResultLedger<PagamentoResto> {
        let resultado: ResultLedger<PagamentoResto> = with_tx!(self, |db_tx| {
            let mut alvo = self.resto_guardado(&db_tx, municipio_id, resto_id).await?;

            let antes = snapshot(&alvo);
            alvo.pagar(valor)?;
            let novo = PagamentoResto::new(municipio_id, resto_id, conta_id, valor, data);

            restos_pagar::ActiveModel::from(&alvo).update(&db_tx).await?;
            if let Some(conta_id) = conta_id {
                let mut conta = self.conta_guardada(&db_tx, municipio_id, conta_id).await?;
                conta.debitar(valor);
                conta_bancaria::ActiveModel::from(&conta)
                    .update(&db_tx)
                    .await?;
            }
            pagamento_resto::ActiveModel::from(&novo).insert(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "restos",
                    "pagar_resto",
                    "restos_pagar",
                    alvo.id,
                    antes,
                    snapshot(&alvo),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, numero = %alvo.numero, %valor, "resto pago");
            Ok(novo)
        });
        let novo = resultado?;

        self.publicar(&EventoTransparencia {
            municipio_id: municipio_id.to_string(),
            titulo: "Pagamento de restos a pagar".to_string(),
            descricao: String::new(),
            referencia: novo.resto_id.to_string(),
            valor: novo.valor,
            dados: snapshot(&novo).unwrap_or_default(),
        });
        Ok(novo)
    }

    /// Marks a resto payment `ESTORNADO`. Balances stay untouched, same
    /// asymmetry as [`Self::estornar_pagamento`].
    pub async fn estornar_pagamento_resto(
        &self,
        municipio_id: &str,
        pagamento_id: Uuid,
        usuario: &str,
    ) -> ResultLedger<PagamentoResto> {
        with_tx!(self, |db_tx| {
            let modelo = pagamento_resto::Entity::find_by_id(pagamento_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| LedgerError::NotFound("pagamento de resto".to_string()))?;
            let mut alvo = PagamentoResto::try_from(modelo)?;
            if alvo.municipio_id != municipio_id {
                return Err(LedgerError::CrossTenantReference(
                    "pagamento belongs to another municipio".to_string(),
                ));
            }
            if alvo.status == StatusPagamento::Estornado {
                return Err(LedgerError::InvalidAmount(
                    "pagamento ja estornado".to_string(),
                ));
            }

            let antes = snapshot(&alvo);
            alvo.status = StatusPagamento::Estornado;
            pagamento_resto::ActiveModel::from(&alvo).update(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "restos",
                    "estornar_pagamento_resto",
                    "pagamento_resto",
                    alvo.id,
                    antes,
                    snapshot(&alvo),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, pagamento = %alvo.id, "pagamento de resto estornado");
            Ok(alvo)
        })
    }

    /// Cancels the unpaid remainder of an inscription.
    pub async fn cancelar_resto(
        &self,
        municipio_id: &str,
        resto_id: Uuid,
        usuario: &str,
    ) -> ResultLedger<RestosPagar> {
        with_tx!(self, |db_tx| {
            let mut alvo = self.resto_guardado(&db_tx, municipio_id, resto_id).await?;
            let antes = snapshot(&alvo);
            alvo.cancelar()?;
            restos_pagar::ActiveModel::from(&alvo).update(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "restos",
                    "cancelar_resto",
                    "restos_pagar",
                    alvo.id,
                    antes,
                    snapshot(&alvo),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, numero = %alvo.numero, "resto cancelado");
            Ok(alvo)
        })
    }
}
