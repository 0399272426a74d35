//! Expense pipeline: empenho → liquidação → pagamento, plus the estorno.

use chrono::NaiveDate;
use sea_orm::{PaginatorTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Empenho, EventoTransparencia, Ledger, LedgerError, Liquidacao, LogEvento, Money, Pagamento,
    ResultLedger, StatusPagamento, conta_bancaria, dotacao, empenho, liquidacao, pagamento,
};

use super::{snapshot, with_tx};

impl Ledger {
    /// Commits budget authority against a dotação.
    ///
    /// The empenho number is sequential per tenant within the fiscal year,
    /// `AAAA/NNNNNN`.
    pub async fn empenhar(
        &self,
        municipio_id: &str,
        dotacao_id: Uuid,
        credor: &str,
        descricao: &str,
        valor: Money,
        usuario: &str,
    ) -> ResultLedger<Empenho> {
        let resultado: ResultLedger<Empenho> = with_tx!(self, |db_tx| {
            let mut alvo = self.dotacao_guardada(&db_tx, municipio_id, dotacao_id).await?;
            let ano = self
                .exercicio_aberto(&db_tx, municipio_id, alvo.exercicio_id)
                .await?
                .ano;

            alvo.empenhar(valor)?;

            // The `{ano}/` prefix scopes the sequential to the fiscal year,
            // so numbering restarts at 000001 every rollover. The unique
            // index on (municipio_id, numero) rejects a duplicate minted by
            // a concurrent call.
            let sequencial = empenho::Entity::find()
                .filter(empenho::Column::MunicipioId.eq(municipio_id))
                .filter(empenho::Column::Numero.starts_with(format!("{ano}/")))
                .count(&db_tx)
                .await?
                + 1;
            let novo = Empenho::new(
                municipio_id,
                dotacao_id,
                format!("{ano}/{sequencial:06}"),
                credor.to_string(),
                descricao.to_string(),
                valor,
            )?;

            dotacao::ActiveModel::from(&alvo).update(&db_tx).await?;
            empenho::ActiveModel::from(&novo).insert(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "despesa",
                    "empenhar",
                    "empenho",
                    novo.id,
                    None,
                    snapshot(&novo),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, numero = %novo.numero, %valor, "empenho emitido");
            Ok(novo)
        });
        let novo = resultado?;

        self.publicar(&EventoTransparencia {
            municipio_id: municipio_id.to_string(),
            titulo: "Empenho".to_string(),
            descricao: novo.descricao.clone(),
            referencia: novo.numero.clone(),
            valor: novo.valor_empenhado,
            dados: snapshot(&novo).unwrap_or_default(),
        });
        Ok(novo)
    }

    /// Accrues delivered goods/services against an empenho.
    pub async fn liquidar(
        &self,
        municipio_id: &str,
        empenho_id: Uuid,
        valor: Money,
        data: NaiveDate,
        usuario: &str,
    ) -> ResultLedger<Liquidacao> {
        with_tx!(self, |db_tx| {
            let mut alvo = self.empenho_guardado(&db_tx, municipio_id, empenho_id).await?;
            let mut linha = self
                .dotacao_guardada(&db_tx, municipio_id, alvo.dotacao_id)
                .await?;
            self.exercicio_aberto(&db_tx, municipio_id, linha.exercicio_id)
                .await?;

            let antes = snapshot(&alvo);
            alvo.liquidar(valor)?;
            linha.liquidar(valor)?;
            let nova = Liquidacao::new(municipio_id, empenho_id, valor, data);

            dotacao::ActiveModel::from(&linha).update(&db_tx).await?;
            empenho::ActiveModel::from(&alvo).update(&db_tx).await?;
            liquidacao::ActiveModel::from(&nova).insert(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "despesa",
                    "liquidar",
                    "empenho",
                    alvo.id,
                    antes,
                    snapshot(&alvo),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, numero = %alvo.numero, %valor, "liquidacao registrada");
            Ok(nova)
        })
    }

    /// Pays against the empenho's accrued pool, optionally debiting a bank
    /// account. The payment is created already `PAGO`.
    pub async fn pagar(
        &self,
        municipio_id: &str,
        liquidacao_id: Uuid,
        valor: Money,
        data: NaiveDate,
        conta_id: Option<Uuid>,
        usuario: &str,
    ) -> ResultLedger<Pagamento> {
        let resultado: ResultLedger<Pagamento> = with_tx!(self, |db_tx| {
            let modelo = liquidacao::Entity::find_by_id(liquidacao_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| LedgerError::NotFound("liquidacao".to_string()))?;
            let alvo = Liquidacao::try_from(modelo)?;
            if alvo.municipio_id != municipio_id {
                return Err(LedgerError::CrossTenantReference(
                    "liquidacao belongs to another municipio".to_string(),
                ));
            }

            let mut emp = self
                .empenho_guardado(&db_tx, municipio_id, alvo.empenho_id)
                .await?;
            let mut linha = self
                .dotacao_guardada(&db_tx, municipio_id, emp.dotacao_id)
                .await?;
            self.exercicio_aberto(&db_tx, municipio_id, linha.exercicio_id)
                .await?;

            let antes = snapshot(&emp);
            emp.pagar(valor)?;
            linha.pagar(valor)?;
            let novo = Pagamento::new(municipio_id, liquidacao_id, conta_id, valor, data);

            dotacao::ActiveModel::from(&linha).update(&db_tx).await?;
            empenho::ActiveModel::from(&emp).update(&db_tx).await?;
            if let Some(conta_id) = conta_id {
                let mut conta = self.conta_guardada(&db_tx, municipio_id, conta_id).await?;
                conta.debitar(valor);
                conta_bancaria::ActiveModel::from(&conta)
                    .update(&db_tx)
                    .await?;
            }
            pagamento::ActiveModel::from(&novo).insert(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "despesa",
                    "pagar",
                    "empenho",
                    emp.id,
                    antes,
                    snapshot(&emp),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, numero = %emp.numero, %valor, "pagamento efetuado");
            Ok(novo)
        });
        let novo = resultado?;

        self.publicar(&EventoTransparencia {
            municipio_id: municipio_id.to_string(),
            titulo: "Pagamento".to_string(),
            descricao: String::new(),
            referencia: novo.liquidacao_id.to_string(),
            valor: novo.valor,
            dados: snapshot(&novo).unwrap_or_default(),
        });
        Ok(novo)
    }

    /// Marks a payment `ESTORNADO`.
    ///
    /// The aggregates and account balance the payment moved are left as
    /// they are; the estorno is an audit mark, not a reversal.
    pub async fn estornar_pagamento(
        &self,
        municipio_id: &str,
        pagamento_id: Uuid,
        usuario: &str,
    ) -> ResultLedger<Pagamento> {
        with_tx!(self, |db_tx| {
            let modelo = pagamento::Entity::find_by_id(pagamento_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| LedgerError::NotFound("pagamento".to_string()))?;
            let mut alvo = Pagamento::try_from(modelo)?;
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
            pagamento::ActiveModel::from(&alvo).update(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "despesa",
                    "estornar_pagamento",
                    "pagamento",
                    alvo.id,
                    antes,
                    snapshot(&alvo),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, pagamento = %alvo.id, "pagamento estornado");
            Ok(alvo)
        })
    }
}
