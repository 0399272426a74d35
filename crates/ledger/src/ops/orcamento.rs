//! Setup and budget-ledger operations: fiscal years, bank accounts,
//! dotações and supplementary credits.

use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    ContaBancaria, CreditoAdicional, Dotacao, EventoTransparencia, Exercicio, Ledger, LogEvento,
    Money, ResultLedger, conta_bancaria, credito_adicional, dotacao, exercicio,
};

use super::{snapshot, with_tx};

impl Ledger {
    /// Opens a new fiscal year for the tenant.
    pub async fn novo_exercicio(
        &self,
        municipio_id: &str,
        ano: i32,
        usuario: &str,
    ) -> ResultLedger<Exercicio> {
        let novo = Exercicio::new(municipio_id, ano);
        with_tx!(self, |db_tx| {
            exercicio::ActiveModel::from(&novo).insert(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "orcamento",
                    "novo_exercicio",
                    "exercicio",
                    novo.id,
                    None,
                    snapshot(&novo),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, ano, "exercicio aberto");
            Ok(novo)
        })
    }

    /// Closes a fiscal year. One-way: there is no reopen.
    pub async fn encerrar_exercicio(
        &self,
        municipio_id: &str,
        exercicio_id: Uuid,
        usuario: &str,
    ) -> ResultLedger<Exercicio> {
        with_tx!(self, |db_tx| {
            let mut alvo = self
                .exercicio_aberto(&db_tx, municipio_id, exercicio_id)
                .await?;
            let antes = snapshot(&alvo);
            alvo.aberto = false;
            exercicio::ActiveModel::from(&alvo).update(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "orcamento",
                    "encerrar_exercicio",
                    "exercicio",
                    alvo.id,
                    antes,
                    snapshot(&alvo),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, ano = alvo.ano, "exercicio encerrado");
            Ok(alvo)
        })
    }

    pub async fn nova_conta_bancaria(
        &self,
        municipio_id: &str,
        nome: &str,
        banco: &str,
        agencia: &str,
        numero: &str,
        saldo_inicial: Money,
        usuario: &str,
    ) -> ResultLedger<ContaBancaria> {
        let conta = ContaBancaria::new(
            municipio_id,
            nome.to_string(),
            banco.to_string(),
            agencia.to_string(),
            numero.to_string(),
            saldo_inicial,
        );
        with_tx!(self, |db_tx| {
            conta_bancaria::ActiveModel::from(&conta)
                .insert(&db_tx)
                .await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "orcamento",
                    "nova_conta_bancaria",
                    "conta_bancaria",
                    conta.id,
                    None,
                    snapshot(&conta),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, nome, "conta bancaria criada");
            Ok(conta)
        })
    }

    /// Creates a budget line inside an open fiscal year.
    pub async fn nova_dotacao(
        &self,
        municipio_id: &str,
        exercicio_id: Uuid,
        unidade_gestora: &str,
        fonte_recurso: &str,
        descricao: &str,
        valor_inicial: Money,
        usuario: &str,
    ) -> ResultLedger<Dotacao> {
        let nova = Dotacao::new(
            municipio_id,
            exercicio_id,
            unidade_gestora.to_string(),
            fonte_recurso.to_string(),
            descricao.to_string(),
            valor_inicial,
        )?;
        with_tx!(self, |db_tx| {
            self.exercicio_aberto(&db_tx, municipio_id, exercicio_id)
                .await?;
            dotacao::ActiveModel::from(&nova).insert(&db_tx).await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "orcamento",
                    "nova_dotacao",
                    "dotacao",
                    nova.id,
                    None,
                    snapshot(&nova),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, %valor_inicial, "dotacao criada");
            Ok(nova)
        })
    }

    /// Raises a dotação's ceiling and records the immutable credit.
    pub async fn aplicar_credito_adicional(
        &self,
        municipio_id: &str,
        dotacao_id: Uuid,
        valor: Money,
        observacao: Option<&str>,
        usuario: &str,
    ) -> ResultLedger<CreditoAdicional> {
        let resultado: ResultLedger<CreditoAdicional> = with_tx!(self, |db_tx| {
            let mut alvo = self.dotacao_guardada(&db_tx, municipio_id, dotacao_id).await?;
            self.exercicio_aberto(&db_tx, municipio_id, alvo.exercicio_id)
                .await?;

            let antes = snapshot(&alvo);
            alvo.aplicar_credito(valor)?;
            let credito = CreditoAdicional::new(
                municipio_id,
                dotacao_id,
                valor,
                observacao.map(str::to_string),
            );

            dotacao::ActiveModel::from(&alvo).update(&db_tx).await?;
            credito_adicional::ActiveModel::from(&credito)
                .insert(&db_tx)
                .await?;
            self.registrar_log(
                &db_tx,
                &LogEvento::new(
                    municipio_id,
                    "orcamento",
                    "aplicar_credito_adicional",
                    "dotacao",
                    alvo.id,
                    antes,
                    snapshot(&alvo),
                    usuario,
                ),
            )
            .await?;
            tracing::info!(municipio_id, %valor, "credito adicional aplicado");
            Ok(credito)
        });
        let credito = resultado?;

        self.publicar(&EventoTransparencia {
            municipio_id: municipio_id.to_string(),
            titulo: "Crédito adicional".to_string(),
            descricao: credito.observacao.clone().unwrap_or_default(),
            referencia: credito.dotacao_id.to_string(),
            valor: credito.valor,
            dados: snapshot(&credito).unwrap_or_default(),
        });
        Ok(credito)
    }
}
