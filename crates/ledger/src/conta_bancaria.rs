//! Bank account balance aggregate.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money};

/// A municipal bank account.
///
/// Credited by revenue postings and debited by payments of either kind.
/// The balance may go negative; overdraft control is a treasury concern,
/// not a ledger invariant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContaBancaria {
    pub id: Uuid,
    pub municipio_id: String,
    pub nome: String,
    pub banco: String,
    pub agencia: String,
    pub numero: String,
    pub saldo_atual: Money,
}

impl ContaBancaria {
    pub fn new(
        municipio_id: &str,
        nome: String,
        banco: String,
        agencia: String,
        numero: String,
        saldo_inicial: Money,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            municipio_id: municipio_id.to_string(),
            nome,
            banco,
            agencia,
            numero,
            saldo_atual: saldo_inicial,
        }
    }

    pub fn creditar(&mut self, valor: Money) {
        self.saldo_atual += valor;
    }

    pub fn debitar(&mut self, valor: Money) {
        self.saldo_atual -= valor;
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contas_bancarias")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub municipio_id: String,
    pub nome: String,
    pub banco: String,
    pub agencia: String,
    pub numero: String,
    pub saldo_atual: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::arrecadacao::Entity")]
    Arrecadacoes,
    #[sea_orm(has_many = "super::pagamento::Entity")]
    Pagamentos,
}

impl Related<super::arrecadacao::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Arrecadacoes.def()
    }
}

impl Related<super::pagamento::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pagamentos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ContaBancaria> for ActiveModel {
    fn from(conta: &ContaBancaria) -> Self {
        Self {
            id: ActiveValue::Set(conta.id.to_string()),
            municipio_id: ActiveValue::Set(conta.municipio_id.clone()),
            nome: ActiveValue::Set(conta.nome.clone()),
            banco: ActiveValue::Set(conta.banco.clone()),
            agencia: ActiveValue::Set(conta.agencia.clone()),
            numero: ActiveValue::Set(conta.numero.clone()),
            saldo_atual: ActiveValue::Set(conta.saldo_atual.centavos()),
        }
    }
}

impl TryFrom<Model> for ContaBancaria {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("conta bancaria".to_string()))?,
            municipio_id: model.municipio_id,
            nome: model.nome,
            banco: model.banco,
            agencia: model.agencia,
            numero: model.numero,
            saldo_atual: Money::new(model.saldo_atual),
        })
    }
}
