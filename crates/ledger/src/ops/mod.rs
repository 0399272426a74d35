//! Operation blocks on [`crate::Ledger`], grouped by ledger area.
//!
//! Every mutating operation validates before writing and runs inside one
//! database transaction: begin, read the aggregates fresh, validate, write,
//! append audit rows, commit. Any error rolls the whole operation back.

mod arrecadacao;
mod auditoria;
mod conciliacao;
mod despesa;
mod extrato;
mod orcamento;
mod restos;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Serializes an aggregate for an audit before/after image.
fn snapshot<T: serde::Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}
