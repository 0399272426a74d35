//! Fire-and-forget hook for a transparency portal.
//!
//! Publicly relevant mutations (credits, commitments, payments, revenue,
//! payables inscriptions) emit one event after their transaction commits.
//! The ledger never reads anything back from the sink.

use serde::{Deserialize, Serialize};

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventoTransparencia {
    pub municipio_id: String,
    pub titulo: String,
    pub descricao: String,
    pub referencia: String,
    pub valor: Money,
    pub dados: serde_json::Value,
}

pub trait TransparenciaSink: Send + Sync {
    fn publicar(&self, evento: &EventoTransparencia);
}
