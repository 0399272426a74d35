use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait};

use ledger::{
    EventoTransparencia, Ledger, LedgerError, Money, StatusEmpenho, StatusPagamento, StatusResto,
    TransparenciaSink,
};
use migration::MigratorTrait;

async fn ledger_with_db() -> (Ledger, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let ledger = Ledger::builder().database(db.clone()).build();
    (ledger, db)
}

fn dia(ano: i32, mes: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(ano, mes, d).unwrap()
}

async fn reload_dotacao(db: &DatabaseConnection, id: uuid::Uuid) -> ledger::Dotacao {
    let model = ledger::dotacao::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap();
    ledger::Dotacao::try_from(model).unwrap()
}

async fn reload_empenho(db: &DatabaseConnection, id: uuid::Uuid) -> ledger::Empenho {
    let model = ledger::empenho::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap();
    ledger::Empenho::try_from(model).unwrap()
}

async fn reload_conta(db: &DatabaseConnection, id: uuid::Uuid) -> ledger::ContaBancaria {
    let model = ledger::conta_bancaria::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap();
    ledger::ContaBancaria::try_from(model).unwrap()
}

#[tokio::test]
async fn empenho_liquidacao_pagamento_pipeline() {
    let (ledger, db) = ledger_with_db().await;
    let exercicio = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let conta = ledger
        .nova_conta_bancaria(
            "pirapora",
            "Conta Movimento",
            "001",
            "1234",
            "56789-0",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            exercicio.id,
            "02.01",
            "1500",
            "Material de consumo",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();

    let empenho = ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Fornecedor Ltda",
            "Merenda escolar",
            Money::new(50_000),
            "ana",
        )
        .await
        .unwrap();
    assert_eq!(empenho.numero, "2026/000001");

    let d = reload_dotacao(&db, dotacao.id).await;
    assert_eq!(d.valor_empenhado, Money::new(50_000));
    assert_eq!(d.saldo_disponivel(), Money::new(50_000));

    let liquidacao = ledger
        .liquidar("pirapora", empenho.id, Money::new(40_000), dia(2026, 3, 1), "ana")
        .await
        .unwrap();

    let e = reload_empenho(&db, empenho.id).await;
    assert_eq!(e.status, StatusEmpenho::Liquidado);
    assert_eq!(e.saldo_a_liquidar(), Money::new(10_000));

    ledger
        .pagar(
            "pirapora",
            liquidacao.id,
            Money::new(40_000),
            dia(2026, 3, 5),
            Some(conta.id),
            "ana",
        )
        .await
        .unwrap();

    let e = reload_empenho(&db, empenho.id).await;
    assert_eq!(e.status, StatusEmpenho::Pago);
    let d = reload_dotacao(&db, dotacao.id).await;
    assert_eq!(d.valor_pago, Money::new(40_000));
    let c = reload_conta(&db, conta.id).await;
    assert_eq!(c.saldo_atual, Money::new(60_000));
}

#[tokio::test]
async fn empenho_beyond_saldo_writes_nothing() {
    let (ledger, db) = ledger_with_db().await;
    let exercicio = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            exercicio.id,
            "02.01",
            "1500",
            "Obras",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();

    let err = ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Construtora",
            "Reforma",
            Money::new(150_000),
            "ana",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::BudgetExceeded(_)));

    assert_eq!(
        ledger::empenho::Entity::find().count(&db).await.unwrap(),
        0
    );
    let d = reload_dotacao(&db, dotacao.id).await;
    assert_eq!(d.valor_empenhado, Money::ZERO);
}

#[tokio::test]
async fn empenho_numbering_restarts_each_fiscal_year() {
    let (ledger, _db) = ledger_with_db().await;
    let ex2026 = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let ex2027 = ledger.novo_exercicio("pirapora", 2027, "ana").await.unwrap();
    let d2026 = ledger
        .nova_dotacao(
            "pirapora",
            ex2026.id,
            "02.01",
            "1500",
            "Custeio",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();
    let d2027 = ledger
        .nova_dotacao(
            "pirapora",
            ex2027.id,
            "02.01",
            "1500",
            "Custeio",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();

    let primeiro = ledger
        .empenhar(
            "pirapora",
            d2026.id,
            "Fornecedor",
            "Compra",
            Money::new(10_000),
            "ana",
        )
        .await
        .unwrap();
    let segundo = ledger
        .empenhar(
            "pirapora",
            d2026.id,
            "Fornecedor",
            "Compra",
            Money::new(10_000),
            "ana",
        )
        .await
        .unwrap();
    assert_eq!(primeiro.numero, "2026/000001");
    assert_eq!(segundo.numero, "2026/000002");

    // The sequential starts over at the year rollover.
    let virada = ledger
        .empenhar(
            "pirapora",
            d2027.id,
            "Fornecedor",
            "Compra",
            Money::new(10_000),
            "ana",
        )
        .await
        .unwrap();
    assert_eq!(virada.numero, "2027/000001");
}

#[tokio::test]
async fn credito_adicional_raises_ceiling() {
    let (ledger, db) = ledger_with_db().await;
    let exercicio = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            exercicio.id,
            "02.01",
            "1500",
            "Saude",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();

    ledger
        .aplicar_credito_adicional(
            "pirapora",
            dotacao.id,
            Money::new(25_000),
            Some("decreto 12/2026"),
            "ana",
        )
        .await
        .unwrap();

    // The raised ceiling admits an empenho above the initial budget.
    ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Hospital",
            "Insumos",
            Money::new(120_000),
            "ana",
        )
        .await
        .unwrap();

    let d = reload_dotacao(&db, dotacao.id).await;
    assert_eq!(d.valor_inicial, Money::new(100_000));
    assert_eq!(d.valor_atualizado, Money::new(125_000));
    assert_eq!(d.saldo_disponivel(), Money::new(5_000));
}

#[tokio::test]
async fn closed_exercicio_rejects_postings() {
    let (ledger, _db) = ledger_with_db().await;
    let exercicio = ledger.novo_exercicio("pirapora", 2025, "ana").await.unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            exercicio.id,
            "02.01",
            "1500",
            "Custeio",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();

    ledger
        .encerrar_exercicio("pirapora", exercicio.id, "ana")
        .await
        .unwrap();

    let err = ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Fornecedor",
            "Tardio",
            Money::new(1_000),
            "ana",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ExercicioFechado(_)));

    let err = ledger
        .nova_dotacao(
            "pirapora",
            exercicio.id,
            "02.02",
            "1500",
            "Nova",
            Money::new(1_000),
            "ana",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ExercicioFechado(_)));
}

#[tokio::test]
async fn cross_tenant_reference_fails_and_writes_nothing() {
    let (ledger, db) = ledger_with_db().await;
    let exercicio = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            exercicio.id,
            "02.01",
            "1500",
            "Custeio",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();

    let err = ledger
        .empenhar(
            "outromunicipio",
            dotacao.id,
            "Fornecedor",
            "Indevido",
            Money::new(1_000),
            "eva",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CrossTenantReference(_)));
    assert_eq!(
        ledger::empenho::Entity::find().count(&db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn restos_a_pagar_flow() {
    let (ledger, db) = ledger_with_db().await;
    let ex2026 = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let ex2027 = ledger.novo_exercicio("pirapora", 2027, "ana").await.unwrap();
    let conta = ledger
        .nova_conta_bancaria(
            "pirapora",
            "Conta Movimento",
            "001",
            "1234",
            "56789-0",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            ex2026.id,
            "02.01",
            "1500",
            "Servicos",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();
    let empenho = ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Prestadora",
            "Limpeza",
            Money::new(30_000),
            "ana",
        )
        .await
        .unwrap();
    ledger
        .liquidar("pirapora", empenho.id, Money::new(30_000), dia(2026, 12, 20), "ana")
        .await
        .unwrap();

    let resto = ledger
        .inscrever_resto(
            "pirapora",
            empenho.id,
            ex2027.id,
            Money::new(30_000),
            "RP 2027/001",
            "ana",
        )
        .await
        .unwrap();
    assert_eq!(resto.status, StatusResto::Inscrito);

    ledger
        .pagar_resto(
            "pirapora",
            resto.id,
            Money::new(12_000),
            dia(2027, 2, 1),
            Some(conta.id),
            "ana",
        )
        .await
        .unwrap();

    let model = ledger::restos_pagar::Entity::find_by_id(resto.id.to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let r = ledger::RestosPagar::try_from(model).unwrap();
    assert_eq!(r.status, StatusResto::Parcial);
    assert_eq!(r.saldo_a_pagar(), Money::new(18_000));
    assert_eq!(
        reload_conta(&db, conta.id).await.saldo_atual,
        Money::new(88_000)
    );

    ledger
        .pagar_resto(
            "pirapora",
            resto.id,
            Money::new(18_000),
            dia(2027, 3, 1),
            Some(conta.id),
            "ana",
        )
        .await
        .unwrap();

    let model = ledger::restos_pagar::Entity::find_by_id(resto.id.to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let r = ledger::RestosPagar::try_from(model).unwrap();
    assert_eq!(r.status, StatusResto::Pago);
    assert_eq!(r.saldo_a_pagar(), Money::ZERO);
    assert_eq!(
        reload_conta(&db, conta.id).await.saldo_atual,
        Money::new(70_000)
    );

    // Fully paid inscriptions cannot be cancelled.
    let err = ledger
        .cancelar_resto("pirapora", resto.id, "ana")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ExceedsBalance(_)));
}

#[tokio::test]
async fn inscricao_cannot_exceed_saldo_a_pagar() {
    let (ledger, _db) = ledger_with_db().await;
    let ex2026 = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let ex2027 = ledger.novo_exercicio("pirapora", 2027, "ana").await.unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            ex2026.id,
            "02.01",
            "1500",
            "Servicos",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();
    let empenho = ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Prestadora",
            "Limpeza",
            Money::new(30_000),
            "ana",
        )
        .await
        .unwrap();
    ledger
        .liquidar("pirapora", empenho.id, Money::new(20_000), dia(2026, 12, 1), "ana")
        .await
        .unwrap();

    let err = ledger
        .inscrever_resto(
            "pirapora",
            empenho.id,
            ex2027.id,
            Money::new(20_001),
            "RP 2027/009",
            "ana",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ExceedsBalance(_)));
}

#[tokio::test]
async fn estorno_marks_status_but_keeps_balances() {
    let (ledger, db) = ledger_with_db().await;
    let exercicio = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let conta = ledger
        .nova_conta_bancaria(
            "pirapora",
            "Conta Movimento",
            "001",
            "1234",
            "56789-0",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            exercicio.id,
            "02.01",
            "1500",
            "Custeio",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();
    let empenho = ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Fornecedor",
            "Compra",
            Money::new(20_000),
            "ana",
        )
        .await
        .unwrap();
    let liquidacao = ledger
        .liquidar("pirapora", empenho.id, Money::new(20_000), dia(2026, 4, 1), "ana")
        .await
        .unwrap();
    let pagamento = ledger
        .pagar(
            "pirapora",
            liquidacao.id,
            Money::new(20_000),
            dia(2026, 4, 2),
            Some(conta.id),
            "ana",
        )
        .await
        .unwrap();

    let estornado = ledger
        .estornar_pagamento("pirapora", pagamento.id, "ana")
        .await
        .unwrap();
    assert_eq!(estornado.status, StatusPagamento::Estornado);

    // The estorno is an audit mark only; nothing is credited back.
    let d = reload_dotacao(&db, dotacao.id).await;
    assert_eq!(d.valor_pago, Money::new(20_000));
    assert_eq!(
        reload_conta(&db, conta.id).await.saldo_atual,
        Money::new(80_000)
    );

    let err = ledger
        .estornar_pagamento("pirapora", pagamento.id, "ana")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[tokio::test]
async fn account_balance_conserves_postings() {
    let (ledger, db) = ledger_with_db().await;
    let ex2026 = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let ex2027 = ledger.novo_exercicio("pirapora", 2027, "ana").await.unwrap();
    let conta = ledger
        .nova_conta_bancaria(
            "pirapora",
            "Conta Unica",
            "001",
            "1234",
            "56789-0",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            ex2026.id,
            "02.01",
            "1500",
            "Custeio",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();

    ledger
        .registrar_arrecadacao(
            "pirapora",
            ex2026.id,
            conta.id,
            "1.1.1.8.01",
            Money::new(50_000),
            dia(2026, 1, 10),
            "ana",
        )
        .await
        .unwrap();

    let empenho = ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Fornecedor",
            "Compra",
            Money::new(40_000),
            "ana",
        )
        .await
        .unwrap();
    let liquidacao = ledger
        .liquidar("pirapora", empenho.id, Money::new(40_000), dia(2026, 2, 1), "ana")
        .await
        .unwrap();
    ledger
        .pagar(
            "pirapora",
            liquidacao.id,
            Money::new(20_000),
            dia(2026, 2, 2),
            Some(conta.id),
            "ana",
        )
        .await
        .unwrap();

    let resto = ledger
        .inscrever_resto(
            "pirapora",
            empenho.id,
            ex2027.id,
            Money::new(20_000),
            "RP 2027/001",
            "ana",
        )
        .await
        .unwrap();
    ledger
        .pagar_resto(
            "pirapora",
            resto.id,
            Money::new(10_000),
            dia(2027, 1, 15),
            Some(conta.id),
            "ana",
        )
        .await
        .unwrap();

    // initial 1000.00 + revenue 500.00 - payment 200.00 - resto payment 100.00
    assert_eq!(
        reload_conta(&db, conta.id).await.saldo_atual,
        Money::new(120_000)
    );
}

#[tokio::test]
async fn logs_trace_entity_history() {
    let (ledger, _db) = ledger_with_db().await;
    let exercicio = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            exercicio.id,
            "02.01",
            "1500",
            "Custeio",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();
    let empenho = ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Fornecedor",
            "Compra",
            Money::new(20_000),
            "ana",
        )
        .await
        .unwrap();
    ledger
        .liquidar("pirapora", empenho.id, Money::new(20_000), dia(2026, 4, 1), "ana")
        .await
        .unwrap();

    let trilha = ledger
        .logs_por_entidade("pirapora", "empenho", &empenho.id.to_string())
        .await
        .unwrap();
    let eventos: Vec<&str> = trilha.iter().map(|l| l.evento.as_str()).collect();
    assert_eq!(eventos, vec!["empenhar", "liquidar"]);
    assert!(trilha.iter().all(|l| l.usuario == "ana"));

    // Another tenant sees nothing.
    let vazio = ledger
        .logs_por_entidade("outromunicipio", "empenho", &empenho.id.to_string())
        .await
        .unwrap();
    assert!(vazio.is_empty());
}

#[derive(Default)]
struct SinkMemoria {
    eventos: Mutex<Vec<EventoTransparencia>>,
}

impl TransparenciaSink for SinkMemoria {
    fn publicar(&self, evento: &EventoTransparencia) {
        self.eventos.lock().unwrap().push(evento.clone());
    }
}

#[tokio::test]
async fn transparency_events_fire_after_commit() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let sink = Arc::new(SinkMemoria::default());
    let ledger = Ledger::builder()
        .database(db.clone())
        .transparencia(sink.clone())
        .build();

    let exercicio = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            exercicio.id,
            "02.01",
            "1500",
            "Custeio",
            Money::new(100_000),
            "ana",
        )
        .await
        .unwrap();
    ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Fornecedor",
            "Compra",
            Money::new(20_000),
            "ana",
        )
        .await
        .unwrap();

    // A rejected mutation publishes nothing.
    let _ = ledger
        .empenhar(
            "pirapora",
            dotacao.id,
            "Fornecedor",
            "Grande demais",
            Money::new(500_000),
            "ana",
        )
        .await
        .unwrap_err();

    let eventos = sink.eventos.lock().unwrap();
    assert_eq!(eventos.len(), 1);
    assert_eq!(eventos[0].titulo, "Empenho");
    assert_eq!(eventos[0].valor, Money::new(20_000));
}
