use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder};
use uuid::Uuid;

use ledger::{FormatoExtrato, Ledger, LedgerError, Money, TipoConciliacao};
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

struct Cenario {
    exercicio_id: Uuid,
    conta_id: Uuid,
}

async fn cenario_base(ledger: &Ledger) -> Cenario {
    let exercicio = ledger.novo_exercicio("pirapora", 2026, "ana").await.unwrap();
    let conta = ledger
        .nova_conta_bancaria(
            "pirapora",
            "Conta Movimento",
            "001",
            "1234",
            "56789-0",
            Money::new(500_000),
            "ana",
        )
        .await
        .unwrap();
    Cenario {
        exercicio_id: exercicio.id,
        conta_id: conta.id,
    }
}

/// Creates a paid 100.00 pagamento on 2026-01-11 against the scenario's
/// account, going through the whole pipeline.
async fn pagamento_pago(ledger: &Ledger, cenario: &Cenario) {
    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            cenario.exercicio_id,
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
            Money::new(10_000),
            "ana",
        )
        .await
        .unwrap();
    let liquidacao = ledger
        .liquidar("pirapora", empenho.id, Money::new(10_000), dia(2026, 1, 11), "ana")
        .await
        .unwrap();
    ledger
        .pagar(
            "pirapora",
            liquidacao.id,
            Money::new(10_000),
            dia(2026, 1, 11),
            Some(cenario.conta_id),
            "ana",
        )
        .await
        .unwrap();
}

async fn itens_da_importacao(
    db: &DatabaseConnection,
    importacao_id: Uuid,
) -> Vec<ledger::extrato::item::Model> {
    ledger::extrato::item::Entity::find()
        .order_by_asc(ledger::extrato::item::Column::Ordem)
        .all(db)
        .await
        .unwrap()
        .into_iter()
        .filter(|i| i.importacao_id == importacao_id.to_string())
        .collect()
}

const CSV_EXTRATO: &str = "Data;Histórico;Valor;Tipo;Documento\n\
    10/01/2026;Arrecadacao ISS;250.00;C;REC-001\n\
    11/01/2026;PAG FORNECEDOR;100.00;D;DOC-9\n\
    12/01/2026;Tarifa manutencao;15,90;D;\n";

#[tokio::test]
async fn import_persists_header_and_items() {
    let (ledger, db) = ledger_with_db().await;
    let cenario = cenario_base(&ledger).await;

    let importacao_id = ledger
        .importar_extrato(
            "pirapora",
            cenario.conta_id,
            cenario.exercicio_id,
            FormatoExtrato::Csv,
            "extrato-jan.csv",
            CSV_EXTRATO.as_bytes(),
            "ana",
        )
        .await
        .unwrap();

    let header = ledger::extrato::importacao::Entity::find_by_id(importacao_id.to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.formato, "CSV");
    assert_eq!(header.total_itens, 3);
    assert_eq!(header.total_creditos, 25_000);
    assert_eq!(header.total_debitos, 11_590);
    assert_eq!(header.data_inicial, dia(2026, 1, 10));
    assert_eq!(header.data_final, dia(2026, 1, 12));

    let itens = itens_da_importacao(&db, importacao_id).await;
    assert_eq!(itens.len(), 3);
    assert_eq!(itens[0].valor, 25_000);
    assert_eq!(itens[1].valor, -10_000);
    assert_eq!(itens[2].valor, -1_590);
}

#[tokio::test]
async fn unparseable_statement_writes_nothing() {
    let (ledger, db) = ledger_with_db().await;
    let cenario = cenario_base(&ledger).await;

    let err = ledger
        .importar_extrato(
            "pirapora",
            cenario.conta_id,
            cenario.exercicio_id,
            FormatoExtrato::Csv,
            "vazio.csv",
            b"Data;Valor\n",
            "ana",
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NoTransactionsFound);
    assert_eq!(
        ledger::extrato::importacao::Entity::find()
            .count(&db)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn auto_reconcile_matches_revenue_and_payment() {
    let (ledger, db) = ledger_with_db().await;
    let cenario = cenario_base(&ledger).await;

    ledger
        .registrar_arrecadacao(
            "pirapora",
            cenario.exercicio_id,
            cenario.conta_id,
            "1.1.1.8.01",
            Money::new(25_000),
            dia(2026, 1, 10),
            "ana",
        )
        .await
        .unwrap();
    pagamento_pago(&ledger, &cenario).await;

    let importacao_id = ledger
        .importar_extrato(
            "pirapora",
            cenario.conta_id,
            cenario.exercicio_id,
            FormatoExtrato::Csv,
            "extrato-jan.csv",
            CSV_EXTRATO.as_bytes(),
            "ana",
        )
        .await
        .unwrap();

    let resumo = ledger
        .conciliar_automatico("pirapora", importacao_id, "ana")
        .await
        .unwrap();
    assert_eq!(resumo.processados, 3);
    assert_eq!(resumo.conciliados, 2);
    assert_eq!(resumo.receitas, 1);
    assert_eq!(resumo.pagamentos, 1);
    assert_eq!(resumo.pagamentos_rp, 0);

    // A second run with no new postings matches nothing more.
    let repetido = ledger
        .conciliar_automatico("pirapora", importacao_id, "ana")
        .await
        .unwrap();
    assert_eq!(repetido.conciliados, 0);
    assert_eq!(
        ledger::conciliacao::Entity::find().count(&db).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn zero_value_item_is_never_reconciled() {
    let (ledger, db) = ledger_with_db().await;
    let cenario = cenario_base(&ledger).await;

    ledger
        .registrar_arrecadacao(
            "pirapora",
            cenario.exercicio_id,
            cenario.conta_id,
            "1.1.1.8.01",
            Money::new(25_000),
            dia(2026, 1, 10),
            "ana",
        )
        .await
        .unwrap();

    // Some banks emit 0,00 informational lines; they stay out of the run.
    let csv = "Data;Valor;Tipo\n\
        10/01/2026;0,00;C\n\
        10/01/2026;250.00;C\n";
    let importacao_id = ledger
        .importar_extrato(
            "pirapora",
            cenario.conta_id,
            cenario.exercicio_id,
            FormatoExtrato::Csv,
            "extrato-zero.csv",
            csv.as_bytes(),
            "ana",
        )
        .await
        .unwrap();

    let resumo = ledger
        .conciliar_automatico("pirapora", importacao_id, "ana")
        .await
        .unwrap();
    assert_eq!(resumo.processados, 1);
    assert_eq!(resumo.conciliados, 1);
    assert_eq!(resumo.receitas, 1);

    let itens = itens_da_importacao(&db, importacao_id).await;
    assert_eq!(itens[0].valor, 0);
    let marcas = ledger::conciliacao::Entity::find().all(&db).await.unwrap();
    assert_eq!(marcas.len(), 1);
    assert_eq!(marcas[0].extrato_item_id, itens[1].id);
}

#[tokio::test]
async fn auto_reconcile_matches_resto_payment() {
    let (ledger, db) = ledger_with_db().await;
    let cenario = cenario_base(&ledger).await;
    let ex2027 = ledger.novo_exercicio("pirapora", 2027, "ana").await.unwrap();

    let dotacao = ledger
        .nova_dotacao(
            "pirapora",
            cenario.exercicio_id,
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
    ledger
        .pagar_resto(
            "pirapora",
            resto.id,
            Money::new(30_000),
            dia(2027, 1, 15),
            Some(cenario.conta_id),
            "ana",
        )
        .await
        .unwrap();

    let csv = "Data;Valor;Tipo\n15/01/2027;300.00;D\n";
    let importacao_id = ledger
        .importar_extrato(
            "pirapora",
            cenario.conta_id,
            ex2027.id,
            FormatoExtrato::Csv,
            "extrato-rp.csv",
            csv.as_bytes(),
            "ana",
        )
        .await
        .unwrap();

    let resumo = ledger
        .conciliar_automatico("pirapora", importacao_id, "ana")
        .await
        .unwrap();
    assert_eq!(resumo.conciliados, 1);
    assert_eq!(resumo.pagamentos_rp, 1);

    let marca = ledger::conciliacao::Entity::find()
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(marca.tipo, "PAGAMENTO_RP");
}

#[tokio::test]
async fn ofx_import_reconciles_like_csv() {
    let (ledger, _db) = ledger_with_db().await;
    let cenario = cenario_base(&ledger).await;

    ledger
        .registrar_arrecadacao(
            "pirapora",
            cenario.exercicio_id,
            cenario.conta_id,
            "1.1.1.8.01",
            Money::new(25_000),
            dia(2026, 1, 10),
            "ana",
        )
        .await
        .unwrap();

    let ofx = "<OFX><BANKTRANLIST>\n\
               <STMTTRN>\n\
               <TRNTYPE>CREDIT\n\
               <DTPOSTED>20260110\n\
               <TRNAMT>250.00\n\
               <FITID>2026011001\n\
               <MEMO>Arrecadacao ISS\n\
               </STMTTRN>\n\
               </BANKTRANLIST></OFX>";
    let importacao_id = ledger
        .importar_extrato(
            "pirapora",
            cenario.conta_id,
            cenario.exercicio_id,
            FormatoExtrato::Ofx,
            "extrato.ofx",
            ofx.as_bytes(),
            "ana",
        )
        .await
        .unwrap();

    let resumo = ledger
        .conciliar_automatico("pirapora", importacao_id, "ana")
        .await
        .unwrap();
    assert_eq!(resumo.conciliados, 1);
    assert_eq!(resumo.receitas, 1);
}

#[tokio::test]
async fn marcar_ajuste_is_idempotent() {
    let (ledger, db) = ledger_with_db().await;
    let cenario = cenario_base(&ledger).await;

    let importacao_id = ledger
        .importar_extrato(
            "pirapora",
            cenario.conta_id,
            cenario.exercicio_id,
            FormatoExtrato::Csv,
            "extrato-jan.csv",
            CSV_EXTRATO.as_bytes(),
            "ana",
        )
        .await
        .unwrap();
    let itens = itens_da_importacao(&db, importacao_id).await;
    let item_id = Uuid::parse_str(&itens[2].id).unwrap();

    let primeira = ledger
        .marcar_ajuste("pirapora", item_id, Some("tarifa bancaria"), "ana")
        .await
        .unwrap();
    assert_eq!(primeira.tipo, TipoConciliacao::Ajuste);

    let segunda = ledger
        .marcar_ajuste("pirapora", item_id, Some("duplicada"), "ana")
        .await
        .unwrap();
    assert_eq!(segunda.id, primeira.id);
    assert_eq!(segunda.observacao.as_deref(), Some("tarifa bancaria"));
    assert_eq!(
        ledger::conciliacao::Entity::find().count(&db).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn desfazer_conciliacao_removes_mark_only() {
    let (ledger, db) = ledger_with_db().await;
    let cenario = cenario_base(&ledger).await;

    let importacao_id = ledger
        .importar_extrato(
            "pirapora",
            cenario.conta_id,
            cenario.exercicio_id,
            FormatoExtrato::Csv,
            "extrato-jan.csv",
            CSV_EXTRATO.as_bytes(),
            "ana",
        )
        .await
        .unwrap();
    let itens = itens_da_importacao(&db, importacao_id).await;
    let item_id = Uuid::parse_str(&itens[0].id).unwrap();

    ledger
        .marcar_ajuste("pirapora", item_id, None, "ana")
        .await
        .unwrap();

    assert!(ledger
        .desfazer_conciliacao("pirapora", item_id, "ana")
        .await
        .unwrap());
    assert_eq!(
        ledger::conciliacao::Entity::find().count(&db).await.unwrap(),
        0
    );

    // Undo of an unconciled item is a no-op.
    assert!(!ledger
        .desfazer_conciliacao("pirapora", item_id, "ana")
        .await
        .unwrap());

    // The item itself survives and can be reconciled again.
    let itens = itens_da_importacao(&db, importacao_id).await;
    assert_eq!(itens.len(), 3);
}

#[tokio::test]
async fn cross_tenant_import_is_rejected() {
    let (ledger, db) = ledger_with_db().await;
    let cenario = cenario_base(&ledger).await;

    let err = ledger
        .importar_extrato(
            "outromunicipio",
            cenario.conta_id,
            cenario.exercicio_id,
            FormatoExtrato::Csv,
            "extrato-jan.csv",
            CSV_EXTRATO.as_bytes(),
            "eva",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CrossTenantReference(_)));
    assert_eq!(
        ledger::extrato::importacao::Entity::find()
            .count(&db)
            .await
            .unwrap(),
        0
    );
}
