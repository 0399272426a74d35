//! CSV/OFX bank statement parsing.
//!
//! Banks disagree on everything: encoding, delimiter, header names, date
//! and amount formats. This module normalizes all of it into
//! [`ItemExtrato`] rows with signed centavos values.

use std::{collections::HashMap, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::{
    LedgerError, Money, ResultLedger,
    extrato::{FormatoExtrato, ItemExtrato},
};

/// Parses a raw statement payload into normalized line items.
///
/// Returns [`LedgerError::NoTransactionsFound`] when nothing parses.
pub fn parse_extrato(formato: FormatoExtrato, bytes: &[u8]) -> ResultLedger<Vec<ItemExtrato>> {
    let texto = decode_bytes(bytes);
    let itens = match formato {
        FormatoExtrato::Csv => parse_csv(&texto)?,
        FormatoExtrato::Ofx => parse_ofx(&texto),
    };
    if itens.is_empty() {
        return Err(LedgerError::NoTransactionsFound);
    }
    Ok(itens)
}

/// Decodes statement bytes. UTF-8 (with or without BOM) first, then
/// Latin-1 as the infallible fallback.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1 maps each byte to the code point of the same value.
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Recognized statement columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Campo {
    Data,
    Valor,
    Tipo,
    Documento,
    Historico,
    Saldo,
}

/// Header aliases, in normalized form (lowercase, diacritics stripped).
const ALIASES: &[(Campo, &[&str])] = &[
    (
        Campo::Data,
        &["data", "data movimento", "data mov", "dt movimento", "date", "data lancamento"],
    ),
    (
        Campo::Valor,
        &["valor", "valor (r$)", "vlr", "amount", "montante", "valor lancamento"],
    ),
    (Campo::Tipo, &["tipo", "d/c", "dc", "tipo lancamento", "natureza"]),
    (
        Campo::Documento,
        &["documento", "doc", "num documento", "nr documento", "numero documento"],
    ),
    (
        Campo::Historico,
        &["historico", "descricao", "memo", "lancamento", "observacao"],
    ),
    (Campo::Saldo, &["saldo", "saldo (r$)", "balance"]),
];

/// Lowercases and strips combining marks so `Descrição`, `DESCRICAO` and
/// `descricao` all match the same alias.
fn normalizar(header: &str) -> String {
    header
        .trim()
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn identificar_campo(header: &str) -> Option<Campo> {
    let normalizado = normalizar(header);
    ALIASES
        .iter()
        .find(|(_, nomes)| nomes.contains(&normalizado.as_str()))
        .map(|(campo, _)| *campo)
}

/// Picks the delimiter that splits the most sampled lines into more than
/// one column, among `;`, `,`, tab and `|`. Counting lines rather than
/// occurrences keeps a comma-heavy description column from outvoting the
/// real separator. Ties keep the earlier candidate, so `;` is the default.
fn detectar_delimitador(texto: &str) -> u8 {
    let amostra: Vec<&str> = texto
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(20)
        .collect();

    let mut melhor = b';';
    let mut melhor_linhas = 0usize;
    for candidato in [b';', b',', b'\t', b'|'] {
        let linhas = amostra
            .iter()
            .filter(|l| l.contains(candidato as char))
            .count();
        if linhas > melhor_linhas {
            melhor = candidato;
            melhor_linhas = linhas;
        }
    }
    melhor
}

fn aplicar_tipo(valor: Money, tipo: Option<&str>) -> Money {
    let Some(tipo) = tipo else {
        return valor;
    };
    match normalizar(tipo).as_str() {
        "d" | "debito" | "debit" => -valor.abs(),
        "c" | "credito" | "credit" => valor.abs(),
        _ => valor,
    }
}

fn parse_csv(texto: &str) -> ResultLedger<Vec<ItemExtrato>> {
    let delimitador = detectar_delimitador(texto);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimitador)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(texto.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LedgerError::MissingRequiredColumns(e.to_string()))?;

    let mut colunas: HashMap<Campo, usize> = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Some(campo) = identificar_campo(header) {
            colunas.entry(campo).or_insert(idx);
        }
    }
    if !colunas.contains_key(&Campo::Data) || !colunas.contains_key(&Campo::Valor) {
        return Err(LedgerError::MissingRequiredColumns(
            "statement needs a date column and a value column".to_string(),
        ));
    }

    let coluna = |record: &csv::StringRecord, campo: Campo| -> Option<String> {
        colunas
            .get(&campo)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let mut itens = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else { continue };
        let Some(data_raw) = coluna(&record, Campo::Data) else {
            continue;
        };
        let Some(valor_raw) = coluna(&record, Campo::Valor) else {
            continue;
        };
        let Ok(data) = parse_data(&data_raw) else {
            continue;
        };
        let Ok(valor) = valor_raw.parse::<Money>() else {
            continue;
        };
        let tipo = coluna(&record, Campo::Tipo);
        itens.push(ItemExtrato {
            data_movimento: data,
            valor: aplicar_tipo(valor, tipo.as_deref()),
            documento: coluna(&record, Campo::Documento),
            historico: coluna(&record, Campo::Historico),
            id_externo: None,
        });
    }
    Ok(itens)
}

static STMTTRN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<STMTTRN>(.*?)</STMTTRN>").unwrap());

/// OFX 1.x is SGML tag soup with optional closing tags; a value runs from
/// the opening tag to the next `<` or end of line.
fn tag_ofx(bloco: &str, tag: &str) -> Option<String> {
    static TAGS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<([A-Z0-9]+)>([^<\r\n]*)").unwrap());
    TAGS.captures_iter(bloco)
        .find(|c| c[1].eq_ignore_ascii_case(tag))
        .map(|c| c[2].trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_ofx(texto: &str) -> Vec<ItemExtrato> {
    let mut itens = Vec::new();
    for captura in STMTTRN.captures_iter(texto) {
        let bloco = &captura[1];
        let Some(data_raw) = tag_ofx(bloco, "DTPOSTED") else {
            continue;
        };
        let Some(valor_raw) = tag_ofx(bloco, "TRNAMT") else {
            continue;
        };
        let Ok(data) = parse_data(&data_raw) else {
            continue;
        };
        let Ok(valor) = valor_raw.parse::<Money>() else {
            continue;
        };

        let valor = match tag_ofx(bloco, "TRNTYPE").map(|t| t.to_uppercase()) {
            Some(t) if t.contains("DEBIT") || t.contains("PAYMENT") => -valor.abs(),
            Some(t) if t.contains("CREDIT") || t.contains("DEP") => valor.abs(),
            _ => valor,
        };

        itens.push(ItemExtrato {
            data_movimento: data,
            valor,
            documento: tag_ofx(bloco, "CHECKNUM"),
            historico: tag_ofx(bloco, "MEMO").or_else(|| tag_ofx(bloco, "NAME")),
            id_externo: tag_ofx(bloco, "FITID"),
        });
    }
    itens
}

/// Parses the date formats seen in Brazilian statements, including OFX's
/// `YYYYMMDDHHMMSS[.XXX][gmt offset]` with the time part truncated.
pub fn parse_data(s: &str) -> ResultLedger<NaiveDate> {
    let s = s.trim();
    for formato in ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"] {
        if let Ok(data) = NaiveDate::parse_from_str(s, formato) {
            return Ok(data);
        }
    }
    // YYYYMMDD with an optional time suffix.
    let digitos: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digitos.len() >= 8
        && let Ok(data) = NaiveDate::parse_from_str(&digitos[..8], "%Y%m%d")
    {
        return Ok(data);
    }
    Err(LedgerError::InvalidDate(s.to_string()))
}
