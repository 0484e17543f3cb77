//! GS1 Application Identifier extraction.
//!
//! Each AI is searched for independently across the whole payload instead of
//! tokenizing segments left to right, so the first `<AI><value>` occurrence
//! anywhere in the string wins. A value can therefore be claimed by two AIs
//! when one AI's digits appear inside another's value (`10AB17240615` yields
//! both a batch and an expiry). Variable-length values run until a GS (0x1D)
//! separator or the end of the payload.

use regex::Regex;
use std::sync::LazyLock;

use crate::medicine::PartialMedicineInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gs1Ai {
    Gtin,
    Expiry,
    Batch,
    Serial,
    Quantity,
}

impl Gs1Ai {
    pub fn code(&self) -> &'static str {
        match self {
            Gs1Ai::Gtin => "01",
            Gs1Ai::Expiry => "17",
            Gs1Ai::Batch => "10",
            Gs1Ai::Serial => "21",
            Gs1Ai::Quantity => "30",
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            Gs1Ai::Gtin => "gtin",
            Gs1Ai::Expiry => "expiryDate",
            Gs1Ai::Batch => "batchNumber",
            Gs1Ai::Serial => "serial",
            Gs1Ai::Quantity => "quantity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gs1Field {
    pub ai: Gs1Ai,
    pub value: String,
}

static AI_PATTERNS: LazyLock<Vec<(Gs1Ai, Regex)>> = LazyLock::new(|| {
    [
        (Gs1Ai::Gtin, r"01([0-9]{14})"),
        (Gs1Ai::Expiry, r"17([0-9]{6})"),
        (Gs1Ai::Batch, r"10([^\x1D]+)"),
        (Gs1Ai::Serial, r"21([^\x1D]+)"),
        (Gs1Ai::Quantity, r"30([0-9]+)"),
    ]
    .into_iter()
    .map(|(ai, pattern)| (ai, Regex::new(pattern).expect("GS1 pattern must compile")))
    .collect()
});

/// Swappable GS1 parsing strategy.
pub trait Gs1Parser: Send + Sync {
    fn parse(&self, payload: &str) -> PartialMedicineInfo;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexGs1Parser;

impl Gs1Parser for RegexGs1Parser {
    fn parse(&self, payload: &str) -> PartialMedicineInfo {
        parse_gs1(payload)
    }
}

/// Every recognized AI occurrence, one per AI at most, in AI table order.
pub fn parse_fields(payload: &str) -> Vec<Gs1Field> {
    AI_PATTERNS
        .iter()
        .filter_map(|(ai, pattern)| {
            let value = pattern.captures(payload)?.get(1)?.as_str();
            Some(Gs1Field {
                ai: *ai,
                value: value.to_string(),
            })
        })
        .collect()
}

pub fn parse_gs1(payload: &str) -> PartialMedicineInfo {
    let mut info = PartialMedicineInfo::default();
    for field in parse_fields(payload) {
        match field.ai {
            Gs1Ai::Expiry => info.expiry_date = expiry_to_iso(&field.value),
            Gs1Ai::Batch => info.batch_number = Some(field.value),
            Gs1Ai::Quantity => info.quantity = Some(field.value),
            // kept for product lookup, not part of the record yet
            Gs1Ai::Gtin | Gs1Ai::Serial => {
                tracing::debug!("gs1: {} = {}", field.ai.field_name(), field.value);
            }
        }
    }
    info
}

fn expiry_to_iso(value: &str) -> Option<String> {
    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (year, rest) = value.split_at(2);
    let (month, day) = rest.split_at(2);
    Some(format!("20{}-{}-{}", year, month, day))
}
