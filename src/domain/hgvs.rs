//! Genomic HGVS extraction from the protein-level literature lookup

use serde::Serialize;
use serde_json::Value;

use crate::domain::query::ProteinSubmission;

pub const TARGET_ASSEMBLY: &str = "GRCh38";

const HGVS_TEXT_KEYS: [&str; 3] = ["value", "$", "#text"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProteinLookup {
    pub submitted: ProteinSubmission,
    #[serde(rename = "genomicHGVS")]
    pub genomic_hgvs: Vec<String>,
    #[serde(rename = "rawResponse")]
    pub raw_response: Value,
}

/// Reads `variant-list.variant[0].genome-level.hgvs-list.hgvs` and keeps GRCh38 records.
///
/// Single-element lists may arrive as bare objects, so both shapes are accepted.
/// A response without that path yields an empty list.
pub fn extract_grch38_hgvs(response: &Value) -> Vec<String> {
    let Some(first_variant) = response
        .get("variant-list")
        .and_then(|list| list.get("variant"))
        .and_then(first_item)
    else {
        return Vec::new();
    };

    let Some(records) = first_variant
        .get("genome-level")
        .and_then(|level| level.get("hgvs-list"))
        .and_then(|list| list.get("hgvs"))
    else {
        return Vec::new();
    };

    as_items(records)
        .filter(|record| {
            record.get("@assembly").and_then(Value::as_str) == Some(TARGET_ASSEMBLY)
        })
        .filter_map(hgvs_text)
        .collect()
}

fn first_item(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(value),
        _ => None,
    }
}

fn as_items(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(items) => Box::new(items.iter()),
        Value::Object(_) => Box::new(std::iter::once(value)),
        _ => Box::new(std::iter::empty()),
    }
}

fn hgvs_text(record: &Value) -> Option<String> {
    HGVS_TEXT_KEYS
        .iter()
        .find_map(|key| record.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
