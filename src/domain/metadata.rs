//! OpenCRAVAT store documents and the projections returned to MCP callers
//!
//! The manifest maps module name to module metadata; each module's YAML
//! definition lists its output columns. Remote values are passed through as
//! JSON without interpretation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

pub const ANNOTATOR_MODULE_TYPE: &str = "annotator";

pub type Manifest = BTreeMap<String, ManifestEntry>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub latest_version: Option<Value>,
    pub tags: Option<Value>,
    pub datasource: Option<Value>,
}

impl ManifestEntry {
    pub fn is_annotator(&self) -> bool {
        self.kind.as_ref().and_then(Value::as_str) == Some(ANNOTATOR_MODULE_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatorSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(rename = "dataSourceVersion", skip_serializing_if = "Option::is_none")]
    pub data_source_version: Option<Value>,
}

impl From<ManifestEntry> for AnnotatorSummary {
    fn from(entry: ManifestEntry) -> Self {
        Self {
            title: entry.title,
            description: entry.description,
            version: entry.latest_version,
            tags: entry.tags,
            data_source_version: entry.datasource,
        }
    }
}

pub fn parse_manifest(document: &str) -> Result<Manifest, AppError> {
    serde_yaml::from_str(document)
        .map_err(|err| AppError::remote_call(format!("manifest is not valid yaml: {err}")))
}

pub fn project_annotators(
    manifest: Manifest,
    filter_to: Option<&BTreeSet<String>>,
) -> BTreeMap<String, AnnotatorSummary> {
    manifest
        .into_iter()
        .filter(|(_, entry)| entry.is_annotator())
        .filter(|(name, _)| filter_to.map_or(true, |allowed| allowed.contains(name)))
        .map(|(name, entry)| (name, AnnotatorSummary::from(entry)))
        .collect()
}

pub fn resolve_latest_version(manifest: &Manifest, annotator: &str) -> Result<String, AppError> {
    let entry = manifest.get(annotator).ok_or_else(|| {
        AppError::not_found(
            "annotator_not_found",
            format!("annotator '{annotator}' is not in the module manifest"),
        )
    })?;

    match entry.latest_version.as_ref() {
        Some(Value::String(version)) if !version.trim().is_empty() => {
            Ok(version.trim().to_string())
        }
        Some(Value::Number(version)) => Ok(version.to_string()),
        _ => Err(AppError::remote_call(format!(
            "manifest entry for '{annotator}' has no latest_version"
        ))),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleDefinition {
    #[serde(default)]
    pub output_columns: Vec<OutputColumn>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputColumn {
    pub name: String,
    pub title: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub desc: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub title: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub desc: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleFields {
    pub annotator: String,
    pub version: String,
    pub fields: BTreeMap<String, FieldSummary>,
}

pub fn parse_module_definition(document: &str) -> Result<ModuleDefinition, AppError> {
    serde_yaml::from_str(document)
        .map_err(|err| AppError::remote_call(format!("module definition is not valid yaml: {err}")))
}

pub fn project_fields(definition: ModuleDefinition) -> BTreeMap<String, FieldSummary> {
    definition
        .output_columns
        .into_iter()
        .map(|column| {
            (
                column.name,
                FieldSummary {
                    title: column.title,
                    kind: column.kind,
                    desc: column.desc,
                },
            )
        })
        .collect()
}
