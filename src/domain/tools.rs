//! Interactive tools exposed via Model Context Protocol
//!
//! `annotate_variant`, `list_annotators`, `get_annotator_fields` and
//! `protein_variant_to_genomic_hgvs`, each delegating to the configured
//! `VariantService`.

use std::collections::BTreeSet;

use chrono::{SecondsFormat, Utc};
use rust_mcp_sdk::{
    macros,
    schema::{CallToolRequestParams, CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::query::{
    normalize_annotate_input, normalize_text, parse_protein_change, resolve_annotators,
    RawIdentifiers,
};
use crate::mcp::rpc::{
    app_error_to_json_rpc, json_rpc_error, json_rpc_error_with_data, json_rpc_result,
    to_json_value,
};
use crate::{errors::AppError, AppState};

#[macros::mcp_tool(
    name = "annotate_variant",
    description = "Annotate a genomic variant with OpenCRAVAT. Identify it by locus (chromosome, position, reference_allele, alternate_allele on hg38), rsid, caid or hgvs. Optionally choose annotators; a bundled default set is used otherwise."
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct AnnotateVariantTool {
    /// Chromosome name, e.g. chr7
    pub chromosome: Option<String>,
    /// 1-based hg38 position
    pub position: Option<u64>,
    /// Reference allele
    pub reference_allele: Option<String>,
    /// Alternate allele
    pub alternate_allele: Option<String>,
    /// dbSNP identifier, e.g. rs113488022
    pub rsid: Option<String>,
    /// ClinGen Allele Registry identifier, e.g. CA123643
    pub caid: Option<String>,
    /// HGVS expression
    pub hgvs: Option<String>,
    /// Annotator module names to run
    pub annotators: Option<Vec<String>>,
}

#[macros::mcp_tool(
    name = "list_annotators",
    description = "List OpenCRAVAT annotator modules with title, description, version, tags and data source version"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct ListAnnotatorsTool {
    /// Restrict to the default annotator set (default true)
    pub default_only: Option<bool>,
}

#[macros::mcp_tool(
    name = "get_annotator_fields",
    description = "Describe the output fields produced by one OpenCRAVAT annotator"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetAnnotatorFieldsTool {
    /// Annotator module name, e.g. clinvar
    pub annotator: String,
}

#[macros::mcp_tool(
    name = "protein_variant_to_genomic_hgvs",
    description = "Map a protein change on a gene (e.g. BRAF V600E) to GRCh38 genomic HGVS expressions"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct ProteinVariantToGenomicHgvsTool {
    /// Gene symbol, e.g. BRAF
    pub gene: String,
    /// Protein change as <refAA><position><altAA>, e.g. V600E
    pub protein_change: String,
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![
        AnnotateVariantTool::tool(),
        ListAnnotatorsTool::tool(),
        GetAnnotatorFieldsTool::tool(),
        ProteinVariantToGenomicHgvsTool::tool(),
    ]
}

pub async fn handle_tools_call(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };
    let arguments = json!(tool_call.arguments.unwrap_or_default());

    let outcome = match tool_call.name.as_str() {
        "annotate_variant" => annotate_variant(state, arguments).await,
        "list_annotators" => list_annotators(state, arguments).await,
        "get_annotator_fields" => get_annotator_fields(state, arguments).await,
        "protein_variant_to_genomic_hgvs" => protein_variant_to_genomic_hgvs(state, arguments).await,
        _ => {
            return json_rpc_error_with_data(
                id,
                -32601,
                "Method not found",
                Some(json!({
                    "code": "tool_not_found",
                    "message": "unknown tool name",
                    "details": {
                        "name": tool_call.name,
                    },
                })),
            )
        }
    };

    match outcome {
        Ok(result) => json_rpc_result(id, to_json_value(&result)),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, AppError> {
    serde_json::from_value(arguments)
        .map_err(|err| AppError::bad_request("invalid_arguments", err.to_string()))
}

fn required_text(value: String, field: &'static str) -> Result<String, AppError> {
    normalize_text(Some(value))
        .ok_or_else(|| AppError::bad_request("invalid_arguments", format!("{field} must not be empty")))
}

fn generated_at_utc() -> Value {
    json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn tool_result(text: String, structured_content: Map<String, Value>) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text, None, None))],
        is_error: None,
        meta: None,
        structured_content: Some(structured_content),
    }
}

async fn annotate_variant(state: &AppState, arguments: Value) -> Result<CallToolResult, AppError> {
    let args: AnnotateVariantTool = parse_arguments(arguments)?;
    let input = normalize_annotate_input(RawIdentifiers {
        chromosome: args.chromosome,
        position: args.position,
        reference_allele: args.reference_allele,
        alternate_allele: args.alternate_allele,
        rsid: args.rsid,
        caid: args.caid,
        hgvs: args.hgvs,
    })?;
    let annotators = resolve_annotators(args.annotators, &state.default_annotators)?;

    let annotation = state.variant_service.annotate(&input, &annotators).await?;
    let text = serde_json::to_string_pretty(&annotation)
        .map_err(|err| AppError::internal(format!("annotation rendering failed: {err}")))?;

    Ok(tool_result(
        text,
        Map::from_iter([
            ("input".to_string(), json!(input)),
            ("annotators".to_string(), json!(annotators)),
            ("annotation".to_string(), annotation),
            ("generated_at_utc".to_string(), generated_at_utc()),
        ]),
    ))
}

async fn list_annotators(state: &AppState, arguments: Value) -> Result<CallToolResult, AppError> {
    let args: ListAnnotatorsTool = parse_arguments(arguments)?;
    let default_only = args.default_only.unwrap_or(true);

    let filter: Option<BTreeSet<String>> =
        default_only.then(|| state.default_annotators.iter().cloned().collect());
    let annotators = state.variant_service.list_annotators(filter.as_ref()).await?;
    let total = annotators.len();

    Ok(tool_result(
        format!("Returned {total} annotators"),
        Map::from_iter([
            ("annotators".to_string(), json!(annotators)),
            ("total".to_string(), json!(total)),
            ("default_only".to_string(), json!(default_only)),
            ("generated_at_utc".to_string(), generated_at_utc()),
        ]),
    ))
}

async fn get_annotator_fields(
    state: &AppState,
    arguments: Value,
) -> Result<CallToolResult, AppError> {
    let args: GetAnnotatorFieldsTool = parse_arguments(arguments)?;
    let annotator = required_text(args.annotator, "annotator")?;

    let module = state.variant_service.get_fields(&annotator).await?;

    Ok(tool_result(
        format!(
            "Annotator {} version {} exposes {} fields",
            module.annotator,
            module.version,
            module.fields.len()
        ),
        Map::from_iter([
            ("annotator".to_string(), json!(module.annotator)),
            ("version".to_string(), json!(module.version)),
            ("fields".to_string(), json!(module.fields)),
            ("generated_at_utc".to_string(), generated_at_utc()),
        ]),
    ))
}

async fn protein_variant_to_genomic_hgvs(
    state: &AppState,
    arguments: Value,
) -> Result<CallToolResult, AppError> {
    let args: ProteinVariantToGenomicHgvsTool = parse_arguments(arguments)?;
    let gene = required_text(args.gene, "gene")?;
    let change = parse_protein_change(&args.protein_change)?;

    let lookup = state
        .variant_service
        .protein_variant_to_genomic_hgvs(&gene, &change)
        .await?;

    Ok(tool_result(
        format!(
            "Found {} GRCh38 genomic HGVS for {gene} {}",
            lookup.genomic_hgvs.len(),
            change.raw
        ),
        Map::from_iter([
            ("submitted".to_string(), json!(lookup.submitted)),
            ("genomicHGVS".to_string(), json!(lookup.genomic_hgvs)),
            ("rawResponse".to_string(), lookup.raw_response),
        ]),
    ))
}
