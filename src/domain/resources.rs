//! Model Context Protocol resources
//!
//! Exposes the default annotator set and the annotator catalog under
//! `resource://` URIs.

use rust_mcp_sdk::schema::{
    ReadResourceContent, ReadResourceRequestParams, ReadResourceResult, Resource,
    TextResourceContents,
};
use serde_json::{json, Value};

use crate::domain::annotators::DEFAULT_ANNOTATORS_REVISION;
use crate::mcp::rpc::{
    app_error_to_json_rpc, json_rpc_error, json_rpc_error_with_data, json_rpc_result,
    to_json_value,
};
use crate::AppState;

pub const DEFAULT_ANNOTATORS_URI: &str = "resource://annotators/default";
pub const ANNOTATOR_CATALOG_URI: &str = "resource://annotators/catalog";

pub fn build_resources_list() -> Vec<Resource> {
    vec![
        Resource {
            annotations: None,
            description: Some(
                "Annotator modules used when annotate_variant is called without annotators"
                    .to_string(),
            ),
            icons: vec![],
            meta: None,
            mime_type: Some("application/json".to_string()),
            name: "Default Annotators".to_string(),
            size: None,
            title: None,
            uri: DEFAULT_ANNOTATORS_URI.to_string(),
        },
        Resource {
            annotations: None,
            description: Some("Every annotator module in the OpenCRAVAT store manifest".to_string()),
            icons: vec![],
            meta: None,
            mime_type: Some("application/json".to_string()),
            name: "Annotator Catalog".to_string(),
            size: None,
            title: None,
            uri: ANNOTATOR_CATALOG_URI.to_string(),
        },
    ]
}

fn text_resource(uri: &str, content: &Value) -> Value {
    to_json_value(&ReadResourceResult {
        contents: vec![ReadResourceContent::from(TextResourceContents {
            meta: None,
            mime_type: Some("application/json".to_string()),
            text: content.to_string(),
            uri: uri.to_string(),
        })],
        meta: None,
    })
}

pub async fn handle_resources_read(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let resource_read: ReadResourceRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    match resource_read.uri.as_str() {
        DEFAULT_ANNOTATORS_URI => {
            let content = json!({
                "revision": DEFAULT_ANNOTATORS_REVISION,
                "annotators": &*state.default_annotators,
            });
            json_rpc_result(id, text_resource(DEFAULT_ANNOTATORS_URI, &content))
        }
        ANNOTATOR_CATALOG_URI => match state.variant_service.list_annotators(None).await {
            Ok(annotators) => {
                let content = json!({ "annotators": annotators });
                json_rpc_result(id, text_resource(ANNOTATOR_CATALOG_URI, &content))
            }
            Err(err) => app_error_to_json_rpc(id, err),
        },
        _ => json_rpc_error_with_data(
            id,
            -32601,
            "Method not found",
            Some(json!({
                "code": "resource_not_found",
                "message": "unknown resource uri",
                "details": {
                    "uri": resource_read.uri,
                },
            })),
        ),
    }
}
