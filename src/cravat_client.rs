use std::collections::{BTreeMap, BTreeSet};
use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::domain::{
    hgvs::{extract_grch38_hgvs, ProteinLookup},
    metadata::{
        parse_manifest, parse_module_definition, project_annotators, project_fields,
        resolve_latest_version, AnnotatorSummary, Manifest, ModuleFields,
    },
    query::{
        build_annotate_url, build_protein_lookup_url, join_segments, AnnotateInput,
        ProteinChange, ProteinSubmission,
    },
};
use crate::errors::AppError;

#[async_trait]
pub trait VariantService: Send + Sync {
    async fn annotate(
        &self,
        input: &AnnotateInput,
        annotators: &[String],
    ) -> Result<Value, AppError>;

    async fn list_annotators(
        &self,
        filter_to: Option<&BTreeSet<String>>,
    ) -> Result<BTreeMap<String, AnnotatorSummary>, AppError>;

    async fn get_fields(&self, annotator: &str) -> Result<ModuleFields, AppError>;

    async fn protein_variant_to_genomic_hgvs(
        &self,
        gene: &str,
        change: &ProteinChange,
    ) -> Result<ProteinLookup, AppError>;
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api_base: Url,
    pub store_base: Url,
    pub protein_lookup: Option<Url>,
}

#[derive(Debug, Clone)]
pub struct CravatClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl CravatClient {
    pub fn new(endpoints: Endpoints, timeout: Option<Duration>) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|err| AppError::internal(format!("failed to build http client: {err}")))?;

        Ok(Self { http, endpoints })
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, AppError> {
        debug!(url = %url, "outbound GET");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| {
                let error = remote_error(err);
                warn!(url = %url, error = %error, "remote call failed");
                error
            })?;

        Ok(response)
    }

    async fn get_json(&self, url: Url) -> Result<Value, AppError> {
        self.get(url)
            .await?
            .json::<Value>()
            .await
            .map_err(|err| AppError::remote_call(format!("response is not valid json: {err}")))
    }

    async fn get_text(&self, url: Url) -> Result<String, AppError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(remote_error)
    }

    async fn fetch_manifest(&self) -> Result<Manifest, AppError> {
        let url = join_segments(&self.endpoints.store_base, &["manifest.yml"])?;
        parse_manifest(&self.get_text(url).await?)
    }
}

/// Flattens a reqwest failure and its source chain into a `RemoteCall`.
fn remote_error(err: reqwest::Error) -> AppError {
    let mut message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };

    let mut source = StdError::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    AppError::remote_call(message)
}

#[async_trait]
impl VariantService for CravatClient {
    async fn annotate(
        &self,
        input: &AnnotateInput,
        annotators: &[String],
    ) -> Result<Value, AppError> {
        let url = build_annotate_url(&self.endpoints.api_base, input, annotators)?;
        self.get_json(url).await
    }

    async fn list_annotators(
        &self,
        filter_to: Option<&BTreeSet<String>>,
    ) -> Result<BTreeMap<String, AnnotatorSummary>, AppError> {
        let manifest = self.fetch_manifest().await?;
        Ok(project_annotators(manifest, filter_to))
    }

    async fn get_fields(&self, annotator: &str) -> Result<ModuleFields, AppError> {
        let manifest = self.fetch_manifest().await?;
        let version = resolve_latest_version(&manifest, annotator)?;

        let module_file = format!("{annotator}.yml");
        let url = join_segments(
            &self.endpoints.store_base,
            &["modules", annotator, version.as_str(), module_file.as_str()],
        )?;
        let definition = parse_module_definition(&self.get_text(url).await?)?;

        Ok(ModuleFields {
            annotator: annotator.to_string(),
            version,
            fields: project_fields(definition),
        })
    }

    async fn protein_variant_to_genomic_hgvs(
        &self,
        gene: &str,
        change: &ProteinChange,
    ) -> Result<ProteinLookup, AppError> {
        let endpoint = self.endpoints.protein_lookup.as_ref().ok_or_else(|| {
            AppError::remote_call("protein lookup endpoint is not configured (PROTEIN_LOOKUP_URL)")
        })?;

        let raw_response = self
            .get_json(build_protein_lookup_url(endpoint, gene, change))
            .await?;

        Ok(ProteinLookup {
            submitted: ProteinSubmission::new(gene, change),
            genomic_hgvs: extract_grch38_hgvs(&raw_response),
            raw_response,
        })
    }
}
