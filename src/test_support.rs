use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::cravat_client::VariantService;
use crate::domain::{
    hgvs::{extract_grch38_hgvs, ProteinLookup},
    metadata::{
        parse_manifest, parse_module_definition, project_annotators, project_fields,
        resolve_latest_version, AnnotatorSummary, ModuleFields,
    },
    query::{AnnotateInput, ProteinChange, ProteinSubmission},
};
use crate::errors::AppError;
use crate::AppState;

pub const MANIFEST: &str = r#"
clinvar:
  type: annotator
  title: ClinVar
  description: Clinical significance of variants
  latest_version: "2025.01.01"
  datasource: "2025.01.01"
  tags: [clinical relevance]
gnomad4:
  type: annotator
  title: gnomAD4
  latest_version: "4.1.0"
excelreporter:
  type: reporter
  title: Excel Reporter
  latest_version: "1.2.0"
"#;

pub const CLINVAR_MODULE: &str = r#"
output_columns:
  - name: sig
    title: Clinical Significance
    type: string
    desc: ClinVar clinical significance
  - name: id
    title: ClinVar ID
    type: int
"#;

pub fn annotation_fixture() -> Value {
    json!({
        "crx": {"chrom": "chr7", "pos": 140753336, "ref_base": "A", "alt_base": "T"},
        "clinvar": {"sig": "Pathogenic", "id": 13961},
        "gnomad4": {"af": 0.0000123},
        "go": null
    })
}

pub fn protein_lookup_fixture() -> Value {
    json!({
        "variant-list": {
            "variant": [{
                "genome-level": {
                    "hgvs-list": {
                        "hgvs": [
                            {"@assembly": "GRCh37", "value": "NC_000007.13:g.140453136A>T"},
                            {"@assembly": "GRCh38", "value": "NC_000007.14:g.140753336A>T"}
                        ]
                    }
                }
            }]
        }
    })
}

#[derive(Default)]
pub struct MockService {
    pub annotate_calls: Mutex<Vec<(AnnotateInput, Vec<String>)>>,
    pub fail_remote: bool,
}

impl MockService {
    pub fn failing() -> Self {
        Self {
            fail_remote: true,
            ..Default::default()
        }
    }

    fn check_remote(&self) -> Result<(), AppError> {
        if self.fail_remote {
            return Err(AppError::remote_call("upstream unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl VariantService for MockService {
    async fn annotate(
        &self,
        input: &AnnotateInput,
        annotators: &[String],
    ) -> Result<Value, AppError> {
        self.check_remote()?;
        if let Ok(mut calls) = self.annotate_calls.lock() {
            calls.push((input.clone(), annotators.to_vec()));
        }
        Ok(annotation_fixture())
    }

    async fn list_annotators(
        &self,
        filter_to: Option<&BTreeSet<String>>,
    ) -> Result<BTreeMap<String, AnnotatorSummary>, AppError> {
        self.check_remote()?;
        Ok(project_annotators(parse_manifest(MANIFEST)?, filter_to))
    }

    async fn get_fields(&self, annotator: &str) -> Result<ModuleFields, AppError> {
        self.check_remote()?;
        let version = resolve_latest_version(&parse_manifest(MANIFEST)?, annotator)?;
        let document = if annotator == "clinvar" {
            CLINVAR_MODULE
        } else {
            "output_columns: []\n"
        };

        Ok(ModuleFields {
            annotator: annotator.to_string(),
            version,
            fields: project_fields(parse_module_definition(document)?),
        })
    }

    async fn protein_variant_to_genomic_hgvs(
        &self,
        gene: &str,
        change: &ProteinChange,
    ) -> Result<ProteinLookup, AppError> {
        self.check_remote()?;
        let raw_response = protein_lookup_fixture();
        Ok(ProteinLookup {
            submitted: ProteinSubmission::new(gene, change),
            genomic_hgvs: extract_grch38_hgvs(&raw_response),
            raw_response,
        })
    }
}

pub fn state_with(service: Arc<MockService>) -> AppState {
    AppState::new(
        vec!["clinvar".to_string(), "gnomad4".to_string()],
        service,
    )
}

pub fn state() -> AppState {
    state_with(Arc::new(MockService::default()))
}
