//! Outbound query construction for the OpenCRAVAT annotation endpoint
//! and the protein-level literature lookup.

use serde::Serialize;
use url::Url;

use crate::errors::AppError;

pub const ANNOTATE_ASSEMBLY: &str = "hg38";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub chromosome: String,
    pub position: u64,
    pub reference_allele: String,
    pub alternate_allele: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotateInput {
    Variant(Variant),
    Rsid(String),
    Caid(String),
    Hgvs(String),
}

impl AnnotateInput {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Variant(_) => "variant",
            Self::Rsid(_) => "rsid",
            Self::Caid(_) => "caid",
            Self::Hgvs(_) => "hgvs",
        }
    }

    /// Identifier parameters for the annotate endpoint, without `annotators`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Variant(variant) => vec![
                ("chrom", variant.chromosome.clone()),
                ("pos", variant.position.to_string()),
                ("ref_base", variant.reference_allele.clone()),
                ("alt_base", variant.alternate_allele.clone()),
                ("assembly", ANNOTATE_ASSEMBLY.to_string()),
            ],
            Self::Rsid(rsid) => vec![("dbsnp", rsid.clone())],
            Self::Caid(caid) => vec![("clingen", caid.clone())],
            Self::Hgvs(hgvs) => vec![("hgvs", hgvs.clone())],
        }
    }
}

/// Identifier fields as they arrive from a tool call, before a single form is chosen.
#[derive(Debug, Default, Clone)]
pub struct RawIdentifiers {
    pub chromosome: Option<String>,
    pub position: Option<u64>,
    pub reference_allele: Option<String>,
    pub alternate_allele: Option<String>,
    pub rsid: Option<String>,
    pub caid: Option<String>,
    pub hgvs: Option<String>,
}

/// Picks one identifier form, checking variant, rsid, caid, then hgvs.
pub fn normalize_annotate_input(raw: RawIdentifiers) -> Result<AnnotateInput, AppError> {
    let chromosome = normalize_text(raw.chromosome);
    let reference_allele = normalize_text(raw.reference_allele);
    let alternate_allele = normalize_text(raw.alternate_allele);

    let any_variant_field = chromosome.is_some()
        || raw.position.is_some()
        || reference_allele.is_some()
        || alternate_allele.is_some();

    if any_variant_field {
        let (Some(chromosome), Some(position), Some(reference_allele), Some(alternate_allele)) =
            (chromosome, raw.position, reference_allele, alternate_allele)
        else {
            return Err(AppError::bad_request(
                "incomplete_variant",
                "variant requires chromosome, position, reference_allele and alternate_allele",
            ));
        };

        if position == 0 {
            return Err(AppError::bad_request(
                "invalid_position",
                "position must be a positive integer",
            ));
        }

        return Ok(AnnotateInput::Variant(Variant {
            chromosome,
            position,
            reference_allele,
            alternate_allele,
        }));
    }

    if let Some(rsid) = normalize_text(raw.rsid) {
        return Ok(AnnotateInput::Rsid(rsid));
    }
    if let Some(caid) = normalize_text(raw.caid) {
        return Ok(AnnotateInput::Caid(caid));
    }
    if let Some(hgvs) = normalize_text(raw.hgvs) {
        return Ok(AnnotateInput::Hgvs(hgvs));
    }

    Err(AppError::bad_request(
        "missing_identifier",
        "one of variant fields, rsid, caid or hgvs is required",
    ))
}

/// Explicit annotators win over the defaults; order is kept as given.
pub fn resolve_annotators(
    requested: Option<Vec<String>>,
    defaults: &[String],
) -> Result<Vec<String>, AppError> {
    let Some(requested) = requested else {
        return Ok(defaults.to_vec());
    };

    if requested.is_empty() {
        return Err(AppError::bad_request(
            "invalid_annotators",
            "annotators must not be empty when provided",
        ));
    }

    requested
        .into_iter()
        .map(|name| {
            normalize_text(Some(name)).ok_or_else(|| {
                AppError::bad_request("invalid_annotators", "annotator names must not be blank")
            })
        })
        .collect()
}

pub fn build_annotate_url(
    api_base: &Url,
    input: &AnnotateInput,
    annotators: &[String],
) -> Result<Url, AppError> {
    let mut url = join_segments(api_base, &["api", "annotate"])?;
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in input.query_pairs() {
            query.append_pair(key, &value);
        }
        query.append_pair("annotators", &annotators.join(","));
    }
    Ok(url)
}

/// Appends path segments to `base`, percent-encoding each one.
pub fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, AppError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| AppError::internal(format!("base url cannot hold a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinChange {
    pub reference_aa: char,
    pub position: u32,
    pub alternate_aa: char,
    pub raw: String,
}

/// Parses `<refAA><position><altAA>`, e.g. `V600E`.
pub fn parse_protein_change(value: &str) -> Result<ProteinChange, AppError> {
    let raw = value.trim();
    let mut chars = raw.chars();
    let (Some(reference_aa), Some(alternate_aa)) = (chars.next(), chars.next_back()) else {
        return Err(AppError::bad_request(
            "invalid_protein_change",
            "protein_change must look like V600E",
        ));
    };

    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(AppError::bad_request(
            "invalid_protein_change",
            format!("protein_change position '{digits}' is not a number"),
        ));
    }

    let position = match digits.parse::<u32>() {
        Ok(position) if position > 0 => position,
        _ => {
            return Err(AppError::bad_request(
                "invalid_protein_change",
                format!("protein_change position '{digits}' must be a positive integer"),
            ))
        }
    };

    Ok(ProteinChange {
        reference_aa,
        position,
        alternate_aa,
        raw: raw.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProteinSubmission {
    pub gene: String,
    #[serde(rename = "proteinChange")]
    pub protein_change: String,
    #[serde(rename = "refAA")]
    pub reference_aa: String,
    pub position: u32,
    #[serde(rename = "altAA")]
    pub alternate_aa: String,
}

impl ProteinSubmission {
    pub fn new(gene: &str, change: &ProteinChange) -> Self {
        Self {
            gene: gene.to_string(),
            protein_change: change.raw.clone(),
            reference_aa: change.reference_aa.to_string(),
            position: change.position,
            alternate_aa: change.alternate_aa.to_string(),
        }
    }
}

pub fn build_protein_lookup_url(
    endpoint: &Url,
    gene: &str,
    change: &ProteinChange,
) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("ref", gene)
        .append_pair("variant", &change.raw)
        .append_pair("level", "protein")
        .append_pair("format", "json");
    url
}

pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    fn api_base() -> Url {
        Url::parse("https://run.opencravat.org").expect("valid url")
    }

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    fn keys(url: &Url) -> Vec<String> {
        pairs(url).into_iter().map(|(key, _)| key).collect()
    }

    fn braf_variant() -> AnnotateInput {
        AnnotateInput::Variant(Variant {
            chromosome: "chr7".to_string(),
            position: 140_753_336,
            reference_allele: "A".to_string(),
            alternate_allele: "T".to_string(),
        })
    }

    #[test]
    fn variant_query_has_locus_fields_and_assembly() {
        let annotators = vec!["clinvar".to_string(), "gnomad4".to_string()];
        let url = build_annotate_url(&api_base(), &braf_variant(), &annotators).expect("url");

        assert_eq!(url.path(), "/api/annotate");
        assert_eq!(
            pairs(&url),
            vec![
                ("chrom".to_string(), "chr7".to_string()),
                ("pos".to_string(), "140753336".to_string()),
                ("ref_base".to_string(), "A".to_string()),
                ("alt_base".to_string(), "T".to_string()),
                ("assembly".to_string(), "hg38".to_string()),
                ("annotators".to_string(), "clinvar,gnomad4".to_string()),
            ]
        );
    }

    #[test]
    fn rsid_query_only_has_dbsnp() {
        let annotators = vec!["clinvar".to_string()];
        let input = AnnotateInput::Rsid("rs113488022".to_string());
        let url = build_annotate_url(&api_base(), &input, &annotators).expect("url");

        assert_eq!(keys(&url), vec!["dbsnp", "annotators"]);
        assert!(url.query_pairs().all(|(_, value)| value != "hg38"));
    }

    #[test]
    fn caid_query_only_has_clingen() {
        let annotators = vec!["clinvar".to_string()];
        let input = AnnotateInput::Caid("CA123643".to_string());
        let url = build_annotate_url(&api_base(), &input, &annotators).expect("url");

        assert_eq!(keys(&url), vec!["clingen", "annotators"]);
    }

    #[test]
    fn hgvs_query_only_has_hgvs() {
        let annotators = vec!["clinvar".to_string()];
        let input = AnnotateInput::Hgvs("NM_004333.6:c.1799T>A".to_string());
        let url = build_annotate_url(&api_base(), &input, &annotators).expect("url");

        assert_eq!(
            pairs(&url),
            vec![
                ("hgvs".to_string(), "NM_004333.6:c.1799T>A".to_string()),
                ("annotators".to_string(), "clinvar".to_string()),
            ]
        );
    }

    #[test]
    fn annotators_keep_caller_order_and_duplicates() {
        let annotators = vec![
            "revel".to_string(),
            "clinvar".to_string(),
            "revel".to_string(),
        ];
        let input = AnnotateInput::Rsid("rs1".to_string());
        let url = build_annotate_url(&api_base(), &input, &annotators).expect("url");

        let joined = pairs(&url)
            .into_iter()
            .find(|(key, _)| key == "annotators")
            .map(|(_, value)| value);
        assert_eq!(joined.as_deref(), Some("revel,clinvar,revel"));
    }

    #[test]
    fn base_with_path_prefix_keeps_prefix() {
        let base = Url::parse("http://127.0.0.1:9000/proxy/").expect("valid url");
        let input = AnnotateInput::Rsid("rs1".to_string());
        let url = build_annotate_url(&base, &input, &["go".to_string()]).expect("url");

        assert_eq!(url.path(), "/proxy/api/annotate");
    }

    #[test]
    fn variant_wins_over_other_identifiers() {
        let input = normalize_annotate_input(RawIdentifiers {
            chromosome: Some("chr7".to_string()),
            position: Some(140_753_336),
            reference_allele: Some("A".to_string()),
            alternate_allele: Some("T".to_string()),
            rsid: Some("rs113488022".to_string()),
            caid: Some("CA123643".to_string()),
            hgvs: Some("NC_000007.14:g.140753336A>T".to_string()),
        })
        .expect("input should normalize");

        assert_eq!(input, braf_variant());
    }

    #[test]
    fn rsid_wins_over_caid_and_hgvs() {
        let input = normalize_annotate_input(RawIdentifiers {
            rsid: Some(" rs113488022 ".to_string()),
            caid: Some("CA123643".to_string()),
            hgvs: Some("NC_000007.14:g.140753336A>T".to_string()),
            ..Default::default()
        })
        .expect("input should normalize");

        assert_eq!(input, AnnotateInput::Rsid("rs113488022".to_string()));
    }

    #[test]
    fn caid_wins_over_hgvs() {
        let input = normalize_annotate_input(RawIdentifiers {
            caid: Some("CA123643".to_string()),
            hgvs: Some("NC_000007.14:g.140753336A>T".to_string()),
            ..Default::default()
        })
        .expect("input should normalize");

        assert_eq!(input.kind(), "caid");
    }

    #[test]
    fn blank_identifiers_are_ignored() {
        let input = normalize_annotate_input(RawIdentifiers {
            rsid: Some("   ".to_string()),
            hgvs: Some("NC_000007.14:g.140753336A>T".to_string()),
            ..Default::default()
        })
        .expect("input should normalize");

        assert_eq!(input.kind(), "hgvs");
    }

    #[test]
    fn partial_variant_is_rejected() {
        let error = normalize_annotate_input(RawIdentifiers {
            chromosome: Some("chr7".to_string()),
            rsid: Some("rs113488022".to_string()),
            ..Default::default()
        })
        .expect_err("partial variant must fail");

        assert!(matches!(
            error,
            AppError::BadRequest {
                code: "incomplete_variant",
                ..
            }
        ));
    }

    #[test]
    fn zero_position_is_rejected() {
        let error = normalize_annotate_input(RawIdentifiers {
            chromosome: Some("chr7".to_string()),
            position: Some(0),
            reference_allele: Some("A".to_string()),
            alternate_allele: Some("T".to_string()),
            ..Default::default()
        })
        .expect_err("zero position must fail");

        assert!(error.to_string().contains("bad request"));
    }

    #[test]
    fn missing_identifier_is_rejected() {
        let error = normalize_annotate_input(RawIdentifiers::default())
            .expect_err("empty input must fail");
        assert!(matches!(
            error,
            AppError::BadRequest {
                code: "missing_identifier",
                ..
            }
        ));
    }

    #[test]
    fn resolve_annotators_falls_back_to_defaults() {
        let defaults = vec!["clinvar".to_string(), "go".to_string()];
        let resolved = resolve_annotators(None, &defaults).expect("defaults");
        assert_eq!(resolved, defaults);
    }

    #[test]
    fn resolve_annotators_trims_explicit_names() {
        let resolved = resolve_annotators(
            Some(vec![" revel ".to_string(), "sift".to_string()]),
            &[],
        )
        .expect("explicit list");
        assert_eq!(resolved, vec!["revel".to_string(), "sift".to_string()]);
    }

    #[test]
    fn resolve_annotators_rejects_empty_or_blank() {
        assert!(resolve_annotators(Some(vec![]), &[]).is_err());
        assert!(resolve_annotators(Some(vec!["clinvar".to_string(), " ".to_string()]), &[]).is_err());
    }

    #[test]
    fn parses_braf_v600e() {
        let change = parse_protein_change("V600E").expect("valid change");
        assert_eq!(change.reference_aa, 'V');
        assert_eq!(change.position, 600);
        assert_eq!(change.alternate_aa, 'E');
        assert_eq!(change.raw, "V600E");
    }

    #[test]
    fn non_numeric_position_is_a_validation_error() {
        let error = parse_protein_change("VxxE").expect_err("must fail");
        assert!(matches!(
            error,
            AppError::BadRequest {
                code: "invalid_protein_change",
                ..
            }
        ));
    }

    #[test]
    fn signed_or_zero_position_is_rejected() {
        for change in ["V+600E", "V-600E", "V0E", "V000E"] {
            let error = parse_protein_change(change).expect_err("must fail");
            assert!(
                matches!(
                    error,
                    AppError::BadRequest {
                        code: "invalid_protein_change",
                        ..
                    }
                ),
                "{change} should be rejected"
            );
        }
    }

    #[test]
    fn too_short_protein_change_is_rejected() {
        assert!(parse_protein_change("V").is_err());
        assert!(parse_protein_change("VE").is_err());
        assert!(parse_protein_change("").is_err());
    }

    #[test]
    fn protein_lookup_url_carries_fixed_parameters() {
        let endpoint = Url::parse("https://lookup.example.org/api/mutation").expect("valid url");
        let change = parse_protein_change("V600E").expect("valid change");
        let url = build_protein_lookup_url(&endpoint, "BRAF", &change);

        assert_eq!(
            pairs(&url),
            vec![
                ("ref".to_string(), "BRAF".to_string()),
                ("variant".to_string(), "V600E".to_string()),
                ("level".to_string(), "protein".to_string()),
                ("format".to_string(), "json".to_string()),
            ]
        );
    }

    #[test]
    fn submission_echo_uses_wire_names() {
        let change = parse_protein_change("V600E").expect("valid change");
        let echo = serde_json::to_value(ProteinSubmission::new("BRAF", &change)).expect("json");

        assert_eq!(echo["refAA"], "V");
        assert_eq!(echo["altAA"], "E");
        assert_eq!(echo["position"], 600);
        assert_eq!(echo["proteinChange"], "V600E");
    }
}
