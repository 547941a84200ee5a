//! Bundled default annotator set
//!
//! Used whenever a caller does not name annotators explicitly. Bump
//! `DEFAULT_ANNOTATORS_REVISION` whenever the list changes.

pub const DEFAULT_ANNOTATORS_REVISION: u32 = 1;

pub const DEFAULT_ANNOTATORS: [&str; 144] = [
    "abraom",
    "alfa",
    "alfa_african",
    "alfa_asian",
    "alfa_european",
    "alfa_latin_american",
    "alfa_other",
    "allofus250k",
    "aloft",
    "alphamissense",
    "arrvars",
    "bayesdel",
    "biogrid",
    "brca1_func_assay",
    "cadd",
    "cadd_exome",
    "cancer_genome_interpreter",
    "cancer_hotspots",
    "cardioboost",
    "ccr",
    "ccre_screen",
    "cedar",
    "cgc",
    "cgd",
    "cgl",
    "chasmplus",
    "chasmplus_mski",
    "civic",
    "civic_gene",
    "clingen",
    "clingen_allele_registry",
    "clinpred",
    "clinvar",
    "clinvar_T2T_hg38_comparator",
    "cscape",
    "cscape_coding",
    "dann",
    "dann_coding",
    "dbcid",
    "dbscsnv",
    "dbsnp",
    "dbsnp_common",
    "denovo",
    "dgi",
    "ditto",
    "encode_tfbs",
    "ensembl_regulatory_build",
    "esm1b",
    "esp6500",
    "ess_gene",
    "eve",
    "exac_gene",
    "fathmm",
    "fathmm_mkl",
    "fathmm_xf",
    "fitcons",
    "flank_seq",
    "funseq2",
    "genehancer",
    "genocanyon",
    "gerp",
    "geuvadis",
    "ghis",
    "gmvp",
    "gnomad4",
    "go",
    "grantham_scores",
    "grasp",
    "gtex",
    "gwas_catalog",
    "haploreg_afr",
    "haploreg_amr",
    "haploreg_asn",
    "haploreg_eur",
    "hg19",
    "hgdp",
    "hpo",
    "intact",
    "interpro",
    "linsight",
    "litvar_full",
    "loftool",
    "lrt",
    "mavedb",
    "metalr",
    "metarnn",
    "metasvm",
    "mirbase",
    "mistic",
    "mitomap",
    "mupit",
    "mutation_assessor",
    "mutationtaster",
    "mutpanning",
    "mutpred2",
    "mutpred_indel",
    "ncbigene",
    "ncer",
    "ncrna",
    "ndex",
    "ndex_chd",
    "ndex_signor",
    "omim",
    "oncokb",
    "pangalodb",
    "pangolin",
    "pharmgkb",
    "phastcons",
    "phdsnpg",
    "phi",
    "phylop",
    "polyphen2",
    "prec",
    "primateai",
    "provean",
    "pseudogene",
    "pubmed",
    "regeneron",
    "regulomedb",
    "repeat",
    "revel",
    "rvis",
    "segway",
    "sift",
    "siphy",
    "spliceai",
    "swissprot_binding",
    "swissprot_domains",
    "swissprot_ptm",
    "target",
    "thousandgenomes",
    "thousandgenomes_ad_mixed_american",
    "thousandgenomes_african",
    "thousandgenomes_east_asian",
    "thousandgenomes_european",
    "thousandgenomes_south_asian",
    "trinity",
    "ucscgenomebrowser",
    "uk10k_cohort",
    "uniprot",
    "uniprot_domain",
    "varity_r",
    "vest",
    "vista_enhancer",
];

pub fn default_annotators() -> Vec<String> {
    DEFAULT_ANNOTATORS.iter().map(|name| name.to_string()).collect()
}
