//! Scalar field-name mapping.
//!
//! The external → internal direction is algorithmic: split on word
//! boundaries, lowercase, join with `-`. The reverse direction is lossy for
//! acronyms and Rally's own capitalizations (`FormattedID`, `ToDo`), so it
//! consults a fixed table of known irregular mappings before falling back to
//! naive PascalCase reconstruction. Names outside the table are not
//! guaranteed to round-trip; known vocabulary always does.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix on internal names whose external counterpart carries the `_` metadata marker.
pub const METADATA_PREFIX: &str = "metadata-";

/// Prefix on internal names whose external counterpart carries the `c_` custom marker.
pub const CUSTOM_PREFIX: &str = "custom-";

/// External marker for user-defined custom fields.
const CUSTOM_MARKER: &str = "c_";

// Word-boundary rules for the external → internal direction. The acronym
// rule must run before the case-rise rule: `APIIntegration` splits as
// `API-Integration`, never `A-P-I-ntegration`.
static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
static CASE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// Known irregular mappings, kebab form → exact external form.
///
/// Generic PascalCase reconstruction gets these wrong (`formatted-id` would
/// become `FormattedId`), so the reverse direction is table-first. Adding a
/// field the bridge must round-trip is a data change here, not a code change.
const IRREGULAR_FIELDS: &[(&str, &str)] = &[
    // identifiers
    ("formatted-id", "FormattedID"),
    ("object-id", "ObjectID"),
    ("object-uuid", "ObjectUUID"),
    ("api-integration", "APIIntegration"),
    // dates
    ("creation-date", "CreationDate"),
    ("last-update-date", "LastUpdateDate"),
    ("accepted-date", "AcceptedDate"),
    ("in-progress-date", "InProgressDate"),
    // build fields
    ("found-in-build", "FoundInBuild"),
    ("fixed-in-build", "FixedInBuild"),
    ("verified-in-build", "VerifiedInBuild"),
    ("target-build", "TargetBuild"),
    // estimate and progress fields
    ("plan-estimate", "PlanEstimate"),
    ("task-estimate-total", "TaskEstimateTotal"),
    ("task-actual-total", "TaskActualTotal"),
    ("task-remaining-total", "TaskRemainingTotal"),
    ("to-do", "ToDo"),
    ("estimate", "Estimate"),
    ("actuals", "Actuals"),
    // parent-link fields
    ("parent", "Parent"),
    ("work-product", "WorkProduct"),
    ("portfolio-item", "PortfolioItem"),
    ("requirement", "Requirement"),
    ("test-case", "TestCase"),
    // metadata interiors, which keep Rally's lowerCamel forms
    ("ref", "ref"),
    ("type", "type"),
    ("ref-object-name", "refObjectName"),
    ("ref-object-uuid", "refObjectUUID"),
    ("object-version", "objectVersion"),
    ("rally-api-major", "rallyAPIMajor"),
    ("rally-api-minor", "rallyAPIMinor"),
];

static IRREGULAR_BY_KEBAB: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| IRREGULAR_FIELDS.iter().copied().collect());

/// Convert one external field name to the internal convention.
///
/// Marker handling runs first: `c_Foo` → `custom-foo`, `_ref` →
/// `metadata-ref`. Everything else goes through the generic word split.
pub fn field_name_to_internal(name: &str) -> String {
    if let Some(rest) = name.strip_prefix(CUSTOM_MARKER) {
        return format!("{CUSTOM_PREFIX}{}", kebab_case(rest));
    }
    if let Some(rest) = name.strip_prefix('_') {
        return format!("{METADATA_PREFIX}{}", kebab_case(rest));
    }
    kebab_case(name)
}

/// Convert one internal field name back to the external convention.
///
/// Prefix namespaces are unwrapped first, then the remainder is
/// reconstructed table-first.
pub fn field_name_to_external(name: &str) -> String {
    if let Some(rest) = name.strip_prefix(CUSTOM_PREFIX) {
        return format!("{CUSTOM_MARKER}{}", external_form(rest));
    }
    if let Some(rest) = name.strip_prefix(METADATA_PREFIX) {
        return format!("_{}", external_form(rest));
    }
    external_form(name)
}

fn external_form(kebab: &str) -> String {
    match IRREGULAR_BY_KEBAB.get(kebab) {
        Some(exact) => (*exact).to_string(),
        None => pascal_case(kebab),
    }
}

fn kebab_case(name: &str) -> String {
    let split = ACRONYM_BOUNDARY.replace_all(name, "${1}-${2}");
    let split = CASE_BOUNDARY.replace_all(&split, "${1}-${2}");
    split.to_lowercase()
}

fn pascal_case(kebab: &str) -> String {
    kebab
        .split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
