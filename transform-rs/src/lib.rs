//! # Field Transformation
//!
//! Bidirectional conversion between the two naming conventions the bridge
//! speaks:
//!
//! - **External**: Rally's native field style. `PascalCase` for ordinary
//!   fields (`FormattedID`, `PlanEstimate`), a single leading underscore for
//!   metadata fields (`_ref`, `_type`, `_refObjectName`), and a `c_` marker
//!   for user-defined custom fields (`c_MyCustomField`).
//! - **Internal**: the tool-facing style. kebab-case for ordinary fields
//!   (`formatted-id`, `plan-estimate`), with `metadata-` and `custom-`
//!   prefix namespaces replacing the external markers.
//!
//! The crate exposes the scalar name mapping (`field_name_to_internal`,
//! `field_name_to_external`) and whole-record conversion (`to_internal`,
//! `to_external`) that rebuilds arbitrarily nested `serde_json::Value`
//! trees with every object key renamed. Both directions are total: they
//! never fail and never mutate their input.

pub mod fields;
pub mod walk;

pub use fields::{field_name_to_external, field_name_to_internal};
pub use walk::{to_external, to_internal, transform, Direction};
