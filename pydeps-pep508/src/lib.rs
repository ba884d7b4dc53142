mod error;
mod marker;
mod name;
mod requirement;
mod version;

pub use error::ParseError;
pub use marker::{MarkerExpression, MarkerOperator, MarkerTree, MarkerValue, MarkerVariable};
pub use name::{is_valid_name, normalize_name};
pub use requirement::{Requirement, VersionConstraint, parse_requirements};
pub use version::PythonVersion;

use std::collections::BTreeSet;

/// Decides whether a requirement's environment marker holds.
///
/// An absent marker is always satisfied. Runtime version comparisons are only
/// applied when `target_python` is given; `extra` comparisons test membership
/// in `requested_extras`, which must hold normalized names.
pub fn evaluate(
    marker: Option<&MarkerTree>,
    target_python: Option<&PythonVersion>,
    requested_extras: &BTreeSet<String>,
) -> bool {
    match marker {
        Some(tree) => tree.evaluate(target_python, requested_extras),
        None => true,
    }
}
