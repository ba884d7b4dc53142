pub mod deps;
pub mod resolve;

pub use deps::{DirectDependencies, package_dependencies};
pub use resolve::{DependencyReport, resolve_dependencies, resolve_dependencies_with_cancel};
