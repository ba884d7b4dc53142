use crate::analysis::{DependencyAnalysis, analyze};
use crate::registry::PackageIndex;
use crate::resolve::{ResolutionReport, ResolveRequest, Resolver, ResolverSettings};
use crate::Result;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Serialize)]
pub struct DependencyReport {
    pub resolution: ResolutionReport,
    pub analysis: DependencyAnalysis,
}

pub async fn resolve_dependencies<I: PackageIndex>(
    index: I,
    settings: ResolverSettings,
    request: &ResolveRequest,
) -> Result<DependencyReport> {
    resolve_dependencies_with_cancel(index, settings, request, &CancellationToken::new()).await
}

pub async fn resolve_dependencies_with_cancel<I: PackageIndex>(
    index: I,
    settings: ResolverSettings,
    request: &ResolveRequest,
    cancel: &CancellationToken,
) -> Result<DependencyReport> {
    let resolver = Resolver::new(index, settings);
    let resolution = resolver.resolve_with_cancel(request, cancel).await?;
    let analysis = analyze(&resolution);

    Ok(DependencyReport {
        resolution,
        analysis,
    })
}
