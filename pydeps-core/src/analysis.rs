use crate::resolve::{DependencyEdge, PackageNode, ResolutionReport};
use serde::Serialize;
use std::collections::BTreeMap;

/// Packages with at least this many active dependencies are flagged.
pub const HIGH_DEPENDENCY_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct DependencyAnalysis {
    pub depth: DepthAnalysis,
    pub circular_dependencies: Vec<DependencyEdge>,
    pub complexity: ComplexityScore,
    pub performance: PerformanceImpact,
    pub summary: DependencySummary,
    pub maintenance: MaintenanceConcerns,
    pub potential_conflicts: Vec<PotentialConflict>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthAnalysis {
    pub max_depth: usize,
    pub depth_distribution: BTreeMap<usize, usize>,
    pub average_depth: f64,
    /// Packages at depth 1 or 2.
    pub shallow_deps: usize,
    /// Packages at depth 3 or more.
    pub deep_deps: usize,
    pub leaf_packages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityScore {
    /// 0 to 10, one decimal.
    pub score: f64,
    pub level: Level,
    pub recommendation: &'static str,
    pub factors: ComplexityFactors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplexityFactors {
    pub total_packages: usize,
    pub max_depth: usize,
    pub total_dependencies: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Good,
    Moderate,
    Poor,
}

/// Rough install cost of the graph. Derived from its shape only; nothing is
/// measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceImpact {
    pub estimated_install_time_seconds: usize,
    pub estimated_memory_footprint_mb: usize,
    pub performance_level: PerformanceLevel,
    pub recommendations: Vec<String>,
    pub metrics: PerformanceMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PerformanceMetrics {
    pub package_count_impact: &'static str,
    pub depth_impact: &'static str,
    pub resolution_complexity: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencySummary {
    pub direct_runtime_count: usize,
    pub direct_dev_count: usize,
    pub direct_optional_groups: usize,
    pub total_transitive_packages: usize,
    pub total_runtime_dependencies: usize,
    pub total_development_dependencies: usize,
    pub total_extra_dependencies: usize,
    pub max_dependency_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceConcerns {
    pub total_packages: usize,
    pub packages_without_version_info: usize,
    pub high_dependency_packages: Vec<HighDependencyPackage>,
    pub risk_score: f64,
    pub risk_level: Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighDependencyPackage {
    pub name: String,
    pub dependency_count: usize,
}

/// A package that more than one parent asks for with different constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PotentialConflict {
    pub package: String,
    pub requirements: Vec<ConstraintSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintSource {
    pub required_by: String,
    pub constraint: String,
}

pub fn analyze(report: &ResolutionReport) -> DependencyAnalysis {
    let depth = depth_analysis(&report.nodes);

    DependencyAnalysis {
        complexity: complexity_score(&report.nodes, depth.max_depth),
        performance: performance_impact(report.nodes.len(), depth.max_depth),
        summary: summary(report, depth.max_depth),
        maintenance: maintenance_concerns(&report.nodes),
        potential_conflicts: potential_conflicts(&report.nodes),
        circular_dependencies: report.circular_dependencies.clone(),
        depth,
    }
}

pub fn depth_analysis(nodes: &BTreeMap<String, PackageNode>) -> DepthAnalysis {
    let mut distribution = BTreeMap::new();
    let mut total = 0;

    for node in nodes.values() {
        *distribution.entry(node.depth).or_insert(0) += 1;
        total += node.depth;
    }

    let average_depth = if nodes.is_empty() {
        0.0
    } else {
        round_to(total as f64 / nodes.len() as f64, 2)
    };

    DepthAnalysis {
        max_depth: distribution.keys().next_back().copied().unwrap_or(0),
        average_depth,
        shallow_deps: nodes
            .values()
            .filter(|node| (1..=2).contains(&node.depth))
            .count(),
        deep_deps: nodes.values().filter(|node| node.depth >= 3).count(),
        leaf_packages: nodes
            .values()
            .filter(|node| !node.is_resolved() || node.children.is_empty())
            .map(|node| node.name.clone())
            .collect(),
        depth_distribution: distribution,
    }
}

pub fn complexity_score(nodes: &BTreeMap<String, PackageNode>, max_depth: usize) -> ComplexityScore {
    let total_packages = nodes.len();
    let total_dependencies: usize = nodes.values().map(|node| node.children.len()).sum();

    let raw = 5.0 * ratio(total_packages, 40)
        + 3.0 * ratio(max_depth, 8)
        + 2.0 * ratio(total_dependencies, 100);
    let score = round_to(raw, 1);

    let (level, recommendation) = if score < 2.5 {
        (
            Level::Low,
            "Simple dependency structure, low maintenance overhead",
        )
    } else if score < 6.0 {
        (
            Level::Moderate,
            "Moderate complexity; review dependencies periodically",
        )
    } else {
        (
            Level::High,
            "Complex dependency graph; consider trimming or pinning dependencies",
        )
    };

    ComplexityScore {
        score,
        level,
        recommendation,
        factors: ComplexityFactors {
            total_packages,
            max_depth,
            total_dependencies,
        },
    }
}

pub fn performance_impact(total_packages: usize, max_depth: usize) -> PerformanceImpact {
    let performance_level = match total_packages {
        0..=25 => PerformanceLevel::Good,
        26..=50 => PerformanceLevel::Moderate,
        _ => PerformanceLevel::Poor,
    };

    let package_count_impact = match total_packages {
        0..=20 => "low",
        21..=50 => "medium",
        _ => "high",
    };

    let depth_impact = match max_depth {
        0..=3 => "low",
        4..=6 => "medium",
        _ => "high",
    };

    let resolution_complexity = match total_packages {
        0..=10 => "simple",
        11..=30 => "moderate",
        _ => "complex",
    };

    let mut recommendations = Vec::new();
    if total_packages > 50 {
        recommendations.push(
            "Large dependency set; consider auditing for unused packages".to_string(),
        );
    }
    if max_depth > 6 {
        recommendations
            .push("Deep dependency chains; pin intermediate packages for stability".to_string());
    }
    if performance_level != PerformanceLevel::Good {
        recommendations
            .push("Cache wheels or use a local index mirror to speed up installs".to_string());
    }

    PerformanceImpact {
        estimated_install_time_seconds: 5 + 2 * total_packages,
        estimated_memory_footprint_mb: 50 + 3 * total_packages,
        performance_level,
        recommendations,
        metrics: PerformanceMetrics {
            package_count_impact,
            depth_impact,
            resolution_complexity,
        },
    }
}

pub fn summary(report: &ResolutionReport, max_depth: usize) -> DependencySummary {
    let root = report.root();

    DependencySummary {
        direct_runtime_count: root.map_or(0, |node| node.buckets.runtime.len()),
        direct_dev_count: root.map_or(0, |node| node.buckets.development_count()),
        direct_optional_groups: root.map_or(0, |node| node.buckets.extras.len()),
        total_transitive_packages: report.nodes.len().saturating_sub(1),
        total_runtime_dependencies: report
            .nodes
            .values()
            .map(|node| node.buckets.runtime.len())
            .sum(),
        total_development_dependencies: report
            .nodes
            .values()
            .map(|node| node.buckets.development_count())
            .sum(),
        total_extra_dependencies: report
            .nodes
            .values()
            .map(|node| node.buckets.extras_count())
            .sum(),
        max_dependency_depth: max_depth,
    }
}

pub fn maintenance_concerns(nodes: &BTreeMap<String, PackageNode>) -> MaintenanceConcerns {
    let packages_without_version_info = nodes
        .values()
        .filter(|node| node.version.is_none())
        .count();

    let high_dependency_packages: Vec<HighDependencyPackage> = nodes
        .values()
        .map(|node| (node, node.children.len() + node.unexpanded.len()))
        .filter(|(_, count)| *count >= HIGH_DEPENDENCY_THRESHOLD)
        .map(|(node, dependency_count)| HighDependencyPackage {
            name: node.name.clone(),
            dependency_count,
        })
        .collect();

    let raw = packages_without_version_info as f64 * 2.0 + high_dependency_packages.len() as f64;
    let risk_score = round_to(raw.min(10.0), 1);
    let risk_level = if risk_score < 3.0 {
        Level::Low
    } else if risk_score < 6.0 {
        Level::Moderate
    } else {
        Level::High
    };

    MaintenanceConcerns {
        total_packages: nodes.len(),
        packages_without_version_info,
        high_dependency_packages,
        risk_score,
        risk_level,
    }
}

/// Finds packages reached through several edges whose active declaring lines
/// carry differing version constraints. Only textual differences are detected.
pub fn potential_conflicts(nodes: &BTreeMap<String, PackageNode>) -> Vec<PotentialConflict> {
    let mut by_package: BTreeMap<&str, Vec<ConstraintSource>> = BTreeMap::new();

    for node in nodes.values() {
        for child in &node.children {
            let Some(spec) = node.constraints.get(child) else {
                continue;
            };

            by_package
                .entry(child.as_str())
                .or_default()
                .push(ConstraintSource {
                    required_by: node.name.clone(),
                    constraint: spec.clone(),
                });
        }
    }

    by_package
        .into_iter()
        .filter(|(_, sources)| {
            sources
                .iter()
                .any(|source| source.constraint != sources[0].constraint)
        })
        .map(|(package, requirements)| PotentialConflict {
            package: package.to_string(),
            requirements,
        })
        .collect()
}

fn ratio(value: usize, cap: usize) -> f64 {
    (value as f64 / cap as f64).min(1.0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
