mod cycles;
mod tree;
pub mod types;

pub use types::{
    DEFAULT_MAX_DEPTH, DependencyEdge, DependencyTree, MAX_DEPTH_CEILING, NodeState, PackageNode,
    ResolutionReport, ResolveRequest, TreeLink,
};

use crate::classify::{AllowList, DefaultDevGroups, DevGroupPredicate, classify};
use crate::registry::{IndexError, PackageIndex, PackageMetadata};
use crate::{PydepsConfig, PydepsError, Result};
use futures::stream::{self, StreamExt};
use pydeps_pep508::{PythonVersion, is_valid_name, normalize_name, parse_requirements};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct ResolverSettings {
    /// Upper bound on index lookups in flight at once.
    pub concurrency: usize,
    pub timeout: Option<Duration>,
    pub dev_groups: Arc<dyn DevGroupPredicate>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        ResolverSettings {
            concurrency: 8,
            timeout: None,
            dev_groups: Arc::new(DefaultDevGroups),
        }
    }
}

impl ResolverSettings {
    pub fn from_config(config: &PydepsConfig) -> Self {
        let dev_groups: Arc<dyn DevGroupPredicate> = match &config.dev_groups {
            Some(names) => Arc::new(AllowList::new(names)),
            None => Arc::new(DefaultDevGroups),
        };

        ResolverSettings {
            concurrency: config.registry_concurrency.max(1),
            timeout: config.resolve_timeout,
            dev_groups,
        }
    }
}

pub struct Resolver<I: PackageIndex> {
    index: I,
    settings: ResolverSettings,
}

struct Pending {
    name: String,
    parent: String,
    depth: usize,
}

/// Per-call view of the request, shared by every node expansion.
struct Walk<'a> {
    python: Option<PythonVersion>,
    include_development: bool,
    max_depth: usize,
    predicate: &'a dyn DevGroupPredicate,
}

impl<I: PackageIndex> Resolver<I> {
    pub fn new(index: I, settings: ResolverSettings) -> Self {
        Resolver { index, settings }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub async fn resolve(&self, request: &ResolveRequest) -> Result<ResolutionReport> {
        self.resolve_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Resolves `request`, giving up with [`PydepsError::Cancelled`] when
    /// `cancel` fires or the configured timeout elapses. In-flight lookups are
    /// dropped; no partial report is returned.
    pub async fn resolve_with_cancel(
        &self,
        request: &ResolveRequest,
        cancel: &CancellationToken,
    ) -> Result<ResolutionReport> {
        let timeout = self.settings.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::warn!(package = %request.package_name, "resolution cancelled");
                Err(PydepsError::Cancelled { name: request.package_name.clone() })
            }
            _ = deadline => {
                tracing::warn!(
                    package = %request.package_name,
                    timeout = ?timeout,
                    "resolution timed out"
                );
                Err(PydepsError::Cancelled { name: request.package_name.clone() })
            }
            result = self.run(request) => result,
        }
    }

    async fn run(&self, request: &ResolveRequest) -> Result<ResolutionReport> {
        let started = Instant::now();
        let requested = request.package_name.trim();

        if !is_valid_name(requested) {
            return Err(PydepsError::InvalidName {
                name: request.package_name.clone(),
            });
        }

        let walk = Walk {
            python: target_python(request.target_python.as_deref()),
            include_development: request.include_development,
            max_depth: clamp_depth(request.max_depth),
            predicate: self.settings.dev_groups.as_ref(),
        };

        let root_name = normalize_name(requested);
        let pinned = request.pinned_version.as_deref();

        tracing::debug!(package = %root_name, version = ?pinned, "fetching root metadata");

        let metadata = self
            .index
            .get_package_metadata(&root_name, pinned)
            .await
            .map_err(|err| PydepsError::from_index(requested, pinned, err))?;

        let root_extras: BTreeSet<String> = request
            .requested_extras
            .iter()
            .map(|extra| normalize_name(extra))
            .filter(|extra| !extra.is_empty())
            .collect();

        let root_version = metadata.version.clone();
        let root_requires_python = metadata.requires_python.clone();
        let (mut root, active) = walk.node(&root_name, metadata, 0, None, &root_extras);

        for extra in &root_extras {
            let declared = root.buckets.extras.contains_key(extra)
                || root.buckets.development.contains_key(extra);
            if !declared {
                tracing::warn!(package = %root_name, extra = %extra, "requested extra is not declared");
            }
        }

        let mut nodes: BTreeMap<String, PackageNode> = BTreeMap::new();
        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut revisits: Vec<DependencyEdge> = Vec::new();
        let mut frontier: Vec<Pending> = Vec::new();

        visited.insert(root_name.clone());
        walk.link(&mut root, active, &mut visited, &mut revisits, &mut frontier);
        nodes.insert(root_name.clone(), root);

        while !frontier.is_empty() {
            let batch = std::mem::take(&mut frontier);
            tracing::debug!(
                pending = batch.len(),
                depth = batch[0].depth,
                "expanding frontier"
            );

            let fetched: Vec<(Pending, std::result::Result<PackageMetadata, IndexError>)> =
                stream::iter(batch)
                    .map(|pending| async move {
                        let result = self.index.get_package_metadata(&pending.name, None).await;
                        (pending, result)
                    })
                    .buffered(self.settings.concurrency.max(1))
                    .collect()
                    .await;

            for (pending, result) in fetched {
                let node = match result {
                    Ok(metadata) => {
                        let (mut node, active) = walk.node(
                            &pending.name,
                            metadata,
                            pending.depth,
                            Some(&pending.parent),
                            &BTreeSet::new(),
                        );
                        walk.link(&mut node, active, &mut visited, &mut revisits, &mut frontier);
                        node
                    }
                    Err(err) => {
                        tracing::warn!(
                            package = %pending.name,
                            depth = pending.depth,
                            path = %lineage(&nodes, &pending),
                            kind = err.kind(),
                            error = %err,
                            "failed to fetch dependency metadata"
                        );
                        failed_node(&pending, &err)
                    }
                };

                nodes.insert(pending.name, node);
            }
        }

        let (circular_dependencies, shared_dependencies) =
            cycles::classify_revisits(&nodes, revisits);
        let tree = tree::project(&nodes, &nodes[&root_name], &circular_dependencies);

        tracing::info!(
            package = %root_name,
            version = %root_version,
            nodes = nodes.len(),
            cycles = circular_dependencies.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "resolved dependency graph"
        );

        Ok(ResolutionReport {
            package_name: root_name,
            version: root_version,
            requires_python: root_requires_python,
            request: ResolveRequest {
                max_depth: walk.max_depth,
                ..request.clone()
            },
            nodes,
            tree,
            circular_dependencies,
            shared_dependencies,
        })
    }
}

struct ActiveRequirement {
    name: String,
    raw: String,
    specifier: Option<String>,
}

impl Walk<'_> {
    /// Builds the node for one fetched release along with its active
    /// requirements, first line per package, in declaration order.
    fn node(
        &self,
        name: &str,
        metadata: PackageMetadata,
        depth: usize,
        parent: Option<&str>,
        requested_extras: &BTreeSet<String>,
    ) -> (PackageNode, Vec<ActiveRequirement>) {
        let requirements = parse_requirements(metadata.requires_dist.iter().map(String::as_str));
        let buckets = classify(&requirements, &metadata.provides_extra, self.predicate);

        let mut extras = requested_extras.clone();
        if self.include_development {
            extras.extend(buckets.development_groups().map(str::to_string));
        }

        let mut seen = BTreeSet::new();
        let active: Vec<ActiveRequirement> = requirements
            .iter()
            .filter(|req| {
                pydeps_pep508::evaluate(
                    req.environment_marker.as_ref(),
                    self.python.as_ref(),
                    &extras,
                )
            })
            .filter(|req| seen.insert(req.name.clone()))
            .map(|req| ActiveRequirement {
                name: req.name.clone(),
                raw: req.raw.clone(),
                specifier: req.specifier().map(str::to_string),
            })
            .collect();

        let node = PackageNode {
            name: name.to_string(),
            display_name: metadata.name,
            version: Some(metadata.version),
            requires_python: metadata.requires_python,
            declared_requirements: metadata.requires_dist,
            depth,
            parent: parent.map(str::to_string),
            children: Vec::new(),
            unexpanded: Vec::new(),
            constraints: BTreeMap::new(),
            buckets,
            state: NodeState::Resolved,
        };

        (node, active)
    }

    /// Records the edges of a freshly built node. Packages already in the
    /// graph are always linked as revisits. Unseen packages are queued below
    /// the depth bound; at the bound they stay in `unexpanded` and the node
    /// becomes `Truncated`.
    fn link(
        &self,
        node: &mut PackageNode,
        active: Vec<ActiveRequirement>,
        visited: &mut BTreeSet<String>,
        revisits: &mut Vec<DependencyEdge>,
        frontier: &mut Vec<Pending>,
    ) {
        for req in active {
            if visited.contains(&req.name) {
                revisits.push(DependencyEdge {
                    from: node.name.clone(),
                    to: req.name.clone(),
                    at_depth: node.depth + 1,
                });
            } else if node.depth < self.max_depth {
                visited.insert(req.name.clone());
                frontier.push(Pending {
                    name: req.name.clone(),
                    parent: node.name.clone(),
                    depth: node.depth + 1,
                });
            } else {
                node.unexpanded.push(req.raw);
                continue;
            }

            if let Some(specifier) = req.specifier {
                node.constraints.insert(req.name.clone(), specifier);
            }
            node.children.push(req.name);
        }

        if !node.unexpanded.is_empty() {
            node.state = NodeState::Truncated;
        }
    }
}

fn failed_node(pending: &Pending, err: &IndexError) -> PackageNode {
    PackageNode {
        name: pending.name.clone(),
        display_name: pending.name.clone(),
        version: None,
        requires_python: None,
        declared_requirements: Vec::new(),
        depth: pending.depth,
        parent: Some(pending.parent.clone()),
        children: Vec::new(),
        unexpanded: Vec::new(),
        constraints: BTreeMap::new(),
        buckets: Default::default(),
        state: NodeState::FetchFailed {
            kind: err.kind().to_string(),
            message: err.to_string(),
        },
    }
}

/// Discovery path from the root down to `pending`, e.g. `a > b > c`.
fn lineage(nodes: &BTreeMap<String, PackageNode>, pending: &Pending) -> String {
    let mut path = vec![pending.name.as_str()];
    let mut current = nodes.get(&pending.parent);

    while let Some(node) = current {
        path.push(node.name.as_str());
        current = node.parent.as_ref().and_then(|parent| nodes.get(parent));
    }

    path.reverse();
    path.join(" > ")
}

fn clamp_depth(requested: usize) -> usize {
    let clamped = requested.clamp(1, MAX_DEPTH_CEILING);
    if clamped != requested {
        tracing::warn!(requested, clamped, "max depth out of range");
    }
    clamped
}

fn target_python(raw: Option<&str>) -> Option<PythonVersion> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    match PythonVersion::parse(raw) {
        Ok(version) => Some(version),
        Err(err) => {
            tracing::warn!(version = %raw, error = %err, "ignoring unparseable target python version");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryIndex, meta, requests_index};

    fn resolver(index: MemoryIndex) -> Resolver<MemoryIndex> {
        Resolver::new(index, ResolverSettings::default())
    }

    fn names(report: &ResolutionReport) -> Vec<&str> {
        report.nodes.keys().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn package_without_requirements_is_a_single_node() {
        let resolver = resolver(MemoryIndex::new().package("six", "1.16.0", &[]));
        let report = resolver.resolve(&ResolveRequest::new("six")).await.unwrap();

        assert_eq!(names(&report), vec!["six"]);
        let root = report.root().unwrap();
        assert_eq!(root.depth, 0);
        assert!(root.children.is_empty());
        assert_eq!(root.state, NodeState::Resolved);
        assert!(report.circular_dependencies.is_empty());
    }

    #[tokio::test]
    async fn resolves_requests_runtime_dependencies() {
        let resolver = resolver(requests_index());
        let report = resolver
            .resolve(&ResolveRequest::new("requests"))
            .await
            .unwrap();

        assert_eq!(report.version, "2.31.0");
        assert_eq!(report.requires_python.as_deref(), Some(">=3.7"));
        assert_eq!(
            names(&report),
            vec!["certifi", "charset-normalizer", "idna", "requests", "urllib3"]
        );
        assert!(report.nodes.values().all(|node| node.depth <= 1));
        assert!(report.circular_dependencies.is_empty());
        assert_eq!(
            report.root().unwrap().children,
            vec!["charset-normalizer", "idna", "urllib3", "certifi"]
        );
    }

    #[tokio::test]
    async fn requested_extra_adds_depth_one_nodes() {
        let resolver = resolver(requests_index());
        let report = resolver
            .resolve(&ResolveRequest::new("requests").extras(["security"]))
            .await
            .unwrap();

        assert_eq!(report.nodes.len(), 7);
        assert_eq!(report.nodes["pyopenssl"].depth, 1);
        assert_eq!(report.nodes["pyopenssl"].display_name, "pyOpenSSL");
        assert_eq!(report.nodes["cryptography"].depth, 1);
        assert!(!report.nodes.contains_key("pysocks"));
    }

    #[tokio::test]
    async fn two_package_cycle_terminates() {
        let index = MemoryIndex::new()
            .package("a", "1.0", &["b"])
            .package("b", "1.0", &["a"]);
        let resolver = resolver(index);
        let report = resolver.resolve(&ResolveRequest::new("a")).await.unwrap();

        assert_eq!(names(&report), vec!["a", "b"]);
        assert_eq!(
            report.circular_dependencies,
            vec![DependencyEdge {
                from: "b".to_string(),
                to: "a".to_string(),
                at_depth: 2,
            }]
        );
        assert!(report.shared_dependencies.is_empty());
        assert_eq!(resolver.index().calls("a"), 1);
        assert_eq!(resolver.index().calls("b"), 1);
    }

    #[tokio::test]
    async fn self_dependency_is_reported_as_cycle() {
        let resolver = resolver(MemoryIndex::new().package("loop", "1.0", &["loop>=1"]));
        let report = resolver.resolve(&ResolveRequest::new("loop")).await.unwrap();

        assert_eq!(report.nodes.len(), 1);
        assert_eq!(report.circular_dependencies.len(), 1);
        assert_eq!(report.tree.children[0].link, TreeLink::Cycle);
    }

    #[tokio::test]
    async fn diamond_is_shared_not_circular() {
        let index = MemoryIndex::new()
            .package("app", "1.0", &["left", "right"])
            .package("left", "1.0", &["base>=1"])
            .package("right", "1.0", &["base>=2"])
            .package("base", "2.0", &[]);
        let resolver = resolver(index);
        let report = resolver.resolve(&ResolveRequest::new("app")).await.unwrap();

        assert!(report.circular_dependencies.is_empty());
        assert_eq!(
            report.shared_dependencies,
            vec![DependencyEdge {
                from: "right".to_string(),
                to: "base".to_string(),
                at_depth: 2,
            }]
        );
        assert_eq!(report.nodes["base"].parent.as_deref(), Some("left"));
        assert_eq!(resolver.index().calls("base"), 1);
    }

    #[tokio::test]
    async fn depth_bound_marks_truncated_nodes() {
        let index = MemoryIndex::new()
            .package("a", "1.0", &["b"])
            .package("b", "1.0", &["c"])
            .package("c", "1.0", &["d"])
            .package("d", "1.0", &[]);
        let resolver = resolver(index);
        let report = resolver
            .resolve(&ResolveRequest::new("a").max_depth(2))
            .await
            .unwrap();

        assert_eq!(names(&report), vec!["a", "b", "c"]);
        let c = &report.nodes["c"];
        assert_eq!(c.depth, 2);
        assert_eq!(c.state, NodeState::Truncated);
        assert_eq!(c.unexpanded, vec!["d"]);
        assert!(c.children.is_empty());
        assert_eq!(resolver.index().calls("d"), 0);
    }

    #[tokio::test]
    async fn depth_bound_leaf_without_requirements_stays_resolved() {
        let index = MemoryIndex::new()
            .package("a", "1.0", &["b"])
            .package("b", "1.0", &[]);
        let report = resolver(index)
            .resolve(&ResolveRequest::new("a").max_depth(1))
            .await
            .unwrap();

        assert_eq!(report.nodes["b"].state, NodeState::Resolved);
    }

    #[tokio::test]
    async fn depth_bound_still_links_packages_in_the_graph() {
        let index = MemoryIndex::new()
            .package("a", "1.0", &["b"])
            .package("b", "1.0", &["a"]);
        let report = resolver(index)
            .resolve(&ResolveRequest::new("a").max_depth(1))
            .await
            .unwrap();

        let b = &report.nodes["b"];
        assert_eq!(b.state, NodeState::Resolved);
        assert_eq!(b.children, vec!["a"]);
        assert!(b.unexpanded.is_empty());
        assert_eq!(
            report.circular_dependencies,
            vec![DependencyEdge {
                from: "b".to_string(),
                to: "a".to_string(),
                at_depth: 2,
            }]
        );
    }

    #[tokio::test]
    async fn depth_bound_node_with_unseen_dependency_is_truncated() {
        let index = MemoryIndex::new()
            .package("a", "1.0", &["b"])
            .package("b", "1.0", &["a", "c"])
            .package("c", "1.0", &[]);
        let resolver = resolver(index);
        let report = resolver
            .resolve(&ResolveRequest::new("a").max_depth(1))
            .await
            .unwrap();

        let b = &report.nodes["b"];
        assert_eq!(b.state, NodeState::Truncated);
        assert_eq!(b.children, vec!["a"]);
        assert_eq!(b.unexpanded, vec!["c"]);
        assert_eq!(report.circular_dependencies.len(), 1);
        assert_eq!(resolver.index().calls("c"), 0);
    }

    #[tokio::test]
    async fn loop_closing_edge_is_circular_when_reached_by_two_routes() {
        let index = MemoryIndex::new()
            .package("r", "1.0", &["q", "p"])
            .package("q", "1.0", &["q2"])
            .package("q2", "1.0", &["c"])
            .package("p", "1.0", &["c"])
            .package("c", "1.0", &["p"]);
        let report = resolver(index)
            .resolve(&ResolveRequest::new("r"))
            .await
            .unwrap();

        assert_eq!(report.nodes["c"].parent.as_deref(), Some("p"));
        assert_eq!(
            report.circular_dependencies,
            vec![DependencyEdge {
                from: "c".to_string(),
                to: "p".to_string(),
                at_depth: 3,
            }]
        );
        assert_eq!(
            report.shared_dependencies,
            vec![DependencyEdge {
                from: "q2".to_string(),
                to: "c".to_string(),
                at_depth: 3,
            }]
        );

        let p = &report.tree.children[1];
        assert_eq!(p.name, "p");
        assert_eq!(p.children[0].name, "c");
        assert_eq!(p.children[0].children[0].link, TreeLink::Cycle);
    }

    #[tokio::test]
    async fn edge_constraint_comes_from_the_active_line() {
        let index = MemoryIndex::new()
            .package(
                "app",
                "1.0",
                &[
                    "foo>=1; python_version < '3.8'",
                    "foo>=2; python_version >= '3.8'",
                ],
            )
            .package("foo", "2.1", &[]);
        let report = resolver(index)
            .resolve(&ResolveRequest::new("app").python("3.11"))
            .await
            .unwrap();

        let app = report.root().unwrap();
        assert_eq!(app.children, vec!["foo"]);
        assert_eq!(app.constraints.get("foo").map(String::as_str), Some(">=2"));
    }

    #[tokio::test]
    async fn out_of_range_depth_is_clamped() {
        let index = MemoryIndex::new()
            .package("a", "1.0", &["b"])
            .package("b", "1.0", &[]);
        let resolver = resolver(index);

        let report = resolver
            .resolve(&ResolveRequest::new("a").max_depth(0))
            .await
            .unwrap();
        assert_eq!(report.request.max_depth, 1);
        assert!(report.nodes.contains_key("b"));

        let report = resolver
            .resolve(&ResolveRequest::new("a").max_depth(99))
            .await
            .unwrap();
        assert_eq!(report.request.max_depth, MAX_DEPTH_CEILING);
    }

    #[tokio::test]
    async fn filters_on_target_python() {
        let index = MemoryIndex::new()
            .package("app", "1.0", &["typing-extensions; python_version < '3.10'"])
            .package("typing-extensions", "4.9.0", &[]);
        let resolver = resolver(index);

        let newer = resolver
            .resolve(&ResolveRequest::new("app").python("3.11"))
            .await
            .unwrap();
        assert_eq!(newer.nodes.len(), 1);

        let older = resolver
            .resolve(&ResolveRequest::new("app").python("3.9"))
            .await
            .unwrap();
        assert!(older.nodes.contains_key("typing-extensions"));

        let unfiltered = resolver.resolve(&ResolveRequest::new("app")).await.unwrap();
        assert!(unfiltered.nodes.contains_key("typing-extensions"));
    }

    #[tokio::test]
    async fn unparseable_target_python_is_ignored() {
        let index = MemoryIndex::new()
            .package("app", "1.0", &["tomli; python_version < '3.11'"])
            .package("tomli", "2.0.1", &[]);
        let report = resolver(index)
            .resolve(&ResolveRequest::new("app").python("not-a-version"))
            .await
            .unwrap();

        assert!(report.nodes.contains_key("tomli"));
    }

    #[tokio::test]
    async fn development_groups_follow_the_global_flag() {
        let index = MemoryIndex::new()
            .release(meta("app", "1.0", &["lib", "pytest; extra == 'test'"], &["test"]))
            .release(meta("lib", "1.0", &["black; extra == 'lint'"], &["lint"]))
            .package("pytest", "8.0.0", &[])
            .package("black", "24.1.0", &[]);
        let resolver = resolver(index);

        let plain = resolver.resolve(&ResolveRequest::new("app")).await.unwrap();
        assert_eq!(names(&plain), vec!["app", "lib"]);

        let with_dev = resolver
            .resolve(&ResolveRequest::new("app").include_development(true))
            .await
            .unwrap();
        assert_eq!(names(&with_dev), vec!["app", "black", "lib", "pytest"]);
        assert_eq!(with_dev.nodes["black"].depth, 2);
    }

    #[tokio::test]
    async fn non_root_extras_are_not_activated() {
        let index = MemoryIndex::new()
            .release(meta("app", "1.0", &["lib[speed]"], &[]))
            .release(meta("lib", "1.0", &["ujson; extra == 'speed'"], &["speed"]))
            .package("ujson", "5.9.0", &[]);
        let report = resolver(index)
            .resolve(&ResolveRequest::new("app"))
            .await
            .unwrap();

        assert_eq!(names(&report), vec!["app", "lib"]);
        assert_eq!(report.nodes["lib"].buckets.extras["speed"].len(), 1);
    }

    #[tokio::test]
    async fn child_failure_becomes_terminal_node() {
        let index = MemoryIndex::new()
            .package("app", "1.0", &["ghost", "real"])
            .package("real", "1.0", &[])
            .failing("ghost", IndexError::NotFound);
        let report = resolver(index)
            .resolve(&ResolveRequest::new("app"))
            .await
            .unwrap();

        let ghost = &report.nodes["ghost"];
        assert_eq!(ghost.version, None);
        assert_eq!(ghost.depth, 1);
        assert!(matches!(
            &ghost.state,
            NodeState::FetchFailed { kind, .. } if kind == "not_found"
        ));
        assert_eq!(report.nodes["real"].state, NodeState::Resolved);
    }

    #[tokio::test]
    async fn root_failures_propagate() {
        let index = MemoryIndex::new()
            .failing("flaky", IndexError::Network("connection reset".to_string()));
        let resolver = resolver(index);

        let missing = resolver.resolve(&ResolveRequest::new("nope")).await;
        assert!(matches!(missing, Err(PydepsError::PackageNotFound { .. })));

        let invalid = resolver.resolve(&ResolveRequest::new("  ")).await;
        assert!(matches!(invalid, Err(PydepsError::InvalidName { .. })));

        let network = resolver.resolve(&ResolveRequest::new("flaky")).await;
        assert!(matches!(network, Err(PydepsError::Network { .. })));
    }

    #[tokio::test]
    async fn pinned_version_applies_to_root() {
        let index = MemoryIndex::new()
            .package("lib", "1.0", &[])
            .package("lib", "2.0", &[]);
        let resolver = resolver(index);

        let pinned = resolver
            .resolve(&ResolveRequest::new("lib").pinned("1.0"))
            .await
            .unwrap();
        assert_eq!(pinned.version, "1.0");

        let latest = resolver.resolve(&ResolveRequest::new("lib")).await.unwrap();
        assert_eq!(latest.version, "2.0");
    }

    #[tokio::test]
    async fn cancellation_returns_no_report() {
        let index = MemoryIndex::new()
            .package("slow", "1.0", &[])
            .delayed("slow", Duration::from_secs(30));
        let resolver = resolver(index);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = resolver
            .resolve_with_cancel(&ResolveRequest::new("slow"), &cancel)
            .await;
        assert!(matches!(result, Err(PydepsError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn timeout_cancels_resolution() {
        let index = MemoryIndex::new()
            .package("slow", "1.0", &[])
            .delayed("slow", Duration::from_secs(30));
        let settings = ResolverSettings {
            timeout: Some(Duration::from_millis(20)),
            ..ResolverSettings::default()
        };
        let resolver = Resolver::new(index, settings);

        let result = resolver.resolve(&ResolveRequest::new("slow")).await;
        assert!(matches!(result, Err(PydepsError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn completion_order_does_not_change_the_graph() {
        let build = |slow: &str| {
            MemoryIndex::new()
                .package("app", "1.0", &["x", "y"])
                .package("x", "1.0", &["shared"])
                .package("y", "1.0", &["shared"])
                .package("shared", "1.0", &[])
                .delayed(slow, Duration::from_millis(25))
        };

        let first = resolver(build("x"))
            .resolve(&ResolveRequest::new("app"))
            .await
            .unwrap();
        let second = resolver(build("y"))
            .resolve(&ResolveRequest::new("app"))
            .await
            .unwrap();

        let shape = |report: &ResolutionReport| {
            report
                .nodes
                .values()
                .map(|n| (n.name.clone(), n.depth, n.parent.clone(), n.children.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&first), shape(&second));
        assert_eq!(first.shared_dependencies, second.shared_dependencies);
    }

    #[tokio::test]
    async fn single_fetch_per_package_under_concurrency() {
        let index = MemoryIndex::new()
            .package("app", "1.0", &["a", "b", "c"])
            .package("a", "1.0", &["common"])
            .package("b", "1.0", &["common"])
            .package("c", "1.0", &["common"])
            .package("common", "1.0", &[]);
        let resolver = Resolver::new(
            index,
            ResolverSettings {
                concurrency: 2,
                ..ResolverSettings::default()
            },
        );

        let report = resolver.resolve(&ResolveRequest::new("app")).await.unwrap();
        assert_eq!(report.nodes.len(), 5);
        assert_eq!(resolver.index().total_calls(), 5);
        assert_eq!(report.shared_dependencies.len(), 2);
    }
}
