use crate::classify::DependencyBuckets;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const MAX_DEPTH_CEILING: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolveRequest {
    pub package_name: String,
    pub pinned_version: Option<String>,
    pub target_python: Option<String>,
    pub requested_extras: Vec<String>,
    pub include_development: bool,
    pub max_depth: usize,
}

impl ResolveRequest {
    pub fn new(package_name: &str) -> Self {
        ResolveRequest {
            package_name: package_name.to_string(),
            pinned_version: None,
            target_python: None,
            requested_extras: Vec::new(),
            include_development: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn pinned(mut self, version: &str) -> Self {
        self.pinned_version = Some(version.to_string());
        self
    }

    pub fn python(mut self, version: &str) -> Self {
        self.target_python = Some(version.to_string());
        self
    }

    pub fn extras<I, S>(mut self, extras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_extras = extras.into_iter().map(Into::into).collect();
        self
    }

    pub fn include_development(mut self, include: bool) -> Self {
        self.include_development = include;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeState {
    Resolved,
    /// Present in the graph but its own requirements were not expanded
    /// because the depth bound was reached.
    Truncated,
    FetchFailed { kind: String, message: String },
}

impl NodeState {
    pub fn label(&self) -> &'static str {
        match self {
            NodeState::Resolved => "resolved",
            NodeState::Truncated => "truncated",
            NodeState::FetchFailed { .. } => "fetch_failed",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PackageNode {
    pub name: String,
    pub display_name: String,
    pub version: Option<String>,
    pub requires_python: Option<String>,
    pub declared_requirements: Vec<String>,
    pub depth: usize,
    pub parent: Option<String>,
    /// Child names in declaration order. At the depth bound only packages
    /// already in the graph are linked.
    pub children: Vec<String>,
    /// Active requirement lines whose packages were not expanded; only set on
    /// `Truncated` nodes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unexpanded: Vec<String>,
    /// Specifier text of the active line behind each child edge.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, String>,
    pub buckets: DependencyBuckets,
    #[serde(flatten)]
    pub state: NodeState,
}

impl PackageNode {
    pub fn is_resolved(&self) -> bool {
        self.state == NodeState::Resolved
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub at_depth: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeLink {
    Root,
    Expanded,
    /// Edge back to a package on the current path.
    Cycle,
    /// Edge to a package already placed elsewhere in the tree.
    Shared,
}

#[derive(Clone, Debug, Serialize)]
pub struct DependencyTree {
    pub name: String,
    pub version: Option<String>,
    pub depth: usize,
    pub status: &'static str,
    pub link: TreeLink,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DependencyTree>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResolutionReport {
    pub package_name: String,
    pub version: String,
    pub requires_python: Option<String>,
    pub request: ResolveRequest,
    pub nodes: BTreeMap<String, PackageNode>,
    pub tree: DependencyTree,
    pub circular_dependencies: Vec<DependencyEdge>,
    pub shared_dependencies: Vec<DependencyEdge>,
}

impl ResolutionReport {
    pub fn root(&self) -> Option<&PackageNode> {
        self.nodes.get(&self.package_name)
    }
}
