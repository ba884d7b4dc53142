use super::types::{DependencyEdge, PackageNode};
use std::collections::{BTreeMap, BTreeSet};

/// Splits revisit edges into `(circular, shared)`.
///
/// A revisit `from -> to` closes a loop when `from` can be reached again by
/// following recorded edges out of `to`. That covers a child pointing back at
/// one of its discovery ancestors as well as two packages at the same depth
/// requiring each other. Every other revisit reaches a package shared with
/// another branch.
pub(crate) fn classify_revisits(
    nodes: &BTreeMap<String, PackageNode>,
    revisits: Vec<DependencyEdge>,
) -> (Vec<DependencyEdge>, Vec<DependencyEdge>) {
    revisits
        .into_iter()
        .partition(|edge| reaches(nodes, &edge.to, &edge.from))
}

fn reaches<'a>(nodes: &'a BTreeMap<String, PackageNode>, start: &'a str, target: &str) -> bool {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut stack = vec![start];

    while let Some(name) = stack.pop() {
        if name == target {
            return true;
        }
        if !seen.insert(name) {
            continue;
        }
        if let Some(node) = nodes.get(name) {
            stack.extend(node.children.iter().map(String::as_str));
        }
    }

    false
}
