use super::types::{DependencyEdge, DependencyTree, PackageNode, TreeLink};
use std::collections::{BTreeMap, BTreeSet};

/// Nested view of the flat node map. A child is only expanded below the
/// parent that discovered it; every other edge becomes a reference leaf.
pub(crate) fn project(
    nodes: &BTreeMap<String, PackageNode>,
    root: &PackageNode,
    cycles: &[DependencyEdge],
) -> DependencyTree {
    let cyclic: BTreeSet<(&str, &str)> = cycles
        .iter()
        .map(|edge| (edge.from.as_str(), edge.to.as_str()))
        .collect();

    expand(nodes, root, TreeLink::Root, &cyclic)
}

fn expand(
    nodes: &BTreeMap<String, PackageNode>,
    node: &PackageNode,
    link: TreeLink,
    cyclic: &BTreeSet<(&str, &str)>,
) -> DependencyTree {
    let mut children = Vec::with_capacity(node.children.len());

    for name in &node.children {
        let Some(child) = nodes.get(name) else {
            continue;
        };

        if child.parent.as_deref() == Some(node.name.as_str()) {
            children.push(expand(nodes, child, TreeLink::Expanded, cyclic));
        } else if cyclic.contains(&(node.name.as_str(), name.as_str())) {
            children.push(leaf(child, TreeLink::Cycle));
        } else {
            children.push(leaf(child, TreeLink::Shared));
        }
    }

    DependencyTree {
        name: node.display_name.clone(),
        version: node.version.clone(),
        depth: node.depth,
        status: node.state.label(),
        link,
        children,
    }
}

fn leaf(node: &PackageNode, link: TreeLink) -> DependencyTree {
    DependencyTree {
        name: node.display_name.clone(),
        version: node.version.clone(),
        depth: node.depth,
        status: node.state.label(),
        link,
        children: Vec::new(),
    }
}

impl DependencyTree {
    /// Number of entries in the projection, reference leaves included.
    pub fn entries(&self) -> usize {
        1 + self.children.iter().map(DependencyTree::entries).sum::<usize>()
    }

    /// Renders the tree with box-drawing guides, one package per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.label());
        out.push('\n');

        let count = self.children.len();
        for (idx, child) in self.children.iter().enumerate() {
            child.render_into(&mut out, "", idx + 1 == count);
        }

        out
    }

    fn render_into(&self, out: &mut String, prefix: &str, last: bool) {
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&self.label());
        out.push('\n');

        let nested = format!("{}{}", prefix, if last { "    " } else { "│   " });
        let count = self.children.len();
        for (idx, child) in self.children.iter().enumerate() {
            child.render_into(out, &nested, idx + 1 == count);
        }
    }

    fn label(&self) -> String {
        let mut label = match &self.version {
            Some(version) => format!("{}@{}", self.name, version),
            None => self.name.clone(),
        };

        match self.link {
            TreeLink::Cycle => label.push_str(" (cycle)"),
            TreeLink::Shared => label.push_str(" (shared)"),
            TreeLink::Root | TreeLink::Expanded => {}
        }

        match self.status {
            "truncated" => label.push_str(" [truncated]"),
            "fetch_failed" => label.push_str(" [fetch failed]"),
            _ => {}
        }

        label
    }
}
