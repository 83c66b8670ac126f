use crate::error::{Error, Result};
use crate::model::{Identity, Item, NodeId};
use crate::palette::PaletteStore;
use crate::weight::{compare_domains, compare_packages, SizeMode};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Domain { key: String, order_index: usize },
    Package { key: String, item: Item },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub kind: NodeKind,
    /// Effective weight for a package, subtree sum otherwise.
    pub value: f64,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn key(&self) -> &str {
        match &self.kind {
            NodeKind::Root => "",
            NodeKind::Domain { key, .. } | NodeKind::Package { key, .. } => key,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Package { .. })
    }
}

/// Root → domains → packages for one slice, stored in pre-order:
/// the root at index 0, each domain followed by its packages.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    pub root: NodeId,
    pub nodes: Vec<Node>,
}

struct Group<'a> {
    key: &'a str,
    order_index: usize,
    packages: Vec<(&'a Item, f64)>,
}

impl Hierarchy {
    /// Groups `slice` by domain. Domain order indices come from `store`, which
    /// registers domains it has not seen yet.
    pub fn build(
        slice: &[Item],
        slice_index: usize,
        mode: &SizeMode,
        store: &mut PaletteStore,
    ) -> Result<Self> {
        if slice.is_empty() {
            return Err(Error::EmptySlice { index: slice_index });
        }

        let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(slice.len());
        let mut group_of: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<Group<'_>> = Vec::new();
        for item in slice {
            if !seen.insert((item.domain.as_str(), item.package.as_str())) {
                return Err(Error::DuplicateIdentity {
                    domain: item.domain.clone(),
                    package: item.package.clone(),
                });
            }
            let weight = mode.effective_weight(item)?;
            let gi = *group_of.entry(item.domain.as_str()).or_insert_with(|| {
                groups.push(Group {
                    key: item.domain.as_str(),
                    order_index: store.assign(&item.domain).order_index,
                    packages: Vec::new(),
                });
                groups.len() - 1
            });
            groups[gi].packages.push((item, weight));
        }

        groups.sort_by(|a, b| compare_domains((a.order_index, a.key), (b.order_index, b.key)));
        for group in &mut groups {
            group
                .packages
                .sort_by(|(a, _), (b, _)| compare_packages(&a.package, &b.package));
        }

        let root = NodeId(0);
        let mut nodes = Vec::with_capacity(1 + groups.len() + slice.len());
        nodes.push(Node {
            id: root,
            parent: None,
            depth: 0,
            kind: NodeKind::Root,
            value: 0.0,
            children: Vec::with_capacity(groups.len()),
        });

        let mut total = 0.0;
        for group in groups {
            let domain_id = NodeId(nodes.len());
            let sum: f64 = group.packages.iter().map(|(_, w)| w).sum();
            total += sum;
            nodes[root.0].children.push(domain_id);
            nodes.push(Node {
                id: domain_id,
                parent: Some(root),
                depth: 1,
                kind: NodeKind::Domain {
                    key: group.key.to_string(),
                    order_index: group.order_index,
                },
                value: sum,
                children: Vec::with_capacity(group.packages.len()),
            });
            for (item, weight) in group.packages {
                let id = NodeId(nodes.len());
                nodes[domain_id.0].children.push(id);
                nodes.push(Node {
                    id,
                    parent: Some(domain_id),
                    depth: 2,
                    kind: NodeKind::Package {
                        key: item.package.clone(),
                        item: item.clone(),
                    },
                    value: weight,
                    children: Vec::new(),
                });
            }
        }
        nodes[root.0].value = total;

        tracing::debug!(
            slice = slice_index,
            domains = nodes[root.0].children.len(),
            packages = slice.len(),
            total,
            "built hierarchy"
        );
        Ok(Self { root, nodes })
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn root_node(&self) -> &Node {
        self.get(self.root)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.get(id).children.iter().map(move |c| self.get(*c))
    }

    pub fn domains(&self) -> impl Iterator<Item = &Node> + '_ {
        self.children(self.root)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// `(domain, package)` of a package node.
    pub fn identity(&self, id: NodeId) -> Option<Identity> {
        let node = self.get(id);
        match &node.kind {
            NodeKind::Package { key, .. } => {
                let domain = self.get(node.parent?).key();
                Some(Identity::new(domain, key.as_str()))
            }
            _ => None,
        }
    }

    /// Pre-order node ids; parents come before their children.
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for c in self.get(id).children.iter().rev() {
                stack.push(*c);
            }
        }
        out
    }
}
