use std::collections::{BTreeSet, HashMap};

use super::intrinsic::{Intrinsic, SubPart, find_intrinsics, parse_sub};
use super::template::Template;

/// How one resource came to depend on another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Ref,
    GetAtt,
    Sub,
    DependsOn,
}

/// A directed edge `from` → `to`: `from` uses `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub kind: DependencyKind,
    /// Property path of the intrinsic on `from`; empty for `DependsOn`
    pub property_path: String,
}

/// Resource-to-resource dependencies of a template
#[derive(Debug, Default)]
pub struct DependencyGraph {
    pub edges: Vec<DependencyEdge>,
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
}

impl DependencyGraph {
    /// Build the graph from every intrinsic and `DependsOn` in the template
    ///
    /// Targets that are not resources (parameters, pseudo parameters) are
    /// ignored.
    pub fn build(template: &Template) -> Self {
        let mut graph = DependencyGraph::default();

        for (logical_id, resource) in &template.resources {
            for (path, node) in find_intrinsics(&resource.properties) {
                let mut targets = Vec::new();
                collect_targets(node, &mut targets);

                for (target, kind) in targets {
                    if template.is_resource(&target) {
                        graph.add(logical_id, &target, kind, &path);
                    }
                }
            }

            for target in &resource.depends_on {
                if template.is_resource(target) {
                    graph.add(logical_id, target, DependencyKind::DependsOn, "");
                }
            }
        }

        graph
    }

    fn add(&mut self, from: &str, to: &str, kind: DependencyKind, property_path: &str) {
        let index = self.edges.len();
        self.edges.push(DependencyEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            property_path: property_path.to_string(),
        });
        self.outgoing.entry(from.to_string()).or_default().push(index);
        self.incoming.entry(to.to_string()).or_default().push(index);
    }

    /// Edges leaving a resource
    pub fn dependencies_of(&self, logical_id: &str) -> Vec<&DependencyEdge> {
        self.edges_at(&self.outgoing, logical_id)
    }

    /// Edges arriving at a resource
    pub fn dependents_of(&self, logical_id: &str) -> Vec<&DependencyEdge> {
        self.edges_at(&self.incoming, logical_id)
    }

    /// Distinct resources `logical_id` points at through edges of `kind`
    pub fn related(&self, logical_id: &str, kind: DependencyKind) -> Vec<String> {
        let targets: BTreeSet<String> = self
            .dependencies_of(logical_id)
            .into_iter()
            .filter(|edge| edge.kind == kind)
            .map(|edge| edge.to.clone())
            .collect();

        targets.into_iter().collect()
    }

    fn edges_at(&self, index: &HashMap<String, Vec<usize>>, logical_id: &str) -> Vec<&DependencyEdge> {
        index
            .get(logical_id)
            .map(|edges| edges.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }
}

fn collect_targets(node: &serde_json::Value, targets: &mut Vec<(String, DependencyKind)>) {
    match Intrinsic::parse(node) {
        Some(Intrinsic::Ref(target)) => targets.push((target, DependencyKind::Ref)),
        Some(Intrinsic::GetAtt { resource, .. }) => {
            targets.push((resource, DependencyKind::GetAtt))
        }
        Some(Intrinsic::Sub {
            template,
            variables,
        }) => {
            for part in parse_sub(&template) {
                if let SubPart::Placeholder(name) = part {
                    if variables.contains_key(&name) {
                        continue;
                    }
                    let resource = name.split('.').next().unwrap_or_default().to_string();
                    targets.push((resource, DependencyKind::Sub));
                }
            }
            for value in variables.values() {
                collect_targets(value, targets);
            }
        }
        _ => match node {
            serde_json::Value::Object(map) => {
                for value in map.values() {
                    collect_targets(value, targets);
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    collect_targets(item, targets);
                }
            }
            _ => {}
        },
    }
}
