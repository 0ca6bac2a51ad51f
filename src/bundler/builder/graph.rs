//! Step dependency graph.
//!
//! Each target expands into a DAG of [`Step`]s. Edges come in two kinds:
//! [`Dependency::Requires`] means the downstream step is skipped unless the
//! upstream one succeeded; [`Dependency::After`] only orders them.

use super::target::Target;
use crate::bundler::{Arch, Error, Result};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// One unit of pipeline work.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Step {
    Clean,
    CleanEnvironments,
    Provision(Arch),
    Freeze(Arch),
    Inspect,
    Sign(Arch),
    CheckSignature(Arch),
    Package(Arch),
    WriteManifest,
    Notarize(Arch),
    Staple(Arch),
    Launch(Arch),
}

impl Step {
    /// Architecture this step acts on, if it is architecture-specific.
    pub fn arch(&self) -> Option<Arch> {
        match self {
            Step::Provision(a)
            | Step::Freeze(a)
            | Step::Sign(a)
            | Step::CheckSignature(a)
            | Step::Package(a)
            | Step::Notarize(a)
            | Step::Staple(a)
            | Step::Launch(a) => Some(*a),
            Step::Clean | Step::CleanEnvironments | Step::Inspect | Step::WriteManifest => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Clean => "clean",
            Step::CleanEnvironments => "clean-environments",
            Step::Provision(_) => "provision",
            Step::Freeze(_) => "freeze",
            Step::Inspect => "inspect",
            Step::Sign(_) => "sign",
            Step::CheckSignature(_) => "check-signature",
            Step::Package(_) => "package",
            Step::WriteManifest => "write-manifest",
            Step::Notarize(_) => "notarize",
            Step::Staple(_) => "staple",
            Step::Launch(_) => "launch",
        };
        match self.arch() {
            Some(arch) => write!(f, "{name} ({arch})"),
            None => f.write_str(name),
        }
    }
}

/// Edge kind between two steps.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dependency {
    /// Downstream runs only if upstream succeeded.
    Requires,
    /// Downstream runs after upstream, whatever its outcome.
    After,
}

/// Steps of one target and the edges between them.
#[derive(Debug, Default)]
pub struct PipelineGraph {
    graph: DiGraph<Step, Dependency>,
    nodes: HashMap<Step, NodeIndex>,
}

impl PipelineGraph {
    /// Expand `target` into its step graph.
    pub fn for_target(target: Target) -> Self {
        let mut g = PipelineGraph::default();
        match target {
            Target::Provision(arch) => {
                g.add(Step::Provision(arch));
            }
            Target::Build(arch) => g.add_build(arch, None),
            Target::BuildAll => g.add_build_all(),
            Target::PackageForDistribution => {
                g.add_build_all();
                for arch in Arch::ALL {
                    g.requires(Step::Freeze(arch), Step::Sign(arch));
                    g.after(Step::Sign(arch), Step::CheckSignature(arch));
                    g.requires(Step::Sign(arch), Step::Package(arch));
                    g.after(Step::CheckSignature(arch), Step::Package(arch));
                    g.after(Step::Package(arch), Step::Inspect);
                }
                g.after(Step::Inspect, Step::WriteManifest);
            }
            Target::Notarize => {
                for arch in Arch::ALL {
                    g.requires(Step::Notarize(arch), Step::Staple(arch));
                }
            }
            Target::Verify => {
                for arch in Arch::ALL {
                    g.after(Step::CheckSignature(arch), Step::Inspect);
                }
            }
            Target::Clean => {
                g.add(Step::Clean);
            }
            Target::CleanEnvironments => {
                g.add(Step::CleanEnvironments);
            }
            Target::Launch(arch) => {
                g.add(Step::Launch(arch));
            }
        }
        g
    }

    fn add_build(&mut self, arch: Arch, after: Option<Step>) {
        if let Some(first) = after {
            self.after(first, Step::Provision(arch));
        }
        self.requires(Step::Provision(arch), Step::Freeze(arch));
    }

    fn add_build_all(&mut self) {
        self.add(Step::Clean);
        for arch in Arch::ALL {
            self.add_build(arch, Some(Step::Clean));
        }
        for arch in Arch::ALL {
            self.after(Step::Freeze(arch), Step::Inspect);
        }
    }

    /// Insert a step once; later calls return the existing node.
    fn add(&mut self, step: Step) -> NodeIndex {
        if let Some(index) = self.nodes.get(&step) {
            return *index;
        }
        let index = self.graph.add_node(step);
        self.nodes.insert(step, index);
        index
    }

    fn edge(&mut self, from: Step, to: Step, kind: Dependency) {
        let a = self.add(from);
        let b = self.add(to);
        self.graph.update_edge(a, b, kind);
    }

    fn requires(&mut self, upstream: Step, downstream: Step) {
        self.edge(upstream, downstream, Dependency::Requires);
    }

    fn after(&mut self, upstream: Step, downstream: Step) {
        self.edge(upstream, downstream, Dependency::After);
    }

    /// Every step in the graph, in insertion order.
    pub fn steps(&self) -> Vec<Step> {
        self.graph.node_weights().copied().collect()
    }

    pub fn contains(&self, step: Step) -> bool {
        self.nodes.contains_key(&step)
    }

    /// Steps `step` depends on through a [`Dependency::Requires`] edge.
    pub fn required_by(&self, step: Step) -> Vec<Step> {
        let Some(index) = self.nodes.get(&step) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(*index, Direction::Incoming)
            .filter(|e| *e.weight() == Dependency::Requires)
            .map(|e| self.graph[e.source()])
            .collect()
    }

    /// Execution order: Kahn's algorithm, ties broken by insertion order.
    ///
    /// Insertion is architecture-major, so arm64 work precedes x86_64 work
    /// whenever the edges allow it.
    pub fn execution_order(&self) -> Result<Vec<Step>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.edges_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(next) = ready.pop_first() {
            let node = NodeIndex::new(next);
            order.push(self.graph[node]);
            for neighbor in self.graph.neighbors_directed(node, Direction::Outgoing) {
                let degree = &mut in_degree[neighbor.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(neighbor.index());
                }
            }
        }

        if order.len() != self.graph.node_count() {
            return Err(Error::GenericError(
                "step graph contains a cycle".to_string(),
            ));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Arch::{Arm64, X86_64};

    fn order(target: Target) -> Vec<Step> {
        PipelineGraph::for_target(target).execution_order().unwrap()
    }

    #[test]
    fn build_is_provision_then_freeze() {
        assert_eq!(
            order(Target::Build(X86_64)),
            vec![Step::Provision(X86_64), Step::Freeze(X86_64)]
        );
    }

    #[test]
    fn build_all_is_architecture_major() {
        assert_eq!(
            order(Target::BuildAll),
            vec![
                Step::Clean,
                Step::Provision(Arm64),
                Step::Freeze(Arm64),
                Step::Provision(X86_64),
                Step::Freeze(X86_64),
                Step::Inspect,
            ]
        );
    }

    #[test]
    fn package_for_distribution_orders_every_stage() {
        assert_eq!(
            order(Target::PackageForDistribution),
            vec![
                Step::Clean,
                Step::Provision(Arm64),
                Step::Freeze(Arm64),
                Step::Provision(X86_64),
                Step::Freeze(X86_64),
                Step::Sign(Arm64),
                Step::CheckSignature(Arm64),
                Step::Package(Arm64),
                Step::Sign(X86_64),
                Step::CheckSignature(X86_64),
                Step::Package(X86_64),
                Step::Inspect,
                Step::WriteManifest,
            ]
        );
    }

    #[test]
    fn staple_requires_notarize_of_same_arch() {
        let graph = PipelineGraph::for_target(Target::Notarize);
        assert_eq!(graph.required_by(Step::Staple(Arm64)), vec![Step::Notarize(Arm64)]);
        assert_eq!(graph.required_by(Step::Staple(X86_64)), vec![Step::Notarize(X86_64)]);
        assert_eq!(
            graph.execution_order().unwrap(),
            vec![
                Step::Notarize(Arm64),
                Step::Staple(Arm64),
                Step::Notarize(X86_64),
                Step::Staple(X86_64),
            ]
        );
    }

    #[test]
    fn inspect_only_orders_after_freeze() {
        let graph = PipelineGraph::for_target(Target::BuildAll);
        assert!(graph.required_by(Step::Inspect).is_empty());
        assert!(graph.required_by(Step::Provision(Arm64)).is_empty());
        assert_eq!(graph.required_by(Step::Freeze(Arm64)), vec![Step::Provision(Arm64)]);
    }

    #[test]
    fn verify_never_builds() {
        let graph = PipelineGraph::for_target(Target::Verify);
        assert!(!graph.contains(Step::Freeze(Arm64)));
        assert!(!graph.contains(Step::Sign(Arm64)));
        assert_eq!(graph.steps().len(), 3);
    }

    #[test]
    fn cycles_are_reported() {
        let mut graph = PipelineGraph::default();
        graph.after(Step::Inspect, Step::WriteManifest);
        graph.after(Step::WriteManifest, Step::Inspect);
        assert!(graph.execution_order().is_err());
    }
}
