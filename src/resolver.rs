//! Dependency validation and load-order resolution over a full plugin set.
//!
//! Resolution runs in three passes:
//!
//! 1. Index plugins by id. Duplicate ids end the run immediately.
//! 2. Check every dependency for presence and version. Problems are
//!    collected, not raised, so one run reports all of them.
//! 3. Topologically sort the `BEFORE`/`AFTER` edges between present plugins,
//!    breaking ties by ascending id. Cycles are reported by membership.
//!
//! A run with any failure exposes no load order.

use std::cmp::Reverse;
use std::collections::{btree_set, BTreeMap, BTreeSet, BinaryHeap};

use thiserror::Error;

use crate::metadata::{DeclaredVersion, Dependency, LoadOrder, PluginMetadata};
use crate::range::VersionRange;

/// Configuration for the [`Resolver`].
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Fail version ranges against targets whose version is missing or did
    /// not parse, instead of accepting them with a warning.
    pub strict_unparsed_versions: bool,
}

impl ResolverConfig {
    /// Create a new resolver configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat unparsed target versions as mismatches.
    pub fn with_strict_unparsed_versions(mut self, strict: bool) -> Self {
        self.strict_unparsed_versions = strict;
        self
    }
}

/// A problem found during resolution.
///
/// Whether a problem fails the run depends on where it is reported: the
/// `problems` of a [`ResolutionResult::Failure`] or the `warnings` of
/// either variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ResolutionProblem {
    /// Two or more plugins share an id.
    #[error("duplicate plugin id '{id}' declared {count} times")]
    DuplicatePluginId {
        /// The shared id.
        id: String,
        /// How many plugins declared it.
        count: usize,
    },

    /// A required dependency target is absent from the set.
    #[error("plugin '{plugin}' requires '{dependency}', which is not present")]
    UnmetDependency {
        /// Declaring plugin.
        plugin: String,
        /// Missing target.
        dependency: String,
    },

    /// A present target's version lies outside the declared range.
    #[error("plugin '{plugin}' requires '{dependency}' {required}, found {actual}")]
    VersionMismatch {
        /// Declaring plugin.
        plugin: String,
        /// Target plugin.
        dependency: String,
        /// Declared range.
        required: VersionRange,
        /// Target's version as written.
        actual: String,
    },

    /// A range could not be checked because the target's version is
    /// missing or unparsed; the dependency was accepted.
    #[error(
        "plugin '{plugin}' requires '{dependency}' {required}, but its version {} cannot be checked",
        .actual.as_deref().unwrap_or("<none>")
    )]
    UncheckedVersion {
        /// Declaring plugin.
        plugin: String,
        /// Target plugin.
        dependency: String,
        /// Declared range.
        required: VersionRange,
        /// Target's version text, if any.
        actual: Option<String>,
    },

    /// Plugins whose ordering constraints form a cycle.
    #[error("dependency cycle: {}", .members.join(" -> "))]
    DependencyCycle {
        /// Cycle members, in walk order when the cycle is a simple ring.
        members: Vec<String>,
    },
}

/// Outcome of one resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "lowercase"))]
pub enum ResolutionResult {
    /// Every required constraint holds.
    Success {
        /// Plugin ids in initialization order.
        order: Vec<String>,
        /// Non-blocking diagnostics.
        warnings: Vec<ResolutionProblem>,
    },
    /// At least one constraint failed; no plugin may be initialized.
    Failure {
        /// Every blocking problem found.
        problems: Vec<ResolutionProblem>,
        /// Non-blocking diagnostics.
        warnings: Vec<ResolutionProblem>,
    },
}

impl ResolutionResult {
    /// Returns true if resolution succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The load order, on success.
    pub fn order(&self) -> Option<&[String]> {
        match self {
            Self::Success { order, .. } => Some(order),
            Self::Failure { .. } => None,
        }
    }

    /// Blocking problems; empty on success.
    pub fn problems(&self) -> &[ResolutionProblem] {
        match self {
            Self::Success { .. } => &[],
            Self::Failure { problems, .. } => problems,
        }
    }

    /// Non-blocking diagnostics.
    pub fn warnings(&self) -> &[ResolutionProblem] {
        match self {
            Self::Success { warnings, .. } | Self::Failure { warnings, .. } => warnings,
        }
    }
}

/// Accumulates problems across one run.
#[derive(Debug, Default)]
struct Problems {
    failures: Vec<ResolutionProblem>,
    warnings: Vec<ResolutionProblem>,
}

impl Problems {
    fn fail(&mut self, problem: ResolutionProblem) {
        tracing::debug!("Resolution problem: {}", problem);
        self.failures.push(problem);
    }

    fn warn(&mut self, problem: ResolutionProblem) {
        tracing::warn!("{}", problem);
        self.warnings.push(problem);
    }

    fn report(&mut self, dep: &Dependency, problem: ResolutionProblem) {
        if dep.is_optional() {
            self.warn(problem);
        } else {
            self.fail(problem);
        }
    }
}

/// Resolves a plugin set into a load order.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    /// Create a new resolver.
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Get the resolver configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the complete plugin set.
    ///
    /// The verdict and the order do not depend on the order of `plugins`.
    pub fn resolve(&self, plugins: &[PluginMetadata]) -> ResolutionResult {
        tracing::debug!("Resolving {} plugins", plugins.len());

        let index = match index_plugins(plugins) {
            Ok(index) => index,
            Err(duplicates) => {
                return ResolutionResult::Failure {
                    problems: duplicates,
                    warnings: Vec::new(),
                }
            }
        };

        let mut problems = Problems::default();
        for plugin in index.values() {
            self.check_dependencies(plugin, &index, &mut problems);
        }

        let graph = LoadGraph::build(&index);
        let order = match graph.sort() {
            Ok(order) => Some(order),
            Err(cycles) => {
                for members in cycles {
                    problems.fail(ResolutionProblem::DependencyCycle { members });
                }
                None
            }
        };

        match order {
            Some(order) if problems.failures.is_empty() => {
                tracing::debug!("Resolved load order: {}", order.join(", "));
                ResolutionResult::Success {
                    order,
                    warnings: problems.warnings,
                }
            }
            _ => {
                tracing::debug!(
                    "Resolution failed with {} problems",
                    problems.failures.len()
                );
                ResolutionResult::Failure {
                    problems: problems.failures,
                    warnings: problems.warnings,
                }
            }
        }
    }

    fn check_dependencies(
        &self,
        plugin: &PluginMetadata,
        index: &BTreeMap<&str, &PluginMetadata>,
        problems: &mut Problems,
    ) {
        for dep in plugin.dependencies() {
            let Some(target) = index.get(dep.id()) else {
                if dep.is_optional() {
                    tracing::trace!("Optional dependency {} of {} is absent", dep.id(), plugin.id());
                } else {
                    problems.fail(ResolutionProblem::UnmetDependency {
                        plugin: plugin.id().to_string(),
                        dependency: dep.id().to_string(),
                    });
                }
                continue;
            };

            let Some(range) = dep.version_range() else {
                continue;
            };

            match target.version() {
                Some(DeclaredVersion::Parsed { version, text }) => {
                    if !range.contains(version) {
                        problems.report(
                            dep,
                            ResolutionProblem::VersionMismatch {
                                plugin: plugin.id().to_string(),
                                dependency: dep.id().to_string(),
                                required: range.clone(),
                                actual: text.clone(),
                            },
                        );
                    }
                }
                unchecked => {
                    let actual = unchecked.map(|v| v.as_str().to_string());
                    if self.config.strict_unparsed_versions {
                        problems.report(
                            dep,
                            ResolutionProblem::VersionMismatch {
                                plugin: plugin.id().to_string(),
                                dependency: dep.id().to_string(),
                                required: range.clone(),
                                actual: actual.unwrap_or_else(|| "<none>".to_string()),
                            },
                        );
                    } else {
                        problems.warn(ResolutionProblem::UncheckedVersion {
                            plugin: plugin.id().to_string(),
                            dependency: dep.id().to_string(),
                            required: range.clone(),
                            actual,
                        });
                    }
                }
            }
        }
    }
}

/// Resolve `plugins` with the default configuration.
pub fn resolve(plugins: &[PluginMetadata]) -> ResolutionResult {
    Resolver::default().resolve(plugins)
}

/// Index plugins by id, or report every duplicated id.
fn index_plugins(
    plugins: &[PluginMetadata],
) -> Result<BTreeMap<&str, &PluginMetadata>, Vec<ResolutionProblem>> {
    let mut index = BTreeMap::new();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for plugin in plugins {
        *counts.entry(plugin.id()).or_default() += 1;
        index.entry(plugin.id()).or_insert(plugin);
    }

    let duplicates: Vec<ResolutionProblem> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, count)| ResolutionProblem::DuplicatePluginId {
            id: id.to_string(),
            count,
        })
        .collect();

    if duplicates.is_empty() {
        Ok(index)
    } else {
        for problem in &duplicates {
            tracing::debug!("Resolution aborted: {}", problem);
        }
        Err(duplicates)
    }
}

/// Ordering constraints between present plugins.
///
/// An edge `a -> b` means `a` must initialize before `b`.
struct LoadGraph<'a> {
    successors: BTreeMap<&'a str, BTreeSet<&'a str>>,
}

impl<'a> LoadGraph<'a> {
    fn build(index: &BTreeMap<&'a str, &'a PluginMetadata>) -> Self {
        let mut successors: BTreeMap<&'a str, BTreeSet<&'a str>> =
            index.keys().map(|id| (*id, BTreeSet::new())).collect();

        for (&id, plugin) in index {
            for dep in plugin.dependencies() {
                // absent targets impose no ordering
                let Some((&target, _)) = index.get_key_value(dep.id()) else {
                    continue;
                };
                let (first, then) = match dep.load_order() {
                    LoadOrder::After => (target, id),
                    LoadOrder::Before => (id, target),
                    LoadOrder::Unordered => continue,
                };
                tracing::trace!("Load edge {} -> {}", first, then);
                successors.entry(first).or_default().insert(then);
            }
        }

        Self { successors }
    }

    /// Kahn's algorithm with a min-heap for ascending-id tie-breaks.
    fn sort(&self) -> Result<Vec<String>, Vec<Vec<String>>> {
        let mut in_degree: BTreeMap<&str, usize> =
            self.successors.keys().map(|id| (*id, 0)).collect();
        for targets in self.successors.values() {
            for target in targets {
                *in_degree.entry(*target).or_default() += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<&str>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| Reverse(*id))
            .collect();

        let mut order = Vec::with_capacity(self.successors.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id.to_string());
            for target in &self.successors[id] {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(*target));
                    }
                }
            }
        }

        if order.len() == self.successors.len() {
            return Ok(order);
        }

        let placed: BTreeSet<&str> = order.iter().map(String::as_str).collect();
        let blocked: BTreeSet<&'a str> = self
            .successors
            .keys()
            .copied()
            .filter(|id| !placed.contains(id))
            .collect();
        Err(self.cycles(&blocked))
    }

    /// Cycles among the nodes Kahn's algorithm could not place.
    fn cycles(&self, blocked: &BTreeSet<&'a str>) -> Vec<Vec<String>> {
        let mut tarjan = Tarjan::default();
        for &node in blocked {
            if !tarjan.indices.contains_key(node) {
                tarjan.visit(self, blocked, node);
            }
        }

        let mut cycles: Vec<Vec<String>> = tarjan
            .components
            .into_iter()
            .filter(|component| {
                component.len() > 1 || self.successors[component[0]].contains(component[0])
            })
            .map(|component| self.cycle_members(component.into_iter().collect()))
            .collect();
        cycles.sort();
        cycles
    }

    /// Walk order for a simple ring starting at its smallest id; sorted
    /// membership for anything more tangled.
    fn cycle_members(&self, members: BTreeSet<&'a str>) -> Vec<String> {
        let within = |id: &str| -> Vec<&'a str> {
            self.successors[id]
                .iter()
                .copied()
                .filter(|s| members.contains(s))
                .collect()
        };

        let is_ring = members.iter().all(|m| within(m).len() == 1);
        let Some(&start) = members.iter().next() else {
            return Vec::new();
        };
        if !is_ring {
            return members.iter().map(|m| m.to_string()).collect();
        }

        let mut walk = vec![start.to_string()];
        let mut current = start;
        loop {
            let next = within(current)[0];
            if next == start {
                break;
            }
            walk.push(next.to_string());
            current = next;
        }
        walk
    }
}

/// Tarjan's strongly connected components, restricted to a node subset.
#[derive(Default)]
struct Tarjan<'a> {
    next_index: usize,
    indices: BTreeMap<&'a str, usize>,
    lowlinks: BTreeMap<&'a str, usize>,
    stack: Vec<&'a str>,
    on_stack: BTreeSet<&'a str>,
    components: Vec<Vec<&'a str>>,
}

impl<'a> Tarjan<'a> {
    /// Depth-first walk from `root` with an explicit stack of successor
    /// iterators, so long chains cannot exhaust the thread stack.
    fn visit(&mut self, graph: &LoadGraph<'a>, nodes: &BTreeSet<&'a str>, root: &'a str) {
        let mut work: Vec<(&'a str, btree_set::Iter<'_, &'a str>)> = Vec::new();
        self.open(root);
        work.push((root, graph.successors[root].iter()));

        while let Some((node, successors)) = work.last_mut() {
            let node = *node;
            match successors.next() {
                Some(&next) if !nodes.contains(next) => {}
                Some(&next) => {
                    if !self.indices.contains_key(next) {
                        self.open(next);
                        work.push((next, graph.successors[next].iter()));
                    } else if self.on_stack.contains(next) {
                        let low = self.lowlinks[node].min(self.indices[next]);
                        self.lowlinks.insert(node, low);
                    }
                }
                None => {
                    work.pop();
                    if let Some((parent, _)) = work.last() {
                        let parent = *parent;
                        let low = self.lowlinks[parent].min(self.lowlinks[node]);
                        self.lowlinks.insert(parent, low);
                    }
                    if self.lowlinks[node] == self.indices[node] {
                        self.close(node);
                    }
                }
            }
        }
    }

    fn open(&mut self, node: &'a str) {
        self.indices.insert(node, self.next_index);
        self.lowlinks.insert(node, self.next_index);
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);
    }

    /// Pop the component rooted at `node`.
    fn close(&mut self, node: &'a str) {
        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack.remove(member);
            component.push(member);
            if member == node {
                break;
            }
        }
        self.components.push(component);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{PluginMetadataBuilder, SourceFormat};

    fn plugin(id: &str, version: &str) -> PluginMetadataBuilder {
        PluginMetadata::builder(id, SourceFormat::Structured).version(version)
    }

    fn dep(id: &str) -> Dependency {
        Dependency::new(id).unwrap()
    }

    fn ranged(id: &str, range: &str) -> Dependency {
        dep(id).with_range(VersionRange::parse(range).unwrap())
    }

    fn order(result: &ResolutionResult) -> Vec<&str> {
        result
            .order()
            .expect("resolution should succeed")
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_empty_set() {
        let result = resolve(&[]);
        assert!(result.is_success());
        assert!(order(&result).is_empty());
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let plugins = vec![
            plugin("gamma", "1").build().unwrap(),
            plugin("alpha", "1").build().unwrap(),
            plugin("beta", "1").build().unwrap(),
        ];
        assert_eq!(order(&resolve(&plugins)), ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_after_and_before_edges() {
        let plugins = vec![
            // alpha starts after zeta
            plugin("alpha", "1")
                .dependency(dep("zeta").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
            // omega starts before beta
            plugin("omega", "1")
                .dependency(dep("beta").with_load_order(LoadOrder::Before))
                .build()
                .unwrap(),
            plugin("beta", "1").build().unwrap(),
            plugin("zeta", "1").build().unwrap(),
        ];
        assert_eq!(order(&resolve(&plugins)), ["omega", "beta", "zeta", "alpha"]);
    }

    #[test]
    fn test_unordered_adds_no_edge() {
        let plugins = vec![
            plugin("alpha", "1").dependency(dep("beta")).build().unwrap(),
            plugin("beta", "1").build().unwrap(),
        ];
        assert_eq!(order(&resolve(&plugins)), ["alpha", "beta"]);
    }

    #[test]
    fn test_range_satisfied() {
        let plugins = vec![
            plugin("alpha", "1.0.0")
                .dependency(ranged("beta", "[1.0.0,2.0.0)").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
            plugin("beta", "1.5.0").build().unwrap(),
        ];
        let result = resolve(&plugins);
        assert_eq!(order(&result), ["beta", "alpha"]);
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_required_version_mismatch_fails() {
        let plugins = vec![
            plugin("alpha", "1.0.0")
                .dependency(ranged("beta", "[1.0.0,2.0.0)").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
            plugin("beta", "2.0.0").build().unwrap(),
        ];
        let result = resolve(&plugins);
        assert!(result.order().is_none());
        assert_eq!(
            result.problems(),
            [ResolutionProblem::VersionMismatch {
                plugin: "alpha".into(),
                dependency: "beta".into(),
                required: VersionRange::parse("[1.0.0,2.0.0)").unwrap(),
                actual: "2.0.0".into(),
            }]
        );
        assert_eq!(
            result.problems()[0].to_string(),
            "plugin 'alpha' requires 'beta' [1.0.0,2.0.0), found 2.0.0"
        );
    }

    #[test]
    fn test_optional_version_mismatch_warns() {
        let plugins = vec![
            plugin("alpha", "1")
                .dependency(ranged("beta", "[2.0,)").optional())
                .build()
                .unwrap(),
            plugin("beta", "1.0").build().unwrap(),
        ];
        let result = resolve(&plugins);
        assert!(result.is_success());
        assert!(matches!(
            result.warnings(),
            [ResolutionProblem::VersionMismatch { .. }]
        ));
    }

    #[test]
    fn test_unmet_dependencies() {
        let plugins = vec![plugin("alpha", "1")
            .dependency(dep("missing"))
            .dependency(dep("maybe").optional().with_load_order(LoadOrder::Before))
            .build()
            .unwrap()];
        let result = resolve(&plugins);
        assert_eq!(
            result.problems(),
            [ResolutionProblem::UnmetDependency {
                plugin: "alpha".into(),
                dependency: "missing".into(),
            }]
        );
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_duplicate_ids_fail_fast() {
        let plugins = vec![
            plugin("alpha", "1").dependency(dep("missing")).build().unwrap(),
            plugin("beta", "1").build().unwrap(),
            plugin("alpha", "2").build().unwrap(),
            plugin("beta", "2").build().unwrap(),
            plugin("alpha", "3").build().unwrap(),
        ];
        let result = resolve(&plugins);
        assert_eq!(
            result.problems(),
            [
                ResolutionProblem::DuplicatePluginId { id: "alpha".into(), count: 3 },
                ResolutionProblem::DuplicatePluginId { id: "beta".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_two_plugin_cycle() {
        let plugins = vec![
            plugin("alpha", "1")
                .dependency(dep("beta").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
            plugin("beta", "1")
                .dependency(dep("alpha").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
        ];
        let result = resolve(&plugins);
        assert!(!result.is_success());
        assert_eq!(
            result.problems(),
            [ResolutionProblem::DependencyCycle {
                members: vec!["alpha".into(), "beta".into()],
            }]
        );
    }

    #[test]
    fn test_ring_is_reported_in_walk_order() {
        // c before a, a before b, b before c
        let plugins = vec![
            plugin("a", "1")
                .dependency(dep("c").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
            plugin("b", "1")
                .dependency(dep("a").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
            plugin("c", "1")
                .dependency(dep("b").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
            // downstream of the cycle, not part of it
            plugin("d", "1")
                .dependency(dep("c").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
        ];
        let result = resolve(&plugins);
        assert_eq!(
            result.problems(),
            [ResolutionProblem::DependencyCycle {
                members: vec!["a".into(), "b".into(), "c".into()],
            }]
        );
    }

    #[test]
    fn test_self_cycle_and_other_problems_accumulate() {
        let plugins = vec![
            plugin("alpha", "1")
                .dependency(dep("alpha").with_load_order(LoadOrder::After))
                .dependency(dep("ghost"))
                .build()
                .unwrap(),
            plugin("beta", "1")
                .dependency(dep("gamma").optional().with_load_order(LoadOrder::Before))
                .build()
                .unwrap(),
            plugin("gamma", "1")
                .dependency(dep("beta").optional().with_load_order(LoadOrder::Before))
                .build()
                .unwrap(),
        ];
        let result = resolve(&plugins);
        assert_eq!(result.problems().len(), 3);
        assert!(matches!(
            result.problems()[0],
            ResolutionProblem::UnmetDependency { .. }
        ));
        assert_eq!(
            result.problems()[1],
            ResolutionProblem::DependencyCycle { members: vec!["alpha".into()] }
        );
        assert_eq!(
            result.problems()[2],
            ResolutionProblem::DependencyCycle {
                members: vec!["beta".into(), "gamma".into()],
            }
        );
    }

    #[test]
    fn test_long_ring_reports_without_overflow() {
        const RING: usize = 10_000;
        let id = |i: usize| format!("p{:05}", i % RING);
        let plugins: Vec<PluginMetadata> = (0..RING)
            .map(|i| {
                plugin(&id(i), "1")
                    .dependency(dep(&id(i + 1)).with_load_order(LoadOrder::Before))
                    .build()
                    .unwrap()
            })
            .collect();

        let result = resolve(&plugins);
        assert!(!result.is_success());
        match result.problems() {
            [ResolutionProblem::DependencyCycle { members }] => {
                assert_eq!(members.len(), RING);
                assert_eq!(members[0], "p00000");
                assert_eq!(members[1], "p00001");
                assert_eq!(members[RING - 1], id(RING - 1));
            }
            other => panic!("unexpected problems: {} reported", other.len()),
        }
    }

    #[test]
    fn test_long_chain_below_cycle() {
        const CHAIN: usize = 10_000;
        let id = |i: usize| format!("c{:05}", i);
        // c00000 and c00001 form a cycle; every later link starts after its predecessor
        let mut plugins = vec![
            plugin(&id(0), "1")
                .dependency(dep(&id(1)).with_load_order(LoadOrder::Before))
                .build()
                .unwrap(),
            plugin(&id(1), "1")
                .dependency(dep(&id(0)).with_load_order(LoadOrder::Before))
                .build()
                .unwrap(),
        ];
        for i in 2..CHAIN {
            plugins.push(
                plugin(&id(i), "1")
                    .dependency(dep(&id(i - 1)).with_load_order(LoadOrder::After))
                    .build()
                    .unwrap(),
            );
        }

        let result = resolve(&plugins);
        assert_eq!(
            result.problems(),
            [ResolutionProblem::DependencyCycle {
                members: vec![id(0), id(1)],
            }]
        );
    }

    #[test]
    fn test_tangled_component_reports_sorted_members() {
        let plugins = vec![
            plugin("a", "1")
                .dependency(dep("b").with_load_order(LoadOrder::Before))
                .dependency(dep("c").with_load_order(LoadOrder::Before))
                .build()
                .unwrap(),
            plugin("b", "1")
                .dependency(dep("a").with_load_order(LoadOrder::Before))
                .build()
                .unwrap(),
            plugin("c", "1")
                .dependency(dep("a").with_load_order(LoadOrder::Before))
                .build()
                .unwrap(),
        ];
        let result = resolve(&plugins);
        assert_eq!(
            result.problems(),
            [ResolutionProblem::DependencyCycle {
                members: vec!["a".into(), "b".into(), "c".into()],
            }]
        );
    }

    #[test]
    fn test_unparsed_target_version() {
        let plugins = vec![
            plugin("alpha", "1")
                .dependency(ranged("legacy", "[2.0,)"))
                .build()
                .unwrap(),
            PluginMetadata::builder("legacy", SourceFormat::Legacy)
                .lenient_version("@VERSION@")
                .build()
                .unwrap(),
        ];

        let lenient = resolve(&plugins);
        assert!(lenient.is_success());
        assert!(matches!(
            lenient.warnings(),
            [ResolutionProblem::UncheckedVersion { actual: Some(v), .. }] if v == "@VERSION@"
        ));

        let strict = Resolver::new(ResolverConfig::new().with_strict_unparsed_versions(true));
        assert!(strict.config().strict_unparsed_versions);
        let result = strict.resolve(&plugins);
        assert!(matches!(
            result.problems(),
            [ResolutionProblem::VersionMismatch { actual, .. }] if actual == "@VERSION@"
        ));
    }

    #[test]
    fn test_order_independent() {
        let base = vec![
            plugin("alpha", "1")
                .dependency(dep("delta").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
            plugin("beta", "1")
                .dependency(dep("alpha").with_load_order(LoadOrder::Before))
                .build()
                .unwrap(),
            plugin("gamma", "1").build().unwrap(),
            plugin("delta", "1")
                .dependency(dep("gamma").with_load_order(LoadOrder::After))
                .build()
                .unwrap(),
        ];
        let expected = resolve(&base);
        assert_eq!(order(&expected), ["beta", "gamma", "delta", "alpha"]);

        let mut shuffled = base.clone();
        for _ in 0..shuffled.len() {
            shuffled.rotate_left(1);
            assert_eq!(resolve(&shuffled), expected);
            shuffled.reverse();
            assert_eq!(resolve(&shuffled), expected);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_result_serializes() {
        let result = resolve(&[plugin("alpha", "1")
            .dependency(dep("beta"))
            .build()
            .unwrap()]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["problems"][0]["kind"], "unmet_dependency");
        assert_eq!(json["problems"][0]["dependency"], "beta");
    }
}
