//! Module Dependency Graph
//!
//! Cycle detection and topological ordering over module dependency edges
//! (regular, depends-on and friend edges alike).

use crate::ids::ModuleId;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};

/// Edges go from a module to the modules it depends on
pub struct ModuleGraph {
    names: IndexMap<ModuleId, String>,
    edges: IndexMap<ModuleId, Vec<ModuleId>>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self {
            names: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    pub fn add_module(&mut self, id: ModuleId, name: &str) {
        self.names.insert(id, name.to_string());
        self.edges.entry(id).or_default();
    }

    pub fn add_edge(&mut self, from: ModuleId, to: ModuleId) {
        let targets = self.edges.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    pub fn name(&self, id: ModuleId) -> &str {
        self.names.get(&id).map(String::as_str).unwrap_or("<unknown>")
    }

    /// First cycle found by DFS, as module names with the first one repeated at the end
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();

        for node in self.edges.keys() {
            if !visited.contains(node) {
                let cycle = self.detect_cycle(*node, &mut visited, &mut on_stack, &mut path);
                if cycle.is_some() {
                    return cycle;
                }
            }
        }
        None
    }

    fn detect_cycle(
        &self,
        node: ModuleId,
        visited: &mut HashSet<ModuleId>,
        on_stack: &mut HashSet<ModuleId>,
        path: &mut Vec<ModuleId>,
    ) -> Option<Vec<String>> {
        visited.insert(node);
        on_stack.insert(node);
        path.push(node);

        if let Some(neighbors) = self.edges.get(&node) {
            for neighbor in neighbors {
                if !visited.contains(neighbor) {
                    if let Some(cycle) = self.detect_cycle(*neighbor, visited, on_stack, path) {
                        return Some(cycle);
                    }
                } else if on_stack.contains(neighbor) {
                    let start = path.iter().position(|n| n == neighbor).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|id| self.name(*id).to_string()).collect();
                    cycle.push(self.name(*neighbor).to_string());
                    return Some(cycle);
                }
            }
        }

        path.pop();
        on_stack.remove(&node);
        None
    }

    /// Kahn's algorithm; dependencies come before their dependents
    ///
    /// Modules on a cycle are appended at the end in registration order.
    pub fn topological_order(&self) -> Vec<ModuleId> {
        let mut remaining: HashMap<ModuleId, usize> = self
            .edges
            .iter()
            .map(|(id, deps)| (*id, deps.len()))
            .collect();
        let mut dependents: HashMap<ModuleId, Vec<ModuleId>> = HashMap::new();
        for (id, deps) in &self.edges {
            for dep in deps {
                dependents.entry(*dep).or_default().push(*id);
            }
        }

        let mut queue: VecDeque<ModuleId> = self
            .edges
            .keys()
            .filter(|id| remaining.get(id) == Some(&0))
            .copied()
            .collect();
        let mut order = Vec::with_capacity(self.edges.len());

        while let Some(id) = queue.pop_front() {
            order.push(id);
            for dependent in dependents.get(&id).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        if order.len() < self.edges.len() {
            for id in self.edges.keys() {
                if !order.contains(id) {
                    order.push(*id);
                }
            }
        }
        order
    }

    /// Every module reachable from `start` along `edges_of` (excluding `start`)
    pub fn reachable(
        start: ModuleId,
        edges_of: impl Fn(ModuleId) -> Vec<ModuleId>,
    ) -> Vec<ModuleId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<ModuleId> = edges_of(start).into();
        while let Some(id) = queue.pop_front() {
            if id == start || !seen.insert(id) {
                continue;
            }
            order.push(id);
            queue.extend(edges_of(id));
        }
        order
    }
}

impl Default for ModuleGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> ModuleId {
        ModuleId::from_raw(raw)
    }

    #[test]
    fn test_topological_order_puts_dependencies_first() {
        let mut graph = ModuleGraph::new();
        graph.add_module(id(0), "app");
        graph.add_module(id(1), "lib");
        graph.add_module(id(2), "sdk");
        graph.add_edge(id(0), id(1));
        graph.add_edge(id(1), id(2));
        graph.add_edge(id(0), id(2));

        assert!(graph.find_cycle().is_none());
        assert_eq!(graph.topological_order(), vec![id(2), id(1), id(0)]);
    }

    #[test]
    fn test_cycle_is_reported_with_names() {
        let mut graph = ModuleGraph::new();
        graph.add_module(id(0), "a");
        graph.add_module(id(1), "b");
        graph.add_module(id(2), "c");
        graph.add_edge(id(0), id(1));
        graph.add_edge(id(1), id(2));
        graph.add_edge(id(2), id(0));

        let cycle = graph.find_cycle().unwrap();
        assert_eq!(cycle, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_reachable_skips_start_and_duplicates() {
        let edges = |m: ModuleId| match m.as_raw() {
            0 => vec![id(1), id(2)],
            1 => vec![id(2), id(0)],
            _ => vec![],
        };
        assert_eq!(ModuleGraph::reachable(id(0), edges), vec![id(1), id(2)]);
    }
}
