// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Dependency graph between source units
//!
//! Edges point from a dependent unit to the unit it waits for. An edge that
//! would close a cycle is never added: the target is reported as cyclic and
//! the dependent proceeds without waiting for it.

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Result of [`DependencyGraph::add_dependency`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    Added,
    AlreadyPresent,
    /// The dependency already (transitively) waits for the dependent
    WouldCycle,
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: StableDiGraph<Url, ()>,
    nodes: HashMap<Url, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, url: &Url) -> NodeIndex {
        if let Some(&index) = self.nodes.get(url) {
            return index;
        }
        let index = self.graph.add_node(url.clone());
        self.nodes.insert(url.clone(), index);
        index
    }

    /// Record that `dependent` waits for `dependency`
    pub fn add_dependency(&mut self, dependent: &Url, dependency: &Url) -> EdgeOutcome {
        let from = self.node(dependent);
        let to = self.node(dependency);
        if self.graph.find_edge(from, to).is_some() {
            return EdgeOutcome::AlreadyPresent;
        }
        if self.reaches(to, from) {
            return EdgeOutcome::WouldCycle;
        }
        self.graph.add_edge(from, to, ());
        EdgeOutcome::Added
    }

    /// Whether `target` is reachable from `start`
    fn reaches(&self, start: NodeIndex, target: NodeIndex) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            stack.extend(self.graph.neighbors_directed(node, Direction::Outgoing).filter(|next| !visited.contains(next)));
        }
        false
    }

    /// Units waiting for `url`
    pub fn dependents(&self, url: &Url) -> Vec<Url> {
        let Some(&index) = self.nodes.get(url) else {
            return Vec::new();
        };
        self.graph.neighbors_directed(index, Direction::Incoming).map(|n| self.graph[n].clone()).collect()
    }

    /// Units `url` waits for
    pub fn dependencies(&self, url: &Url) -> Vec<Url> {
        let Some(&index) = self.nodes.get(url) else {
            return Vec::new();
        };
        self.graph.neighbors_directed(index, Direction::Outgoing).map(|n| self.graph[n].clone()).collect()
    }

    pub fn remove(&mut self, url: &Url) {
        if let Some(index) = self.nodes.remove(url) {
            self.graph.remove_node(index);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
