//! Event dependency graph
//!
//! Nodes are the built events that own their id. An edge `A -> B` means
//! "A happens after B", so B must be scheduled earlier. Edges to unresolved,
//! unbuilt, or wrong-kind targets are left out; resolution has already
//! reported them.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::parser::ast::{Document, Event, Ident, TimeValue};
use crate::parser::grammar::StatementKind;
use crate::parser::lexer::{Location, Spanned};
use crate::semantic::symbols::SymbolTable;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use thiserror::Error;

/// Graph construction invariant violations. These are bugs, not user errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("event '{0}' was added to the graph twice")]
    DuplicateNode(Ident),

    #[error("edge {from} -> {to} refers to an event outside the graph")]
    DanglingEdge { from: Ident, to: Ident },
}

impl From<GraphError> for strata_core::Error {
    fn from(err: GraphError) -> Self {
        strata_core::Error::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphOptions {
    /// Treat each DEPOSITION as after the DEPOSITION declared before it
    pub implicit_deposition_order: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Written as `after:`
    Explicit,
    /// Inferred from declaration order
    Implicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub kind: EdgeKind,
    /// The `after:` entry, or the later event's id for implicit edges
    pub span: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventNode {
    pub id: Ident,
    pub kind: StatementKind,
    pub span: Location,
    pub time: Option<Spanned<TimeValue>>,
}

impl EventNode {
    pub fn years_before_present(&self) -> Option<f64> {
        self.time.as_ref().and_then(|t| t.value.years_before_present())
    }
}

/// A cycle of `after:` edges, closed: the first id is repeated at the end
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    pub path: Vec<Ident>,
    /// The edge that closed the cycle
    pub span: Location,
}

impl Cycle {
    pub fn contains(&self, id: &str) -> bool {
        self.path.iter().any(|p| p == id)
    }

    /// Ids on the cycle, each once
    pub fn members(&self) -> &[Ident] {
        &self.path[..self.path.len().saturating_sub(1)]
    }
}

impl From<&Cycle> for Diagnostic {
    fn from(cycle: &Cycle) -> Self {
        Diagnostic::error(
            DiagnosticKind::Cycle,
            format!("Circular dependency detected: {}", cycle.path.join(" -> ")),
            cycle.span,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventGraph {
    nodes: Vec<EventNode>,
    index: HashMap<Ident, usize>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl EventGraph {
    pub fn build(document: &Document, table: &SymbolTable, options: GraphOptions) -> Result<Self, GraphError> {
        let mut graph = EventGraph::default();

        let events: Vec<&Event> = document.events().filter(|e| table.is_canonical(&e.id)).collect();
        for event in &events {
            graph.add_node(event)?;
        }

        for event in &events {
            for target in &event.after {
                if target.value == event.id.value || table.event(&target.value).is_none() {
                    continue;
                }
                // declared but never built
                if !graph.index.contains_key(&target.value) {
                    continue;
                }
                graph.add_edge(&event.id.value, &target.value, EdgeKind::Explicit, target.span)?;
            }
        }

        if options.implicit_deposition_order {
            let depositions: Vec<&Event> = events
                .iter()
                .copied()
                .filter(|e| e.kind.statement_kind() == StatementKind::Deposition)
                .collect();
            for pair in depositions.windows(2) {
                let (earlier, later) = (pair[0], pair[1]);
                if !graph.has_edge(&later.id.value, &earlier.id.value) {
                    graph.add_edge(&later.id.value, &earlier.id.value, EdgeKind::Implicit, later.id.span)?;
                }
            }
        }

        tracing::debug!(nodes = graph.nodes.len(), edges = graph.edges.len(), "built event graph");

        Ok(graph)
    }

    fn add_node(&mut self, event: &Event) -> Result<(), GraphError> {
        if self.index.contains_key(&event.id.value) {
            return Err(GraphError::DuplicateNode(event.id.value.clone()));
        }
        self.index.insert(event.id.value.clone(), self.nodes.len());
        self.nodes.push(EventNode {
            id: event.id.value.clone(),
            kind: event.kind.statement_kind(),
            span: event.id.span,
            time: event.time.clone(),
        });
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        Ok(())
    }

    fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind, span: Location) -> Result<(), GraphError> {
        let (Some(&from_index), Some(&to_index)) = (self.index.get(from), self.index.get(to)) else {
            return Err(GraphError::DanglingEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        };
        tracing::trace!(from, to, ?kind, "edge");
        let edge = self.edges.len();
        self.edges.push(Edge {
            from: from_index,
            to: to_index,
            kind,
            span,
        });
        self.outgoing[from_index].push(edge);
        self.incoming[to_index].push(edge);
        Ok(())
    }

    fn has_edge(&self, from: &str, to: &str) -> bool {
        let (Some(&from), Some(&to)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        self.outgoing[from].iter().any(|&e| self.edges[e].to == to)
    }

    pub fn nodes(&self) -> &[EventNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&EventNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Ids this event is directly after
    pub fn dependencies(&self, id: &str) -> Vec<&str> {
        match self.index.get(id) {
            Some(&i) => self.outgoing[i]
                .iter()
                .map(|&e| self.nodes[self.edges[e].to].id.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Depth-first search with an on-stack marker. Every back edge closes one
    /// cycle, reported in the order the back edges are met. Roots are taken in
    /// declaration order.
    pub fn find_cycles(&self) -> Vec<Cycle> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut cycles = Vec::new();

        for root in 0..self.nodes.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }

            // (node, position in its outgoing list)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::OnStack;

            while let Some(&(node, next)) = stack.last() {
                let Some(&edge) = self.outgoing[node].get(next) else {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                };
                let top = stack.len() - 1;
                stack[top].1 += 1;

                let target = self.edges[edge].to;
                match marks[target] {
                    Mark::Unvisited => {
                        marks[target] = Mark::OnStack;
                        stack.push((target, 0));
                    }
                    Mark::OnStack => {
                        let start = stack.iter().position(|&(n, _)| n == target).unwrap_or(0);
                        let mut path: Vec<Ident> =
                            stack[start..].iter().map(|&(n, _)| self.nodes[n].id.clone()).collect();
                        path.push(self.nodes[target].id.clone());
                        tracing::trace!(path = %path.join(" -> "), "cycle");
                        cycles.push(Cycle {
                            path,
                            span: self.edges[edge].span,
                        });
                    }
                    Mark::Done => {}
                }
            }
        }

        tracing::debug!(cycles = cycles.len(), "searched for cycles");
        cycles
    }

    /// Event ids oldest first, or `None` when the graph has a cycle.
    /// Ties keep declaration order.
    pub fn chronological_order(&self) -> Option<Vec<&str>> {
        let mut pending: Vec<usize> = self.outgoing.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = pending
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(self.nodes[node].id.as_str());
            for &edge in &self.incoming[node] {
                let later = self.edges[edge].from;
                pending[later] -= 1;
                if pending[later] == 0 {
                    ready.push(Reverse(later));
                }
            }
        }

        (order.len() == self.nodes.len()).then_some(order)
    }

    /// Nodes whose order is undefined: members of a strongly connected
    /// component with more than one node, or with an edge to itself.
    ///
    /// This is wider than the union of reported cycles, since one back edge
    /// per cycle does not name every node of a component.
    pub fn cyclic_nodes(&self) -> HashSet<usize> {
        const UNVISITED: usize = usize::MAX;

        let count = self.nodes.len();
        let mut index = vec![UNVISITED; count];
        let mut low = vec![0; count];
        let mut on_stack = vec![false; count];
        let mut stack: Vec<usize> = Vec::new();
        let mut next_index = 0;
        let mut cyclic = HashSet::new();

        for root in 0..count {
            if index[root] != UNVISITED {
                continue;
            }

            // Tarjan, iteratively: (node, position in its outgoing list)
            let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
            index[root] = next_index;
            low[root] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root] = true;

            while let Some(&(node, next)) = frames.last() {
                if let Some(&edge) = self.outgoing[node].get(next) {
                    let top = frames.len() - 1;
                    frames[top].1 += 1;

                    let target = self.edges[edge].to;
                    if index[target] == UNVISITED {
                        index[target] = next_index;
                        low[target] = next_index;
                        next_index += 1;
                        stack.push(target);
                        on_stack[target] = true;
                        frames.push((target, 0));
                    } else if on_stack[target] {
                        low[node] = low[node].min(index[target]);
                    }
                    continue;
                }

                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    low[parent] = low[parent].min(low[node]);
                }
                if low[node] != index[node] {
                    continue;
                }

                let mut component = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                let self_loop = self.outgoing[node].iter().any(|&e| self.edges[e].to == node);
                if component.len() > 1 || self_loop {
                    cyclic.extend(component);
                }
            }
        }

        cyclic
    }
}
