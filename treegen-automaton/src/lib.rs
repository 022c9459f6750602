use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt::Display,
};

use log::debug;
use petgraph::{
    graph::NodeIndex,
    prelude::DiGraph,
    visit::{Dfs, EdgeRef},
    Direction::Outgoing,
};

mod render;

pub use render::{write_dfa_dot, write_nfa_dot};

/// States are arena indices into the automaton graphs.
pub type StateId = NodeIndex;

/// The input alphabet: ASCII code points 1..127 without `\r` and `\n`.
/// `.` and `[^...]` in patterns expand against exactly this set.
pub fn charset() -> impl Iterator<Item = char> {
    (1u8..127)
        .map(char::from)
        .filter(|c| *c != '\r' && *c != '\n')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NfaEdge {
    Epsilon,
    Char(char),
}

impl Display for NfaEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NfaEdge::Epsilon => write!(f, "ε"),
            NfaEdge::Char(c) => write!(f, "{}", c),
        }
    }
}

/// A nondeterministic automaton arena. States are graph nodes carrying an
/// ordered list of accept names; sub-automata are identified by node
/// indices into the shared graph.
pub struct Nfa {
    graph: DiGraph<Vec<String>, NfaEdge>,
}

impl Nfa {
    pub fn new() -> Self {
        Nfa {
            graph: DiGraph::new(),
        }
    }

    pub fn add_state(&mut self) -> NodeIndex {
        self.graph.add_node(Vec::new())
    }

    pub fn add_transition(&mut self, start: NodeIndex, end: NodeIndex, on: char) {
        self.graph.add_edge(start, end, NfaEdge::Char(on));
    }

    pub fn add_epsilon(&mut self, start: NodeIndex, end: NodeIndex) {
        self.graph.add_edge(start, end, NfaEdge::Epsilon);
    }

    pub fn add_accept(&mut self, state: NodeIndex, name: &str) {
        self.graph[state].push(name.to_string());
    }

    pub fn accepts(&self, state: NodeIndex) -> &[String] {
        &self.graph[state]
    }

    /// A fresh start state with an ε-edge to each given start.
    pub fn union(&mut self, starts: &[NodeIndex]) -> NodeIndex {
        let start = self.add_state();
        for &inner in starts {
            self.add_epsilon(start, inner);
        }
        start
    }

    /// States reachable from `start`, in depth-first order.
    pub fn reachable_from(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut visited = Vec::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            visited.push(node);
        }
        visited
    }

    pub fn epsilon_closure(&self, starts: &[NodeIndex]) -> BTreeSet<NodeIndex> {
        let mut closure: BTreeSet<NodeIndex> = starts.iter().copied().collect();
        let mut queue: Vec<NodeIndex> = starts.to_vec();
        while let Some(state) = queue.pop() {
            for edge in self.graph.edges_directed(state, Outgoing) {
                if let NfaEdge::Epsilon = edge.weight() {
                    if closure.insert(edge.target()) {
                        queue.push(edge.target());
                    }
                }
            }
        }
        closure
    }

    /// The characters leaving the ε-closure of `state`.
    pub fn closure_inputs(&self, state: NodeIndex) -> BTreeSet<char> {
        let mut inputs = BTreeSet::new();
        for node in self.epsilon_closure(&[state]) {
            for edge in self.graph.edges_directed(node, Outgoing) {
                if let NfaEdge::Char(c) = edge.weight() {
                    inputs.insert(*c);
                }
            }
        }
        inputs
    }

    /// Re-enters a deterministic automaton into a fresh arena, so it can be
    /// unioned or determinized again.
    pub fn from_dfa(dfa: &Dfa) -> (Nfa, NodeIndex) {
        let mut nfa = Nfa::new();
        let mut node_map = BTreeMap::new();
        for (node, accepts) in dfa.states() {
            let copy = nfa.add_state();
            nfa.graph[copy] = accepts.to_vec();
            node_map.insert(node, copy);
        }
        for (node, _) in dfa.states() {
            for (c, target) in dfa.transitions_from(node) {
                nfa.add_transition(node_map[&node], node_map[&target], c);
            }
        }
        (nfa, node_map[&dfa.start()])
    }

    /// Iterative subset construction. Every produced state's accept list is
    /// the union of the member accept names, ordered by `priority`.
    pub fn to_dfa(&self, start: NodeIndex, priority: &[String]) -> Dfa {
        let mut graph: DiGraph<Vec<String>, char> = DiGraph::new();
        let mut state_map: BTreeMap<BTreeSet<NodeIndex>, NodeIndex> = BTreeMap::new();

        let start_closure = self.epsilon_closure(&[start]);
        let dfa_start = graph.add_node(self.closure_accepts(&start_closure, priority));
        state_map.insert(start_closure.clone(), dfa_start);

        let mut queue = VecDeque::new();
        queue.push_back(start_closure);
        while let Some(closure) = queue.pop_front() {
            let dfa_state = state_map[&closure];
            let mut inputs = BTreeSet::new();
            for &node in &closure {
                for edge in self.graph.edges_directed(node, Outgoing) {
                    if let NfaEdge::Char(c) = edge.weight() {
                        inputs.insert(*c);
                    }
                }
            }
            for c in inputs {
                let mut targets = Vec::new();
                for &node in &closure {
                    for edge in self.graph.edges_directed(node, Outgoing) {
                        if *edge.weight() == NfaEdge::Char(c) {
                            targets.push(edge.target());
                        }
                    }
                }
                let target_closure = self.epsilon_closure(&targets);
                let target_state = match state_map.get(&target_closure) {
                    Some(state) => *state,
                    None => {
                        let state = graph.add_node(self.closure_accepts(&target_closure, priority));
                        state_map.insert(target_closure.clone(), state);
                        queue.push_back(target_closure);
                        state
                    }
                };
                graph.add_edge(dfa_state, target_state, c);
            }
        }
        debug!(
            "subset construction: {} nfa states -> {} dfa states",
            self.graph.node_count(),
            graph.node_count()
        );
        Dfa {
            graph,
            start: dfa_start,
        }
    }

    fn closure_accepts(&self, closure: &BTreeSet<NodeIndex>, priority: &[String]) -> Vec<String> {
        let names: BTreeSet<&String> = closure
            .iter()
            .flat_map(|node| self.graph[*node].iter())
            .collect();
        let mut accepts: Vec<String> = names.into_iter().cloned().collect();
        accepts.sort_by_key(|name| {
            priority
                .iter()
                .position(|p| p == name)
                .unwrap_or(usize::MAX)
        });
        accepts
    }

    pub(crate) fn graph(&self) -> &DiGraph<Vec<String>, NfaEdge> {
        &self.graph
    }
}

impl Default for Nfa {
    fn default() -> Self {
        Nfa::new()
    }
}

/// A deterministic automaton: at most one target per `(state, char)`.
#[derive(Debug)]
pub struct Dfa {
    graph: DiGraph<Vec<String>, char>,
    start: NodeIndex,
}

impl Dfa {
    pub fn start(&self) -> NodeIndex {
        self.start
    }

    pub fn states(&self) -> impl Iterator<Item = (NodeIndex, &[String])> + '_ {
        self.graph
            .node_indices()
            .map(|node| (node, self.graph[node].as_slice()))
    }

    pub fn accepts(&self, state: NodeIndex) -> &[String] {
        &self.graph[state]
    }

    pub fn transitions_from(&self, node: NodeIndex) -> impl Iterator<Item = (char, NodeIndex)> + '_ {
        self.graph
            .edges_directed(node, Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
    }

    fn target(&self, node: NodeIndex, on: char) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Outgoing)
            .find(|edge| *edge.weight() == on)
            .map(|edge| edge.target())
    }

    /// Longest-match against a prefix of `text`: the most recent accepting
    /// position wins, ties at equal length go to the priority-minimum
    /// accept name. Matches are never empty.
    pub fn longest_match(&self, text: &str) -> Option<(&str, usize)> {
        let mut state = self.start;
        let mut matched: Option<(&str, usize)> = None;
        for (consumed, c) in text.chars().enumerate() {
            match self.target(state, c) {
                Some(target) => state = target,
                None => break,
            }
            if let Some(name) = self.graph[state].first() {
                matched = Some((name.as_str(), consumed + 1));
            }
        }
        matched
    }
}
