use std::io::Write;

use petgraph::{visit::EdgeRef, Direction::Outgoing};

use crate::{Dfa, Nfa, NfaEdge};

fn escape_label(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\r' => escaped.push_str("\\\\r"),
            '\n' => escaped.push_str("\\\\n"),
            '\t' => escaped.push_str("\\\\t"),
            '\u{c}' => escaped.push_str("\\\\f"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn write_state(
    output: &mut dyn Write,
    id: usize,
    accepts: &[String],
) -> std::io::Result<()> {
    if accepts.is_empty() {
        writeln!(output, "    \"{}\" [shape=circle];", id)
    } else {
        writeln!(output, "    \"{}\" [shape=doublecircle];", id)?;
        writeln!(
            output,
            "    \"accept {}\" [label=\"{}\", shape=rectangle, color=blue];",
            id,
            escape_label(&accepts.join("\n"))
        )?;
        writeln!(
            output,
            "    \"{}\" -> \"accept {}\" [style=dashed, color=blue, arrowhead=none];",
            id, id
        )
    }
}

/// Emits Graphviz dot for the part of the arena reachable from `start`.
pub fn write_nfa_dot(
    nfa: &Nfa,
    start: petgraph::graph::NodeIndex,
    output: &mut dyn Write,
) -> std::io::Result<()> {
    writeln!(output, "digraph {{")?;
    writeln!(output, "    rankdir=LR;")?;
    let states = nfa.reachable_from(start);
    for (id, &state) in states.iter().enumerate() {
        write_state(output, id + 1, nfa.accepts(state))?;
    }
    for (id, &state) in states.iter().enumerate() {
        for edge in nfa.graph().edges_directed(state, Outgoing) {
            let target_id = states.iter().position(|s| *s == edge.target()).unwrap() + 1;
            let label = match edge.weight() {
                NfaEdge::Epsilon => "ε".to_string(),
                NfaEdge::Char(c) => escape_label(&c.to_string()),
            };
            writeln!(
                output,
                "    \"{}\" -> \"{}\" [label=\"{}\"];",
                id + 1,
                target_id,
                label
            )?;
        }
    }
    writeln!(output, "    \"0\" [shape=point];")?;
    writeln!(output, "    \"0\" -> \"1\" [label=\"start\"];")?;
    writeln!(output, "}}")
}

pub fn write_dfa_dot(dfa: &Dfa, output: &mut dyn Write) -> std::io::Result<()> {
    writeln!(output, "digraph {{")?;
    writeln!(output, "    rankdir=LR;")?;
    let states: Vec<_> = dfa.states().collect();
    let position = |node| {
        states.iter().position(|(state, _)| *state == node).unwrap() + 1
    };
    for (state, accepts) in &states {
        write_state(output, position(*state), accepts)?;
    }
    for (state, _) in &states {
        for (on, target) in dfa.transitions_from(*state) {
            writeln!(
                output,
                "    \"{}\" -> \"{}\" [label=\"{}\"];",
                position(*state),
                position(target),
                escape_label(&on.to_string())
            )?;
        }
    }
    writeln!(output, "    \"0\" [shape=point];")?;
    writeln!(
        output,
        "    \"0\" -> \"{}\" [label=\"start\"];",
        position(dfa.start())
    )?;
    writeln!(output, "}}")
}
