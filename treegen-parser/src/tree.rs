use std::io::Write;

use treegen_symbol::{SymbolPool, Token};

/// A concrete parse tree. Leaves carry lexed tokens verbatim; interior
/// nodes carry a token whose value is the nonterminal's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    token: Token,
    children: Vec<ParseTree>,
}

impl ParseTree {
    pub fn new(token: Token, children: Vec<ParseTree>) -> Self {
        ParseTree { token, children }
    }

    pub fn leaf(token: Token) -> Self {
        ParseTree {
            token,
            children: Vec::new(),
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn children(&self) -> &[ParseTree] {
        &self.children
    }

    /// The in-order frontier of lexed tokens. Childless interior nodes
    /// (epsilon reductions) contribute nothing.
    pub fn leaves(&self) -> Vec<&Token> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'tree>(&'tree self, leaves: &mut Vec<&'tree Token>) {
        if self.children.is_empty() {
            if self.token.symbol().is_terminal() {
                leaves.push(&self.token);
            }
        } else {
            for child in &self.children {
                child.collect_leaves(leaves);
            }
        }
    }
}

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

fn write_node(
    tree: &ParseTree,
    pool: &SymbolPool,
    next_id: &mut usize,
    output: &mut dyn Write,
) -> std::io::Result<usize> {
    let id = *next_id;
    *next_id += 1;
    writeln!(
        output,
        "    \"{}\" [label=\"{}\"];",
        id,
        escape_label(pool.name(tree.token().symbol()))
    )?;
    if tree.children().is_empty() {
        writeln!(
            output,
            "    \"value {}\" [label=\"{}\", shape=box, color=blue];",
            id,
            escape_label(tree.token().value())
        )?;
        writeln!(
            output,
            "    \"{}\" -> \"value {}\" [style=dashed, color=blue, arrowhead=none];",
            id, id
        )?;
    }
    for child in tree.children() {
        let child_id = write_node(child, pool, next_id, output)?;
        writeln!(output, "    \"{}\" -> \"{}\";", id, child_id)?;
    }
    Ok(id)
}

/// Emits Graphviz dot for a parse tree, top to bottom, with the lexed
/// value of each leaf in a box beside it.
pub fn write_tree_dot(
    tree: &ParseTree,
    pool: &SymbolPool,
    output: &mut dyn Write,
) -> std::io::Result<()> {
    writeln!(output, "digraph {{")?;
    writeln!(output, "    rankdir=TB;")?;
    let mut next_id = 0;
    write_node(tree, pool, &mut next_id, output)?;
    writeln!(output, "}}")
}
