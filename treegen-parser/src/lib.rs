pub mod grammar;
pub mod lr;
pub mod parser;
pub mod tree;

pub use grammar::{ConflictKind, Grammar, GrammarError, Rule};
pub use lr::{output_table, Action, ParseTable};
pub use parser::{ParseError, Parser};
pub use tree::{write_tree_dot, ParseTree};

#[cfg(test)]
mod tests;
