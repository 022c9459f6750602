use std::{error::Error, fmt::Display};

use treegen_symbol::{Symbol, Token, END_SYMBOL_NAME, START_SYMBOL_NAME};

use crate::{
    grammar::{Grammar, GrammarError},
    lr::{Action, ParseTable},
    tree::ParseTree,
};

#[derive(Debug, PartialEq)]
pub enum ParseError {
    UnexpectedToken {
        symbol: String,
        value: String,
        position: usize,
    },
}

impl Error for ParseError {}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                symbol,
                value,
                position,
            } => write!(
                f,
                "unexpected token {}: {} at {}",
                symbol, value, position
            ),
        }
    }
}

/// The table-driven LR driver: two parallel stacks (state ids and parse
/// nodes), one pass over the token stream.
pub struct Parser<'grammar> {
    grammar: &'grammar Grammar,
    table: ParseTable,
}

impl<'grammar> Parser<'grammar> {
    /// Builds the LR(1) table for the grammar; conflicting grammars are
    /// rejected here.
    pub fn new(grammar: &'grammar Grammar) -> Result<Self, GrammarError> {
        let table = ParseTable::build(grammar)?;
        Ok(Parser { grammar, table })
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    pub fn parse(&self, tokens: &[Token]) -> Result<ParseTree, ParseError> {
        let pool = self.grammar.symbol_pool();
        let end_token = Token::new(END_SYMBOL_NAME, Symbol::End);
        let mut state_stack = vec![0usize];
        let mut node_stack: Vec<ParseTree> = Vec::new();
        let mut position = 0;
        loop {
            let token = tokens.get(position).unwrap_or(&end_token);
            // the state stack always keeps its seed entry
            let state = *state_stack.last().unwrap();
            let action = self
                .table
                .action(state, token.symbol())
                .ok_or_else(|| unexpected(pool.name(token.symbol()), token.value(), position))?;
            match action {
                Action::Shift(target) => {
                    state_stack.push(target);
                    node_stack.push(ParseTree::leaf(token.clone()));
                    position += 1;
                }
                Action::Reduce(rule_id) => {
                    let rule = self.grammar.rule(rule_id);
                    // an epsilon rule recognized nothing, so it pops nothing
                    let count = if rule.is_epsilon() { 0 } else { rule.rhs().len() };
                    let children = node_stack.split_off(node_stack.len() - count);
                    state_stack.truncate(state_stack.len() - count);
                    let lhs = rule.lhs();
                    let name = pool.name(lhs);
                    let node = ParseTree::new(Token::new(name, lhs), children);
                    let uncovered = *state_stack.last().unwrap();
                    match self.table.action(uncovered, lhs) {
                        Some(Action::Goto(target)) => state_stack.push(target),
                        _ => return Err(unexpected(name, name, position)),
                    }
                    node_stack.push(node);
                }
                Action::Accept(_) => {
                    let start = pool.start_symbol();
                    return Ok(ParseTree::new(
                        Token::new(START_SYMBOL_NAME, start),
                        node_stack,
                    ));
                }
                Action::Goto(_) => {
                    return Err(unexpected(pool.name(token.symbol()), token.value(), position));
                }
            }
        }
    }
}

fn unexpected(symbol: &str, value: &str, position: usize) -> ParseError {
    ParseError::UnexpectedToken {
        symbol: symbol.to_string(),
        value: value.to_string(),
        position,
    }
}
