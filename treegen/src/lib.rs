//! A configuration-driven parser toolkit: a declarative grammar plus an
//! input string in, a concrete parse tree out. Patterns are compiled to a
//! unified DFA for tokenization; the grammar is analyzed into a canonical
//! LR(1) table that a generic driver executes against the token stream.

use std::{error::Error as StdError, fmt::Display};

pub use treegen_automaton::{charset, write_dfa_dot, write_nfa_dot, Dfa, Nfa, StateId};
pub use treegen_input::{parse_config, ConfigError, ParserConfig};
pub use treegen_lexer::{scan_pattern, Lexer, LexerError, RegexCompiler, RegexError};
pub use treegen_parser::{
    output_table, write_tree_dot, Action, ConflictKind, Grammar, GrammarError, ParseError,
    ParseTable, ParseTree, Parser,
};
pub use treegen_symbol::{Symbol, SymbolError, SymbolPool, Token};

#[derive(Debug, PartialEq)]
pub enum Error {
    Config(ConfigError),
    Symbol(SymbolError),
    Grammar(GrammarError),
    Lexer(LexerError),
    Parse(ParseError),
}

impl StdError for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(error) => write!(f, "{}", error),
            Error::Symbol(error) => write!(f, "{}", error),
            Error::Grammar(error) => write!(f, "{}", error),
            Error::Lexer(error) => write!(f, "{}", error),
            Error::Parse(error) => write!(f, "{}", error),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Error::Config(error)
    }
}

impl From<SymbolError> for Error {
    fn from(error: SymbolError) -> Self {
        Error::Symbol(error)
    }
}

impl From<GrammarError> for Error {
    fn from(error: GrammarError) -> Self {
        Error::Grammar(error)
    }
}

impl From<LexerError> for Error {
    fn from(error: LexerError) -> Self {
        Error::Lexer(error)
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Error::Parse(error)
    }
}

/// Runs the whole pipeline for one input: grammar analysis, lexer
/// construction, tokenization and the LR parse.
pub fn parse_text(config: &ParserConfig, text: &str) -> Result<ParseTree, Error> {
    let grammar = Grammar::from_config(config)?;
    let lexer = Lexer::new(config, grammar.symbol_pool())?;
    let tokens = lexer.tokenize(text)?;
    let parser = Parser::new(&grammar)?;
    Ok(parser.parse(&tokens)?)
}
