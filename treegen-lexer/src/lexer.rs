use std::{collections::BTreeSet, error::Error, fmt::Display};

use log::debug;
use treegen_automaton::{Dfa, Nfa};
use treegen_input::ParserConfig;
use treegen_parser::GrammarError;
use treegen_symbol::{SymbolError, SymbolPool, Token};

use crate::regex::{RegexCompiler, RegexError};

#[derive(Debug, PartialEq)]
pub enum LexerError {
    UnexpectedCharacter { ch: char, position: usize },
    Regex { name: String, error: RegexError },
    Grammar(GrammarError),
    Symbol(SymbolError),
}

impl Error for LexerError {}

impl Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexerError::UnexpectedCharacter { ch, position } => {
                write!(f, "unexpected character {:?} at {}", ch, position)
            }
            LexerError::Regex { name, error } => write!(f, "in pattern for {}: {}", name, error),
            LexerError::Grammar(error) => write!(f, "{}", error),
            LexerError::Symbol(error) => write!(f, "{}", error),
        }
    }
}

impl From<GrammarError> for LexerError {
    fn from(error: GrammarError) -> Self {
        LexerError::Grammar(error)
    }
}

impl From<SymbolError> for LexerError {
    fn from(error: SymbolError) -> Self {
        LexerError::Symbol(error)
    }
}

/// The generated tokenizer: every configured pattern compiled into one
/// shared NFA, determinized with declaration order as accept priority.
#[derive(Debug)]
pub struct Lexer<'pool> {
    pool: &'pool SymbolPool,
    dfa: Dfa,
    ignored: BTreeSet<String>,
}

impl<'pool> Lexer<'pool> {
    pub fn new(config: &ParserConfig, pool: &'pool SymbolPool) -> Result<Self, LexerError> {
        let compiler = RegexCompiler::new()?;
        let mut nfa = Nfa::new();
        let mut starts = Vec::new();
        for (name, pattern) in &config.terminal_symbols {
            let fragment =
                compiler
                    .compile(&mut nfa, pattern)
                    .map_err(|error| LexerError::Regex {
                        name: name.clone(),
                        error,
                    })?;
            for &end in &fragment.ends {
                nfa.add_accept(end, name);
            }
            starts.push(fragment.start);
        }
        let start = nfa.union(&starts);
        let priority: Vec<String> = config
            .terminal_symbols
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        let dfa = nfa.to_dfa(start, &priority);
        debug!("compiled lexer for {} terminals", priority.len());
        Ok(Lexer {
            pool,
            dfa,
            ignored: config.ignored_symbols.iter().cloned().collect(),
        })
    }

    /// The unified automaton, for rendering.
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    /// Greedy longest-match tokenization. Matches of ignored terminals are
    /// dropped; positions are char offsets into `text`.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        let mut rest = text;
        let mut position = 0;
        while !rest.is_empty() {
            let (name, length) = match self.dfa.longest_match(rest) {
                Some(matched) => matched,
                None => {
                    // rest is non-empty here
                    let ch = rest.chars().next().unwrap();
                    return Err(LexerError::UnexpectedCharacter { ch, position });
                }
            };
            let byte_length: usize = rest.chars().take(length).map(char::len_utf8).sum();
            if !self.ignored.contains(name) {
                tokens.push(Token::new(&rest[..byte_length], self.pool.get_terminal(name)?));
            }
            rest = &rest[byte_length..];
            position += length;
        }
        Ok(tokens)
    }
}
