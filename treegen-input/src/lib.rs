use std::{error::Error, fmt::Display};

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, space0, space1},
    combinator::{all_consuming, map, rest, verify},
    multi::separated_list1,
    sequence::{preceded, separated_pair, tuple},
    IResult,
};

/// The recognized configuration document, already ordered the way the
/// grammar and lexer consume it: `terminal_symbols` order defines lexer
/// priority, `production_rules` order defines rule ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserConfig {
    pub terminal_symbols: Vec<(String, String)>,
    pub nonterminal_symbols: Vec<String>,
    pub start_symbol: String,
    pub production_rules: Vec<String>,
    pub ignored_symbols: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Syntax { line: usize },
    MissingStartSymbol,
}

impl Error for ConfigError {}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Syntax { line } => write!(f, "syntax error at line {}", line),
            ConfigError::MissingStartSymbol => write!(f, "no start directive in configuration"),
        }
    }
}

enum Directive<'src> {
    Token(&'src str, &'src str),
    Ignore(Vec<&'src str>),
    NonTerminals(Vec<&'src str>),
    Start(&'src str),
    Rule(&'src str),
}

fn symbol_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != '=')(input)
}

fn parse_token(input: &str) -> IResult<&str, Directive> {
    map(
        preceded(
            tuple((tag("token"), space1)),
            separated_pair(
                symbol_name,
                tuple((space0, char('='), space0)),
                verify(rest, |p: &str| !p.is_empty()),
            ),
        ),
        |(name, pattern)| Directive::Token(name, pattern),
    )(input)
}

fn parse_ignore(input: &str) -> IResult<&str, Directive> {
    map(
        all_consuming(preceded(
            tuple((tag("ignore"), space1)),
            separated_list1(space1, symbol_name),
        )),
        Directive::Ignore,
    )(input)
}

fn parse_non_terminals(input: &str) -> IResult<&str, Directive> {
    map(
        all_consuming(preceded(
            tuple((tag("nonterminals"), space1)),
            separated_list1(space1, symbol_name),
        )),
        Directive::NonTerminals,
    )(input)
}

fn parse_start(input: &str) -> IResult<&str, Directive> {
    map(
        all_consuming(preceded(tuple((tag("start"), space1)), symbol_name)),
        Directive::Start,
    )(input)
}

fn parse_rule(input: &str) -> IResult<&str, Directive> {
    map(
        preceded(
            tuple((tag("rule"), space1)),
            verify(rest, |r: &str| r.contains("->")),
        ),
        Directive::Rule,
    )(input)
}

fn parse_directive(input: &str) -> IResult<&str, Directive> {
    alt((
        parse_token,
        parse_ignore,
        parse_non_terminals,
        parse_start,
        parse_rule,
    ))(input)
}

/// Parses the line-oriented configuration document. Empty lines and lines
/// starting with `#` are skipped; a repeated `start` directive keeps the
/// last occurrence.
pub fn parse_config(input: &str) -> Result<ParserConfig, ConfigError> {
    let mut config = ParserConfig::default();
    let mut has_start = false;
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (_, directive) =
            parse_directive(line).map_err(|_| ConfigError::Syntax { line: index + 1 })?;
        match directive {
            Directive::Token(name, pattern) => config
                .terminal_symbols
                .push((name.to_string(), pattern.trim().to_string())),
            Directive::Ignore(names) => config
                .ignored_symbols
                .extend(names.into_iter().map(str::to_string)),
            Directive::NonTerminals(names) => config
                .nonterminal_symbols
                .extend(names.into_iter().map(str::to_string)),
            Directive::Start(name) => {
                config.start_symbol = name.to_string();
                has_start = true;
            }
            Directive::Rule(rule) => config.production_rules.push(rule.trim().to_string()),
        }
    }
    if !has_start {
        return Err(ConfigError::MissingStartSymbol);
    }
    Ok(config)
}
