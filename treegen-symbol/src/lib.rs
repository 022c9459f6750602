use std::{collections::BTreeMap, error::Error, fmt::Display};

/// Name of the start symbol of the augmented grammar.
pub const START_SYMBOL_NAME: &str = "_S";
/// Name of the empty-string terminal.
pub const EPSILON_SYMBOL_NAME: &str = "null";
/// Name of the end-of-input terminal.
pub const END_SYMBOL_NAME: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Epsilon,
    End,
    Terminal(u32),
    NonTerminal(u32),
}

impl Symbol {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Symbol::NonTerminal(_))
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SymbolError {
    NameConflict { name: String },
    UnknownSymbol { name: String },
}

impl Error for SymbolError {}

impl Display for SymbolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolError::NameConflict { name } => {
                write!(f, "{} is reserved and cannot be declared", name)
            }
            SymbolError::UnknownSymbol { name } => {
                write!(f, "symbol {} is not declared", name)
            }
        }
    }
}

/// Interns terminal and nonterminal names once and resolves every later
/// reference by name. The three reserved names are always present: `null`
/// and `$` resolve to [`Symbol::Epsilon`] and [`Symbol::End`], `_S` to the
/// nonterminal reserved for grammar augmentation.
#[derive(Debug, Clone)]
pub struct SymbolPool {
    terminal_names: Vec<String>,
    non_terminal_names: Vec<String>,
    terminals: BTreeMap<String, u32>,
    non_terminals: BTreeMap<String, u32>,
}

impl SymbolPool {
    pub fn new<T, N>(terminals: T, non_terminals: N) -> Result<Self, SymbolError>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        let mut pool = SymbolPool {
            terminal_names: Vec::new(),
            non_terminal_names: Vec::new(),
            terminals: BTreeMap::new(),
            non_terminals: BTreeMap::new(),
        };
        for name in terminals {
            let name = name.as_ref();
            check_reserved(name)?;
            if !pool.terminals.contains_key(name) {
                pool.terminals
                    .insert(name.to_string(), pool.terminal_names.len() as u32);
                pool.terminal_names.push(name.to_string());
            }
        }
        for name in non_terminals {
            let name = name.as_ref();
            check_reserved(name)?;
            if !pool.non_terminals.contains_key(name) {
                pool.non_terminals
                    .insert(name.to_string(), pool.non_terminal_names.len() as u32);
                pool.non_terminal_names.push(name.to_string());
            }
        }
        // the augmented start is interned unconditionally, after all user
        // nonterminals
        let start_index = pool.non_terminal_names.len() as u32;
        pool.non_terminals
            .insert(START_SYMBOL_NAME.to_string(), start_index);
        pool.non_terminal_names.push(START_SYMBOL_NAME.to_string());
        Ok(pool)
    }

    pub fn start_symbol(&self) -> Symbol {
        Symbol::NonTerminal(self.non_terminals[START_SYMBOL_NAME])
    }

    pub fn get_terminal(&self, name: &str) -> Result<Symbol, SymbolError> {
        match name {
            EPSILON_SYMBOL_NAME => Ok(Symbol::Epsilon),
            END_SYMBOL_NAME => Ok(Symbol::End),
            _ => self
                .terminals
                .get(name)
                .map(|i| Symbol::Terminal(*i))
                .ok_or_else(|| SymbolError::UnknownSymbol {
                    name: name.to_string(),
                }),
        }
    }

    pub fn get_non_terminal(&self, name: &str) -> Result<Symbol, SymbolError> {
        self.non_terminals
            .get(name)
            .map(|i| Symbol::NonTerminal(*i))
            .ok_or_else(|| SymbolError::UnknownSymbol {
                name: name.to_string(),
            })
    }

    /// Resolves a name of either kind; terminals win on a collision.
    pub fn get_symbol(&self, name: &str) -> Result<Symbol, SymbolError> {
        self.get_terminal(name)
            .or_else(|_| self.get_non_terminal(name))
    }

    pub fn name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Epsilon => EPSILON_SYMBOL_NAME,
            Symbol::End => END_SYMBOL_NAME,
            Symbol::Terminal(i) => &self.terminal_names[i as usize],
            Symbol::NonTerminal(i) => &self.non_terminal_names[i as usize],
        }
    }

    /// User terminals in declaration order, without `null` and `$`.
    pub fn terminals(&self) -> impl Iterator<Item = Symbol> + '_ {
        (0..self.terminal_names.len() as u32).map(Symbol::Terminal)
    }

    /// Nonterminals in declaration order, `_S` last.
    pub fn non_terminals(&self) -> impl Iterator<Item = Symbol> + '_ {
        (0..self.non_terminal_names.len() as u32).map(Symbol::NonTerminal)
    }

    pub fn non_terminal_count(&self) -> usize {
        self.non_terminal_names.len()
    }
}

fn check_reserved(name: &str) -> Result<(), SymbolError> {
    match name {
        START_SYMBOL_NAME | EPSILON_SYMBOL_NAME | END_SYMBOL_NAME => {
            Err(SymbolError::NameConflict {
                name: name.to_string(),
            })
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    value: String,
    symbol: Symbol,
}

impl Token {
    pub fn new<V: Into<String>>(value: V, symbol: Symbol) -> Self {
        Token {
            value: value.into(),
            symbol,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
