use std::{
    collections::{BTreeMap, BTreeSet},
    error::Error,
    fmt::Display,
};

use treegen_input::ParserConfig;
use treegen_symbol::{Symbol, SymbolError, SymbolPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    ShiftShift,
}

impl Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::ShiftReduce => write!(f, "shift/reduce"),
            ConflictKind::ReduceReduce => write!(f, "reduce/reduce"),
            ConflictKind::ShiftShift => write!(f, "shift/shift"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum GrammarError {
    Symbol(SymbolError),
    InvalidRule { rule: String },
    Conflict {
        kind: ConflictKind,
        state: usize,
        symbol: String,
    },
}

impl Error for GrammarError {}

impl Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::Symbol(error) => write!(f, "{}", error),
            GrammarError::InvalidRule { rule } => write!(f, "invalid production rule: {}", rule),
            GrammarError::Conflict {
                kind,
                state,
                symbol,
            } => write!(
                f,
                "{} conflict in state {} on symbol {}",
                kind, state, symbol
            ),
        }
    }
}

impl From<SymbolError> for GrammarError {
    fn from(error: SymbolError) -> Self {
        GrammarError::Symbol(error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    id: usize,
    lhs: Symbol,
    rhs: Vec<Symbol>,
}

impl Rule {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn lhs(&self) -> Symbol {
        self.lhs
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    /// A rule derives the empty string iff its RHS is the sole `null`
    /// terminal.
    pub fn is_epsilon(&self) -> bool {
        self.rhs == [Symbol::Epsilon]
    }

    pub fn display<'rule, 'grammar>(
        &'rule self,
        grammar: &'grammar Grammar,
    ) -> RuleDisplay<'rule, 'grammar> {
        RuleDisplay {
            rule: self,
            grammar,
        }
    }
}

pub struct RuleDisplay<'rule, 'grammar> {
    rule: &'rule Rule,
    grammar: &'grammar Grammar,
}

impl<'rule, 'grammar> Display for RuleDisplay<'rule, 'grammar> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pool = self.grammar.symbol_pool();
        let rhs: Vec<&str> = self.rule.rhs().iter().map(|s| pool.name(*s)).collect();
        write!(f, "{} -> {}", pool.name(self.rule.lhs()), rhs.join(" "))
    }
}

/// A fully analyzed grammar: the interned symbols, the augmented rule list,
/// and the nullable/FIRST fixpoints the LR construction consumes.
#[derive(Debug)]
pub struct Grammar {
    pool: SymbolPool,
    rules: Vec<Rule>,
    rules_by_lhs: BTreeMap<Symbol, Vec<usize>>,
    start: Symbol,
    nullable: BTreeSet<Symbol>,
    first: BTreeMap<Symbol, BTreeSet<Symbol>>,
}

impl Grammar {
    pub fn from_config(config: &ParserConfig) -> Result<Self, GrammarError> {
        let pool = SymbolPool::new(
            config.terminal_symbols.iter().map(|(name, _)| name),
            config.nonterminal_symbols.iter(),
        )?;
        Grammar::new(pool, &config.start_symbol, &config.production_rules)
    }

    /// Parses `"LHS -> s1 s2 ... sk"` rule strings, prepends the
    /// augmentation `_S -> start` as rule 0 and runs the nullable and FIRST
    /// fixpoints. Rule ids are assigned in registration order.
    pub fn new<R: AsRef<str>>(
        pool: SymbolPool,
        start_name: &str,
        rule_strings: &[R],
    ) -> Result<Self, GrammarError> {
        let user_start = pool.get_non_terminal(start_name)?;
        let start = pool.start_symbol();

        let mut rules = vec![Rule {
            id: 0,
            lhs: start,
            rhs: vec![user_start],
        }];
        for rule_string in rule_strings {
            let rule_string = rule_string.as_ref();
            let (lhs, rhs) =
                rule_string
                    .split_once("->")
                    .ok_or_else(|| GrammarError::InvalidRule {
                        rule: rule_string.to_string(),
                    })?;
            let lhs = pool.get_non_terminal(lhs.trim())?;
            let rhs = rhs
                .split_whitespace()
                .map(|name| pool.get_symbol(name))
                .collect::<Result<Vec<Symbol>, SymbolError>>()?;
            if rhs.is_empty() {
                return Err(GrammarError::InvalidRule {
                    rule: rule_string.to_string(),
                });
            }
            rules.push(Rule {
                id: rules.len(),
                lhs,
                rhs,
            });
        }

        let mut rules_by_lhs: BTreeMap<Symbol, Vec<usize>> = BTreeMap::new();
        for rule in &rules {
            rules_by_lhs.entry(rule.lhs).or_default().push(rule.id);
        }

        let nullable = compute_nullable(&rules);
        let first = compute_first(&pool, &rules);

        Ok(Grammar {
            pool,
            rules,
            rules_by_lhs,
            start,
            nullable,
            first,
        })
    }

    pub fn symbol_pool(&self) -> &SymbolPool {
        &self.pool
    }

    /// The augmented start symbol `_S`.
    pub fn start_symbol(&self) -> Symbol {
        self.start
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: usize) -> &Rule {
        &self.rules[id]
    }

    pub fn rules_for(&self, lhs: Symbol) -> &[usize] {
        self.rules_by_lhs
            .get(&lhs)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_nullable(&self, symbol: Symbol) -> bool {
        self.nullable.contains(&symbol)
    }

    pub fn first(&self, symbol: Symbol) -> &BTreeSet<Symbol> {
        &self.first[&symbol]
    }

    /// FIRST of a sentential sequence, for closure lookaheads: accumulates
    /// terminal FIRSTs across the nullable prefix. The empty-string marker
    /// never appears in the result.
    pub fn first_of_sequence(&self, symbols: &[Symbol]) -> BTreeSet<Symbol> {
        let mut head = BTreeSet::new();
        for &symbol in symbols {
            match symbol {
                Symbol::NonTerminal(_) => {
                    head.extend(self.first[&symbol].iter().copied());
                    if !self.nullable.contains(&symbol) {
                        break;
                    }
                }
                _ => {
                    head.insert(symbol);
                    if symbol != Symbol::Epsilon {
                        break;
                    }
                }
            }
        }
        head.remove(&Symbol::Epsilon);
        head
    }
}

fn compute_nullable(rules: &[Rule]) -> BTreeSet<Symbol> {
    let mut nullable = BTreeSet::from([Symbol::Epsilon]);
    loop {
        let size = nullable.len();
        for rule in rules {
            if rule.rhs.iter().all(|symbol| nullable.contains(symbol)) {
                nullable.insert(rule.lhs);
            }
        }
        if nullable.len() == size {
            break;
        }
    }
    nullable
}

fn compute_first(pool: &SymbolPool, rules: &[Rule]) -> BTreeMap<Symbol, BTreeSet<Symbol>> {
    let mut first: BTreeMap<Symbol, BTreeSet<Symbol>> = BTreeMap::new();
    for terminal in pool
        .terminals()
        .chain([Symbol::Epsilon, Symbol::End])
    {
        first.insert(terminal, BTreeSet::from([terminal]));
    }
    for non_terminal in pool.non_terminals() {
        first.insert(non_terminal, BTreeSet::new());
    }
    // repeat until no more insertions occur
    loop {
        let mut inserted_any = false;
        for rule in rules {
            let mut additions = BTreeSet::new();
            let mut add_epsilon = true;
            for symbol in &rule.rhs {
                let symbol_first = &first[symbol];
                additions.extend(
                    symbol_first
                        .iter()
                        .copied()
                        .filter(|s| *s != Symbol::Epsilon),
                );
                if !symbol_first.contains(&Symbol::Epsilon) {
                    add_epsilon = false;
                    break;
                }
            }
            if add_epsilon {
                additions.insert(Symbol::Epsilon);
            }
            let lhs_first = first.get_mut(&rule.lhs).unwrap();
            for symbol in additions {
                let was_inserted = lhs_first.insert(symbol);
                inserted_any = inserted_any || was_inserted;
            }
        }
        if !inserted_any {
            break;
        }
    }
    first
}
