use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    io::Write,
};

use log::debug;
use treegen_symbol::Symbol;

use crate::grammar::{ConflictKind, Grammar, GrammarError};

mod item;

use item::Item;


type ItemSet = BTreeSet<Item>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(usize),
    Goto(usize),
    Reduce(usize),
    Accept(usize),
}

impl Action {
    fn is_shift(&self) -> bool {
        matches!(self, Action::Shift(_) | Action::Goto(_))
    }
}

/// The canonical LR(1) action/goto table: one transition per populated
/// `(state, symbol)` cell, conflicts rejected during construction.
#[derive(Debug)]
pub struct ParseTable {
    actions: Vec<BTreeMap<Symbol, Action>>,
}

impl ParseTable {
    pub fn build(grammar: &Grammar) -> Result<ParseTable, GrammarError> {
        let start = grammar.start_symbol();
        let kernel: ItemSet = grammar
            .rules_for(start)
            .iter()
            .map(|&rule| Item::new(rule, Symbol::End))
            .collect();
        let start_set = closure(grammar, kernel);

        let mut sets: Vec<ItemSet> = vec![start_set.clone()];
        let mut ids: BTreeMap<ItemSet, usize> = BTreeMap::from([(start_set, 0)]);
        let mut actions: Vec<BTreeMap<Symbol, Action>> = vec![BTreeMap::new()];

        let mut queue = VecDeque::from([0usize]);
        while let Some(id) = queue.pop_front() {
            let item_set = sets[id].clone();
            let mut successors: BTreeMap<Symbol, ItemSet> = BTreeMap::new();
            for item in &item_set {
                match item.next_symbol(grammar) {
                    None => {
                        let rule = grammar.rule(item.rule());
                        let action = if rule.lhs() == start && item.lookahead() == Symbol::End {
                            Action::Accept(item.rule())
                        } else {
                            Action::Reduce(item.rule())
                        };
                        insert_action(grammar, &mut actions[id], id, item.lookahead(), action)?;
                    }
                    Some(next) => {
                        successors.entry(next).or_default().insert(item.advanced());
                    }
                }
            }
            for (symbol, kernel) in successors {
                let target_set = closure(grammar, kernel);
                let target = match ids.get(&target_set) {
                    Some(target) => *target,
                    None => {
                        let target = sets.len();
                        sets.push(target_set.clone());
                        ids.insert(target_set, target);
                        actions.push(BTreeMap::new());
                        queue.push_back(target);
                        target
                    }
                };
                let action = if symbol.is_terminal() {
                    Action::Shift(target)
                } else {
                    Action::Goto(target)
                };
                insert_action(grammar, &mut actions[id], id, symbol, action)?;
            }
        }
        debug!(
            "built canonical LR(1) table: {} states for {} rules",
            sets.len(),
            grammar.rules().len()
        );
        Ok(ParseTable { actions })
    }

    pub fn action(&self, state: usize, symbol: Symbol) -> Option<Action> {
        self.actions.get(state)?.get(&symbol).copied()
    }

    pub fn state_count(&self) -> usize {
        self.actions.len()
    }
}

fn insert_action(
    grammar: &Grammar,
    cells: &mut BTreeMap<Symbol, Action>,
    state: usize,
    symbol: Symbol,
    action: Action,
) -> Result<(), GrammarError> {
    if let Some(existing) = cells.insert(symbol, action) {
        let kind = match (existing.is_shift(), action.is_shift()) {
            (true, true) => ConflictKind::ShiftShift,
            (false, false) => ConflictKind::ReduceReduce,
            _ => ConflictKind::ShiftReduce,
        };
        return Err(GrammarError::Conflict {
            kind,
            state,
            symbol: grammar.symbol_pool().name(symbol).to_string(),
        });
    }
    Ok(())
}

/// LR(1) closure: for every item with a nonterminal behind the dot, add
/// items for that nonterminal's rules under every lookahead in
/// FIRST(suffix · lookahead).
fn closure(grammar: &Grammar, kernel: ItemSet) -> ItemSet {
    let mut set = kernel;
    let mut queue: Vec<Item> = set.iter().copied().collect();
    while let Some(item) = queue.pop() {
        let next = match item.next_symbol(grammar) {
            Some(symbol) => symbol,
            None => continue,
        };
        if let Symbol::NonTerminal(_) = next {
            let mut sequence: Vec<Symbol> = item.following_symbols(grammar).to_vec();
            sequence.push(item.lookahead());
            let lookaheads = grammar.first_of_sequence(&sequence);
            for &rule in grammar.rules_for(next) {
                for &lookahead in &lookaheads {
                    let new_item = Item::new(rule, lookahead);
                    if set.insert(new_item) {
                        queue.push(new_item);
                    }
                }
            }
        }
    }
    set
}

/// Writes the rule listing and the action/goto grid: `s#` shift, `r#`
/// reduce, `g#` goto, `acc` accept.
pub fn output_table(
    grammar: &Grammar,
    table: &ParseTable,
    output: &mut dyn Write,
) -> std::io::Result<()> {
    writeln!(output, "Rules:")?;
    for rule in grammar.rules() {
        writeln!(output, "{}: {}", rule.id(), rule.display(grammar))?;
    }
    writeln!(output)?;

    let pool = grammar.symbol_pool();
    let symbols: Vec<Symbol> = pool
        .terminals()
        .chain([Symbol::End])
        .chain(pool.non_terminals())
        .collect();

    let cell = |state: usize, symbol: Symbol| match table.action(state, symbol) {
        Some(Action::Shift(target)) => format!("s{}", target),
        Some(Action::Goto(target)) => format!("g{}", target),
        Some(Action::Reduce(rule)) => format!("r{}", rule),
        Some(Action::Accept(_)) => "acc".to_string(),
        None => String::new(),
    };
    let widths: Vec<usize> = symbols
        .iter()
        .map(|&symbol| {
            (0..table.state_count())
                .map(|state| cell(state, symbol).len())
                .chain([pool.name(symbol).len()])
                .max()
                .unwrap_or(0)
        })
        .collect();
    let state_width = format!("{}", table.state_count()).len();

    write!(output, "{: >width$}", "", width = state_width)?;
    for (i, &symbol) in symbols.iter().enumerate() {
        write!(output, "|{: <width$}", pool.name(symbol), width = widths[i])?;
    }
    writeln!(output, "|")?;
    for state in 0..table.state_count() {
        write!(output, "{: >width$}", state, width = state_width)?;
        for (i, &symbol) in symbols.iter().enumerate() {
            write!(output, "|{: <width$}", cell(state, symbol), width = widths[i])?;
        }
        writeln!(output, "|")?;
    }
    Ok(())
}
