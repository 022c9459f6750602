use std::{error::Error, fmt::Display};

use treegen_automaton::{charset, Nfa, StateId};
use treegen_parser::{Action, Grammar, GrammarError, ParseTable};
use treegen_symbol::{Symbol, SymbolError, SymbolPool, Token, END_SYMBOL_NAME};

pub const META_TERMINALS: [&str; 11] =
    ["|", "(", ")", "*", "+", "[", "]", "-", "char", "^", "."];
pub const META_NON_TERMINALS: [&str; 5] = ["E", "T", "F", "P", "Px"];
pub const META_START: &str = "E";

/// The regex sub-grammar in declaration order, each rule paired with the
/// semantic operation its reduction applies. The order is load-bearing:
/// rule ids index this table (offset by the augmentation rule 0).
pub const META_RULES: [(&str, RegexOp); 15] = [
    ("E -> E | T", RegexOp::Alternate),
    ("E -> T", RegexOp::Passthrough),
    ("T -> T F", RegexOp::Concat),
    ("T -> F", RegexOp::Passthrough),
    ("F -> ( E )", RegexOp::Group),
    ("F -> F *", RegexOp::Star),
    ("F -> F +", RegexOp::Plus),
    ("F -> P", RegexOp::Passthrough),
    ("P -> .", RegexOp::AnyChar),
    ("P -> char", RegexOp::Literal),
    ("P -> char - char", RegexOp::Range),
    ("Px -> Px P", RegexOp::Join),
    ("Px -> P", RegexOp::Passthrough),
    ("F -> [ Px ]", RegexOp::Set),
    ("F -> [ ^ Px ]", RegexOp::NegatedSet),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexOp {
    Alternate,
    Passthrough,
    Concat,
    Group,
    Star,
    Plus,
    AnyChar,
    Literal,
    Range,
    Join,
    Set,
    NegatedSet,
}

#[derive(Debug, PartialEq)]
pub enum RegexError {
    InvalidPattern { pattern: String },
    Symbol(SymbolError),
}

impl Error for RegexError {}

impl Display for RegexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegexError::InvalidPattern { pattern } => write!(f, "invalid regex: {}", pattern),
            RegexError::Symbol(error) => write!(f, "{}", error),
        }
    }
}

impl From<SymbolError> for RegexError {
    fn from(error: SymbolError) -> Self {
        RegexError::Symbol(error)
    }
}

/// Lexes a pattern into regex tokens: metacharacters become terminals of
/// the same name, everything else a `char`. Escapes turn metacharacters
/// into plain `char`s and `\r \n \t \f \\` into the control character.
pub fn scan_pattern(pool: &SymbolPool, pattern: &str) -> Result<Vec<Token>, RegexError> {
    let invalid = || RegexError::InvalidPattern {
        pattern: pattern.to_string(),
    };
    let char_terminal = pool.get_terminal("char")?;
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().ok_or_else(invalid)?;
                let value = match escaped {
                    '|' | '(' | ')' | '*' | '+' | '[' | ']' | '-' | '^' | '.' => escaped,
                    'r' => '\r',
                    'n' => '\n',
                    't' => '\t',
                    'f' => '\u{c}',
                    '\\' => '\\',
                    _ => return Err(invalid()),
                };
                tokens.push(Token::new(value.to_string(), char_terminal));
            }
            '|' | '(' | ')' | '*' | '+' | '[' | ']' | '-' | '^' | '.' => {
                tokens.push(Token::new(c.to_string(), pool.get_terminal(&c.to_string())?));
            }
            _ => tokens.push(Token::new(c.to_string(), char_terminal)),
        }
    }
    Ok(tokens)
}

/// A Thompson sub-automaton inside a shared arena.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub start: StateId,
    pub ends: Vec<StateId>,
}

/// Compiles patterns by driving the LR table of the regex meta-grammar
/// with a fragment stack: each reduction applies its rule's [`RegexOp`] to
/// the popped children and pushes the built fragment.
pub struct RegexCompiler {
    grammar: Grammar,
    table: ParseTable,
    ops: Vec<RegexOp>,
}

impl RegexCompiler {
    pub fn new() -> Result<Self, GrammarError> {
        let pool = SymbolPool::new(META_TERMINALS, META_NON_TERMINALS)?;
        let rule_strings: Vec<&str> = META_RULES.iter().map(|(rule, _)| *rule).collect();
        let grammar = Grammar::new(pool, META_START, &rule_strings)?;
        let table = ParseTable::build(&grammar)?;
        let ops = META_RULES.iter().map(|(_, op)| *op).collect();
        Ok(RegexCompiler {
            grammar,
            table,
            ops,
        })
    }

    pub fn symbol_pool(&self) -> &SymbolPool {
        self.grammar.symbol_pool()
    }

    /// Builds the pattern's NFA inside `nfa` and returns its fragment. The
    /// caller owns marking the fragment's end states as accepting.
    pub fn compile(&self, nfa: &mut Nfa, pattern: &str) -> Result<Fragment, RegexError> {
        let invalid = || RegexError::InvalidPattern {
            pattern: pattern.to_string(),
        };
        let pool = self.grammar.symbol_pool();
        let tokens = scan_pattern(pool, pattern)?;
        let end_token = Token::new(END_SYMBOL_NAME, Symbol::End);

        let mut state_stack = vec![0usize];
        let mut frame_stack: Vec<(Token, Option<Fragment>)> = Vec::new();
        let mut position = 0;
        loop {
            let token = tokens.get(position).unwrap_or(&end_token);
            // the state stack always keeps its seed entry
            let state = *state_stack.last().unwrap();
            let action = self
                .table
                .action(state, token.symbol())
                .ok_or_else(invalid)?;
            match action {
                Action::Shift(target) => {
                    state_stack.push(target);
                    frame_stack.push((token.clone(), None));
                    position += 1;
                }
                Action::Reduce(rule_id) => {
                    let rule = self.grammar.rule(rule_id);
                    let count = rule.rhs().len();
                    let children = frame_stack.split_off(frame_stack.len() - count);
                    state_stack.truncate(state_stack.len() - count);
                    // rule 0 is the augmentation and only ever accepts
                    let fragment = apply(self.ops[rule_id - 1], nfa, children);
                    let lhs = rule.lhs();
                    let uncovered = *state_stack.last().unwrap();
                    match self.table.action(uncovered, lhs) {
                        Some(Action::Goto(target)) => state_stack.push(target),
                        _ => return Err(invalid()),
                    }
                    frame_stack.push((Token::new(pool.name(lhs), lhs), Some(fragment)));
                }
                Action::Accept(_) => {
                    return frame_stack
                        .pop()
                        .and_then(|(_, fragment)| fragment)
                        .ok_or_else(invalid);
                }
                Action::Goto(_) => return Err(invalid()),
            }
        }
    }
}

/// One Thompson construction step per reduced rule.
fn apply(op: RegexOp, nfa: &mut Nfa, children: Vec<(Token, Option<Fragment>)>) -> Fragment {
    let mut tokens = Vec::new();
    let mut fragments = Vec::new();
    for (token, fragment) in children {
        tokens.push(token);
        if let Some(fragment) = fragment {
            fragments.push(fragment);
        }
    }
    match op {
        RegexOp::Passthrough | RegexOp::Group | RegexOp::Set => {
            // these rule shapes carry exactly one child fragment
            fragments.pop().unwrap()
        }
        RegexOp::Alternate | RegexOp::Join => {
            let start = nfa.add_state();
            let end = nfa.add_state();
            for fragment in &fragments {
                nfa.add_epsilon(start, fragment.start);
                for &fragment_end in &fragment.ends {
                    nfa.add_epsilon(fragment_end, end);
                }
            }
            Fragment {
                start,
                ends: vec![end],
            }
        }
        RegexOp::Concat => {
            let right = fragments.pop().unwrap();
            let left = fragments.pop().unwrap();
            for &left_end in &left.ends {
                nfa.add_epsilon(left_end, right.start);
            }
            Fragment {
                start: left.start,
                ends: right.ends,
            }
        }
        RegexOp::Star | RegexOp::Plus => {
            let inner = fragments.pop().unwrap();
            let start = nfa.add_state();
            let end = nfa.add_state();
            nfa.add_epsilon(start, inner.start);
            if op == RegexOp::Star {
                nfa.add_epsilon(start, end);
            }
            for &inner_end in &inner.ends {
                nfa.add_epsilon(inner_end, inner.start);
                nfa.add_epsilon(inner_end, end);
            }
            Fragment {
                start,
                ends: vec![end],
            }
        }
        RegexOp::AnyChar => {
            let start = nfa.add_state();
            let target = nfa.add_state();
            for c in charset() {
                nfa.add_transition(start, target, c);
            }
            Fragment {
                start,
                ends: vec![target],
            }
        }
        RegexOp::Literal => {
            let start = nfa.add_state();
            let target = nfa.add_state();
            // the scanner emits single-character values
            let c = tokens[0].value().chars().next().unwrap();
            nfa.add_transition(start, target, c);
            Fragment {
                start,
                ends: vec![target],
            }
        }
        RegexOp::Range => {
            let start = nfa.add_state();
            let target = nfa.add_state();
            let low = tokens[0].value().chars().next().unwrap() as u32;
            let high = tokens[2].value().chars().next().unwrap() as u32;
            for code in low..=high {
                if let Some(c) = char::from_u32(code) {
                    nfa.add_transition(start, target, c);
                }
            }
            Fragment {
                start,
                ends: vec![target],
            }
        }
        RegexOp::NegatedSet => {
            let inner = fragments.pop().unwrap();
            // the member characters sit behind the ε-edges the Px unions
            // introduced, so read them from the closure of the inner start
            let members = nfa.closure_inputs(inner.start);
            let start = nfa.add_state();
            let target = nfa.add_state();
            for c in charset().filter(|c| !members.contains(c)) {
                nfa.add_transition(start, target, c);
            }
            Fragment {
                start,
                ends: vec![target],
            }
        }
    }
}
