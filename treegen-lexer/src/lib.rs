mod lexer;
mod regex;

pub use lexer::{Lexer, LexerError};
pub use regex::{
    scan_pattern, Fragment, RegexCompiler, RegexError, RegexOp, META_NON_TERMINALS,
    META_RULES, META_START, META_TERMINALS,
};

#[cfg(test)]
mod tests;
