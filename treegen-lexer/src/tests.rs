use treegen_automaton::Nfa;
use treegen_input::ParserConfig;
use treegen_parser::{Parser, ParseTree};
use treegen_symbol::{SymbolPool, Token};

use crate::{
    lexer::{Lexer, LexerError},
    regex::{scan_pattern, RegexCompiler, RegexError, META_NON_TERMINALS, META_RULES,
        META_START, META_TERMINALS},
};

fn compile_single(pattern: &str) -> treegen_automaton::Dfa {
    let compiler = RegexCompiler::new().unwrap();
    let mut nfa = Nfa::new();
    let fragment = compiler.compile(&mut nfa, pattern).unwrap();
    for &end in &fragment.ends {
        nfa.add_accept(end, pattern);
    }
    nfa.to_dfa(fragment.start, &[pattern.to_string()])
}

#[test]
fn test_compile_and_match() {
    let pattern = "a+[bcd]ef*[g-j]k+";
    let dfa = compile_single(pattern);
    assert_eq!(dfa.longest_match("acehkd"), Some((pattern, 5)));
    assert_eq!(dfa.longest_match("efg"), None);
    assert_eq!(dfa.longest_match("aaadeffgkkkx"), Some((pattern, 11)));
}

#[test]
fn test_alternation_and_star() {
    let dfa = compile_single("(a|b)*abb");
    assert_eq!(dfa.longest_match("abb"), Some(("(a|b)*abb", 3)));
    assert_eq!(dfa.longest_match("abbbababbabb"), Some(("(a|b)*abb", 12)));
    assert_eq!(dfa.longest_match("abab"), None);
}

#[test]
fn test_escapes() {
    let dfa = compile_single("a\\+b");
    assert_eq!(dfa.longest_match("a+b"), Some(("a\\+b", 3)));
    assert_eq!(dfa.longest_match("aab"), None);

    let dfa = compile_single("\\t\\\\");
    assert_eq!(dfa.longest_match("\t\\x"), Some(("\\t\\\\", 2)));
}

#[test]
fn test_any_char_excludes_line_breaks() {
    let dfa = compile_single(".");
    assert_eq!(dfa.longest_match("z"), Some((".", 1)));
    assert_eq!(dfa.longest_match("\n"), None);
}

#[test]
fn test_char_set_and_negation() {
    let dfa = compile_single("[a-cx]");
    assert_eq!(dfa.longest_match("b"), Some(("[a-cx]", 1)));
    assert_eq!(dfa.longest_match("x"), Some(("[a-cx]", 1)));
    assert_eq!(dfa.longest_match("d"), None);

    let dfa = compile_single("[^a-c]");
    assert_eq!(dfa.longest_match("d"), Some(("[^a-c]", 1)));
    assert_eq!(dfa.longest_match("b"), None);
    assert_eq!(dfa.longest_match("\n"), None);
}

#[test]
fn test_invalid_patterns_are_rejected() {
    let compiler = RegexCompiler::new().unwrap();
    for pattern in ["a\\", "\\q", "*a", "(ab", "a|", "[abc"] {
        let mut nfa = Nfa::new();
        let error = compiler.compile(&mut nfa, pattern).unwrap_err();
        assert_eq!(
            error,
            RegexError::InvalidPattern {
                pattern: pattern.to_string()
            },
            "pattern {:?}",
            pattern
        );
    }
}

#[test]
fn test_scan_pattern_token_kinds() {
    let compiler = RegexCompiler::new().unwrap();
    let pool = compiler.symbol_pool();
    let tokens = scan_pattern(pool, "a\\.(.)").unwrap();
    let char_terminal = pool.get_terminal("char").unwrap();
    let values: Vec<&str> = tokens.iter().map(|t| t.value()).collect();
    assert_eq!(values, vec!["a", ".", "(", ".", ")"]);
    assert_eq!(tokens[0].symbol(), char_terminal);
    assert_eq!(tokens[1].symbol(), char_terminal);
    assert_eq!(tokens[2].symbol(), pool.get_terminal("(").unwrap());
    assert_eq!(tokens[3].symbol(), pool.get_terminal(".").unwrap());
}

fn tie_break_config() -> (ParserConfig, SymbolPool) {
    let config = ParserConfig {
        terminal_symbols: vec![
            ("AB2".to_string(), "ab".to_string()),
            ("ABC".to_string(), "abc".to_string()),
            ("A".to_string(), "a".to_string()),
            ("SPACE".to_string(), " ".to_string()),
        ],
        ignored_symbols: vec!["A".to_string(), "SPACE".to_string()],
        ..ParserConfig::default()
    };
    let pool = SymbolPool::new(
        config.terminal_symbols.iter().map(|(name, _)| name),
        std::iter::empty::<&str>(),
    )
    .unwrap();
    (config, pool)
}

#[test]
fn test_tokenize_with_priority_tie_break() {
    let (config, pool) = tie_break_config();
    let lexer = Lexer::new(&config, &pool).unwrap();
    let tokens = lexer.tokenize("aabaabc abaab").unwrap();
    let ab2 = pool.get_terminal("AB2").unwrap();
    let abc = pool.get_terminal("ABC").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::new("ab", ab2),
            Token::new("abc", abc),
            Token::new("ab", ab2),
            Token::new("ab", ab2),
        ]
    );
}

#[test]
fn test_tokenize_unexpected_character() {
    let (config, pool) = tie_break_config();
    let lexer = Lexer::new(&config, &pool).unwrap();
    assert_eq!(
        lexer.tokenize("ab!c"),
        Err(LexerError::UnexpectedCharacter {
            ch: '!',
            position: 2
        })
    );
}

#[test]
fn test_tokenize_keywords_before_identifiers() {
    let config = ParserConfig {
        terminal_symbols: vec![
            ("KEYWORD".to_string(), "int|return".to_string()),
            ("IDENT".to_string(), "[a-z]+".to_string()),
            ("INT".to_string(), "[0-9]+".to_string()),
            ("ASSIGN".to_string(), "=".to_string()),
            ("SEMI".to_string(), ";".to_string()),
            ("WS".to_string(), " +".to_string()),
        ],
        ignored_symbols: vec!["WS".to_string()],
        ..ParserConfig::default()
    };
    let pool = SymbolPool::new(
        config.terminal_symbols.iter().map(|(name, _)| name),
        std::iter::empty::<&str>(),
    )
    .unwrap();
    let lexer = Lexer::new(&config, &pool).unwrap();
    let tokens = lexer.tokenize("int abc = 42; return abc;").unwrap();
    let kinds: Vec<(&str, &str)> = tokens
        .iter()
        .map(|t| (pool.name(t.symbol()), t.value()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("KEYWORD", "int"),
            ("IDENT", "abc"),
            ("ASSIGN", "="),
            ("INT", "42"),
            ("SEMI", ";"),
            ("KEYWORD", "return"),
            ("IDENT", "abc"),
            ("SEMI", ";"),
        ]
    );
}

#[test]
fn test_lexer_surfaces_bad_pattern_with_name() {
    let config = ParserConfig {
        terminal_symbols: vec![("BROKEN".to_string(), "a\\".to_string())],
        ..ParserConfig::default()
    };
    let pool = SymbolPool::new(["BROKEN"], std::iter::empty::<&str>()).unwrap();
    let error = Lexer::new(&config, &pool).unwrap_err();
    assert_eq!(
        error,
        LexerError::Regex {
            name: "BROKEN".to_string(),
            error: RegexError::InvalidPattern {
                pattern: "a\\".to_string()
            }
        }
    );
}

fn find_starred_group<'tree>(tree: &'tree ParseTree) -> Option<&'tree ParseTree> {
    if tree.token().value() == "F"
        && tree.children().len() == 2
        && tree.children()[1].token().value() == "*"
    {
        return Some(&tree.children()[0]);
    }
    tree.children().iter().find_map(find_starred_group)
}

#[test]
fn test_meta_grammar_parsed_as_sentence() {
    let pool = SymbolPool::new(META_TERMINALS, META_NON_TERMINALS).unwrap();
    let rule_strings: Vec<&str> = META_RULES.iter().map(|(rule, _)| *rule).collect();
    let grammar = treegen_parser::Grammar::new(pool, META_START, &rule_strings).unwrap();
    let parser = Parser::new(&grammar).unwrap();
    let tokens = scan_pattern(grammar.symbol_pool(), "(a|b)*abb|ef").unwrap();
    let tree = parser.parse(&tokens).unwrap();

    assert_eq!(tree.token().value(), "_S");
    let alternation = &tree.children()[0];
    assert_eq!(alternation.token().value(), "E");
    assert_eq!(alternation.children().len(), 3);
    assert_eq!(alternation.children()[0].token().value(), "E");
    assert_eq!(alternation.children()[1].token().value(), "|");
    assert_eq!(alternation.children()[2].token().value(), "T");

    // every leaf is a regex token, in input order
    let frontier: String = tree.leaves().iter().map(|t| t.value()).collect();
    assert_eq!(frontier, "(a|b)*abb|ef");

    // the star attaches to the parenthesized alternation
    let starred = find_starred_group(&tree).unwrap();
    let starred_frontier: String = starred.leaves().iter().map(|t| t.value()).collect();
    assert_eq!(starred_frontier, "(a|b)");
}
