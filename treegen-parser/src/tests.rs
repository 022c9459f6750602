use std::collections::BTreeSet;

use treegen_symbol::{Symbol, SymbolPool, Token};

use crate::{
    grammar::{Grammar, GrammarError},
    parser::{ParseError, Parser},
    tree::write_tree_dot,
};

fn grammar(
    terminals: &[&str],
    non_terminals: &[&str],
    start: &str,
    rules: &[&str],
) -> Grammar {
    let pool = SymbolPool::new(terminals.iter(), non_terminals.iter()).unwrap();
    Grammar::new(pool, start, rules).unwrap()
}

fn token(grammar: &Grammar, name: &str, value: &str) -> Token {
    Token::new(value, grammar.symbol_pool().get_terminal(name).unwrap())
}

fn first_names(grammar: &Grammar, name: &str) -> BTreeSet<String> {
    let symbol = grammar.symbol_pool().get_non_terminal(name).unwrap();
    grammar
        .first(symbol)
        .iter()
        .map(|s| grammar.symbol_pool().name(*s).to_string())
        .collect()
}

fn names(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_nullable_and_first_fixpoints() {
    let grammar = grammar(
        &["a", "b", "c", "d", "g"],
        &["A", "B", "C", "D", "E"],
        "A",
        &[
            "A -> B C D",
            "A -> g E",
            "B -> b",
            "B -> null",
            "C -> c",
            "C -> D a",
            "D -> d",
            "D -> null",
            "E -> c",
            "E -> g E",
        ],
    );
    let pool = grammar.symbol_pool();

    for (name, nullable) in [("A", false), ("B", true), ("C", false), ("D", true), ("E", false)] {
        let symbol = pool.get_non_terminal(name).unwrap();
        assert_eq!(grammar.is_nullable(symbol), nullable, "nullable({})", name);
    }

    assert_eq!(first_names(&grammar, "A"), names(&["a", "b", "c", "d", "g"]));
    assert_eq!(first_names(&grammar, "B"), names(&["b", "null"]));
    assert_eq!(first_names(&grammar, "C"), names(&["a", "c", "d"]));
    assert_eq!(first_names(&grammar, "D"), names(&["d", "null"]));
    assert_eq!(first_names(&grammar, "E"), names(&["c", "g"]));
    assert_eq!(first_names(&grammar, "_S"), names(&["a", "b", "c", "d", "g"]));
}

#[test]
fn test_terminal_first_is_singleton_self() {
    let grammar = grammar(&["a", "b"], &["S"], "S", &["S -> a b"]);
    for terminal in grammar
        .symbol_pool()
        .terminals()
        .chain([Symbol::Epsilon, Symbol::End])
    {
        let first = grammar.first(terminal);
        assert_eq!(first.len(), 1);
        assert!(first.contains(&terminal));
    }
}

#[test]
fn test_first_of_sequence_drops_the_empty_marker() {
    let grammar = grammar(
        &["b", "d", "x"],
        &["B", "D"],
        "B",
        &["B -> b", "B -> null", "D -> d", "D -> null"],
    );
    let pool = grammar.symbol_pool();
    let b = pool.get_non_terminal("B").unwrap();
    let d = pool.get_non_terminal("D").unwrap();
    let x = pool.get_terminal("x").unwrap();

    let head = grammar.first_of_sequence(&[b, d]);
    assert!(!head.contains(&Symbol::Epsilon));
    assert_eq!(
        head,
        BTreeSet::from([pool.get_terminal("b").unwrap(), pool.get_terminal("d").unwrap()])
    );
    // the nullable prefix exposes the trailing terminal
    let head = grammar.first_of_sequence(&[b, x]);
    assert!(head.contains(&x));
}

#[test]
fn test_rules_are_registered_in_order() {
    let grammar = grammar(&["a"], &["S"], "S", &["S -> a", "S -> a S"]);
    let ids: Vec<usize> = grammar.rules().iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(grammar.rule(0).lhs(), grammar.start_symbol());
    assert_eq!(
        grammar.rule(0).rhs(),
        &[grammar.symbol_pool().get_non_terminal("S").unwrap()]
    );
}

#[test]
fn test_unknown_symbol_in_rule() {
    let pool = SymbolPool::new(["a"], ["S"]).unwrap();
    let error = Grammar::new(pool, "S", &["S -> a X"]).unwrap_err();
    assert!(matches!(error, GrammarError::Symbol(_)));
}

#[test]
fn test_rule_without_arrow() {
    let pool = SymbolPool::new(["a"], ["S"]).unwrap();
    let error = Grammar::new(pool, "S", &["S a"]).unwrap_err();
    assert_eq!(
        error,
        GrammarError::InvalidRule {
            rule: "S a".to_string()
        }
    );
}

fn arithmetic_grammar() -> Grammar {
    grammar(
        &["num", "add", "sub", "mul", "div", "lp", "rp"],
        &["E", "T", "F"],
        "E",
        &[
            "E -> E add T",
            "E -> E sub T",
            "E -> T",
            "T -> T mul F",
            "T -> T div F",
            "T -> F",
            "F -> lp E rp",
            "F -> num",
        ],
    )
}

#[test]
fn test_parse_arithmetic_expression() {
    let grammar = arithmetic_grammar();
    let parser = Parser::new(&grammar).unwrap();
    let input = [
        ("num", "3"),
        ("mul", "*"),
        ("lp", "("),
        ("num", "6"),
        ("add", "+"),
        ("lp", "("),
        ("num", "4"),
        ("div", "/"),
        ("num", "2"),
        ("rp", ")"),
        ("sub", "-"),
        ("num", "5"),
        ("rp", ")"),
        ("add", "+"),
        ("num", "8"),
    ];
    let tokens: Vec<Token> = input
        .iter()
        .map(|(name, value)| token(&grammar, name, value))
        .collect();
    let tree = parser.parse(&tokens).unwrap();

    // the left spine under the augmented start is _S -> E -> E add T
    assert_eq!(tree.token().value(), "_S");
    assert_eq!(tree.children().len(), 1);
    let expression = &tree.children()[0];
    assert_eq!(expression.token().value(), "E");
    assert_eq!(expression.children().len(), 3);
    assert_eq!(expression.children()[0].token().value(), "E");
    assert_eq!(expression.children()[1].token().value(), "+");
    assert_eq!(expression.children()[2].token().value(), "T");

    let leaves: Vec<&str> = tree.leaves().iter().map(|t| t.value()).collect();
    assert_eq!(
        leaves,
        vec!["3", "*", "(", "6", "+", "(", "4", "/", "2", ")", "-", "5", ")", "+", "8"]
    );
}

#[test]
fn test_parse_round_trips_terminal_only_rules() {
    let grammar = grammar(&["a", "b", "c"], &["S"], "S", &["S -> a b c"]);
    let parser = Parser::new(&grammar).unwrap();
    let tokens = vec![
        token(&grammar, "a", "a"),
        token(&grammar, "b", "b"),
        token(&grammar, "c", "c"),
    ];
    let tree = parser.parse(&tokens).unwrap();
    let leaves: Vec<Token> = tree.leaves().into_iter().cloned().collect();
    assert_eq!(leaves, tokens);
}

#[test]
fn test_parse_epsilon_rule_produces_childless_node() {
    let grammar = grammar(
        &["a", "b"],
        &["A", "B"],
        "A",
        &["A -> a B", "B -> b", "B -> null"],
    );
    let parser = Parser::new(&grammar).unwrap();

    let tree = parser.parse(&[token(&grammar, "a", "a")]).unwrap();
    let a_node = &tree.children()[0];
    assert_eq!(a_node.token().value(), "A");
    assert_eq!(a_node.children().len(), 2);
    assert_eq!(a_node.children()[1].token().value(), "B");
    assert!(a_node.children()[1].children().is_empty());
    let leaves: Vec<&str> = tree.leaves().iter().map(|t| t.value()).collect();
    assert_eq!(leaves, vec!["a"]);

    let tree = parser
        .parse(&[token(&grammar, "a", "a"), token(&grammar, "b", "b")])
        .unwrap();
    let leaves: Vec<&str> = tree.leaves().iter().map(|t| t.value()).collect();
    assert_eq!(leaves, vec!["a", "b"]);
}

#[test]
fn test_unexpected_token_reports_position() {
    let grammar = arithmetic_grammar();
    let parser = Parser::new(&grammar).unwrap();
    let tokens = vec![
        token(&grammar, "num", "1"),
        token(&grammar, "add", "+"),
        token(&grammar, "rp", ")"),
    ];
    assert_eq!(
        parser.parse(&tokens),
        Err(ParseError::UnexpectedToken {
            symbol: "rp".to_string(),
            value: ")".to_string(),
            position: 2,
        })
    );
    // an exhausted stream synthesizes the end marker
    assert_eq!(
        parser.parse(&tokens[..2]),
        Err(ParseError::UnexpectedToken {
            symbol: "$".to_string(),
            value: "$".to_string(),
            position: 2,
        })
    );
}

#[test]
fn test_tree_dot_rendering() {
    let grammar = grammar(&["a"], &["S"], "S", &["S -> a"]);
    let parser = Parser::new(&grammar).unwrap();
    let tree = parser.parse(&[token(&grammar, "a", "a")]).unwrap();
    let mut rendered = Vec::new();
    write_tree_dot(&tree, grammar.symbol_pool(), &mut rendered).unwrap();
    let rendered = String::from_utf8(rendered).unwrap();
    assert!(rendered.starts_with("digraph {"));
    assert!(rendered.contains("label=\"_S\""));
    assert!(rendered.contains("label=\"S\""));
    assert!(rendered.contains("shape=box"));
}
