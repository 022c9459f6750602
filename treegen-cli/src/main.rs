use std::{fs, io::Read, path::PathBuf};

use clap::Parser;
use log::info;
use treegen::{output_table, parse_config, write_dfa_dot, write_tree_dot, Grammar, Lexer};

#[derive(Parser, Debug)]
#[command(author, version, about = "Parse an input with a declarative grammar", long_about = None)]
struct CommandLine {
    #[arg(required = true, help = "The grammar configuration document")]
    config: PathBuf,
    #[arg(help = "The input to parse; stdin when omitted")]
    input: Option<PathBuf>,
    #[arg(long, help = "Print the token listing")]
    tokens: bool,
    #[arg(long, help = "Print the action/goto table")]
    table: bool,
    #[arg(long, help = "Write the parse tree as Graphviz dot to this path")]
    tree: Option<PathBuf>,
    #[arg(long, help = "Write the lexer DFA as Graphviz dot to this path")]
    dfa: Option<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")?.start()?;
    let cli = CommandLine::parse();

    let document = fs::read_to_string(&cli.config)?;
    let config = parse_config(&document)?;
    let grammar = Grammar::from_config(&config)?;
    let lexer = Lexer::new(&config, grammar.symbol_pool())?;
    let parser = treegen::Parser::new(&grammar)?;

    if cli.table {
        output_table(&grammar, parser.table(), &mut std::io::stdout())?;
    }
    if let Some(path) = &cli.dfa {
        let mut file = fs::File::create(path)?;
        write_dfa_dot(lexer.dfa(), &mut file)?;
        info!("wrote lexer dfa to {}", path.display());
    }

    let text = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let tokens = lexer.tokenize(text.trim_end())?;
    if cli.tokens {
        let pool = grammar.symbol_pool();
        for (index, token) in tokens.iter().enumerate() {
            println!("{:>4}  {:<16} {}", index + 1, pool.name(token.symbol()), token.value());
        }
    }

    let tree = parser.parse(&tokens)?;
    if let Some(path) = &cli.tree {
        let mut file = fs::File::create(path)?;
        write_tree_dot(&tree, grammar.symbol_pool(), &mut file)?;
        info!("wrote parse tree to {}", path.display());
    }
    println!(
        "parsed {} tokens into a tree with {} leaves",
        tokens.len(),
        tree.leaves().len()
    );
    Ok(())
}
