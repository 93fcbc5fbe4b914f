use clap::Parser;

use ltl_rs::automaton::Automaton;
use ltl_rs::dot::DotConfig;
use ltl_rs::formula::Ltl;
use ltl_rs::parser::parse;

/// Draw the Büchi automaton of an LTL formula as a DOT graph.
#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Formula to translate.
    #[arg(value_name = "LTL")]
    formula: String,

    /// Do not label edges with guards.
    #[clap(long)]
    no_edge_labels: bool,

    /// Write the graph to a file instead of stdout.
    #[clap(short, long, value_name = "FILE")]
    output: Option<std::path::PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();

    let ltl = Ltl::default();
    let formula = parse(&ltl, &args.formula)?;
    let automaton = Automaton::from_ltl(&ltl, formula);

    let config = DotConfig {
        edge_labels: !args.no_edge_labels,
        ..DotConfig::default()
    };
    let dot = format!(
        "// {}\n// = {}\n{}",
        args.formula,
        ltl.display(formula),
        automaton.to_dot_with_config(&config)?
    );

    match args.output {
        Some(path) => std::fs::write(path, dot)?,
        None => print!("{}", dot),
    }

    Ok(())
}
