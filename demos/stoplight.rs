use clap::Parser;

use ltl_rs::checker::{model_path, Checker, CheckerConfig};
use ltl_rs::formula::Ltl;
use ltl_rs::parser::parse;
use ltl_rs::reach::count_states;
use ltl_rs::stoplight::Stoplight;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Formula whose accepting runs to look for.
    #[arg(value_name = "LTL", default_value = "not (globally finally green)")]
    formula: String,

    /// Explore stubborn sets only.
    #[clap(long)]
    por: bool,

    /// Formula table size (in bits, so the actual size is `2^size` buckets).
    #[clap(long, value_name = "INT", default_value = "10")]
    size: usize,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();
    println!("args = {:?}", args);

    let ltl = Ltl::new(args.size);
    let formula = parse(&ltl, &args.formula)?;
    println!("formula = {}", ltl.display(formula));

    let checker = Checker::new(CheckerConfig { reduction: args.por });

    for (name, model) in [("regular", Stoplight::regular()), ("eco-friendly", Stoplight::eco())] {
        println!();
        println!("# {} stoplight ({} states)", name, count_states(&model));

        let time_check = std::time::Instant::now();
        let found = checker.find(&ltl, formula, &model);
        let time_check = time_check.elapsed();

        match found {
            None => println!("no cycle"),
            Some(trace) => {
                for (i, (light, state)) in model_path(&trace).iter().zip(&trace.path).enumerate() {
                    let mark = if i == trace.cycle_start { " <- cycle" } else { "" };
                    println!("{} {:?} {}{}", i, light, state, mark);
                }
            }
        }
        println!("Checked in {:.3} s", time_check.as_secs_f64());
    }

    Ok(())
}
