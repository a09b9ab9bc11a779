use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;

use gr1_bdd::Manager;
use gr1_bdd::ReorderPolicy;
use gr1_cli::VerbosityFlag;
use gr1_cli::Version;
use gr1_cli::VersionFlag;
use gr1_game::RealizabilityMode;
use gr1_game::compute_losing_positions;
use gr1_game::extract_counterstrategy;
use gr1_game::extract_explicit_strategy;
use gr1_game::extract_symbolic_strategy;
use gr1_game::format_json;
use gr1_game::format_symbolic_header;
use gr1_game::format_text;
use gr1_game::parse_specification;
use gr1_game::solve;
use gr1_utilities::Gr1Error;
use gr1_utilities::Timing;

#[derive(clap::Parser, Debug)]
#[command(about = "A GR(1) reactive synthesis tool", arg_required_else_help = true)]
struct Cli {
    #[command(flatten)]
    version: VersionFlag,

    #[command(flatten)]
    verbosity: VerbosityFlag,

    #[arg(long, global = true, help = "Print phase timings to stderr")]
    timings: bool,

    #[command(subcommand)]
    commands: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Synthesize(SynthesizeArgs),
}

/// Arguments for synthesizing a strategy (or counterstrategy) from a GR(1) specification.
#[derive(clap::Args, Debug)]
struct SynthesizeArgs {
    /// The specification file, in the section-headed prefix-notation format.
    filename: String,

    /// Use the "robotics" realizability quantifier pattern instead of the classical one.
    #[arg(long, default_value_t = false)]
    robotics: bool,

    /// Emit the extracted strategy as JSON instead of the textual block form.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Emit the symbolic strategy (a single BDD plus a descriptive header) instead of
    /// the explicit-state enumeration.
    #[arg(long, default_value_t = false)]
    symbolic: bool,

    /// Write the strategy to this file instead of standard output.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Inner node table capacity of the BDD manager.
    #[arg(long, default_value_t = 1 << 20)]
    node_capacity: usize,

    /// Apply-cache capacity of the BDD manager.
    #[arg(long, default_value_t = 1 << 18)]
    apply_cache_capacity: usize,
}

fn main() -> Result<ExitCode, Gr1Error> {
    let cli = Cli::parse();

    let timing = Timing::new();

    env_logger::Builder::new()
        .filter_level(cli.verbosity.log_level_filter())
        .parse_default_env()
        .init();

    if cli.version.into() {
        eprintln!("{}", Version);
        return Ok(ExitCode::SUCCESS);
    }

    let mut realizable = true;
    if let Some(command) = cli.commands {
        match command {
            Commands::Synthesize(args) => realizable = handle_synthesize(args, &timing)?,
        }
    }

    if cli.timings {
        timing.print();
    }

    eprintln!(
        "RESULT: Specification is {}.",
        if realizable { "realizable" } else { "unrealizable" }
    );

    Ok(ExitCode::SUCCESS)
}

/// Handle the `synthesize` subcommand. Returns the realizability verdict so
/// `main` can print the single-line result required of every run.
fn handle_synthesize(args: SynthesizeArgs, timing: &Timing) -> Result<bool, Gr1Error> {
    let manager = Manager::new(args.node_capacity, args.apply_cache_capacity, 1);
    let reorder = ReorderPolicy::new();

    let mut time_parse = timing.start("parse_specification");
    let file = File::open(&args.filename)?;
    let ctx = parse_specification(BufReader::new(file), &manager)?;
    time_parse.finish();

    let mode = if args.robotics { RealizabilityMode::Robotics } else { RealizabilityMode::Classical };

    let mut time_solve = timing.start("solve");
    let result = solve(&ctx, &manager, mode)?;
    time_solve.finish();

    let output = if result.realizable {
        if args.symbolic {
            let mut time_extract = timing.start("extract_symbolic_strategy");
            let strategy = extract_symbolic_strategy(&ctx, &manager, &reorder, &result.preferred_transitions)?;
            time_extract.finish();
            format_symbolic_header(&ctx, &strategy)
        } else {
            let mut time_extract = timing.start("extract_explicit_strategy");
            let strategy = extract_explicit_strategy(&ctx, &manager, &reorder, &result.winning, &result.preferred_transitions, mode)?;
            time_extract.finish();
            render(&strategy, &ctx, args.json)?
        }
    } else if args.symbolic {
        return Err(Gr1Error::from(
            "symbolic output is only implemented for the realizable (system strategy) case",
        ));
    } else {
        let mut time_losing = timing.start("compute_losing_positions");
        let (losing, log) = compute_losing_positions(&ctx, &manager)?;
        time_losing.finish();

        let mut time_extract = timing.start("extract_counterstrategy");
        let strategy = extract_counterstrategy(&ctx, &manager, &reorder, &losing, &log)?;
        time_extract.finish();
        render(&strategy, &ctx, args.json)?
    };

    match args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            write!(file, "{output}")?;
        }
        None => print!("{output}"),
    }

    Ok(result.realizable)
}

fn render(strategy: &gr1_game::ExplicitStrategy, ctx: &gr1_game::GameContext, json: bool) -> Result<String, Gr1Error> {
    if json {
        let value = format_json(strategy, ctx)?;
        serde_json::to_string_pretty(&value).map_err(|e| Gr1Error::Invariant(format!("failed to render strategy as JSON: {e}")))
    } else {
        format_text(strategy, ctx)
    }
}
