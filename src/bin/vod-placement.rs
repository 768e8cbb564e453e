use tracing::info;
use tracing_subscriber::EnvFilter;

use vod_placement::catalog::Catalog;
use vod_placement::cli::{self, Command, CommonArgs, FormatArg};
use vod_placement::engine::simulate_runs;
use vod_placement::error::Result;
use vod_placement::operators::Operator;
use vod_placement::optimizer::optimize;
use vod_placement::output::{Formatter, HumanFormatter, JsonFormatter, SummaryFormatter};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args()?;
    init_logging(args.command.verbose());

    match args.command {
        Command::Simulate(sim) => {
            let mut config = sim.common.load()?;
            sim.apply(&mut config.simulation);
            let catalog = Catalog::new(&config.scenario)?;
            info!(runs = config.simulation.runs, seed = config.simulation.seed, "simulating");
            let report = simulate_runs(&catalog, config.placement.as_ref(), &config.simulation)?;
            print!("{}", formatter_for(&sim.common).simulation(&report));
        }
        Command::Optimize(opt) => {
            let mut config = opt.common.load()?;
            opt.apply(&mut config.optimizer);
            let catalog = Catalog::new(&config.scenario)?;
            info!(
                iterations = config.optimizer.iterations,
                replications = config.optimizer.replications,
                "optimizing"
            );
            let result = optimize(&catalog, &config.optimizer)?;
            print!("{}", formatter_for(&opt.common).optimization(&result));
        }
        Command::ListOperators => {
            for family in Operator::FAMILIES {
                println!("{}", family);
            }
        }
        Command::ShowConfig(common) => {
            let config = common.load()?;
            let catalog = Catalog::new(&config.scenario)?;
            if let Some(placement) = &config.placement {
                placement.validate(&catalog)?;
            }
            print!("{}", formatter_for(&common).scenario(&config));
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn formatter_for(common: &CommonArgs) -> Box<dyn Formatter> {
    match common.format {
        FormatArg::Human => Box::new(HumanFormatter),
        FormatArg::Summary => Box::new(SummaryFormatter),
        FormatArg::Json => Box::new(JsonFormatter),
    }
}
