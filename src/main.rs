use std::{env, fs::File, path::PathBuf, process::ExitCode, time::Instant};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use log::{error, LevelFilter};

use vw_pbenc::{
    config::SolverConfig,
    io::{self, Dimacs},
    parallel::Portfolio,
    solver::{verify, Solver},
    types::{to_var, Solution},
};

#[derive(Parser, Debug)]
#[command(name = "vw-pbenc", version)]
#[command(about = "CDCL SAT solver for DIMACS CNF with embedded options")]
struct Args {
    /// DIMACS CNF file, stdin if omitted
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Wall-clock limit in seconds
    #[arg(long, value_name = "SECONDS")]
    time_limit: Option<i64>,

    /// Number of portfolio threads
    #[arg(long, conflicts_with = "serial")]
    threads: Option<i64>,

    /// Run a single solver instead of the portfolio
    #[arg(long)]
    serial: bool,

    /// Conflicts per unit of the Luby restart sequence
    #[arg(long, value_name = "CONFLICTS")]
    restart_base: Option<i64>,

    /// Increase verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn verbosity(&self) -> Option<i64> {
        if self.quiet {
            Some(-1)
        } else if self.verbose > 0 {
            Some(i64::from(self.verbose))
        } else {
            None
        }
    }

    /// Command line flags override embedded options.
    fn apply(&self, config: &mut SolverConfig) -> Result<()> {
        let overrides = [
            ("time-limit", self.time_limit),
            ("threads", self.threads),
            ("restart-base", self.restart_base),
            ("verbose", self.verbosity()),
        ];
        for (name, value) in overrides {
            if let Some(value) = value {
                config.set(name, value)?;
            }
        }
        Ok(())
    }
}

fn level(verbose: i64) -> LevelFilter {
    match verbose {
        i64::MIN..=-1 => LevelFilter::Error,
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn rust_log_set() -> bool {
    env::var_os("RUST_LOG").is_some()
}

fn init_logger(args: &Args) {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .parse_default_env()
        .init();
    if !rust_log_set() {
        log::set_max_level(level(args.verbosity().unwrap_or(0)));
    }
}

fn read_input(args: &Args) -> Result<Dimacs> {
    let dimacs = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open '{}'", path.display()))?;
            io::read_problem(file)?
        }
        None => io::read_problem(std::io::stdin().lock())?,
    };
    Ok(dimacs)
}

fn run(args: &Args) -> Result<Solution> {
    let start = Instant::now();

    let Dimacs {
        problem,
        options,
        important,
    } = read_input(args)?;

    let mut config = SolverConfig::from_options(&options)?;
    args.apply(&mut config)?;
    if !rust_log_set() {
        log::set_max_level(level(config.verbose));
    }
    let deadline = config.deadline(start);

    let solution = if args.serial {
        let mut solver = Solver::new(problem.clone())
            .with_restart_base(config.restart_base)
            .with_deadline(deadline);
        for &lit in &important {
            solver.set_important(to_var(lit));
        }
        solver.solve()
    } else {
        Portfolio::new(config).solve(problem.clone(), &important, deadline)
    };

    if solution.is_sat() && !verify(&problem, true, &solution) {
        bail!("model does not satisfy the input");
    }

    io::write_solution(&mut std::io::stdout(), &solution)?;
    Ok(solution)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(&args);

    match run(&args) {
        Ok(Solution::Sat { .. }) => ExitCode::from(10),
        Ok(Solution::Unsat) => ExitCode::from(20),
        Ok(Solution::Unknown) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
