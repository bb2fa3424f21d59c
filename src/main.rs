use std::{
    env::args,
    io::{self, BufWriter, Write},
    path::Path,
    time::Duration,
};

use pretty_env_logger::formatted_builder;
use satlab::{
    formula::Cnf,
    parser::{self, parse_file, parse_reader},
    prelude::*,
    report::Report,
    solver::{CdclSolver, ConfigError, Outcome, Solver, SolverConfig},
};

fn usage_string() -> String {
    format!(
        "Usage: {} [options] [<file_name>]

Solves a DIMACS CNF formula read from <file_name>, or from standard input when omitted,
and prints SAT with a model or UNSAT.

options:
    --restart <policy>    never, fixed:N, geometric:N or luby:N (default: geometric:50)
    --polarity <mode>     random, saved, positive or negative (default: random)
    --decay <factor>      VSIDS decay factor within (0, 1] (default: 0.95)
    --seed <number>       seed for random decisions (default: drawn at random)
    --timeout <seconds>   give up and print UNKNOWN after the given time
    --help                print this message",
        args().next().unwrap_or_else(|| "satlab".to_owned())
    )
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Unknown option '{}'\n\n{}", name, usage_string()))]
    UnknownOption { name: String },
    #[snafu(display("Option '{}' requires a value\n\n{}", name, usage_string()))]
    MissingArgument { name: String },
    #[snafu(display("Invalid value '{}' for option '{}'", value, name))]
    InvalidValue { name: String, value: String },
    #[snafu(display("Invalid value for option '{}'", name))]
    InvalidPolicy { name: String, source: ConfigError },
    #[snafu(display("Unexpected argument '{}'\n\n{}", value, usage_string()))]
    UnexpectedArgument { value: String },
    #[snafu(display("Failed to parse CNF"))]
    ParserError { source: parser::Error },
    #[snafu(display("Solver returned a model falsifying clause #{}: {}", index, clause))]
    InvalidModel { index: usize, clause: String },
    #[snafu(display("Failed to write the result"))]
    OutputError { source: io::Error },
}

struct Options {
    config: SolverConfig,
    seed_given: bool,
    path: Option<String>,
    help: bool,
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, Error> {
    value.parse::<T>().ok().context(InvalidValue { name, value })
}

fn option_value(iter: &mut impl Iterator<Item = String>, name: &str) -> Result<String, Error> {
    iter.next().context(MissingArgument { name })
}

fn parse_options(args: Vec<String>) -> Result<Options, Error> {
    let mut options = Options {
        config: SolverConfig::default(),
        seed_given: false,
        path: None,
        help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if !arg.starts_with("--") {
            ensure!(
                options.path.is_none(),
                UnexpectedArgument { value: arg.as_str() }
            );
            options.path = Some(arg);
            continue;
        }
        let name = arg.as_str();
        match name {
            "--help" => options.help = true,
            "--restart" => {
                let value = option_value(&mut iter, name)?;
                options.config.restart = value.parse().context(InvalidPolicy { name })?;
            }
            "--polarity" => {
                let value = option_value(&mut iter, name)?;
                options.config.polarity = value.parse().context(InvalidPolicy { name })?;
            }
            "--decay" => {
                let value = option_value(&mut iter, name)?;
                let decay = parse_number::<f64>(name, &value)?;
                ensure!(
                    decay > 0.0 && decay <= 1.0,
                    InvalidValue {
                        name,
                        value: value.as_str()
                    }
                );
                options.config.var_decay = decay;
            }
            "--seed" => {
                let value = option_value(&mut iter, name)?;
                options.config.seed = parse_number(name, &value)?;
                options.seed_given = true;
            }
            "--timeout" => {
                let value = option_value(&mut iter, name)?;
                let seconds = parse_number::<f64>(name, &value)?;
                ensure!(
                    seconds.is_finite() && seconds >= 0.0,
                    InvalidValue {
                        name,
                        value: value.as_str()
                    }
                );
                options.config.time_limit = Some(Duration::from_secs_f64(seconds));
            }
            _ => UnknownOption { name }.fail()?,
        }
    }

    Ok(options)
}

fn read_formula(path: Option<&str>) -> Result<Cnf, Error> {
    match path {
        Some(path) => parse_file(path).context(ParserError),
        None => {
            let stdin = io::stdin();
            let locked = stdin.lock();
            parse_reader(locked, Path::new("<stdin>")).context(ParserError)
        }
    }
}

fn print_outcome(outcome: &Outcome) -> Result<(), Error> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match outcome {
        Outcome::Sat(model) => {
            if let Some((index, clause)) = model.falsified_clause() {
                return InvalidModel {
                    index,
                    clause: clause.to_string(),
                }
                .fail();
            }
            writeln!(out, "SAT").context(OutputError)?;
            writeln!(out, "{}", model.dimacs()).context(OutputError)?;
        }
        Outcome::Unsat => writeln!(out, "UNSAT").context(OutputError)?,
        Outcome::Unknown => writeln!(out, "UNKNOWN").context(OutputError)?,
    }

    out.flush().context(OutputError)
}

fn init_logger() {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else if cfg!(debug_assertions) {
        builder.parse_filters("satlab=debug");
    } else {
        builder.parse_filters("satlab=warn");
    }

    builder.try_init().expect("Failed to initialize the logger");
}

fn main() -> Result<(), Report> {
    init_logger();

    // drop arg[0]
    let mut options = parse_options(args().skip(1).collect())?;
    if options.help {
        println!("{}", usage_string());
        return Ok(());
    }

    if !options.seed_given {
        options.config.seed = rand::random();
    }
    log::info!("Random seed {}", options.config.seed);

    let formula = read_formula(options.path.as_deref())?;
    let solver = CdclSolver::new(formula, options.config);
    print_outcome(&solver.solve())?;

    Ok(())
}
