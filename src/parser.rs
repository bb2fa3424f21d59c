use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::formula::{Clause, Cnf, Literal, VariableParseError};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("I/O error occurred while reading CNF from '{}'", path.display()))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Invalid literal '{}' on line {}", token, line))]
    MalformedLiteral {
        line: usize,
        token: String,
        source: VariableParseError,
    },
    #[snafu(display(
        "Literal '{}' on line {} refers to a variable above the declared {}",
        token,
        line,
        num_variables
    ))]
    VariableOutOfRange {
        line: usize,
        token: String,
        num_variables: usize,
    },
    #[snafu(display("Problem line 'p cnf <num_variables> <num_clauses>' is not found"))]
    MalformedProblemDefinition,
    #[snafu(display("The last clause is not terminated by 0"))]
    UnterminatedClause,
    #[snafu(display(
        "The number of clauses ({}) does not match the clauses number in the problem definition ({})",
        found,
        expected,
    ))]
    ClauseCountMismatch { expected: usize, found: usize },
}

/// Parses the problem line, `p cnf <num_variables> <num_clauses>`
fn parse_problem_line(line: &str) -> Result<(usize, usize), Error> {
    let splitted = line.split_whitespace().collect::<Vec<_>>();

    // We only support CNF DIMACS format
    ensure!(
        splitted.len() == 4 && splitted[0] == "p" && splitted[1] == "cnf",
        MalformedProblemDefinition
    );

    match (splitted[2].parse::<usize>(), splitted[3].parse::<usize>()) {
        (Ok(num_variables), Ok(num_clauses)) => Ok((num_variables, num_clauses)),
        _ => MalformedProblemDefinition.fail(),
    }
}

/// Parses a DIMACS CNF formula from a reader.
/// `path` only names the source in error messages.
pub fn parse_reader<R: BufRead>(reader: R, path: &Path) -> Result<Cnf, Error> {
    let mut cnf: Option<(Cnf, usize)> = None;
    let mut pending = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context(IoError { path })?;
        let line_no = line_no + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('c') {
            // empty line, comment
            continue;
        }
        if trimmed.starts_with('%') {
            // SATLIB end-of-formula marker
            break;
        }
        if trimmed.starts_with('p') {
            ensure!(cnf.is_none(), MalformedProblemDefinition);
            let (num_variables, num_clauses) = parse_problem_line(trimmed)?;
            cnf = Some((Cnf::new(num_variables), num_clauses));
            continue;
        }

        let (formula, _) = cnf.as_mut().context(MalformedProblemDefinition)?;
        for token in trimmed.split_whitespace() {
            if token == "0" {
                formula.add_clause(Clause::new(std::mem::take(&mut pending)));
                continue;
            }

            let literal = token.parse::<Literal>().context(MalformedLiteral {
                line: line_no,
                token,
            })?;
            ensure!(
                literal.variable().id() <= formula.num_variables(),
                VariableOutOfRange {
                    line: line_no,
                    token,
                    num_variables: formula.num_variables(),
                }
            );
            pending.push(literal);
        }
    }

    ensure!(pending.is_empty(), UnterminatedClause);

    let (formula, expected) = cnf.context(MalformedProblemDefinition)?;
    ensure!(
        formula.clauses().len() == expected,
        ClauseCountMismatch {
            found: formula.clauses().len(),
            expected,
        }
    );

    Ok(formula)
}

/// Parses CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, Error> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path).context(IoError { path })?);
    parse_reader(file, path)
}
