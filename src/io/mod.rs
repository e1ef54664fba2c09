pub mod options;

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

use log::{debug, info};

use crate::{
    error::ParseError,
    types::{Lit, Problem, Solution},
};

pub use self::options::EmbeddedOptions;

/// A parsed DIMACS file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dimacs {
    pub problem: Problem,
    pub options: EmbeddedOptions,
    /// Literals listed in `o` sections.
    pub important: Vec<Lit>,
}

fn parse_header(line: &str) -> Option<(usize, usize)> {
    match line.split_whitespace().collect::<Vec<_>>()[..] {
        ["p", "cnf", vars, clauses] => Some((vars.parse().ok()?, clauses.parse().ok()?)),
        _ => None,
    }
}

/// Reads a DIMACS CNF file.
///
/// Comments before the header may embed `--name=<int>` options. The body
/// may contain `o <lit>` sections and ends early at a `%` line.
pub fn read_problem(reader: impl Read) -> Result<Dimacs, ParseError> {
    let mut lines = BufReader::new(reader)
        .lines()
        .enumerate()
        .map(|(i, line)| line.map(|line| (i + 1, line)));

    let mut options = EmbeddedOptions::new();
    let mut last_line = 0;

    let (var_count, clause_count) = loop {
        let Some(next) = lines.next() else {
            return Err(ParseError::MissingHeader {
                line: last_line + 1,
            });
        };
        let (line_no, line) = next?;
        last_line = line_no;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('c') {
            options.scan(line);
            continue;
        }
        if !line.starts_with('p') {
            return Err(ParseError::MissingHeader { line: line_no });
        }
        break parse_header(line).ok_or_else(|| ParseError::InvalidHeader {
            line: line_no,
            header: line.to_string(),
        })?;
    };

    let mut clauses = Vec::with_capacity(clause_count);
    let mut clause = vec![];
    let mut clause_line = 0;
    let mut important = vec![];
    let mut section: Option<usize> = None;

    for next in lines {
        let (line_no, line) = next?;

        let trimmed = line.trim_start();
        if trimmed.starts_with('c') {
            continue;
        }
        // SATLIB trailer
        if trimmed.starts_with('%') {
            break;
        }

        for token in line.split_whitespace() {
            if token == "o" {
                if let Some(line) = section {
                    return Err(ParseError::EmptySection { line });
                }
                section = Some(line_no);
                continue;
            }

            let lit = token
                .parse::<Lit>()
                .map_err(|_| ParseError::InvalidLiteral {
                    line: line_no,
                    token: token.to_string(),
                })?;
            let var = lit.unsigned_abs() as usize;
            if var > var_count {
                return Err(ParseError::VarOutOfRange {
                    line: line_no,
                    var,
                    max_var: var_count,
                });
            }

            if section.take().is_some() {
                if lit == 0 {
                    return Err(ParseError::EmptySection { line: line_no });
                }
                important.push(lit);
                continue;
            }

            if clauses.len() == clause_count {
                return Err(ParseError::TooManyClauses {
                    line: line_no,
                    declared: clause_count,
                });
            }
            match lit {
                0 => clauses.push(std::mem::take(&mut clause)),
                _ => {
                    clause.push(lit);
                    clause_line = line_no;
                }
            }
        }
    }

    if let Some(line) = section {
        return Err(ParseError::EmptySection { line });
    }
    if !clause.is_empty() {
        return Err(ParseError::UnterminatedClause { line: clause_line });
    }
    if clauses.len() < clause_count {
        return Err(ParseError::MissingClauses {
            declared: clause_count,
            found: clauses.len(),
        });
    }

    if !options.is_empty() {
        info!(
            "embedded options: {}",
            options
                .iter()
                .map(|(name, value)| format!("--{name}={value}"))
                .collect::<Vec<_>>()
                .join(" ")
        );
    }
    debug!(
        "read {var_count} variables, {} clauses, {} important literals",
        clauses.len(),
        important.len()
    );

    Ok(Dimacs {
        problem: Problem { var_count, clauses },
        options,
        important,
    })
}

const LINE_WIDTH: usize = 80;

pub fn write_solution(writer: &mut impl Write, solution: &Solution) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);

    let solution_str = match solution {
        Solution::Sat { .. } => "SATISFIABLE",
        Solution::Unsat => "UNSATISFIABLE",
        Solution::Unknown => "UNKNOWN",
    };
    writeln!(writer, "s {solution_str}")?;

    if let Solution::Sat { model } = solution {
        let mut line = String::from("v");
        for lit in model.iter().chain(std::iter::once(&0)) {
            let token = format!(" {lit}");
            if line.len() + token.len() > LINE_WIDTH {
                writeln!(writer, "{line}")?;
                line.truncate(1);
            }
            line.push_str(&token);
        }
        writeln!(writer, "{line}")?;
    }

    writer.flush()
}

pub fn write_problem(writer: &mut impl Write, problem: &Problem) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);

    writeln!(writer, "p cnf {} {}", problem.var_count, problem.clauses.len())?;
    for clause in &problem.clauses {
        for lit in clause {
            write!(writer, "{lit} ")?;
        }
        writeln!(writer, "0")?;
    }

    writer.flush()
}
