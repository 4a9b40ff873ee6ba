use crate::formula::{Clause, Formula, Literal, Variable};
use std::fmt::{self, Display, Formatter};
use std::io::{self, BufRead, BufReader, Read, Write};

/// Parses DIMACS CNF text. Comment lines start with `c`. The `p cnf` header
/// is validated when present but not required: the variable set is derived
/// from the literals actually seen, and the header's counts are not
/// enforced. A clause line is a sequence of signed integers terminated by
/// `0`; a line without a terminating zero still ends its clause at
/// end-of-line. Empty clauses (a line containing only `0`) are preserved.
pub fn parse<R: Read>(reader: R) -> Result<Formula, DimacsParseError> {
    let reader = BufReader::new(reader);

    let mut clauses = vec![];

    for line in reader.lines() {
        let line = line?;
        let mut tokens = line.split_whitespace().peekable();

        match tokens.peek() {
            Some(&"c") | None => continue,
            Some(&"p") => {
                let _ = tokens.next();

                if tokens.next() != Some("cnf") {
                    return Err(DimacsParseError::Format("missing 'cnf' in header".into()));
                }

                let _num_variables = tokens
                    .next()
                    .and_then(|t| usize::from_str_radix(t, 10).ok())
                    .ok_or_else(|| DimacsParseError::Format("invalid num_variables".into()))?;

                let _num_clauses = tokens
                    .next()
                    .and_then(|t| usize::from_str_radix(t, 10).ok())
                    .ok_or_else(|| DimacsParseError::Format("invalid num_clauses".into()))?;
            }
            Some(_) => {
                let mut clause = vec![];
                for token in tokens {
                    match parse_literal(token)? {
                        Some(literal) => clause.push(literal),
                        // terminating zero; anything after it on this line is ignored
                        None => break,
                    }
                }
                clauses.push(Clause::new(clause));
            }
        }
    }

    Ok(Formula::new(clauses))
}

/// Writes a formula back out as DIMACS CNF, one clause per line.
/// Parsing the output reproduces the formula.
pub fn serialize<W: Write>(formula: &Formula, writer: &mut W) -> io::Result<()> {
    let max_variable = formula.variables().last().map_or(0, |v| v.0);
    writeln!(writer, "p cnf {} {}", max_variable, formula.len())?;

    for clause in formula.clauses() {
        for literal in clause.literals() {
            write!(writer, "{} ", literal)?;
        }
        writeln!(writer, "0")?;
    }

    Ok(())
}

fn parse_literal(s: &str) -> Result<Option<Literal>, DimacsParseError> {
    let l = isize::from_str_radix(s, 10)
        .map_err(|_| DimacsParseError::Format(format!("invalid literal '{}'", s)))?;
    if l > 0 {
        Ok(Some(Literal::Positive(Variable(l as usize))))
    } else if l < 0 {
        Ok(Some(Literal::Negative(Variable(-l as usize))))
    } else {
        Ok(None)
    }
}

#[derive(Debug)]
pub enum DimacsParseError {
    Io(std::io::Error),
    Format(String),
}

impl From<std::io::Error> for DimacsParseError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl Display for DimacsParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DimacsParseError::Io(e) => write!(f, "i/o error: {}", e),
            DimacsParseError::Format(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for DimacsParseError {}
