//! Sparse coordinate-list (COO) problem files
//!
//! One term per line, `u v bias`, where `u == v` denotes a linear term.
//! Blank lines and `#` comments are ignored, except for an optional
//! `# vartype=BINARY` header which must agree with the requested vartype.

use crate::qubo::{BinaryQuadraticModel, Variable, Vartype};
use crate::{RcmError, Result};
use nom::{
    IResult,
    bytes::complete::tag,
    character::complete::{alpha1, char, digit1, space0, space1},
    combinator::{all_consuming, map_res},
    number::complete::double,
    sequence::{preceded, terminated, tuple},
};
use std::fmt::Write as _;
use std::path::Path;

/// Parse a COO document into a model of the given vartype
pub fn parse_coo(input: &str, vartype: Vartype) -> Result<BinaryQuadraticModel<Variable>> {
    let mut bqm = BinaryQuadraticModel::new(vartype);

    for (index, raw_line) in input.lines().enumerate() {
        let line_number = index + 1;

        if let Ok((_, declared)) = vartype_header(raw_line) {
            let declared: Vartype = declared.parse().map_err(|_| {
                RcmError::parse_error(format!("unknown vartype '{}'", declared), line_number)
            })?;
            if declared != vartype {
                return Err(RcmError::parse_error(
                    format!("file declares vartype {} but {} was requested", declared, vartype),
                    line_number,
                ));
            }
            continue;
        }

        let line = strip_comment(raw_line);
        if line.trim().is_empty() {
            continue;
        }

        let (_, (u, v, bias)) = all_consuming(term)(line).map_err(|_| {
            RcmError::parse_error(format!("malformed term '{}'", line.trim()), line_number)
        })?;

        if !bias.is_finite() {
            return Err(RcmError::parse_error(
                format!("non-finite bias {}", bias),
                line_number,
            ));
        }

        if u == v {
            bqm.add_variable(Variable(u), bias);
        } else {
            bqm.add_interaction(Variable(u), Variable(v), bias);
        }
    }

    Ok(bqm)
}

/// Load a COO problem file
pub fn load_coo<P: AsRef<Path>>(
    path: P,
    vartype: Vartype,
) -> Result<BinaryQuadraticModel<Variable>> {
    let content = std::fs::read_to_string(path)?;
    parse_coo(&content, vartype)
}

/// Render a model as a COO document with a vartype header
pub fn to_coo(bqm: &BinaryQuadraticModel<Variable>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# vartype={}", bqm.vartype());

    for (v, bias) in bqm.iter_linear() {
        let _ = writeln!(out, "{} {} {:?}", v, v, bias);
    }
    for (u, v, bias) in bqm.iter_quadratic() {
        let _ = writeln!(out, "{} {} {:?}", u, v, bias);
    }

    out
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn label(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>)(input)
}

fn term(input: &str) -> IResult<&str, (usize, usize, f64)> {
    let (input, (_, u, _, v, _, bias, _)) =
        tuple((space0, label, space1, label, space1, double, space0))(input)?;
    Ok((input, (u, v, bias)))
}

fn vartype_header(input: &str) -> IResult<&str, &str> {
    all_consuming(preceded(
        tuple((space0, char('#'), space0, tag("vartype"), space0, char('='), space0)),
        terminated(alpha1, space0),
    ))(input)
}
