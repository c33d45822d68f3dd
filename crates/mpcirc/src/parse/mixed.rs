//! Parser for the line-oriented mixed-circuit format.
//!
//! One gate per line: the first token is the gate's own name, all following
//! tokens are its operand names in positional order. Lines starting with `#`
//! are comments. Line order is the declared evaluation order.

use crate::parse::{token, ws};
use nom::branch::alt;
use nom::character::complete::{char, multispace0, not_line_ending, space1};
use nom::combinator::{all_consuming, map};
use nom::multi::many0;
use nom::sequence::{preceded, terminated};
use nom::IResult;

/// Raw, unvalidated form of a circuit file. Gate names are not yet resolved
/// into a kind and operand counts are not checked.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Circuit {
    pub gates: Vec<RawGate>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawGate {
    pub name: String,
    pub operands: Vec<String>,
}

pub fn circuit(input: &str) -> Result<Circuit, nom::Err<nom::error::Error<&str>>> {
    let (_, lines) = all_consuming(terminated(many0(ws(line)), multispace0))(input)?;
    let gates = lines.into_iter().flatten().collect();
    Ok(Circuit { gates })
}

fn line(i: &str) -> IResult<&str, Option<RawGate>> {
    alt((map(comment, |_| None), map(gate_line, Some)))(i)
}

fn comment(i: &str) -> IResult<&str, &str> {
    preceded(char('#'), not_line_ending)(i)
}

fn gate_line(i: &str) -> IResult<&str, RawGate> {
    let (i, name) = token(i)?;
    // space1 does not match line endings, so operands stop at the end of the line
    let (i, operands) = many0(preceded(space1, token))(i)?;
    let gate = RawGate {
        name: name.to_owned(),
        operands: operands.into_iter().map(str::to_owned).collect(),
    };
    Ok((i, gate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(name: &str, operands: &[&str]) -> RawGate {
        RawGate {
            name: name.to_owned(),
            operands: operands.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn parse_simple_circuit() {
        let parsed = circuit("INPUT0_0\nINPUT1_1\nADD_2 INPUT0_0 INPUT1_1\nOUTPUT_3 ADD_2\n")
            .expect("valid circuit");
        assert_eq!(
            vec![
                gate("INPUT0_0", &[]),
                gate("INPUT1_1", &[]),
                gate("ADD_2", &["INPUT0_0", "INPUT1_1"]),
                gate("OUTPUT_3", &["ADD_2"]),
            ],
            parsed.gates
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let parsed = circuit("# header comment\n\nINPUT0_0\n# another one\n\n\nOUTPUT_1 INPUT0_0")
            .expect("valid circuit");
        assert_eq!(
            vec![gate("INPUT0_0", &[]), gate("OUTPUT_1", &["INPUT0_0"])],
            parsed.gates
        );
    }

    #[test]
    fn operand_order_is_positional() {
        let parsed = circuit("SUB_2 INPUT1_1 INPUT0_0\n").expect("valid circuit");
        assert_eq!(vec![gate("SUB_2", &["INPUT1_1", "INPUT0_0"])], parsed.gates);
    }

    #[test]
    fn whitespace_only_input_is_empty() {
        let parsed = circuit("\n  \n").expect("valid circuit");
        assert!(parsed.gates.is_empty());
    }
}
