use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::errors::CircuitError;
use crate::parse::mixed;
use crate::protocols::Protocol;

/// A gate identifier. The prefix up to the first `_` doubles as the gate's
/// type tag (`ADD_2` is an `ADD` gate); the remainder is a disambiguating
/// ordinal with no effect on evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GateName(String);

impl GateName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The type tag. A name without `_` is all tag.
    pub fn kind_prefix(&self) -> &str {
        self.0
            .split('_')
            .next()
            .expect("split yields at least one element")
    }
}

impl Display for GateName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GateName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

pub type OperandList = SmallVec<[GateName; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

/// The closed gate taxonomy of the circuit format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// `INPUT<k>`: create a share of the fixture value owned by party `k`.
    Input(usize),
    Arith(ArithOp),
    Bool(BoolOp),
    Cmp(CmpOp),
    /// Protocol conversion. The operand must currently be a `from` share.
    Conv { from: Protocol, to: Protocol },
    /// Reveal the operand's value to all parties.
    Output,
}

impl GateKind {
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        use Protocol::*;
        let kind = match prefix {
            "ADD" => GateKind::Arith(ArithOp::Add),
            "SUB" => GateKind::Arith(ArithOp::Sub),
            "MUL" => GateKind::Arith(ArithOp::Mul),
            "DIV" => GateKind::Arith(ArithOp::Div),
            "AND" => GateKind::Bool(BoolOp::And),
            "OR" => GateKind::Bool(BoolOp::Or),
            "XOR" => GateKind::Bool(BoolOp::Xor),
            "GT" => GateKind::Cmp(CmpOp::Gt),
            "LT" => GateKind::Cmp(CmpOp::Lt),
            "GE" => GateKind::Cmp(CmpOp::Ge),
            "LE" => GateKind::Cmp(CmpOp::Le),
            "EQ" => GateKind::Cmp(CmpOp::Eq),
            "NE" => GateKind::Cmp(CmpOp::Ne),
            "A2B" => GateKind::Conv {
                from: Arithmetic,
                to: Boolean,
            },
            "Y2B" => GateKind::Conv {
                from: Yao,
                to: Boolean,
            },
            "A2Y" => GateKind::Conv {
                from: Arithmetic,
                to: Yao,
            },
            "B2Y" => GateKind::Conv {
                from: Boolean,
                to: Yao,
            },
            "B2A" => GateKind::Conv {
                from: Boolean,
                to: Arithmetic,
            },
            "Y2A" => GateKind::Conv {
                from: Yao,
                to: Arithmetic,
            },
            "OUTPUT" => GateKind::Output,
            _ => {
                let party = prefix.strip_prefix("INPUT")?.parse().ok()?;
                GateKind::Input(party)
            }
        };
        Some(kind)
    }

    pub fn arity(&self) -> usize {
        match self {
            GateKind::Input(_) => 0,
            GateKind::Conv { .. } | GateKind::Output => 1,
            GateKind::Arith(_) | GateKind::Bool(_) | GateKind::Cmp(_) => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgramGate {
    pub name: GateName,
    pub kind: GateKind,
}

/// An ordered gate program plus the operand lookup built from it.
///
/// The declared order is the evaluation order. The program trusts that every
/// operand is declared before its consumer and performs no topological sort;
/// a violation surfaces as an unresolved-operand error during dispatch.
#[derive(Debug, Clone)]
pub struct CircuitProgram {
    gates: Vec<ProgramGate>,
    operand_index: IndexMap<GateName, OperandList, ahash::RandomState>,
}

impl CircuitProgram {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CircuitError> {
        let file_content = fs::read_to_string(path)?;
        Self::parse(&file_content)
    }

    pub fn parse(input: &str) -> Result<Self, CircuitError> {
        let parsed = mixed::circuit(input).map_err(|err| err.to_owned())?;
        Self::from_parsed(parsed)
    }

    pub fn from_parsed(parsed: mixed::Circuit) -> Result<Self, CircuitError> {
        let mut gates = Vec::with_capacity(parsed.gates.len());
        let mut operand_index = IndexMap::with_capacity_and_hasher(
            parsed.gates.len(),
            ahash::RandomState::default(),
        );
        for raw in parsed.gates {
            let name = GateName::new(raw.name);
            let kind = GateKind::from_prefix(name.kind_prefix()).ok_or_else(|| {
                CircuitError::UnsupportedGate {
                    prefix: name.kind_prefix().to_owned(),
                    gate: name.clone(),
                }
            })?;
            if raw.operands.len() != kind.arity() {
                return Err(CircuitError::WrongOperandCount {
                    gate: name,
                    expected: kind.arity(),
                    actual: raw.operands.len(),
                });
            }
            let operands: OperandList = raw.operands.into_iter().map(GateName::new).collect();
            if operand_index.insert(name.clone(), operands).is_some() {
                return Err(CircuitError::DuplicateGate(name));
            }
            gates.push(ProgramGate { name, kind });
        }
        debug!(gates = gates.len(), "Built circuit program");
        Ok(Self {
            gates,
            operand_index,
        })
    }

    pub fn gates(&self) -> impl Iterator<Item = &ProgramGate> + '_ {
        self.gates.iter()
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn input_count(&self) -> usize {
        self.gates
            .iter()
            .filter(|g| matches!(g.kind, GateKind::Input(_)))
            .count()
    }

    pub fn output_count(&self) -> usize {
        self.gates
            .iter()
            .filter(|g| matches!(g.kind, GateKind::Output))
            .count()
    }

    /// Operands of `gate` in positional order. Empty for input gates and
    /// unknown names.
    pub fn operands_of(&self, gate: &GateName) -> &[GateName] {
        self.operand_index
            .get(gate)
            .map(|ops| ops.as_slice())
            .unwrap_or(&[])
    }
}
