use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::circuit::GateName;
use crate::errors::{EvalError, ParseProtocolError};

/// The secret-sharing scheme a share currently lives in. Values must be
/// explicitly converted to cross schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Arithmetic,
    Boolean,
    Yao,
}

impl Protocol {
    /// Boolean and Yao shares are bit-oriented and are the legal inputs for
    /// AND/OR/XOR gates.
    pub fn is_boolean_family(self) -> bool {
        matches!(self, Protocol::Boolean | Protocol::Yao)
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Arithmetic => "arithmetic",
            Protocol::Boolean => "boolean",
            Protocol::Yao => "yao",
        };
        f.write_str(name)
    }
}

impl FromStr for Protocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arithmetic" | "arith" => Ok(Protocol::Arithmetic),
            "boolean" | "bool" => Ok(Protocol::Boolean),
            "yao" => Ok(Protocol::Yao),
            other => Err(ParseProtocolError(other.to_owned())),
        }
    }
}

/// A backend share handle tagged with the protocol it was created in.
///
/// The tag is checked at the dispatch boundary so that an illegal operation,
/// say an arithmetic multiply on a Yao share, is rejected before it reaches
/// the backend.
#[derive(Debug, Clone)]
pub enum TypedShare<S> {
    Arith(S),
    Bool(S),
    Yao(S),
}

impl<S> TypedShare<S> {
    pub fn new(protocol: Protocol, share: S) -> Self {
        match protocol {
            Protocol::Arithmetic => TypedShare::Arith(share),
            Protocol::Boolean => TypedShare::Bool(share),
            Protocol::Yao => TypedShare::Yao(share),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            TypedShare::Arith(_) => Protocol::Arithmetic,
            TypedShare::Bool(_) => Protocol::Boolean,
            TypedShare::Yao(_) => Protocol::Yao,
        }
    }

    pub fn inner(&self) -> &S {
        let (TypedShare::Arith(share) | TypedShare::Bool(share) | TypedShare::Yao(share)) = self;
        share
    }

    /// The share if it is a `required` share, otherwise a protocol-mismatch
    /// error naming the consuming gate and the offending operand.
    pub fn require(
        &self,
        required: Protocol,
        gate: &GateName,
        operand: &GateName,
    ) -> Result<&S, EvalError> {
        if self.protocol() == required {
            Ok(self.inner())
        } else {
            Err(EvalError::ProtocolMismatch {
                gate: gate.clone(),
                operand: operand.clone(),
                required,
                actual: self.protocol(),
            })
        }
    }

    /// The share if it is a boolean or Yao share.
    pub fn require_boolean_family(
        &self,
        gate: &GateName,
        operand: &GateName,
    ) -> Result<&S, EvalError> {
        if self.protocol().is_boolean_family() {
            Ok(self.inner())
        } else {
            Err(EvalError::BooleanFamilyRequired {
                gate: gate.clone(),
                operand: operand.clone(),
                actual: self.protocol(),
            })
        }
    }
}

/// A decoded output value. Comparison gates decode to a single bit, everything
/// else to an unsigned word of the backend's bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlainValue {
    Uint(u64),
    Bit(bool),
}

impl PlainValue {
    pub fn as_uint(self) -> u64 {
        match self {
            PlainValue::Uint(v) => v,
            PlainValue::Bit(b) => b as u64,
        }
    }

    pub fn as_bit(self) -> bool {
        match self {
            PlainValue::Bit(b) => b,
            PlainValue::Uint(v) => v != 0,
        }
    }
}

impl Display for PlainValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PlainValue::Uint(v) => write!(f, "{v}"),
            PlainValue::Bit(b) => write!(f, "{b}"),
        }
    }
}
