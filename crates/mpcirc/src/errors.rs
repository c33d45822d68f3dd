use std::io;

use thiserror::Error;

use crate::circuit::GateName;
use crate::protocols::Protocol;

/// Errors while loading a circuit program. All of these are fatal before any
/// protocol work starts.
#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("Unable to read circuit file")]
    ReadFailed(#[from] io::Error),
    #[error("Unable to parse circuit file")]
    ParseFailed(#[from] nom::Err<nom::error::Error<String>>),
    #[error("Unsupported gate type `{prefix}` in gate `{gate}`")]
    UnsupportedGate { gate: GateName, prefix: String },
    #[error("Gate `{gate}` takes {expected} operands but {actual} were declared")]
    WrongOperandCount {
        gate: GateName,
        expected: usize,
        actual: usize,
    },
    #[error("Gate `{0}` is declared more than once")]
    DuplicateGate(GateName),
}

/// Structural errors raised while dispatching gates. Any of these aborts the
/// round with no output.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Operand `{operand}` of gate `{gate}` has no recorded share")]
    UnresolvedOperand { gate: GateName, operand: GateName },
    #[error("Gate `{gate}` needs a {required} share but operand `{operand}` is {actual}")]
    ProtocolMismatch {
        gate: GateName,
        operand: GateName,
        required: Protocol,
        actual: Protocol,
    },
    #[error("Gate `{gate}` needs a boolean or yao share but operand `{operand}` is {actual}")]
    BooleanFamilyRequired {
        gate: GateName,
        operand: GateName,
        actual: Protocol,
    },
    #[error("Gate `{gate}` mixes {lhs} and {rhs} operands")]
    MixedProtocols {
        gate: GateName,
        lhs: Protocol,
        rhs: Protocol,
    },
    #[error("Gate `{gate}` references party {party} but only {parties} parties are configured")]
    InvalidParty {
        gate: GateName,
        party: usize,
        parties: usize,
    },
    #[error("Backend operation failed")]
    Backend(#[from] BackendError),
}

/// Runtime errors of a backend implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Transport failure during protocol run")]
    Transport(#[source] io::Error),
    #[error("Protocol aborted: {0}")]
    ProtocolAbort(String),
    #[error("Output is not available before the protocol run completed")]
    RunPending,
    #[error("Backend resources were already released")]
    Finished,
    #[error("Division by zero while evaluating a DIV gate")]
    DivisionByZero,
    #[error("Unknown share or output handle")]
    UnknownHandle,
}

#[derive(Debug, Error)]
#[error("Unknown protocol `{0}`, expected arithmetic, boolean or yao")]
pub struct ParseProtocolError(pub String);
