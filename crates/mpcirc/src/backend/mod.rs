use std::fmt::Debug;

use async_trait::async_trait;

use crate::circuit::{ArithOp, BoolOp};
use crate::errors::BackendError;
use crate::protocols::{PlainValue, Protocol};
use crate::stats::RunStatistics;

pub mod plain;

/// Binary operations of the backend capability interface.
///
/// `LT`/`GE`/`LE`/`NE` gates are not part of it; the dispatcher rewrites them
/// into `Gt`/`Eq` with swapped operands and `not`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
    Gt,
    Eq,
}

impl From<ArithOp> for BinOp {
    fn from(op: ArithOp) -> Self {
        match op {
            ArithOp::Add => BinOp::Add,
            ArithOp::Sub => BinOp::Sub,
            ArithOp::Mul => BinOp::Mul,
            ArithOp::Div => BinOp::Div,
        }
    }
}

impl From<BoolOp> for BinOp {
    fn from(op: BoolOp) -> Self {
        match op {
            BoolOp::And => BinOp::And,
            BoolOp::Or => BinOp::Or,
            BoolOp::Xor => BinOp::Xor,
        }
    }
}

/// Capability interface a secure-computation engine must provide.
///
/// Every operation before [`run`](Backend::run) only records the gate against
/// the engine's circuit-building API and returns a handle; nothing
/// communicates. `run` executes everything recorded in one batched protocol
/// run (setup and online phase) and is the only call that may block on
/// network I/O. No partial results are observable before it returns.
#[async_trait]
pub trait Backend {
    /// Opaque handle to a recorded share.
    type Share: Clone + Debug + Send;
    /// Opaque handle to a revealed but not yet decoded output.
    type Reveal: Clone + Debug + Send;

    /// Record a share of `value` in `protocol`, owned by `party`.
    fn input(
        &mut self,
        protocol: Protocol,
        value: u64,
        party: usize,
    ) -> Result<Self::Share, BackendError>;

    fn binary_op(
        &mut self,
        op: BinOp,
        lhs: &Self::Share,
        rhs: &Self::Share,
    ) -> Result<Self::Share, BackendError>;

    fn not(&mut self, input: &Self::Share) -> Result<Self::Share, BackendError>;

    fn convert(
        &mut self,
        target: Protocol,
        input: &Self::Share,
    ) -> Result<Self::Share, BackendError>;

    /// Record that the share's value is reconstructed for all parties.
    fn reveal(&mut self, input: &Self::Share) -> Result<Self::Reveal, BackendError>;

    /// Execute all recorded operations.
    async fn run(&mut self) -> Result<(), BackendError>;

    /// Release protocol and party resources. Revealed values and statistics
    /// stay available.
    fn finish(&mut self) -> Result<(), BackendError>;

    /// Decode a revealed output into plaintext. Only valid once
    /// [`run`](Backend::run) has completed.
    fn decode(&self, output: &Self::Reveal) -> Result<PlainValue, BackendError>;

    fn statistics(&self) -> RunStatistics;
}
