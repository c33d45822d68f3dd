//! Deterministic in-process reference backend.
//!
//! Records the gate stream like a real engine's circuit-building API and
//! evaluates it in plaintext during the single batched [`run`](Backend::run)
//! call, modulo `2^bit_width`. No communication happens, so the byte counters
//! in the statistics stay zero.

use std::time::Instant;

use async_trait::async_trait;
use tracing::info;

use crate::backend::{Backend, BinOp};
use crate::errors::BackendError;
use crate::protocols::{PlainValue, Protocol};
use crate::stats::RunStatistics;

pub const DEFAULT_BIT_WIDTH: u32 = 32;

/// Handle to a recorded node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainShare(usize);

/// Handle to a recorded reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainReveal(usize);

#[derive(Debug, Clone, Copy)]
enum Op {
    Input { value: u64 },
    Bin { op: BinOp, lhs: usize, rhs: usize },
    Not { input: usize },
    Convert { input: usize },
}

/// Result width of a recorded node. Comparisons yield a single bit, everything
/// else a full word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Width {
    Word,
    Bit,
}

#[derive(Debug)]
pub struct PlainBackend {
    bit_width: u32,
    ops: Vec<Op>,
    widths: Vec<Width>,
    reveals: Vec<usize>,
    /// One `(value, width)` per recorded reveal, filled by `run`.
    revealed: Vec<(u64, Width)>,
    ran: bool,
    finished: bool,
    stats: RunStatistics,
}

impl PlainBackend {
    pub fn new(bit_width: u32) -> Self {
        assert!(
            (1..=64).contains(&bit_width),
            "bit width must be in 1..=64"
        );
        Self {
            bit_width,
            ops: vec![],
            widths: vec![],
            reveals: vec![],
            revealed: vec![],
            ran: false,
            finished: false,
            stats: RunStatistics::default(),
        }
    }

    fn mask(&self) -> u64 {
        if self.bit_width == 64 {
            u64::MAX
        } else {
            (1 << self.bit_width) - 1
        }
    }

    fn ensure_recording(&self) -> Result<(), BackendError> {
        if self.finished || self.ran {
            return Err(BackendError::Finished);
        }
        Ok(())
    }

    fn check(&self, share: &PlainShare) -> Result<usize, BackendError> {
        if share.0 < self.ops.len() {
            Ok(share.0)
        } else {
            Err(BackendError::UnknownHandle)
        }
    }

    fn push(&mut self, op: Op, width: Width) -> PlainShare {
        self.ops.push(op);
        self.widths.push(width);
        self.stats.gates += 1;
        PlainShare(self.ops.len() - 1)
    }
}

impl Default for PlainBackend {
    fn default() -> Self {
        Self::new(DEFAULT_BIT_WIDTH)
    }
}

#[async_trait]
impl Backend for PlainBackend {
    type Share = PlainShare;
    type Reveal = PlainReveal;

    fn input(
        &mut self,
        _protocol: Protocol,
        value: u64,
        _party: usize,
    ) -> Result<Self::Share, BackendError> {
        self.ensure_recording()?;
        Ok(self.push(Op::Input { value }, Width::Word))
    }

    fn binary_op(
        &mut self,
        op: BinOp,
        lhs: &Self::Share,
        rhs: &Self::Share,
    ) -> Result<Self::Share, BackendError> {
        self.ensure_recording()?;
        let (lhs, rhs) = (self.check(lhs)?, self.check(rhs)?);
        let width = match op {
            BinOp::Gt | BinOp::Eq => Width::Bit,
            BinOp::And | BinOp::Or | BinOp::Xor
                if self.widths[lhs] == Width::Bit && self.widths[rhs] == Width::Bit =>
            {
                Width::Bit
            }
            _ => Width::Word,
        };
        if matches!(
            op,
            BinOp::Mul | BinOp::Div | BinOp::And | BinOp::Or | BinOp::Gt | BinOp::Eq
        ) {
            self.stats.interactive_gates += 1;
        }
        Ok(self.push(Op::Bin { op, lhs, rhs }, width))
    }

    fn not(&mut self, input: &Self::Share) -> Result<Self::Share, BackendError> {
        self.ensure_recording()?;
        let input = self.check(input)?;
        let width = self.widths[input];
        Ok(self.push(Op::Not { input }, width))
    }

    fn convert(
        &mut self,
        _target: Protocol,
        input: &Self::Share,
    ) -> Result<Self::Share, BackendError> {
        self.ensure_recording()?;
        let input = self.check(input)?;
        let width = self.widths[input];
        self.stats.conversions += 1;
        self.stats.interactive_gates += 1;
        Ok(self.push(Op::Convert { input }, width))
    }

    fn reveal(&mut self, input: &Self::Share) -> Result<Self::Reveal, BackendError> {
        self.ensure_recording()?;
        let input = self.check(input)?;
        self.reveals.push(input);
        Ok(PlainReveal(self.reveals.len() - 1))
    }

    async fn run(&mut self) -> Result<(), BackendError> {
        if self.finished {
            return Err(BackendError::Finished);
        }
        if self.ran {
            return Err(BackendError::ProtocolAbort(
                "protocol run was already executed".to_owned(),
            ));
        }
        // Nothing to precompute in plaintext, the setup phase is empty.
        let setup = Instant::now();
        self.stats.time_setup_ms = setup.elapsed().as_millis();

        let online = Instant::now();
        let mask = self.mask();
        let mut values = vec![0_u64; self.ops.len()];
        for (idx, op) in self.ops.iter().enumerate() {
            values[idx] = match *op {
                Op::Input { value } => value & mask,
                Op::Bin { op, lhs, rhs } => {
                    let (a, b) = (values[lhs], values[rhs]);
                    match op {
                        BinOp::Add => a.wrapping_add(b) & mask,
                        BinOp::Sub => a.wrapping_sub(b) & mask,
                        BinOp::Mul => a.wrapping_mul(b) & mask,
                        BinOp::Div => a.checked_div(b).ok_or(BackendError::DivisionByZero)?,
                        BinOp::And => a & b,
                        BinOp::Or => a | b,
                        BinOp::Xor => a ^ b,
                        BinOp::Gt => (a > b) as u64,
                        BinOp::Eq => (a == b) as u64,
                    }
                }
                Op::Not { input } => match self.widths[input] {
                    Width::Bit => (values[input] == 0) as u64,
                    Width::Word => !values[input] & mask,
                },
                Op::Convert { input } => values[input],
            };
        }
        self.revealed = self
            .reveals
            .iter()
            .map(|&node| (values[node], self.widths[node]))
            .collect();
        self.ran = true;
        self.stats.time_online_ms = online.elapsed().as_millis();
        info!(
            gates = self.ops.len(),
            reveals = self.reveals.len(),
            "Executed recorded circuit"
        );
        Ok(())
    }

    fn finish(&mut self) -> Result<(), BackendError> {
        if self.finished {
            return Err(BackendError::Finished);
        }
        self.finished = true;
        self.ops.clear();
        self.widths.clear();
        self.reveals.clear();
        Ok(())
    }

    fn decode(&self, output: &Self::Reveal) -> Result<PlainValue, BackendError> {
        if !self.ran {
            return Err(BackendError::RunPending);
        }
        let (value, width) = self
            .revealed
            .get(output.0)
            .copied()
            .ok_or(BackendError::UnknownHandle)?;
        let value = match width {
            Width::Word => PlainValue::Uint(value),
            Width::Bit => PlainValue::Bit(value != 0),
        };
        Ok(value)
    }

    fn statistics(&self) -> RunStatistics {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(bit_width: u32) -> PlainBackend {
        PlainBackend::new(bit_width)
    }

    #[tokio::test]
    async fn arithmetic_wraps_at_bit_width() -> Result<(), BackendError> {
        let mut b = backend(8);
        let x = b.input(Protocol::Arithmetic, 200, 0)?;
        let y = b.input(Protocol::Arithmetic, 100, 1)?;
        let sum = b.binary_op(BinOp::Add, &x, &y)?;
        let diff = b.binary_op(BinOp::Sub, &y, &x)?;
        let prod = b.binary_op(BinOp::Mul, &x, &y)?;
        let out = [b.reveal(&sum)?, b.reveal(&diff)?, b.reveal(&prod)?];
        b.run().await?;
        assert_eq!(PlainValue::Uint((200 + 100) % 256), b.decode(&out[0])?);
        // 100 - 200 mod 2^8
        assert_eq!(PlainValue::Uint(156), b.decode(&out[1])?);
        assert_eq!(PlainValue::Uint(200 * 100 % 256), b.decode(&out[2])?);
        Ok(())
    }

    #[tokio::test]
    async fn comparisons_decode_to_bits() -> Result<(), BackendError> {
        let mut b = backend(32);
        let x = b.input(Protocol::Boolean, 3, 0)?;
        let y = b.input(Protocol::Boolean, 3, 1)?;
        let gt = b.binary_op(BinOp::Gt, &x, &y)?;
        let eq = b.binary_op(BinOp::Eq, &x, &y)?;
        let ge = b.not(&gt)?;
        let out = [b.reveal(&gt)?, b.reveal(&eq)?, b.reveal(&ge)?];
        b.run().await?;
        assert_eq!(PlainValue::Bit(false), b.decode(&out[0])?);
        assert_eq!(PlainValue::Bit(true), b.decode(&out[1])?);
        assert_eq!(PlainValue::Bit(true), b.decode(&out[2])?);
        Ok(())
    }

    #[tokio::test]
    async fn not_on_word_is_bitwise_complement() -> Result<(), BackendError> {
        let mut b = backend(8);
        let x = b.input(Protocol::Boolean, 0, 0)?;
        let inv = b.not(&x)?;
        let out = b.reveal(&inv)?;
        b.run().await?;
        assert_eq!(PlainValue::Uint(0xff), b.decode(&out)?);
        Ok(())
    }

    #[tokio::test]
    async fn decode_before_run_is_rejected() {
        let mut b = backend(32);
        let x = b.input(Protocol::Boolean, 1, 0).unwrap();
        let out = b.reveal(&x).unwrap();
        assert!(matches!(b.decode(&out), Err(BackendError::RunPending)));
    }

    #[tokio::test]
    async fn division_by_zero_aborts_the_run() {
        let mut b = backend(32);
        let x = b.input(Protocol::Arithmetic, 1, 0).unwrap();
        let y = b.input(Protocol::Arithmetic, 0, 1).unwrap();
        let _div = b.binary_op(BinOp::Div, &x, &y).unwrap();
        assert!(matches!(
            b.run().await,
            Err(BackendError::DivisionByZero)
        ));
    }

    #[tokio::test]
    async fn recording_after_finish_is_rejected() -> Result<(), BackendError> {
        let mut b = backend(32);
        let x = b.input(Protocol::Boolean, 1, 0)?;
        let out = b.reveal(&x)?;
        b.run().await?;
        b.finish()?;
        // revealed values survive finish
        assert_eq!(PlainValue::Uint(1), b.decode(&out)?);
        assert!(matches!(
            b.input(Protocol::Boolean, 1, 0),
            Err(BackendError::Finished)
        ));
        assert!(matches!(b.finish(), Err(BackendError::Finished)));
        Ok(())
    }
}
