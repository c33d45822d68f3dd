//! Gate dispatch and batched execution driving.
//!
//! The [`Evaluator`] walks a [`CircuitProgram`] in declared order, resolves
//! each gate's operands against the share table and records the matching
//! backend operation. Nothing communicates until every gate is recorded; the
//! backend's batched `run` then executes the whole round in one go.

use std::time::Instant;

use ahash::AHashMap;
use smallvec::SmallVec;
use tracing::{debug, info, trace};

use crate::backend::{Backend, BinOp};
use crate::circuit::{CircuitProgram, CmpOp, GateKind, GateName, ProgramGate};
use crate::errors::{BackendError, EvalError};
use crate::protocols::{PlainValue, Protocol, TypedShare};
use crate::stats::{AccumulatedStatistics, RunStatistics};

/// Fixture value fed into `INPUT` gates by default. Inputs are synthetic by
/// design; the circuits under study only ever see constant test inputs.
pub const INPUT_FIXTURE: u64 = 1;

#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Protocol in which `INPUT` gates create their shares.
    pub protocol: Protocol,
    /// Fixture input value per party; the length doubles as the party count.
    pub input_values: Vec<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Boolean,
            input_values: vec![INPUT_FIXTURE; 2],
        }
    }
}

impl EvalConfig {
    pub fn with_protocol(protocol: Protocol) -> Self {
        Self {
            protocol,
            ..Default::default()
        }
    }

    pub fn parties(&self) -> usize {
        self.input_values.len()
    }
}

/// Decoded outputs and statistics of one evaluation round.
#[derive(Debug, Clone)]
pub struct RoundOutput {
    /// One decoded value per `OUTPUT` gate, in file encounter order.
    pub values: Vec<PlainValue>,
    pub statistics: RunStatistics,
}

type Resolved<B> = (GateName, TypedShare<<B as Backend>::Share>);

pub struct Evaluator<'c, B: Backend> {
    program: &'c CircuitProgram,
    config: EvalConfig,
    backend: B,
    shares: AHashMap<GateName, TypedShare<B::Share>>,
    outputs: Vec<B::Reveal>,
}

impl<'c, B: Backend> Evaluator<'c, B> {
    pub fn new(program: &'c CircuitProgram, config: EvalConfig, backend: B) -> Self {
        Self {
            program,
            config,
            backend,
            shares: AHashMap::with_capacity(program.gate_count()),
            outputs: Vec::with_capacity(program.output_count()),
        }
    }

    /// Dispatches every gate in program order, runs the backend's batched
    /// protocol execution and decodes the revealed outputs.
    #[tracing::instrument(skip_all, fields(gates = self.program.gate_count()), err)]
    pub async fn execute(mut self) -> Result<RoundOutput, EvalError> {
        info!(
            inputs = self.program.input_count(),
            outputs = self.program.output_count(),
            "Evaluating circuit"
        );
        let now = Instant::now();
        for gate in self.program.gates() {
            self.dispatch(gate)?;
        }
        debug!(
            recorded = self.shares.len(),
            "All gates dispatched, starting protocol run"
        );
        self.backend.run().await?;
        self.backend.finish()?;
        let values = self
            .outputs
            .iter()
            .map(|out| self.backend.decode(out))
            .collect::<Result<Vec<_>, _>>()?;
        let statistics = self.backend.statistics();
        info!(time_ms = now.elapsed().as_millis(), "Round complete");
        Ok(RoundOutput { values, statistics })
    }

    fn dispatch(&mut self, gate: &ProgramGate) -> Result<(), EvalError> {
        trace!(name = %gate.name, kind = ?gate.kind, "Dispatching gate");
        let share = match gate.kind {
            GateKind::Input(party) => {
                let value = *self.config.input_values.get(party).ok_or_else(|| {
                    EvalError::InvalidParty {
                        gate: gate.name.clone(),
                        party,
                        parties: self.config.parties(),
                    }
                })?;
                let share = self.backend.input(self.config.protocol, value, party)?;
                TypedShare::new(self.config.protocol, share)
            }
            GateKind::Arith(op) => {
                let [(a_name, a), (b_name, b)] = self.resolve2(&gate.name)?;
                let lhs = a.require(Protocol::Arithmetic, &gate.name, &a_name)?;
                let rhs = b.require(Protocol::Arithmetic, &gate.name, &b_name)?;
                let share = self.backend.binary_op(op.into(), lhs, rhs)?;
                TypedShare::new(Protocol::Arithmetic, share)
            }
            GateKind::Bool(op) => {
                let [(a_name, a), (b_name, b)] = self.resolve2(&gate.name)?;
                a.require_boolean_family(&gate.name, &a_name)?;
                b.require_boolean_family(&gate.name, &b_name)?;
                if a.protocol() != b.protocol() {
                    return Err(EvalError::MixedProtocols {
                        gate: gate.name.clone(),
                        lhs: a.protocol(),
                        rhs: b.protocol(),
                    });
                }
                let share = self.backend.binary_op(op.into(), a.inner(), b.inner())?;
                TypedShare::new(a.protocol(), share)
            }
            GateKind::Cmp(op) => {
                let [(_, a), (_, b)] = self.resolve2(&gate.name)?;
                if a.protocol() != b.protocol() {
                    return Err(EvalError::MixedProtocols {
                        gate: gate.name.clone(),
                        lhs: a.protocol(),
                        rhs: b.protocol(),
                    });
                }
                let protocol = a.protocol();
                let backend = &mut self.backend;
                let (a, b) = (a.inner(), b.inner());
                let share = match op {
                    CmpOp::Gt => backend.binary_op(BinOp::Gt, a, b)?,
                    CmpOp::Lt => backend.binary_op(BinOp::Gt, b, a)?,
                    CmpOp::Ge => {
                        let lt = backend.binary_op(BinOp::Gt, b, a)?;
                        backend.not(&lt)?
                    }
                    CmpOp::Le => {
                        let gt = backend.binary_op(BinOp::Gt, a, b)?;
                        backend.not(&gt)?
                    }
                    CmpOp::Eq => backend.binary_op(BinOp::Eq, a, b)?,
                    CmpOp::Ne => {
                        let eq = backend.binary_op(BinOp::Eq, a, b)?;
                        backend.not(&eq)?
                    }
                };
                TypedShare::new(protocol, share)
            }
            GateKind::Conv { from, to } => {
                let (op_name, input) = self.resolve1(&gate.name)?;
                let share = input.require(from, &gate.name, &op_name)?;
                let converted = self.backend.convert(to, share)?;
                TypedShare::new(to, converted)
            }
            GateKind::Output => {
                let (_, input) = self.resolve1(&gate.name)?;
                let revealed = self.backend.reveal(input.inner())?;
                self.outputs.push(revealed);
                return Ok(());
            }
        };
        self.shares.insert(gate.name.clone(), share);
        Ok(())
    }

    /// Resolves the gate's declared operands to their recorded shares. Misses
    /// mean the declaration-before-use invariant of the file was violated.
    fn resolve(&self, gate: &GateName) -> Result<SmallVec<[Resolved<B>; 2]>, EvalError> {
        self.program
            .operands_of(gate)
            .iter()
            .map(|operand| {
                let share = self.shares.get(operand).cloned().ok_or_else(|| {
                    EvalError::UnresolvedOperand {
                        gate: gate.clone(),
                        operand: operand.clone(),
                    }
                })?;
                Ok((operand.clone(), share))
            })
            .collect()
    }

    fn resolve1(&self, gate: &GateName) -> Result<Resolved<B>, EvalError> {
        let mut operands = self.resolve(gate)?.into_iter();
        match operands.next() {
            Some(operand) => Ok(operand),
            None => unreachable!("operand arity is validated at load time"),
        }
    }

    fn resolve2(&self, gate: &GateName) -> Result<[Resolved<B>; 2], EvalError> {
        let mut operands = self.resolve(gate)?.into_iter();
        match (operands.next(), operands.next()) {
            (Some(a), Some(b)) => Ok([a, b]),
            _ => unreachable!("operand arity is validated at load time"),
        }
    }
}

/// Runs `rounds` complete evaluations of `program`, creating a fresh backend
/// per round via `connect`, and accumulates the per-round statistics.
pub async fn execute_rounds<B, F>(
    program: &CircuitProgram,
    config: &EvalConfig,
    rounds: usize,
    mut connect: F,
) -> Result<(Vec<RoundOutput>, AccumulatedStatistics), EvalError>
where
    B: Backend,
    F: FnMut() -> Result<B, BackendError>,
{
    let mut outputs = Vec::with_capacity(rounds);
    let mut accumulated = AccumulatedStatistics::default();
    for round in 0..rounds {
        debug!(round, "Starting evaluation round");
        let backend = connect()?;
        let output = Evaluator::new(program, config.clone(), backend)
            .execute()
            .await?;
        accumulated.add(&output.statistics);
        outputs.push(output);
    }
    Ok((outputs, accumulated))
}
