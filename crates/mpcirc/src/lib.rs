pub use backend::plain::PlainBackend;
pub use backend::{Backend, BinOp};
pub use circuit::{CircuitProgram, GateKind, GateName};
pub use evaluate::{execute_rounds, EvalConfig, Evaluator, RoundOutput, INPUT_FIXTURE};
pub use protocols::{PlainValue, Protocol, TypedShare};

pub mod backend;
pub mod circuit;
pub mod errors;
pub mod evaluate;
pub mod parse;
#[cfg(feature = "_integration_tests")]
#[doc(hidden)]
/// Do **not** use items from this module. They are intended for integration tests and must
/// therefore be public.
pub mod private_test_utils;
pub mod protocols;
pub mod stats;
