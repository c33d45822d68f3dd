use std::path::Path;

use anyhow::Result;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::backend::plain::PlainBackend;
use crate::circuit::CircuitProgram;
use crate::evaluate::{EvalConfig, Evaluator, RoundOutput};

/// Initializes tracing subscriber with EnvFilter for usage in tests. This should be the first call
/// in each test, with the returned value being assigned to a variable to prevent dropping.
/// Output can be configured via the RUST_LOG env variable.
///
/// ```ignore
/// use mpcirc::private_test_utils::init_tracing;
/// fn some_test() {
///     let _guard = init_tracing();
/// }
/// ```
pub fn init_tracing() -> tracing::dispatcher::DefaultGuard {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .set_default()
}

/// Loads a circuit fixture and evaluates it for one round on a fresh
/// [`PlainBackend`].
pub async fn evaluate_file(path: impl AsRef<Path>, config: EvalConfig) -> Result<RoundOutput> {
    let program = CircuitProgram::load(path)?;
    evaluate_program(&program, config).await
}

pub async fn evaluate_program(program: &CircuitProgram, config: EvalConfig) -> Result<RoundOutput> {
    let output = Evaluator::new(program, config, PlainBackend::default())
        .execute()
        .await?;
    Ok(output)
}
