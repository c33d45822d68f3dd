use anyhow::Result;
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

use mpcirc::errors::{CircuitError, EvalError};
use mpcirc::private_test_utils::{evaluate_file, evaluate_program, init_tracing};
use mpcirc::{
    execute_rounds, CircuitProgram, EvalConfig, PlainBackend, PlainValue, Protocol,
};

#[tokio::test]
async fn add_of_both_fixture_inputs() -> Result<()> {
    let _guard = init_tracing();
    let out = evaluate_file(
        "test_resources/circuits/add.circ",
        EvalConfig::with_protocol(Protocol::Arithmetic),
    )
    .await?;
    assert_eq!(vec![PlainValue::Uint(2)], out.values);
    Ok(())
}

#[tokio::test]
async fn gt_on_equal_inputs_is_false() -> Result<()> {
    let _guard = init_tracing();
    let out = evaluate_file("test_resources/circuits/gt.circ", EvalConfig::default()).await?;
    assert_eq!(vec![PlainValue::Bit(false)], out.values);
    Ok(())
}

#[tokio::test]
async fn arithmetic_gates_match_plain_arithmetic() -> Result<()> {
    let _guard = init_tracing();
    let program = CircuitProgram::parse(
        "INPUT0_0\nINPUT1_1\n\
         ADD_2 INPUT0_0 INPUT1_1\n\
         SUB_3 INPUT0_0 INPUT1_1\n\
         MUL_4 INPUT0_0 INPUT1_1\n\
         DIV_5 INPUT0_0 INPUT1_1\n\
         OUTPUT_6 ADD_2\nOUTPUT_7 SUB_3\nOUTPUT_8 MUL_4\nOUTPUT_9 DIV_5\n",
    )?;
    let (a, b) = (0xdead_beef_u64, 0xcafe_u64);
    let config = EvalConfig {
        protocol: Protocol::Arithmetic,
        input_values: vec![a, b],
    };
    let out = evaluate_program(&program, config).await?;
    let modulus = 1_u64 << 32;
    assert_eq!(
        vec![
            PlainValue::Uint((a + b) % modulus),
            PlainValue::Uint((a.wrapping_sub(b)) % modulus),
            PlainValue::Uint(a.wrapping_mul(b) % modulus),
            PlainValue::Uint(a / b),
        ],
        out.values
    );
    Ok(())
}

#[tokio::test]
async fn comparison_identities_on_sampled_pairs() -> Result<()> {
    let _guard = init_tracing();
    let program = CircuitProgram::load("test_resources/circuits/cmp.circ")?;
    let mut rng = ChaCha12Rng::seed_from_u64(0x42);
    let mut samples: Vec<u64> = (0..6).map(|_| rng.gen_range(0..1_u64 << 32)).collect();
    // make sure the equal case is covered
    samples.push(samples[0]);
    for (&a, &b) in samples.iter().cartesian_product(samples.iter()) {
        let config = EvalConfig {
            protocol: Protocol::Boolean,
            input_values: vec![a, b],
        };
        let out = evaluate_program(&program, config).await?;
        let bits: Vec<bool> = out.values.iter().map(|v| v.as_bit()).collect();
        let [gt, lt, ge, le, eq, ne]: [bool; 6] =
            bits.try_into().expect("six comparison outputs");
        assert_eq!(a > b, gt);
        assert_eq!(a < b, lt);
        assert_eq!(!lt, ge);
        assert_eq!(!gt, le);
        assert_eq!(a == b, eq);
        assert_eq!(!eq, ne);
    }
    Ok(())
}

#[tokio::test]
async fn conversion_cycle_preserves_the_value() -> Result<()> {
    let _guard = init_tracing();
    let config = EvalConfig {
        protocol: Protocol::Arithmetic,
        input_values: vec![20, 22],
    };
    let out = evaluate_file("test_resources/circuits/conv_cycle.circ", config).await?;
    assert_eq!(vec![PlainValue::Uint(42)], out.values);
    Ok(())
}

#[tokio::test]
async fn mixed_protocol_circuit() -> Result<()> {
    let _guard = init_tracing();
    let config = EvalConfig {
        protocol: Protocol::Arithmetic,
        input_values: vec![5, 3],
    };
    let out = evaluate_file("test_resources/circuits/mixed.circ", config).await?;
    // ADD_2 = 8, MUL_3 = 24, XOR_6 = 24 ^ 8, AND_7 = 24 & 8, SUB_11 = 16 - 5
    assert_eq!(
        vec![
            PlainValue::Uint(16),
            PlainValue::Uint(8),
            PlainValue::Uint(11),
        ],
        out.values
    );
    Ok(())
}

#[tokio::test]
async fn outputs_follow_encounter_order() -> Result<()> {
    let _guard = init_tracing();
    let program = CircuitProgram::parse(
        "INPUT0_0\nINPUT1_1\n\
         ADD_2 INPUT0_0 INPUT1_1\n\
         OUTPUT_3 INPUT1_1\n\
         MUL_4 ADD_2 ADD_2\n\
         OUTPUT_5 MUL_4\n\
         OUTPUT_6 INPUT0_0\n",
    )?;
    let config = EvalConfig {
        protocol: Protocol::Arithmetic,
        input_values: vec![7, 9],
    };
    let out = evaluate_program(&program, config).await?;
    assert_eq!(
        vec![
            PlainValue::Uint(9),
            PlainValue::Uint(256),
            PlainValue::Uint(7),
        ],
        out.values
    );
    Ok(())
}

#[tokio::test]
async fn repeated_rounds_are_deterministic() -> Result<()> {
    let _guard = init_tracing();
    let program = CircuitProgram::load("test_resources/circuits/mixed.circ")?;
    let config = EvalConfig {
        protocol: Protocol::Arithmetic,
        input_values: vec![5, 3],
    };
    let (rounds, accumulated) =
        execute_rounds(&program, &config, 5, || Ok(PlainBackend::default())).await?;
    assert_eq!(5, rounds.len());
    assert_eq!(5, accumulated.rounds);
    for round in &rounds[1..] {
        assert_eq!(rounds[0].values, round.values);
    }
    assert_eq!(
        accumulated.total.gates,
        5 * rounds[0].statistics.gates
    );
    Ok(())
}

#[tokio::test]
async fn undefined_operand_is_a_fatal_structural_error() -> Result<()> {
    let _guard = init_tracing();
    let err = evaluate_file(
        "test_resources/circuits/undefined_operand.circ",
        EvalConfig::with_protocol(Protocol::Arithmetic),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::UnresolvedOperand { operand, .. }) if operand.as_str() == "INPUT1_9"
    ));
    Ok(())
}

#[tokio::test]
async fn declaration_after_use_is_a_fatal_structural_error() -> Result<()> {
    let _guard = init_tracing();
    // ADD_2 consumes INPUT1_1 before it is declared
    let program =
        CircuitProgram::parse("INPUT0_0\nADD_2 INPUT0_0 INPUT1_1\nINPUT1_1\nOUTPUT_3 ADD_2\n")?;
    let err = evaluate_program(&program, EvalConfig::with_protocol(Protocol::Arithmetic))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::UnresolvedOperand { .. })
    ));
    Ok(())
}

#[test]
fn unknown_gate_type_is_a_fatal_load_error() {
    let err = CircuitProgram::load("test_resources/circuits/unknown_gate.circ").unwrap_err();
    assert!(matches!(
        err,
        CircuitError::UnsupportedGate { prefix, .. } if prefix == "NAND"
    ));
}

#[tokio::test]
async fn bool_gate_on_arithmetic_shares_is_rejected() -> Result<()> {
    let _guard = init_tracing();
    let program =
        CircuitProgram::parse("INPUT0_0\nINPUT1_1\nAND_2 INPUT0_0 INPUT1_1\nOUTPUT_3 AND_2\n")?;
    let err = evaluate_program(&program, EvalConfig::with_protocol(Protocol::Arithmetic))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::BooleanFamilyRequired { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn arith_gate_on_boolean_shares_is_rejected() -> Result<()> {
    let _guard = init_tracing();
    let program = CircuitProgram::load("test_resources/circuits/add.circ")?;
    let err = evaluate_program(&program, EvalConfig::with_protocol(Protocol::Boolean))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::ProtocolMismatch {
            required: Protocol::Arithmetic,
            ..
        })
    ));
    Ok(())
}

#[tokio::test]
async fn conversion_from_wrong_protocol_is_rejected() -> Result<()> {
    let _guard = init_tracing();
    // A2B on a share that is already boolean
    let program = CircuitProgram::parse("INPUT0_0\nA2B_1 INPUT0_0\nOUTPUT_2 A2B_1\n")?;
    let err = evaluate_program(&program, EvalConfig::with_protocol(Protocol::Boolean))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::ProtocolMismatch { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn input_party_outside_configured_range_is_rejected() -> Result<()> {
    let _guard = init_tracing();
    let program = CircuitProgram::parse("INPUT2_0\nOUTPUT_1 INPUT2_0\n")?;
    let err = evaluate_program(&program, EvalConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::InvalidParty {
            party: 2,
            parties: 2,
            ..
        })
    ));
    Ok(())
}
