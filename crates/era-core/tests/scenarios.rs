//! End-to-end runs of small hand-assembled images.

use era_core::{
    render_dump, simulate, DecodedInstruction, ExitStatus, FaultCode, LoadError, Opcode, RunError,
    SimConfig, SimError, SimulationFailure, SimulationReport, HEADER_BYTES,
};
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const fn op(format: u8, opcode: Opcode, regi: u8, regj: u8) -> [u8; 2] {
    DecodedInstruction::new(format, opcode, regi, regj).encode()
}

const STOP: [u8; 2] = op(0, Opcode::Control, 0, 0);
const SKIP: [u8; 2] = op(1, Opcode::Control, 0, 0);

const fn print(reg: u8) -> [u8; 2] {
    op(2, Opcode::Control, reg, 0)
}

const fn ldc(value: u8, reg: u8) -> [u8; 2] {
    op(1, Opcode::LdaLdc, value, reg)
}

fn image(static_data: &[u8], program: &[u8]) -> Vec<u8> {
    let static_addr = HEADER_BYTES as u32;
    let program_addr = static_addr + static_data.len() as u32;

    let mut bytes = vec![0, 0];
    bytes.extend_from_slice(&static_addr.to_be_bytes());
    bytes.extend_from_slice(&(static_data.len() as u32 / 2).to_be_bytes());
    bytes.extend_from_slice(&program_addr.to_be_bytes());
    bytes.extend_from_slice(&(program.len() as u32 / 2).to_be_bytes());
    bytes.extend_from_slice(static_data);
    bytes.extend_from_slice(program);
    bytes
}

fn program(words: &[[u8; 2]]) -> Vec<u8> {
    words.concat()
}

fn run(static_data: &[u8], words: &[[u8; 2]]) -> SimulationReport {
    let config = SimConfig::default().with_memory_bytes(256);
    simulate(&image(static_data, &program(words)), &config).expect("program stops")
}

fn fail(words: &[[u8; 2]], memory_bytes: u32) -> SimulationFailure {
    let config = SimConfig::default().with_memory_bytes(memory_bytes);
    simulate(&image(&[], &program(words)), &config).expect_err("program fails")
}

#[test]
fn single_stop_halts_with_clean_state() {
    let report = run(&[], &[STOP]);

    assert_eq!(report.status, ExitStatus::Stop);
    assert_eq!(report.registers.pc(), 2);
    assert!(report.registers.as_array()[..28].iter().all(|r| *r == 0));
    assert_eq!(report.steps, 1);
}

#[test]
fn ldc_then_print_logs_the_immediate() {
    let report = run(&[], &[ldc(5, 0), print(0), STOP]);

    assert_eq!(report.diagnostics.prints(), &[5]);
    assert_eq!(report.diagnostics.print_log(), "5\n");
}

#[test]
fn word_add_overflow_wraps_to_zero() {
    // R1 = 0 + 0xFFFF_FFFF, R2 = 1, R2 += R1
    let mut words = vec![op(0, Opcode::LdaLdc, 0, 1)];
    words.extend([[0xFF, 0xFF], [0xFF, 0xFF]]);
    words.extend([ldc(1, 2), op(3, Opcode::Add, 1, 2), STOP]);

    let report = run(&[], &words);
    assert_eq!(report.registers.get(1), u32::MAX);
    assert_eq!(report.registers.get(2), 0);
}

#[test]
fn taken_branch_links_return_address() {
    let words = [
        ldc(1, 1),                      // 0
        op(0, Opcode::LdaLdc, 0, 2),    // 2
        [0x00, 0x00],                   // 4: const hi
        [0x00, 0x0E],                   // 6: const lo = 14
        op(3, Opcode::Cbr, 1, 2),       // 8
        ldc(7, 3),                      // 10
        STOP,                           // 12
        print(1),                       // 14
        STOP,                           // 16
    ];

    let report = run(&[], &words);
    assert_eq!(report.diagnostics.prints(), &[10]);
    assert_eq!(report.registers.get(1), 10);
    assert_eq!(report.registers.get(3), 0);
    assert_eq!(report.registers.pc(), 18);
}

#[test]
fn countdown_loop_prints_each_value() {
    let words = [
        ldc(3, 1),                 // 0: counter
        ldc(1, 2),                 // 2: decrement
        ldc(6, 5),                 // 4: loop head
        print(1),                  // 6
        op(3, Opcode::Sub, 2, 1),  // 8
        op(3, Opcode::Mov, 1, 6),  // 10
        op(3, Opcode::Cbr, 6, 5),  // 12
        STOP,                      // 14
    ];

    let report = run(&[], &words);
    assert_eq!(report.diagnostics.prints(), &[3, 2, 1]);
    assert_eq!(report.registers.get(1), 0);
    assert_eq!(report.registers.pc(), 16);
}

#[test]
fn static_data_is_loaded_and_stored_back() {
    let words = [
        op(3, Opcode::Ld, 0, 3),
        print(3),
        ldc(20, 4),
        op(3, Opcode::St, 3, 4),
        STOP,
    ];

    let report = run(&[0x00, 0x00, 0x00, 0x2A], &words);
    assert_eq!(report.registers.sb(), 0);
    assert_eq!(report.registers.sp(), 14);
    assert_eq!(report.diagnostics.prints(), &[42]);
    assert_eq!(&report.memory.as_bytes()[20..24], &[0, 0, 0, 0x2A]);
}

#[test]
fn sub_word_ops_keep_destination_high_bits() {
    let mut words = vec![op(0, Opcode::LdaLdc, 0, 1)];
    words.extend([[0x12, 0x34], [0x56, 0x78]]);
    words.push(op(0, Opcode::LdaLdc, 0, 2));
    words.extend([[0xAA, 0xBB], [0xCC, 0xDD]]);
    words.extend([op(0, Opcode::Mov, 1, 2), STOP]);

    let report = run(&[], &words);
    assert_eq!(report.registers.get(2), 0xAABB_CC78);
}

#[rstest]
#[case(op(3, Opcode::Mov, 0, 31))]
#[case(op(0, Opcode::Control, 0, 31))]
#[case(op(2, Opcode::Cnd, 4, 31))]
fn pc_as_destination_fails_with_status_11(#[case] word: [u8; 2]) {
    let failure = fail(&[word, STOP], 64);

    assert_eq!(
        failure.error,
        RunError::Execution(SimError::Fault {
            code: FaultCode::WrongRegister,
            pc: 2,
        })
    );
    assert_eq!(failure.steps, 0);
}

#[test]
fn load_beyond_capacity_fails_with_status_10() {
    let mut words = vec![op(0, Opcode::LdaLdc, 0, 1)];
    words.extend([[0x00, 0x01], [0x00, 0x00]]);
    words.extend([print(1), op(3, Opcode::Ld, 1, 2), STOP]);

    let failure = fail(&words, 64);
    match failure.error {
        RunError::Execution(error) => assert_eq!(error.status_code(), Some(10)),
        RunError::Load(error) => panic!("unexpected load error: {error}"),
    }
    assert_eq!(failure.diagnostics.prints(), &[0x1_0000]);
}

#[test]
fn running_off_the_end_of_memory_is_fatal() {
    let failure = fail(&[SKIP, SKIP, SKIP, SKIP], 8);

    assert_eq!(
        failure.error,
        RunError::Execution(SimError::FetchOutOfRange { pc: 8, capacity: 8 })
    );
    assert_eq!(failure.steps, 4);
}

#[test]
fn truncated_image_is_a_load_failure() {
    let failure = simulate(&[0; HEADER_BYTES - 1], &SimConfig::default()).expect_err("too short");
    assert_eq!(
        failure.error,
        RunError::Load(LoadError::TruncatedHeader {
            len: HEADER_BYTES - 1
        })
    );
}

#[test]
fn traced_run_appends_trace_to_dump() {
    let config = SimConfig::default().with_memory_bytes(32).with_tracing(true);
    let report = simulate(&image(&[], &program(&[ldc(5, 0), print(0), STOP])), &config)
        .expect("stops");

    let dump = render_dump(&report, true);
    let trace: Vec<&str> = dump.lines().skip_while(|line| !line.starts_with('[')).collect();
    assert_eq!(
        trace,
        [
            "[2] LDA/LDC: 5, 0  (0  0)",
            "[4] STOP/SKIP/PRINT: 0, 0  (5  5)",
            "[6] STOP/SKIP/PRINT: 0, 0  (5  5)",
        ]
    );
}

#[test]
fn batches_do_not_share_state() {
    let config = SimConfig::default().with_memory_bytes(64);
    let writer = image(&[], &program(&[ldc(9, 1), ldc(30, 2), op(3, Opcode::St, 1, 2), STOP]));
    let reader = image(&[], &program(&[ldc(30, 2), op(3, Opcode::Ld, 2, 3), STOP]));

    let first = simulate(&writer, &config).expect("stops");
    let second = simulate(&reader, &config).expect("stops");

    assert_eq!(first.memory.as_bytes()[33], 9);
    assert_eq!(second.registers.get(3), 0);
}
