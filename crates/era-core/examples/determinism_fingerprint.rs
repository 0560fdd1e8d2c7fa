//! Final-state fingerprint of a fixed program, compared across hosts in CI.

use era_core::{simulate, DecodedInstruction, Opcode, SimConfig, HEADER_BYTES, SP};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const MEMORY_BYTES: u32 = 4096;

const fn op(format: u8, opcode: Opcode, regi: u8, regj: u8) -> [u8; 2] {
    DecodedInstruction::new(format, opcode, regi, regj).encode()
}

fn image() -> Vec<u8> {
    let static_data = [0x00, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x01];
    let program = [
        op(3, Opcode::Ld, 0, 1),    // R1 = mem[0]
        op(1, Opcode::LdaLdc, 4, 2), // R2 = 4
        op(3, Opcode::Ld, 2, 3),    // R3 = mem[4]
        op(1, Opcode::LdaLdc, 1, 4), // R4 = 1
        op(1, Opcode::LdaLdc, 18, 5), // R5 = loop head
        op(2, Opcode::Control, 1, 0), // loop: PRINT R1
        op(3, Opcode::Asr, 3, 3),
        op(1, Opcode::Xor, 3, 6),
        op(3, Opcode::Cnd, 1, 6),
        op(3, Opcode::Sub, 4, 1),
        op(3, Opcode::Mov, 1, 7),
        op(3, Opcode::Cbr, 7, 5),
        op(3, Opcode::St, 6, SP),    // first free byte
        op(0, Opcode::Control, 0, 0),
    ]
    .concat();

    let static_addr = HEADER_BYTES as u32;
    let program_addr = static_addr + static_data.len() as u32;
    let mut bytes = vec![0, 0];
    bytes.extend_from_slice(&static_addr.to_be_bytes());
    bytes.extend_from_slice(&(static_data.len() as u32 / 2).to_be_bytes());
    bytes.extend_from_slice(&program_addr.to_be_bytes());
    bytes.extend_from_slice(&(program.len() as u32 / 2).to_be_bytes());
    bytes.extend_from_slice(&static_data);
    bytes.extend_from_slice(&program);
    bytes
}

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> String {
    let config = SimConfig::default()
        .with_memory_bytes(MEMORY_BYTES)
        .with_tracing(true);
    let report = simulate(&image(), &config).expect("fingerprint program should stop");

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    hash_bytes(&mut hash, &report.steps.to_le_bytes());
    hash_bytes(&mut hash, &[report.status.code()]);
    for value in report.registers.as_array() {
        hash_bytes(&mut hash, &value.to_le_bytes());
    }
    for value in report.diagnostics.prints() {
        hash_bytes(&mut hash, &value.to_le_bytes());
    }
    hash_bytes(&mut hash, report.diagnostics.trace_text().as_bytes());
    hash_bytes(&mut hash, report.memory.as_bytes());

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}
