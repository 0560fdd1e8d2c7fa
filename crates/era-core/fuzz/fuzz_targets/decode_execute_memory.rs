#![no_main]

use era_core::{validate_word_access, BoundsCheck, Decoder, ImageHeader, Machine, SimConfig};
use libfuzzer_sys::fuzz_target;

const MEMORY_BYTES: u32 = 512;

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }

    let word = u16::from_be_bytes([data[0], data[1]]);
    let addr = u32::from_be_bytes([data[2], data[3], data[4], data[5]]);

    let instr = Decoder::decode_word(word);
    assert_eq!(instr.encode(), word.to_be_bytes());

    let _ = validate_word_access(addr, MEMORY_BYTES, BoundsCheck::Compatible);
    let _ = validate_word_access(addr, MEMORY_BYTES, BoundsCheck::Strict);
    let _ = ImageHeader::parse(data);

    let bounds_check = if data[5] & 1 == 0 {
        BoundsCheck::Compatible
    } else {
        BoundsCheck::Strict
    };
    let config = SimConfig::default()
        .with_memory_bytes(MEMORY_BYTES)
        .with_tracing(true)
        .with_bounds_check(bounds_check);

    let mut machine = Machine::new(config);
    let payload = &data[..data.len().min(MEMORY_BYTES as usize)];
    let _ = machine.memory.write_bytes(0, payload);
    for index in 0..31_u8 {
        machine.regs.set(index, addr.rotate_left(u32::from(index)));
    }
    machine.regs.set_pc(0);

    for _ in 0..256 {
        if machine.step().is_err() || machine.run_state.is_terminal() {
            break;
        }
    }

    let _ = machine.load(data);
});
