#![no_main]
use libfuzzer_sys::fuzz_target;
use rar_unpack::{FilterBlock, FilterKind};

fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }

    // Byte 0 picks the filter, bytes 1-8 the absolute offset, byte 9 the parameter
    let offset = u64::from_le_bytes([
        data[1], data[2], data[3], data[4], data[5], data[6], data[7], data[8],
    ]);
    let kind = match data[0] % 3 {
        0 => FilterKind::E8 {
            opcode: data[9],
            rar5: data[0] & 0x80 != 0,
        },
        1 => FilterKind::Delta {
            channels: data[9] as usize,
        },
        _ => FilterKind::Arm,
    };

    let payload = data[10..].to_vec();
    let block = FilterBlock::new(kind, offset, payload.len());
    if let Ok(out) = block.apply(payload) {
        assert_eq!(out.len(), data.len() - 10);
    }
});
