#![no_main]
use libfuzzer_sys::fuzz_target;
use rar_unpack::BitReader;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte drives the read widths, the rest is the bit stream
    let widths = data[0];
    let mut reader = BitReader::new(&data[1..]);
    let mut i = 0u32;
    loop {
        let n = ((widths as u32 >> (i % 8)) + i) % 17;
        if i % 5 == 4 {
            reader.align_to_byte();
        }
        if reader.read_bits(n).is_err() {
            break;
        }
        i += 1;
    }
    assert!(reader.bit_position() <= (data.len() as u64 - 1) * 8);
});
