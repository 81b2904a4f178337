//! End-to-end PRG autoload: slot update → reset → delayed load →
//! auto-typed RUN sequence.

use apf_bridge::testing::FakePort;
use c64_bios::testing::FakeCore;
use c64_bios::{Bios, BiosConfig, MatrixCode};

fn make_prg(load_address: u16, payload: &[u8]) -> Vec<u8> {
    let mut prg = load_address.to_le_bytes().to_vec();
    prg.extend_from_slice(payload);
    prg
}

fn make_bios(prg: Vec<u8>) -> Bios<FakePort, FakeCore> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut port = FakePort::new();
    port.insert_slot(0, prg);
    port.notify_slot(0);
    Bios::new(port, FakeCore::new(), BiosConfig::default())
}

#[test]
fn autoload_sequence() {
    let payload: Vec<u8> = (0..1000u32).map(|i| (i * 7) as u8).collect();
    let mut bios = make_bios(make_prg(0x0801, &payload));

    // Event lands on tick 1 (T = 1). Run through the whole cycle.
    for _ in 0..420 {
        bios.tick().expect("tick");
    }

    let core = bios.core();

    // Reset issued when the update was seen, no cartridge configured.
    assert_eq!(core.resets, vec![None]);

    // Program landed in RAM with the BASIC pointers patched.
    assert_eq!(core.ram[0x0801..0x0801 + payload.len()], payload[..]);
    let end = 0x0801u16 + payload.len() as u16;
    for pointer in [0x2Du16, 0x2F, 0x31, 0xAE] {
        let addr = usize::from(pointer);
        assert_eq!(core.ram[addr], (end & 0xFF) as u8);
        assert_eq!(core.ram[addr + 1], (end >> 8) as u8);
    }

    // Key assertions: R during [T+300, T+340), U/N/RETURN for 20 ticks
    // each, idle afterwards. keyboard_masks[n-1] is the mask at tick n.
    let t = 1u32;
    for (idx, &mask) in core.keyboard_masks.iter().enumerate() {
        let tick = idx as u32 + 1;
        let expected = match tick.wrapping_sub(t) {
            300..340 => MatrixCode::R.mask(),
            340..360 => MatrixCode::U.mask(),
            360..380 => MatrixCode::N.mask(),
            380..400 => MatrixCode::RETURN.mask(),
            _ => 0,
        };
        assert_eq!(mask, expected, "tick {tick}");
    }
}

#[test]
fn second_update_mid_cycle_is_ignored() {
    let payload = vec![0xEE; 64];
    let mut bios = make_bios(make_prg(0x0801, &payload));

    for _ in 0..150 {
        bios.tick().expect("tick");
    }
    // Host rewrites the slot while the automaton is mid-cycle.
    bios.bridge_mut().port_mut().notify_slot(0);
    for _ in 0..270 {
        bios.tick().expect("tick");
    }

    // Still exactly one reset and one completed cycle.
    assert_eq!(bios.core().resets.len(), 1);
    let return_ticks = bios
        .core()
        .keyboard_masks
        .iter()
        .filter(|&&m| m == MatrixCode::RETURN.mask())
        .count();
    assert_eq!(return_ticks, 20);
}

#[test]
fn absent_slot_never_starts_a_cycle() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut port = FakePort::new();
    port.notify_slot(0); // update bit without a mounted slot
    let mut bios = Bios::new(port, FakeCore::new(), BiosConfig::default());

    for _ in 0..420 {
        bios.tick().expect("tick");
    }

    // The cycle runs (reset fires on the notification) but the load is
    // a no-op and RAM stays clean.
    assert_eq!(bios.core().resets.len(), 1);
    assert!(bios.core().ram.iter().all(|&b| b == 0));
}
