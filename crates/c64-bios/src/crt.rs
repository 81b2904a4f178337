//! CRT cartridge flashing.

use apf_bridge::{Bridge, BridgeError, BridgePort};
use format_crt::{chip, CartridgeClass, ChipHeader, RomWindow};

use crate::control::CorePort;

/// Flash the cartridge mounted in `slot_id` into the ROM windows.
///
/// Walks the CHIP packets from the fixed base offset, copying each
/// bank into the window selected by its load address. The walk stops
/// at the declared slot length or at the first bad signature; banks
/// already written stay applied. Packet lengths are trusted — there is
/// no cross-check against the slot length (see DESIGN.md).
///
/// Returns the cartridge class so the caller can issue the matching
/// reset, or `Ok(None)` when the slot is absent or the hardware type
/// is unsupported (in which case nothing was written).
pub(crate) fn load<P: BridgePort, C: CorePort>(
    bridge: &mut Bridge<P>,
    core: &mut C,
    slot_id: u16,
) -> Result<Option<CartridgeClass>, BridgeError> {
    let slot_length = bridge.slot_length(slot_id);
    if slot_length == 0 {
        return Ok(None);
    }

    let hw_type = bridge.read_u16(slot_id, format_crt::HW_TYPE_OFFSET)?.swap_bytes();
    let Some(class) = CartridgeClass::from_hardware_type(hw_type) else {
        log::warn!("unsupported CRT hardware type {hw_type} in slot {slot_id}, ignoring");
        return Ok(None);
    };

    let mut packet_base = format_crt::CHIP_BASE;
    while packet_base < slot_length {
        let signature = bridge.read_u32(slot_id, packet_base)?.swap_bytes();
        if signature != format_crt::CHIP_SIGNATURE {
            log::warn!("bad CHIP signature at offset {packet_base:#X}, stopping walk");
            break;
        }

        let header = ChipHeader {
            packet_length: bridge
                .read_u32(slot_id, packet_base + chip::PACKET_LENGTH)?
                .swap_bytes(),
            bank: bridge.read_u16(slot_id, packet_base + chip::BANK)?.swap_bytes(),
            load_address: bridge
                .read_u16(slot_id, packet_base + chip::LOAD_ADDRESS)?
                .swap_bytes(),
            image_size: bridge
                .read_u16(slot_id, packet_base + chip::IMAGE_SIZE)?
                .swap_bytes(),
        };

        let mut image = vec![0u8; usize::from(header.image_size)];
        bridge.read_bytes(slot_id, packet_base + chip::PAYLOAD, &mut image)?;
        match header.window() {
            RomWindow::Low => core.write_rom_low(header.bank_offset(), &image),
            RomWindow::High => core.write_rom_high(header.bank_offset(), &image),
        }
        log::debug!(
            "flashed bank {} ({} bytes) at ${:04X}",
            header.bank,
            header.image_size,
            header.load_address
        );

        if header.packet_length == 0 {
            // A zero-length packet cannot advance the walk.
            log::warn!("zero-length CHIP packet at offset {packet_base:#X}, stopping walk");
            break;
        }
        packet_base += header.packet_length;
    }

    Ok(Some(class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCore;
    use apf_bridge::testing::FakePort;

    /// Minimal CRT header: only the hardware type field matters here.
    fn make_crt_header(hw_type: u16) -> Vec<u8> {
        let mut header = vec![0u8; 0x40];
        header[0..16].copy_from_slice(b"C64 CARTRIDGE   ");
        header[0x16..0x18].copy_from_slice(&hw_type.to_be_bytes());
        header
    }

    fn make_chip(bank: u16, load_address: u16, payload: &[u8]) -> Vec<u8> {
        let mut packet = b"CHIP".to_vec();
        packet.extend_from_slice(&(0x10 + payload.len() as u32).to_be_bytes());
        packet.extend_from_slice(&[0x00, 0x00]); // chip type: ROM
        packet.extend_from_slice(&bank.to_be_bytes());
        packet.extend_from_slice(&load_address.to_be_bytes());
        packet.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        packet.extend_from_slice(payload);
        packet
    }

    fn run(crt: Vec<u8>) -> (Option<CartridgeClass>, FakeCore) {
        let mut port = FakePort::new();
        port.insert_slot(1, crt);
        let mut bridge = Bridge::new(port);
        let mut core = FakeCore::new();
        let class = load(&mut bridge, &mut core, 1).expect("load");
        (class, core)
    }

    #[test]
    fn two_banks_into_low_window() {
        let mut crt = make_crt_header(19);
        crt.extend(make_chip(0, 0x8000, &vec![0xA0; 0x2000]));
        crt.extend(make_chip(1, 0x8000, &vec![0xA1; 0x2000]));

        let (class, core) = run(crt);
        assert_eq!(class, Some(CartridgeClass::MagicDesk));
        assert!(core.rom_low[..0x2000].iter().all(|&b| b == 0xA0));
        assert!(core.rom_low[0x2000..0x4000].iter().all(|&b| b == 0xA1));
    }

    #[test]
    fn high_window_by_load_address() {
        let mut crt = make_crt_header(32);
        crt.extend(make_chip(0, 0x8000, &vec![0x11; 0x2000]));
        crt.extend(make_chip(0, 0xA000, &vec![0x22; 0x2000]));

        let (class, core) = run(crt);
        assert_eq!(class, Some(CartridgeClass::EasyFlash));
        assert!(core.rom_low[..0x2000].iter().all(|&b| b == 0x11));
        assert!(core.rom_high[..0x2000].iter().all(|&b| b == 0x22));
    }

    #[test]
    fn unsupported_type_writes_nothing() {
        let mut crt = make_crt_header(5); // Ocean: not supported here
        crt.extend(make_chip(0, 0x8000, &vec![0xFF; 0x2000]));

        let (class, core) = run(crt);
        assert_eq!(class, None);
        assert!(core.rom_low.iter().all(|&b| b == 0));
        assert!(core.rom_high.iter().all(|&b| b == 0));
    }

    #[test]
    fn bad_signature_stops_but_keeps_earlier_banks() {
        let mut crt = make_crt_header(19);
        crt.extend(make_chip(0, 0x8000, &vec![0xA0; 0x100]));
        let mut broken = make_chip(1, 0x8000, &vec![0xA1; 0x100]);
        broken[0..4].copy_from_slice(b"JUNK");
        crt.extend(broken);

        let (class, core) = run(crt);
        assert_eq!(class, Some(CartridgeClass::MagicDesk));
        assert!(core.rom_low[..0x100].iter().all(|&b| b == 0xA0));
        assert!(core.rom_low[0x100..0x200].iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_length_packet_terminates_walk() {
        let mut crt = make_crt_header(19);
        let mut packet = make_chip(0, 0x8000, &[0x77; 0x10]);
        packet[4..8].copy_from_slice(&0u32.to_be_bytes());
        crt.extend(packet);

        let (class, core) = run(crt);
        assert_eq!(class, Some(CartridgeClass::MagicDesk));
        // The packet itself is still applied.
        assert!(core.rom_low[..0x10].iter().all(|&b| b == 0x77));
    }

    #[test]
    fn absent_slot_is_a_no_op() {
        let mut bridge = Bridge::new(FakePort::new());
        let mut core = FakeCore::new();
        assert_eq!(load(&mut bridge, &mut core, 1), Ok(None));
    }
}
