//! PRG program injection into machine RAM.

use apf_bridge::{Bridge, BridgeError, BridgePort};

use crate::control::CorePort;

/// Load the program mounted in `slot_id` into machine RAM.
///
/// Reads the 2-byte little-endian load address, copies the remaining
/// payload to that address, and patches the BASIC zero-page pointers
/// with the end address so the interpreter sees the program as if it
/// had been LOADed normally. The load address is not range-checked; an
/// oversized program wraps through RAM, as on the real machine.
///
/// Returns `Ok(None)` when the slot is absent or too short to carry a
/// program.
pub(crate) fn load<P: BridgePort, C: CorePort>(
    bridge: &mut Bridge<P>,
    core: &mut C,
    slot_id: u16,
) -> Result<Option<u16>, BridgeError> {
    let slot_length = bridge.slot_length(slot_id);
    if slot_length <= format_prg::HEADER_SIZE {
        if slot_length != 0 {
            log::warn!("PRG slot {slot_id} too short ({slot_length} bytes), skipping");
        }
        return Ok(None);
    }

    let mut header = [0u8; 2];
    bridge.read_bytes(slot_id, 0, &mut header)?;
    let load_address = format_prg::load_address(header);
    let payload_length = slot_length - format_prg::HEADER_SIZE;

    let mut payload = vec![0u8; payload_length as usize];
    bridge.read_bytes(slot_id, format_prg::HEADER_SIZE, &mut payload)?;
    core.write_ram(load_address, &payload);

    let end = format_prg::end_address(load_address, payload_length);
    for pointer in format_prg::BASIC_POINTERS {
        core.write_ram(pointer, &end.to_le_bytes());
    }

    log::debug!(
        "loaded PRG from slot {slot_id}: {payload_length} bytes at ${load_address:04X}"
    );
    Ok(Some(load_address))
}
