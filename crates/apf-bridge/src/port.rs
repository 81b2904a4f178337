//! Bridge hardware port: register map and memory-mapped access.

use crate::{SlotEntry, TransferRequest, CMD_SLOT_READ, STATUS_OK};

/// Raw register-level access to the bridge.
///
/// This is the narrow seam between the transport client and the
/// hardware. The production implementation is [`MmioPort`]; tests use
/// [`crate::testing::FakePort`].
pub trait BridgePort {
    /// Write the four request registers, then the trigger command word.
    fn submit(&mut self, req: TransferRequest);

    /// Whether the high half of the command/status word reads the `ok`
    /// sentinel (no command in flight).
    fn status_ok(&mut self) -> bool;

    /// Copy `dst.len()` bytes out of the staging buffer.
    fn read_staging(&mut self, dst: &mut [u8]);

    /// Read one row of the slot directory.
    fn slot_entry(&mut self, row: usize) -> SlotEntry;

    /// Read the updated-slots bitmask. Read-to-clear: bits report slots
    /// rewritten by the host since the previous read.
    fn updated_slots(&mut self) -> u32;
}

/// Memory-mapped bridge registers.
///
/// Addresses match the fixed bridge address map: command/status word,
/// request field block, staging DPRAM, slot directory, and the
/// updated-slots bitmask.
mod map {
    pub const COMMAND: usize = 0x4000_0000;
    pub const SLOT_ID: usize = 0x4000_0020;
    pub const SLOT_OFFSET: usize = 0x4000_0024;
    pub const DEST_ADDR: usize = 0x4000_0028;
    pub const LENGTH: usize = 0x4000_002C;
    pub const UPDATED_SLOTS: usize = 0x4000_0080;
    pub const DPRAM: usize = 0x7000_0000;
    pub const SLOT_DIRECTORY: usize = 0x9000_0000;
}

/// Volatile register access at the fixed bridge addresses.
pub struct MmioPort {
    _private: (),
}

impl MmioPort {
    /// # Safety
    ///
    /// Callers must guarantee the bridge register block is mapped at
    /// the fixed addresses, i.e. this code is running on the target
    /// hardware. At most one `MmioPort` may drive the bridge at a time.
    #[must_use]
    #[allow(unsafe_code)]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

#[allow(unsafe_code)]
impl BridgePort for MmioPort {
    fn submit(&mut self, req: TransferRequest) {
        unsafe {
            core::ptr::write_volatile(map::SLOT_ID as *mut u32, u32::from(req.slot_id));
            core::ptr::write_volatile(map::SLOT_OFFSET as *mut u32, req.slot_offset);
            core::ptr::write_volatile(map::DEST_ADDR as *mut u32, req.dest_address);
            core::ptr::write_volatile(map::LENGTH as *mut u32, req.length);
            core::ptr::write_volatile(map::COMMAND as *mut u32, CMD_SLOT_READ);
        }
    }

    fn status_ok(&mut self) -> bool {
        let status = unsafe { core::ptr::read_volatile(map::COMMAND as *const u32) };
        (status >> 16) == STATUS_OK
    }

    fn read_staging(&mut self, dst: &mut [u8]) {
        let base = map::DPRAM as *const u8;
        for (idx, byte) in dst.iter_mut().enumerate() {
            *byte = unsafe { core::ptr::read_volatile(base.add(idx)) };
        }
    }

    fn slot_entry(&mut self, row: usize) -> SlotEntry {
        let base = map::SLOT_DIRECTORY as *const u32;
        let slot_id = unsafe { core::ptr::read_volatile(base.add(row * 2)) } as u16;
        let length = unsafe { core::ptr::read_volatile(base.add(row * 2 + 1)) };
        SlotEntry { slot_id, length }
    }

    fn updated_slots(&mut self) -> u32 {
        unsafe { core::ptr::read_volatile(map::UPDATED_SLOTS as *const u32) }
    }
}
