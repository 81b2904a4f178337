//! Data-slot bridge transport.
//!
//! The host mounts images into numbered "data slots" and exposes them
//! through a polled request/response interface: four request registers
//! (slot id, slot offset, destination address, length), a command/status
//! word, a 256-byte staging buffer, and a 32-entry (id, length) slot
//! directory. A transfer is issued by writing the request registers
//! followed by the trigger word; completion is signalled when the high
//! half of the status word reads the `ok` sentinel.
//!
//! The protocol is single-channel: exactly one transfer may be
//! outstanding at a time. Every read here runs to completion before
//! returning, bounded by a poll budget — a transfer that never
//! completes surfaces as [`BridgeError::Stalled`] instead of hanging
//! the caller.

mod port;
pub mod testing;

pub use port::{BridgePort, MmioPort};

/// Size of the bridge staging buffer (DPRAM), in bytes.
///
/// Chunked reads never request more than this per transfer.
pub const STAGING_SIZE: usize = 256;

/// Destination address of the staging buffer in the bridge address map.
pub const STAGING_ADDR: u32 = 0x7000_0000;

/// Command word triggering a data-slot read ("cm", command 0x0180).
pub const CMD_SLOT_READ: u32 = 0x636D_0180;

/// Status sentinel in the high half of the command/status word ("ok").
pub const STATUS_OK: u32 = 0x6F6B;

/// Number of rows in the slot directory.
pub const SLOT_DIRECTORY_ROWS: usize = 32;

/// One row of the host-owned slot directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEntry {
    /// Slot id this row describes (0 = empty row).
    pub slot_id: u16,
    /// Mounted image length in bytes.
    pub length: u32,
}

/// A single transfer request, written to the request registers before
/// the trigger command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    /// Source slot.
    pub slot_id: u16,
    /// Byte offset within the slot.
    pub slot_offset: u32,
    /// Destination address in the bridge address map.
    pub dest_address: u32,
    /// Transfer length in bytes.
    pub length: u32,
}

/// Bridge transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// A transfer did not complete within the poll budget.
    Stalled,
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stalled => write!(f, "data-slot transfer did not complete within the poll budget"),
        }
    }
}

impl std::error::Error for BridgeError {}

/// Bridge client tuning.
#[derive(Debug, Clone, Copy)]
pub struct BridgeConfig {
    /// Maximum status polls per transfer before reporting a stall.
    pub poll_budget: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_budget: 1_000_000,
        }
    }
}

/// Synchronous client over a [`BridgePort`].
///
/// Scalar reads return the staged value in native byte order. Source
/// formats that store fields big-endian (CRT headers, CHIP packets)
/// therefore come back byte-reversed and the caller applies
/// `swap_bytes`; little-endian fields (PRG load address, G64 track
/// table) read back as-is.
pub struct Bridge<P: BridgePort> {
    port: P,
    config: BridgeConfig,
}

impl<P: BridgePort> Bridge<P> {
    pub fn new(port: P) -> Self {
        Self::with_config(port, BridgeConfig::default())
    }

    pub fn with_config(port: P, config: BridgeConfig) -> Self {
        Self { port, config }
    }

    /// Resolve a slot id to its mounted length via the slot directory.
    ///
    /// Returns 0 when the slot is absent; callers treat 0 as "nothing
    /// to load".
    pub fn slot_length(&mut self, slot_id: u16) -> u32 {
        for row in 0..SLOT_DIRECTORY_ROWS {
            let entry = self.port.slot_entry(row);
            if entry.slot_id == slot_id {
                return entry.length;
            }
        }
        0
    }

    /// Read a 16-bit value from a slot through the staging buffer.
    pub fn read_u16(&mut self, slot_id: u16, slot_offset: u32) -> Result<u16, BridgeError> {
        let mut buf = [0u8; 2];
        self.transfer_to_staging(slot_id, slot_offset, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a 32-bit value from a slot through the staging buffer.
    pub fn read_u32(&mut self, slot_id: u16, slot_offset: u32) -> Result<u32, BridgeError> {
        let mut buf = [0u8; 4];
        self.transfer_to_staging(slot_id, slot_offset, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read `dst.len()` bytes from a slot into `dst`.
    ///
    /// Issues as many staging-sized transfers as needed, polling each
    /// to completion before copying it out; the final chunk may be
    /// short. Blocks for the full transfer duration.
    pub fn read_bytes(
        &mut self,
        slot_id: u16,
        slot_offset: u32,
        dst: &mut [u8],
    ) -> Result<(), BridgeError> {
        let mut offset = slot_offset;
        for chunk in dst.chunks_mut(STAGING_SIZE) {
            self.transfer_to_staging(slot_id, offset, chunk)?;
            offset += chunk.len() as u32;
        }
        Ok(())
    }

    /// Kick off a transfer to a hardware destination without waiting
    /// for it to complete.
    ///
    /// Waits for any previous command to finish first (the protocol is
    /// single-channel), then fires and returns. Used for the track
    /// buffer path, where the drive electronics consume the data
    /// directly.
    pub fn start_transfer(&mut self, req: TransferRequest) -> Result<(), BridgeError> {
        self.wait_ready()?;
        self.port.submit(req);
        Ok(())
    }

    /// Block until the bridge reports no command in flight.
    pub fn wait_ready(&mut self) -> Result<(), BridgeError> {
        for _ in 0..self.config.poll_budget {
            if self.port.status_ok() {
                return Ok(());
            }
        }
        log::error!("bridge stalled waiting for command completion");
        Err(BridgeError::Stalled)
    }

    /// Sample the updated-slots bitmask (one bit per low-numbered slot
    /// id, read-to-clear).
    pub fn updated_slots(&mut self) -> u32 {
        self.port.updated_slots()
    }

    /// Access the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// One staging transfer: submit, poll to completion, copy out.
    fn transfer_to_staging(
        &mut self,
        slot_id: u16,
        slot_offset: u32,
        dst: &mut [u8],
    ) -> Result<(), BridgeError> {
        debug_assert!(dst.len() <= STAGING_SIZE);
        // Single-channel protocol: a fire-and-forget track transfer may
        // still be in flight.
        self.wait_ready()?;
        self.port.submit(TransferRequest {
            slot_id,
            slot_offset,
            dest_address: STAGING_ADDR,
            length: dst.len() as u32,
        });
        self.wait_ready()?;
        self.port.read_staging(dst);
        Ok(())
    }
}
