//! G64 disk service: track directory build and on-demand track
//! streaming into the drive's hardware track buffer.

use apf_bridge::{Bridge, BridgeError, BridgePort, TransferRequest};
use format_g64::TrackDirectory;

use crate::control::CorePort;

/// Bridge-side destination address of the hardware track buffer.
///
/// Transfers here bypass the staging path: the drive electronics read
/// the buffer directly.
pub const TRACK_BUFFER_ADDR: u32 = 0x9000_0000;

/// Per-image state for the mounted G64 slot.
pub struct DiskService {
    slot_id: u16,
    directory: Option<TrackDirectory>,
    /// Track currently in the hardware buffer (`None` = nothing
    /// loaded since the last directory rebuild).
    current_track: Option<u8>,
}

impl DiskService {
    #[must_use]
    pub fn new(slot_id: u16) -> Self {
        Self {
            slot_id,
            directory: None,
            current_track: None,
        }
    }

    /// Track currently held in the hardware buffer.
    #[must_use]
    pub fn current_track(&self) -> Option<u8> {
        self.current_track
    }

    /// Rebuild the track directory after the host rewrote the slot.
    ///
    /// Reads the 84-entry offset table, adjusts each present entry
    /// past its track-length prefix, and reads the length fields. The
    /// table and the length fields are little-endian in the image, so
    /// the staged values need no swapping. Resets the current-track
    /// marker so the next status poll reloads.
    pub fn rebuild_directory<P: BridgePort>(
        &mut self,
        bridge: &mut Bridge<P>,
    ) -> Result<(), BridgeError> {
        self.current_track = None;
        if bridge.slot_length(self.slot_id) == 0 {
            self.directory = None;
            return Ok(());
        }

        let mut directory = TrackDirectory::new();
        for track in 0..format_g64::TRACK_COUNT {
            let raw = bridge.read_u32(self.slot_id, format_g64::offset_table_entry(track))?;
            if let Some(data_offset) = format_g64::data_offset(raw) {
                // Length field sits immediately before the data.
                let length = bridge.read_u16(self.slot_id, raw)?;
                directory.set(track, data_offset, length);
            }
        }
        self.directory = Some(directory);
        log::debug!("rebuilt G64 track directory for slot {}", self.slot_id);
        Ok(())
    }

    /// Service the drive: if it requests a track other than the one in
    /// the hardware buffer, kick a refill.
    ///
    /// The refill is fire-and-forget — the transfer is started but not
    /// polled to completion; it is assumed to finish well within a
    /// tick, before the drive electronics need the data.
    pub fn service<P: BridgePort, C: CorePort>(
        &mut self,
        bridge: &mut Bridge<P>,
        core: &mut C,
    ) -> Result<(), BridgeError> {
        let Some(directory) = &self.directory else {
            return Ok(());
        };

        let track = core.drive_status().requested_track();
        if self.current_track == Some(track) {
            return Ok(());
        }

        if let Some(offset) = directory.offset(usize::from(track)) {
            let length = directory.length(usize::from(track));
            core.set_track_length(length);
            bridge.start_transfer(TransferRequest {
                slot_id: self.slot_id,
                slot_offset: offset,
                dest_address: TRACK_BUFFER_ADDR,
                length: u32::from(length),
            })?;
            log::debug!("streaming track {track} ({length} bytes)");
        }
        // Absent tracks leave the buffer untouched; either way this
        // request is answered.
        self.current_track = Some(track);
        Ok(())
    }
}
