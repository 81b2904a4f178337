//! G64 disk image track directory layout.
//!
//! A G64 image stores GCR-encoded track data addressed through a
//! fixed-size directory: starting at byte 12, one 4-byte offset per
//! track for 84 half-track slots. A zero offset marks the track
//! absent. A nonzero offset points at a 2-byte track-length field; the
//! GCR data itself starts 2 bytes later. Both the offsets and the
//! length field are stored little-endian.

/// Number of track slots in the directory (84 half tracks).
pub const TRACK_COUNT: usize = 84;

/// Byte offset of the track offset table within the image.
pub const OFFSET_TABLE_BASE: u32 = 12;

/// Size of the track-length prefix preceding each track's data.
pub const LENGTH_PREFIX_SIZE: u32 = 2;

/// Byte offset of a track's entry in the offset table.
#[must_use]
pub fn offset_table_entry(track: usize) -> u32 {
    OFFSET_TABLE_BASE + track as u32 * 4
}

/// Where a track's GCR data starts, given the raw offset field.
///
/// `None` when the raw offset is zero (track absent); otherwise the
/// raw offset adjusted past the embedded track-length prefix.
#[must_use]
pub fn data_offset(raw_offset: u32) -> Option<u32> {
    if raw_offset == 0 {
        None
    } else {
        Some(raw_offset + LENGTH_PREFIX_SIZE)
    }
}

/// Per-track offset/length table built from a G64 image.
///
/// Offsets stored here already point at the GCR data (past the length
/// prefix); 0 encodes "absent".
pub struct TrackDirectory {
    offsets: [u32; TRACK_COUNT],
    lengths: [u16; TRACK_COUNT],
}

impl TrackDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            offsets: [0; TRACK_COUNT],
            lengths: [0; TRACK_COUNT],
        }
    }

    /// Record a present track.
    ///
    /// `data_offset` must already be adjusted past the length prefix
    /// (see [`data_offset`]).
    pub fn set(&mut self, track: usize, data_offset: u32, length: u16) {
        if track < TRACK_COUNT {
            self.offsets[track] = data_offset;
            self.lengths[track] = length;
        }
    }

    /// Whether the track has data.
    #[must_use]
    pub fn is_present(&self, track: usize) -> bool {
        track < TRACK_COUNT && self.offsets[track] != 0
    }

    /// Image offset of the track's GCR data, `None` if absent.
    #[must_use]
    pub fn offset(&self, track: usize) -> Option<u32> {
        if self.is_present(track) {
            Some(self.offsets[track])
        } else {
            None
        }
    }

    /// Track data length in bytes (0 for absent tracks).
    #[must_use]
    pub fn length(&self, track: usize) -> u16 {
        if track < TRACK_COUNT {
            self.lengths[track]
        } else {
            0
        }
    }
}

impl Default for TrackDirectory {
    fn default() -> Self {
        Self::new()
    }
}
