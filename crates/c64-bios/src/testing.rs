//! In-memory machine port for tests.

use format_crt::CartridgeClass;

use crate::control::{CorePort, DriveStatus, SystemRom};

/// Size of each fake cartridge ROM window (64 banks of 8K).
const ROM_WINDOW_SIZE: usize = 64 * 8192;

/// Fake machine that records everything the firmware does to it.
pub struct FakeCore {
    /// 64K machine RAM image.
    pub ram: Vec<u8>,
    /// Low cartridge ROM window contents.
    pub rom_low: Vec<u8>,
    /// High cartridge ROM window contents.
    pub rom_high: Vec<u8>,
    /// System ROM images written at boot, in order.
    pub system_roms: Vec<(SystemRom, Vec<u8>)>,
    /// Every reset issued, with its cartridge class.
    pub resets: Vec<Option<CartridgeClass>>,
    /// Keyboard matrix mask history, one entry per write.
    pub keyboard_masks: Vec<u64>,
    /// Raw value served to `drive_status` reads.
    pub drive_status_raw: u32,
    /// Track-length register writes, in order.
    pub track_lengths: Vec<u16>,
}

impl FakeCore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: vec![0; 0x1_0000],
            rom_low: vec![0; ROM_WINDOW_SIZE],
            rom_high: vec![0; ROM_WINDOW_SIZE],
            system_roms: Vec::new(),
            resets: Vec::new(),
            keyboard_masks: Vec::new(),
            drive_status_raw: 0,
            track_lengths: Vec::new(),
        }
    }

    /// Most recent keyboard mask (0 if none written yet).
    #[must_use]
    pub fn last_keyboard_mask(&self) -> u64 {
        self.keyboard_masks.last().copied().unwrap_or(0)
    }
}

impl Default for FakeCore {
    fn default() -> Self {
        Self::new()
    }
}

impl CorePort for FakeCore {
    fn write_ram(&mut self, address: u16, bytes: &[u8]) {
        for (idx, &byte) in bytes.iter().enumerate() {
            let addr = address.wrapping_add(idx as u16);
            self.ram[usize::from(addr)] = byte;
        }
    }

    fn write_rom_low(&mut self, offset: u32, bytes: &[u8]) {
        let offset = offset as usize;
        self.rom_low[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn write_rom_high(&mut self, offset: u32, bytes: &[u8]) {
        let offset = offset as usize;
        self.rom_high[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn write_system_rom(&mut self, rom: SystemRom, bytes: &[u8]) {
        self.system_roms.push((rom, bytes.to_vec()));
    }

    fn reset(&mut self, cartridge: Option<CartridgeClass>) {
        self.resets.push(cartridge);
    }

    fn set_keyboard_mask(&mut self, mask: u64) {
        self.keyboard_masks.push(mask);
    }

    fn drive_status(&mut self) -> DriveStatus {
        DriveStatus::from_raw(self.drive_status_raw)
    }

    fn set_track_length(&mut self, length: u16) {
        self.track_lengths.push(length);
    }
}
