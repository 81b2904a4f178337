//! Machine-side control port.
//!
//! The loaders reach the emulated machine through this narrow trait:
//! the RAM and cartridge ROM windows they write into, the reset line
//! with its 2-bit cartridge class field, the injected keyboard matrix
//! mask, and the drive-side status/track-length registers used by the
//! G64 streaming path.

use format_crt::CartridgeClass;

/// System ROM images loaded at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemRom {
    Basic,
    Character,
    Kernal,
}

impl SystemRom {
    /// Data slot the host mounts this ROM in.
    #[must_use]
    pub const fn slot_id(self) -> u16 {
        match self {
            Self::Basic => 200,
            Self::Character => 201,
            Self::Kernal => 202,
        }
    }

    /// Image size in bytes.
    #[must_use]
    pub const fn size(self) -> u32 {
        match self {
            Self::Basic | Self::Kernal => 8192,
            Self::Character => 4096,
        }
    }
}

/// Decoded disk-drive status register.
///
/// Layout: bits 0-6 requested track, bit 7 drive LED, bit 8 motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveStatus(u32);

impl DriveStatus {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Track the drive electronics want loaded (7 bits).
    #[must_use]
    pub const fn requested_track(self) -> u8 {
        (self.0 & 0x7F) as u8
    }

    #[must_use]
    pub const fn led_on(self) -> bool {
        self.0 & (1 << 7) != 0
    }

    #[must_use]
    pub const fn motor_on(self) -> bool {
        self.0 & (1 << 8) != 0
    }
}

/// Machine-side registers and memory windows.
///
/// Production implementation is [`MmioCore`]; tests use
/// [`crate::testing::FakeCore`].
pub trait CorePort {
    /// Write into machine RAM. Addresses wrap at 64K.
    fn write_ram(&mut self, address: u16, bytes: &[u8]);

    /// Write into the low cartridge ROM window (ROML, $8000).
    fn write_rom_low(&mut self, offset: u32, bytes: &[u8]);

    /// Write into the high cartridge ROM window (ROMH).
    fn write_rom_high(&mut self, offset: u32, bytes: &[u8]);

    /// Write a system ROM image (boot-time bring-up).
    fn write_system_rom(&mut self, rom: SystemRom, bytes: &[u8]);

    /// Pulse machine reset with the given cartridge class configured
    /// (`None` = no cartridge).
    fn reset(&mut self, cartridge: Option<CartridgeClass>);

    /// Drive the injected keyboard matrix mask for this tick.
    fn set_keyboard_mask(&mut self, mask: u64);

    /// Sample the disk-drive status register.
    fn drive_status(&mut self) -> DriveStatus;

    /// Program the hardware track-length register before a track
    /// buffer refill.
    fn set_track_length(&mut self, length: u16);
}

/// Fixed machine-side addresses.
mod map {
    pub const KEYB_MASK_0: usize = 0x3000_0004;
    pub const KEYB_MASK_1: usize = 0x3000_0008;
    pub const MACHINE_CTRL: usize = 0x3000_000C;
    pub const DRIVE_STATUS: usize = 0x3000_0100;
    pub const TRACK_LENGTH: usize = 0x3000_0104;
    pub const RAM: usize = 0x5000_0000;
    pub const BASIC_ROM: usize = 0x5001_0000;
    pub const CHAR_ROM: usize = 0x5002_0000;
    pub const KERNAL_ROM: usize = 0x5003_0000;
    pub const ROM_LOW: usize = 0x5100_0000;
    pub const ROM_HIGH: usize = 0x5200_0000;
}

/// Replace `width` bits of `in_val` at `pos` with `val`.
const fn bits_set(in_val: u32, pos: u32, width: u32, val: u32) -> u32 {
    let mask = (1 << width) - 1;
    (in_val & !(mask << pos)) | ((val & mask) << pos)
}

/// Volatile access to the machine-side register block and memory
/// windows at their fixed addresses.
pub struct MmioCore {
    _private: (),
}

impl MmioCore {
    /// # Safety
    ///
    /// Callers must guarantee the machine control block and memory
    /// windows are mapped at the fixed addresses, i.e. this code is
    /// running on the target hardware. At most one `MmioCore` may
    /// drive the machine at a time.
    #[must_use]
    #[allow(unsafe_code)]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    #[allow(unsafe_code)]
    fn write_window(base: usize, offset: u32, bytes: &[u8]) {
        let base = base as *mut u8;
        for (idx, &byte) in bytes.iter().enumerate() {
            unsafe {
                core::ptr::write_volatile(base.add(offset as usize + idx), byte);
            }
        }
    }
}

#[allow(unsafe_code)]
impl CorePort for MmioCore {
    fn write_ram(&mut self, address: u16, bytes: &[u8]) {
        let base = map::RAM as *mut u8;
        for (idx, &byte) in bytes.iter().enumerate() {
            let addr = address.wrapping_add(idx as u16);
            unsafe {
                core::ptr::write_volatile(base.add(usize::from(addr)), byte);
            }
        }
    }

    fn write_rom_low(&mut self, offset: u32, bytes: &[u8]) {
        Self::write_window(map::ROM_LOW, offset, bytes);
    }

    fn write_rom_high(&mut self, offset: u32, bytes: &[u8]) {
        Self::write_window(map::ROM_HIGH, offset, bytes);
    }

    fn write_system_rom(&mut self, rom: SystemRom, bytes: &[u8]) {
        let base = match rom {
            SystemRom::Basic => map::BASIC_ROM,
            SystemRom::Character => map::CHAR_ROM,
            SystemRom::Kernal => map::KERNAL_ROM,
        };
        Self::write_window(base, 0, bytes);
    }

    fn reset(&mut self, cartridge: Option<CartridgeClass>) {
        let code = match cartridge {
            Some(class) => u32::from(class.control_code()),
            None => 0,
        };
        unsafe {
            let ctrl = map::MACHINE_CTRL as *mut u32;
            let mut value = core::ptr::read_volatile(ctrl);
            value = bits_set(value, 0, 1, 0); // assert reset
            core::ptr::write_volatile(ctrl, value);
            value = bits_set(value, 5, 2, code); // cartridge class field
            core::ptr::write_volatile(ctrl, value);
            value = bits_set(value, 0, 1, 1); // release reset
            core::ptr::write_volatile(ctrl, value);
        }
    }

    fn set_keyboard_mask(&mut self, mask: u64) {
        unsafe {
            core::ptr::write_volatile(map::KEYB_MASK_0 as *mut u32, mask as u32);
            core::ptr::write_volatile(map::KEYB_MASK_1 as *mut u32, (mask >> 32) as u32);
        }
    }

    fn drive_status(&mut self) -> DriveStatus {
        let raw = unsafe { core::ptr::read_volatile(map::DRIVE_STATUS as *const u32) };
        DriveStatus::from_raw(raw)
    }

    fn set_track_length(&mut self, length: u16) {
        unsafe {
            core::ptr::write_volatile(map::TRACK_LENGTH as *mut u32, u32::from(length));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_status_fields() {
        let status = DriveStatus::from_raw(0x1A5);
        assert_eq!(status.requested_track(), 0x25);
        assert!(status.led_on());
        assert!(status.motor_on());

        let status = DriveStatus::from_raw(0x005);
        assert_eq!(status.requested_track(), 5);
        assert!(!status.led_on());
        assert!(!status.motor_on());
    }

    #[test]
    fn system_rom_slots_and_sizes() {
        assert_eq!(SystemRom::Basic.slot_id(), 200);
        assert_eq!(SystemRom::Character.slot_id(), 201);
        assert_eq!(SystemRom::Kernal.slot_id(), 202);
        assert_eq!(SystemRom::Basic.size(), 8192);
        assert_eq!(SystemRom::Character.size(), 4096);
        assert_eq!(SystemRom::Kernal.size(), 8192);
    }

    #[test]
    fn bits_set_masks_correctly() {
        assert_eq!(bits_set(0, 0, 1, 1), 1);
        assert_eq!(bits_set(1, 0, 1, 0), 0);
        assert_eq!(bits_set(0, 5, 2, 3), 0b110_0000);
        assert_eq!(bits_set(0xFF, 5, 2, 0), 0b1001_1111);
    }
}
