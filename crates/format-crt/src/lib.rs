//! CRT cartridge container layout.
//!
//! The CRT format wraps C64 cartridge ROM images with a header naming
//! the cartridge hardware type, followed by a sequence of CHIP packets.
//! Each CHIP packet is self-describing:
//!
//!   +0x00: "CHIP" signature (4 bytes, BE)
//!   +0x04: total packet length (4 bytes, BE)
//!   +0x08: chip type (2 bytes, BE) — 0=ROM, 1=RAM, 2=Flash
//!   +0x0A: bank number (2 bytes, BE)
//!   +0x0C: load address (2 bytes, BE)
//!   +0x0E: image size (2 bytes, BE)
//!   +0x10: ROM data (image size bytes)
//!
//! All multi-byte fields are big-endian on the wire. Supported
//! hardware types: 1 (Action Replay), 19 (Magic Desk), 32 (EasyFlash).

/// Header offset of the big-endian hardware type field.
pub const HW_TYPE_OFFSET: u32 = 0x16;

/// Offset of the first CHIP packet.
pub const CHIP_BASE: u32 = 0x40;

/// "CHIP" packet signature as a big-endian u32.
pub const CHIP_SIGNATURE: u32 = 0x4348_4950;

/// Field offsets within a CHIP packet.
pub mod chip {
    /// Total packet length (u32, BE).
    pub const PACKET_LENGTH: u32 = 0x04;
    /// Bank number (u16, BE).
    pub const BANK: u32 = 0x0A;
    /// Load address (u16, BE).
    pub const LOAD_ADDRESS: u32 = 0x0C;
    /// Image size (u16, BE).
    pub const IMAGE_SIZE: u32 = 0x0E;
    /// Start of the ROM payload.
    pub const PAYLOAD: u32 = 0x10;
}

/// Supported cartridge hardware classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeClass {
    /// Type 1: Action Replay.
    ActionReplay,
    /// Type 19: Magic Desk — banked 8K at $8000.
    MagicDesk,
    /// Type 32: EasyFlash — dual-banked ROML+ROMH.
    EasyFlash,
}

impl CartridgeClass {
    /// Map a CRT hardware type code to a class.
    ///
    /// Returns `None` for unsupported codes; the loader treats those
    /// cartridges as absent (no writes, no reset).
    #[must_use]
    pub fn from_hardware_type(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::ActionReplay),
            19 => Some(Self::MagicDesk),
            32 => Some(Self::EasyFlash),
            _ => None,
        }
    }

    /// The 2-bit cartridge field written into the machine control
    /// register on reset, so the core configures its EXROM/GAME
    /// mapping for this class. 0 means "no cartridge".
    #[must_use]
    pub const fn control_code(self) -> u8 {
        match self {
            Self::MagicDesk => 1,
            Self::EasyFlash => 2,
            Self::ActionReplay => 3,
        }
    }
}

/// Destination ROM window for a CHIP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomWindow {
    /// ROML, mapped at $8000.
    Low,
    /// ROMH, mapped at $A000 or $E000.
    High,
}

/// Decoded CHIP packet header (fields already byte-swapped to native).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipHeader {
    /// Total packet length, header included; the next packet starts
    /// this many bytes after the current one.
    pub packet_length: u32,
    /// ROM bank number.
    pub bank: u16,
    /// C64-side load address.
    pub load_address: u16,
    /// Payload size in bytes.
    pub image_size: u16,
}

impl ChipHeader {
    /// Which ROM window this packet flashes: $8000 selects the low
    /// window, everything else the high window.
    #[must_use]
    pub const fn window(&self) -> RomWindow {
        if self.load_address == 0x8000 {
            RomWindow::Low
        } else {
            RomWindow::High
        }
    }

    /// Byte offset of this packet's bank within its ROM window.
    #[must_use]
    pub const fn bank_offset(&self) -> u32 {
        self.bank as u32 * self.image_size as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_type_mapping() {
        assert_eq!(
            CartridgeClass::from_hardware_type(1),
            Some(CartridgeClass::ActionReplay)
        );
        assert_eq!(
            CartridgeClass::from_hardware_type(19),
            Some(CartridgeClass::MagicDesk)
        );
        assert_eq!(
            CartridgeClass::from_hardware_type(32),
            Some(CartridgeClass::EasyFlash)
        );
        assert_eq!(CartridgeClass::from_hardware_type(0), None);
        assert_eq!(CartridgeClass::from_hardware_type(5), None);
        assert_eq!(CartridgeClass::from_hardware_type(99), None);
    }

    #[test]
    fn control_codes_distinct() {
        let codes = [
            CartridgeClass::MagicDesk.control_code(),
            CartridgeClass::EasyFlash.control_code(),
            CartridgeClass::ActionReplay.control_code(),
        ];
        assert_eq!(codes, [1, 2, 3]);
    }

    #[test]
    fn window_by_load_address() {
        let mut header = ChipHeader {
            packet_length: 0x2010,
            bank: 0,
            load_address: 0x8000,
            image_size: 0x2000,
        };
        assert_eq!(header.window(), RomWindow::Low);
        header.load_address = 0xA000;
        assert_eq!(header.window(), RomWindow::High);
        header.load_address = 0xE000;
        assert_eq!(header.window(), RomWindow::High);
    }

    #[test]
    fn bank_offset_scales_by_image_size() {
        let header = ChipHeader {
            packet_length: 0x2010,
            bank: 3,
            load_address: 0x8000,
            image_size: 0x2000,
        };
        assert_eq!(header.bank_offset(), 3 * 0x2000);
    }
}
