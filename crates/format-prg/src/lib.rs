//! PRG program format.
//!
//! A PRG file is the simplest C64 binary format: a 2-byte little-endian
//! load address followed by the raw program bytes. Making an injected
//! program visible to the BASIC interpreter additionally requires
//! patching the zero-page pointers that delimit variable storage, the
//! same ones the Kernal updates after LOAD from serial bus or
//! datasette:
//!
//!   $2D/$2E — start of variable area (end of program plus 1)
//!   $2F/$30 — start of array variable area
//!   $31/$32 — end of array variable area
//!   $AE/$AF — end address after LOAD/VERIFY

/// Size of the load-address header.
pub const HEADER_SIZE: u32 = 2;

/// Zero-page locations receiving the program end address, 16-bit
/// little-endian each.
pub const BASIC_POINTERS: [u16; 4] = [0x2D, 0x2F, 0x31, 0xAE];

/// Decode the little-endian load address from the 2-byte header.
#[must_use]
pub fn load_address(header: [u8; 2]) -> u16 {
    u16::from_le_bytes(header)
}

/// End address of a loaded program: load address plus payload size.
///
/// Wraps at 64K, matching 16-bit pointer arithmetic on the machine.
#[must_use]
pub fn end_address(load_address: u16, payload_length: u32) -> u16 {
    load_address.wrapping_add(payload_length as u16)
}
