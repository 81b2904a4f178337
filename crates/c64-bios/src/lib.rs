//! Control-plane firmware for an FPGA-hosted C64 core.
//!
//! The emulated machine's memory is brought up from host-mounted data
//! slots and kept current as the host rewrites them. All byte movement
//! goes through the data-slot bridge (`apf-bridge`); this crate adds
//! the media loaders and the per-tick scheduler on top:
//!
//! - PRG programs are injected into machine RAM and announced to the
//!   BASIC interpreter, then auto-started by typing RUN.
//! - CRT cartridges are flashed bank by bank into the ROM windows and
//!   activated by a cartridge-configured reset.
//! - G64 disk images are indexed once, then streamed track by track
//!   into the drive's hardware buffer as the drive seeks.
//!
//! Everything runs from a single periodic tick ([`Bios::tick`]); there
//! is no other thread of control and no locking. Bridge reads block to
//! completion inside the tick, so the tick budget assumes the host
//! transport completes promptly.

mod bios;
pub mod control;
mod crt;
mod g64;
mod inject;
mod keyboard;
mod prg;
pub mod testing;

pub use bios::{Bios, BiosConfig};
pub use control::{CorePort, DriveStatus, MmioCore, SystemRom};
pub use g64::{DiskService, TRACK_BUFFER_ADDR};
pub use inject::{InjectAction, InjectState, Injector};
pub use keyboard::MatrixCode;
