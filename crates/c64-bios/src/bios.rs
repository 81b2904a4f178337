//! Per-tick scheduler tying the bridge, the loaders, and the
//! injection automaton together.

use apf_bridge::{Bridge, BridgeConfig, BridgeError, BridgePort};
use format_crt::CartridgeClass;

use crate::control::{CorePort, SystemRom};
use crate::g64::DiskService;
use crate::inject::Injector;
use crate::{crt, prg};

/// Start of the cartridge autostart signature window in RAM.
const CBM80_ADDR: u16 = 0x8000;

/// Firmware configuration: slot assignments and automaton timing.
#[derive(Debug, Clone, Copy)]
pub struct BiosConfig {
    /// Slot carrying the PRG program image.
    pub prg_slot: u16,
    /// Slot carrying the CRT cartridge image.
    pub crt_slot: u16,
    /// Slot carrying the G64 disk image.
    pub g64_slot: u16,
    /// Ticks to wait for the Kernal boot before injecting a program.
    pub boot_ticks: u32,
    /// Ticks the first key is held after the load settles.
    pub load_settle_ticks: u32,
    /// Ticks each subsequent key is held.
    pub key_hold_ticks: u32,
}

impl Default for BiosConfig {
    fn default() -> Self {
        Self {
            prg_slot: 0,
            crt_slot: 1,
            g64_slot: 2,
            boot_ticks: 300,
            load_settle_ticks: 40,
            key_hold_ticks: 20,
        }
    }
}

/// The firmware context: owns all mutable state and is driven by the
/// periodic timer tick. There is exactly one instance; nothing here is
/// shared with another thread of control.
pub struct Bios<P: BridgePort, C: CorePort> {
    bridge: Bridge<P>,
    core: C,
    config: BiosConfig,
    ticks: u32,
    injector: Injector,
    disk: DiskService,
}

impl<P: BridgePort, C: CorePort> Bios<P, C> {
    pub fn new(port: P, core: C, config: BiosConfig) -> Self {
        Self::with_bridge_config(port, core, config, BridgeConfig::default())
    }

    pub fn with_bridge_config(
        port: P,
        core: C,
        config: BiosConfig,
        bridge_config: BridgeConfig,
    ) -> Self {
        Self {
            bridge: Bridge::with_config(port, bridge_config),
            core,
            config,
            ticks: 0,
            injector: Injector::new(
                config.boot_ticks,
                config.load_settle_ticks,
                config.key_hold_ticks,
            ),
            disk: DiskService::new(config.g64_slot),
        }
    }

    /// Bring up the machine: load the system ROMs through the bridge,
    /// then release reset with no cartridge.
    pub fn boot(&mut self) -> Result<(), BridgeError> {
        self.bridge.wait_ready()?;
        for rom in [SystemRom::Basic, SystemRom::Character, SystemRom::Kernal] {
            let mut image = vec![0u8; rom.size() as usize];
            self.bridge.read_bytes(rom.slot_id(), 0, &mut image)?;
            self.core.write_system_rom(rom, &image);
        }
        self.reset_machine(None);
        Ok(())
    }

    /// One timer tick: sample slot updates, run the loaders, advance
    /// the injection automaton, drive the keyboard mask.
    ///
    /// Runs to completion before returning; every bridge read inside
    /// blocks until done or stalled.
    pub fn tick(&mut self) -> Result<(), BridgeError> {
        self.ticks = self.ticks.wrapping_add(1);
        let updated = self.bridge.updated_slots();

        if slot_updated(updated, self.config.crt_slot) {
            if let Some(class) = crt::load(&mut self.bridge, &mut self.core, self.config.crt_slot)?
            {
                self.reset_machine(Some(class));
            }
        }

        if slot_updated(updated, self.config.g64_slot) {
            self.disk.rebuild_directory(&mut self.bridge)?;
        }
        self.disk.service(&mut self.bridge, &mut self.core)?;

        let action = self
            .injector
            .step(self.ticks, slot_updated(updated, self.config.prg_slot));
        if action.reset {
            self.reset_machine(None);
        }
        if action.load {
            prg::load(&mut self.bridge, &mut self.core, self.config.prg_slot)?;
        }
        self.core.set_keyboard_mask(action.key_mask);

        Ok(())
    }

    /// Current tick count.
    #[must_use]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    #[must_use]
    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge<P> {
        &mut self.bridge
    }

    /// Reset the machine, clearing any CBM80 autostart signature first
    /// so a stale cartridge image cannot hijack the boot.
    fn reset_machine(&mut self, cartridge: Option<CartridgeClass>) {
        self.core.write_ram(CBM80_ADDR, &[0u8; 16]);
        self.core.reset(cartridge);
    }
}

/// Whether `slot`'s bit is set in the updated-slots mask. Only
/// low-numbered slots have bits.
fn slot_updated(mask: u32, slot: u16) -> bool {
    slot < 32 && mask & (1 << slot) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCore;
    use apf_bridge::testing::FakePort;

    #[test]
    fn slot_updated_bit_positions() {
        assert!(slot_updated(0b0001, 0));
        assert!(slot_updated(0b0100, 2));
        assert!(!slot_updated(0b0100, 1));
        assert!(!slot_updated(u32::MAX, 32));
        assert!(!slot_updated(u32::MAX, 200));
    }

    #[test]
    fn boot_loads_system_roms_and_releases_reset() {
        let mut port = FakePort::new();
        port.insert_slot(SystemRom::Basic.slot_id(), vec![0xB0; 8192]);
        port.insert_slot(SystemRom::Character.slot_id(), vec![0xC0; 4096]);
        port.insert_slot(SystemRom::Kernal.slot_id(), vec![0xE0; 8192]);
        let mut bios = Bios::new(port, FakeCore::new(), BiosConfig::default());

        bios.boot().expect("boot");

        let core = bios.core();
        assert_eq!(core.system_roms.len(), 3);
        assert_eq!(core.system_roms[0].0, SystemRom::Basic);
        assert_eq!(core.system_roms[0].1, vec![0xB0; 8192]);
        assert_eq!(core.system_roms[1].0, SystemRom::Character);
        assert_eq!(core.system_roms[1].1, vec![0xC0; 4096]);
        assert_eq!(core.system_roms[2].0, SystemRom::Kernal);
        assert_eq!(core.system_roms[2].1, vec![0xE0; 8192]);
        assert_eq!(core.resets, vec![None]);
    }

    #[test]
    fn idle_tick_clears_keyboard_mask() {
        let mut bios = Bios::new(FakePort::new(), FakeCore::new(), BiosConfig::default());
        bios.tick().expect("tick");
        bios.tick().expect("tick");
        assert_eq!(bios.core().keyboard_masks, vec![0, 0]);
    }
}
