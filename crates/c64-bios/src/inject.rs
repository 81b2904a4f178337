//! Timed keystroke injection.
//!
//! When the host rewrites the program slot, the machine is reset, the
//! program is injected once the Kernal has had time to boot, and RUN
//! plus RETURN are typed into the keyboard matrix so the interpreter
//! starts it. Each key is held across several scan cycles by
//! re-asserting its matrix mask every tick.
//!
//! The automaton is a singleton: a slot update arriving while a cycle
//! is in progress is ignored until the cycle returns to idle.

use crate::keyboard::MatrixCode;

/// Automaton state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectState {
    /// Waiting for a program slot update.
    Idle,
    /// Machine reset issued; waiting out the Kernal boot.
    WaitBoot,
    /// Holding R.
    KeyR,
    /// Holding U.
    KeyU,
    /// Holding N.
    KeyN,
    /// Holding RETURN.
    KeyReturn,
}

/// Side effects requested by one automaton step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectAction {
    /// Reset the machine (no cartridge) this tick.
    pub reset: bool,
    /// Perform the PRG load this tick.
    pub load: bool,
    /// Keyboard matrix mask to drive this tick (0 = no key held).
    pub key_mask: u64,
}

impl InjectAction {
    const NONE: Self = Self {
        reset: false,
        load: false,
        key_mask: 0,
    };

    const fn key(code: MatrixCode) -> Self {
        Self {
            reset: false,
            load: false,
            key_mask: code.mask(),
        }
    }
}

/// The injection automaton. Purely time-driven once started; stepped
/// exactly once per tick.
pub struct Injector {
    state: InjectState,
    deadline: u32,
    boot_ticks: u32,
    load_settle_ticks: u32,
    key_hold_ticks: u32,
}

impl Injector {
    #[must_use]
    pub fn new(boot_ticks: u32, load_settle_ticks: u32, key_hold_ticks: u32) -> Self {
        Self {
            state: InjectState::Idle,
            deadline: 0,
            boot_ticks,
            load_settle_ticks,
            key_hold_ticks,
        }
    }

    #[must_use]
    pub fn state(&self) -> InjectState {
        self.state
    }

    /// Advance one tick.
    ///
    /// `slot_updated` is this tick's program-slot update bit; it only
    /// matters in `Idle`. Returns the side effects the caller must
    /// apply (reset, load, keyboard mask).
    pub fn step(&mut self, now: u32, slot_updated: bool) -> InjectAction {
        match self.state {
            InjectState::Idle => {
                if slot_updated {
                    self.state = InjectState::WaitBoot;
                    self.deadline = now.wrapping_add(self.boot_ticks);
                    log::debug!("program slot updated, resetting machine");
                    return InjectAction {
                        reset: true,
                        load: false,
                        key_mask: 0,
                    };
                }
                InjectAction::NONE
            }
            InjectState::WaitBoot => {
                if now >= self.deadline {
                    self.state = InjectState::KeyR;
                    self.deadline = now.wrapping_add(self.load_settle_ticks);
                    return InjectAction {
                        reset: false,
                        load: true,
                        key_mask: MatrixCode::R.mask(),
                    };
                }
                InjectAction::NONE
            }
            InjectState::KeyR => self.hold_or_advance(now, MatrixCode::R, InjectState::KeyU),
            InjectState::KeyU => self.hold_or_advance(now, MatrixCode::U, InjectState::KeyN),
            InjectState::KeyN => self.hold_or_advance(now, MatrixCode::N, InjectState::KeyReturn),
            InjectState::KeyReturn => {
                if now >= self.deadline {
                    self.state = InjectState::Idle;
                    return InjectAction::NONE;
                }
                InjectAction::key(MatrixCode::RETURN)
            }
        }
    }

    /// Keep holding `held` until the deadline, then move to `next` and
    /// assert its key from this same tick.
    fn hold_or_advance(&mut self, now: u32, held: MatrixCode, next: InjectState) -> InjectAction {
        if now >= self.deadline {
            self.state = next;
            self.deadline = now.wrapping_add(self.key_hold_ticks);
            let code = match next {
                InjectState::KeyU => MatrixCode::U,
                InjectState::KeyN => MatrixCode::N,
                _ => MatrixCode::RETURN,
            };
            return InjectAction::key(code);
        }
        InjectAction::key(held)
    }
}
