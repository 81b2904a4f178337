//! In-memory bridge port for tests.

use crate::{BridgePort, SlotEntry, TransferRequest, SLOT_DIRECTORY_ROWS, STAGING_ADDR, STAGING_SIZE};

/// Fake bridge backed by an in-memory slot store.
///
/// Transfers complete after a programmable number of status polls
/// (default 0: the first poll after `submit` succeeds), which lets
/// tests exercise both the happy path and the stall path. Transfers
/// addressed at the staging buffer land in `staging`; transfers to any
/// other destination (the track-buffer path) are recorded in
/// `hardware_writes`.
pub struct FakePort {
    slots: Vec<(u16, Vec<u8>)>,
    completion_delay: u32,
    polls_remaining: u32,
    pending: Option<TransferRequest>,
    staging: [u8; STAGING_SIZE],
    updated: u32,
    /// Completed transfers to non-staging destinations: (destination
    /// address, bytes moved).
    pub hardware_writes: Vec<(u32, Vec<u8>)>,
    /// Every request submitted, in order.
    pub submitted: Vec<TransferRequest>,
}

impl FakePort {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            completion_delay: 0,
            polls_remaining: 0,
            pending: None,
            staging: [0; STAGING_SIZE],
            updated: 0,
            hardware_writes: Vec::new(),
            submitted: Vec::new(),
        }
    }

    /// Mount an image into a slot (replacing any previous contents).
    pub fn insert_slot(&mut self, slot_id: u16, data: Vec<u8>) {
        if let Some(slot) = self.slots.iter_mut().find(|(id, _)| *id == slot_id) {
            slot.1 = data;
        } else {
            assert!(self.slots.len() < SLOT_DIRECTORY_ROWS, "slot directory full");
            self.slots.push((slot_id, data));
        }
    }

    /// Number of status polls a transfer takes to complete.
    pub fn set_completion_delay(&mut self, polls: u32) {
        self.completion_delay = polls;
    }

    /// Latch an updated-slots bit, as the host does after rewriting a
    /// slot. Cleared by the next `updated_slots` read.
    pub fn notify_slot(&mut self, slot_id: u16) {
        assert!(slot_id < 32, "updated bitmask covers low-numbered slots only");
        self.updated |= 1 << slot_id;
    }

    fn slot_bytes(&self, slot_id: u16, offset: u32, length: u32) -> Vec<u8> {
        let Some((_, data)) = self.slots.iter().find(|(id, _)| *id == slot_id) else {
            return vec![0; length as usize];
        };
        let start = offset as usize;
        let end = (start + length as usize).min(data.len());
        let mut out = vec![0u8; length as usize];
        if start < data.len() {
            out[..end - start].copy_from_slice(&data[start..end]);
        }
        out
    }

    fn complete_pending(&mut self) {
        let Some(req) = self.pending.take() else {
            return;
        };
        let bytes = self.slot_bytes(req.slot_id, req.slot_offset, req.length);
        if req.dest_address == STAGING_ADDR {
            let len = bytes.len().min(STAGING_SIZE);
            self.staging[..len].copy_from_slice(&bytes[..len]);
        } else {
            self.hardware_writes.push((req.dest_address, bytes));
        }
    }
}

impl Default for FakePort {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgePort for FakePort {
    fn submit(&mut self, req: TransferRequest) {
        assert!(
            self.pending.is_none(),
            "transfer submitted while another is in flight"
        );
        self.submitted.push(req);
        self.pending = Some(req);
        self.polls_remaining = self.completion_delay;
    }

    fn status_ok(&mut self) -> bool {
        if self.pending.is_none() {
            return true;
        }
        if self.polls_remaining > 0 {
            self.polls_remaining -= 1;
            return false;
        }
        self.complete_pending();
        true
    }

    fn read_staging(&mut self, dst: &mut [u8]) {
        dst.copy_from_slice(&self.staging[..dst.len()]);
    }

    fn slot_entry(&mut self, row: usize) -> SlotEntry {
        match self.slots.get(row) {
            Some((slot_id, data)) => SlotEntry {
                slot_id: *slot_id,
                length: data.len() as u32,
            },
            None => SlotEntry {
                slot_id: 0,
                length: 0,
            },
        }
    }

    fn updated_slots(&mut self) -> u32 {
        std::mem::take(&mut self.updated)
    }
}
