use std::collections::HashMap;

/// Per-run record of which report rows carry which address.
///
/// Every built row reserves a slot (its index in the merged row list). Rows
/// with a non-empty full address are also counted, so the n-th row sharing
/// an address gets occurrence n and can be found again under
/// `(address, n)` when zoning is back-filled.
#[derive(Debug, Default)]
pub struct AddressLedger {
    counts: HashMap<String, usize>,
    order: Vec<String>,
    slots: HashMap<(String, usize), usize>,
    next_slot: usize,
}

impl AddressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the slot for the next row appended to the merged list.
    pub fn reserve_slot(&mut self) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    /// Counts one more row for `full_address` and returns its 1-based occurrence.
    pub fn record(&mut self, full_address: &str, slot: usize) -> usize {
        let count = match self.counts.get_mut(full_address) {
            Some(count) => {
                *count += 1;
                *count
            }
            None => {
                self.counts.insert(full_address.to_string(), 1);
                self.order.push(full_address.to_string());
                1
            }
        };
        self.slots.insert((full_address.to_string(), count), slot);
        count
    }

    /// Distinct addresses, in the order they were first seen.
    pub fn addresses(&self) -> &[String] {
        &self.order
    }

    pub fn occurrences(&self, full_address: &str) -> usize {
        self.counts.get(full_address).copied().unwrap_or(0)
    }

    pub fn slot(&self, full_address: &str, occurrence: usize) -> Option<usize> {
        self.slots.get(&(full_address.to_string(), occurrence)).copied()
    }

    /// Number of row slots handed out so far.
    pub fn slot_count(&self) -> usize {
        self.next_slot
    }
}
