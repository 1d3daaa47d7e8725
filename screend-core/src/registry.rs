//! Slot-based registry of open client connections.
//!
//! Entries live in a `Vec<Option<T>>`; closing a client takes its entry
//! out of the slot and pushes the slot onto a free list for reuse. An
//! entry can only be taken once, so a connection can never be closed
//! twice or lost while another slot is reused.

use std::fmt;

/// Index of an entry in a [`ClientRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owned, single-threaded collection of open connections.
#[derive(Debug)]
pub struct ClientRegistry<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
}

impl<T> Default for ClientRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ClientRegistry<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Register an open connection, reusing a freed slot when one exists.
    pub fn add(&mut self, entry: T) -> SlotId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(entry);
                SlotId(index)
            }
            None => {
                self.slots.push(Some(entry));
                SlotId(self.slots.len() - 1)
            }
        }
    }

    /// Mark `slot` closed and hand its entry back to the caller.
    ///
    /// Returns `None` if the slot is already closed.
    pub fn take(&mut self, slot: SlotId) -> Option<T> {
        let entry = self.slots.get_mut(slot.0)?.take()?;
        self.free.push(slot.0);
        Some(entry)
    }

    /// Iterate over open entries only.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|entry| (SlotId(i), entry)))
    }

    /// Close every slot, yielding the open entries.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.free.clear();
        self.slots.drain(..).flatten()
    }

    /// Number of open entries.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_iterate() {
        let mut reg = ClientRegistry::new();
        let a = reg.add("a");
        let b = reg.add("b");
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);
        let seen: Vec<_> = reg.iter().map(|(_, v)| *v).collect();
        assert_eq!(seen, ["a", "b"]);
    }

    #[test]
    fn closed_slots_are_skipped() {
        let mut reg = ClientRegistry::new();
        let a = reg.add(1);
        let b = reg.add(2);
        let c = reg.add(3);

        assert_eq!(reg.take(b), Some(2));
        let open: Vec<_> = reg.iter().map(|(slot, _)| slot).collect();
        assert_eq!(open, [a, c]);
        assert!(reg.iter().all(|(slot, _)| slot != b));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn take_is_exactly_once() {
        let mut reg = ClientRegistry::new();
        let a = reg.add("conn");
        assert_eq!(reg.take(a), Some("conn"));
        assert_eq!(reg.take(a), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut reg = ClientRegistry::new();
        let a = reg.add(1);
        let _b = reg.add(2);
        reg.take(a);
        let c = reg.add(3);
        assert_eq!(c, a);
        assert!(reg.iter().any(|(slot, v)| slot == c && *v == 3));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn unknown_slot_is_none() {
        let mut reg: ClientRegistry<u8> = ClientRegistry::new();
        assert_eq!(reg.take(SlotId(7)), None);
    }

    #[test]
    fn drain_yields_open_entries() {
        let mut reg = ClientRegistry::new();
        let a = reg.add(1);
        reg.add(2);
        reg.add(3);
        reg.take(a);

        let mut rest: Vec<_> = reg.drain().collect();
        rest.sort();
        assert_eq!(rest, [2, 3]);
        assert!(reg.is_empty());
        assert_eq!(reg.iter().count(), 0);
    }
}
