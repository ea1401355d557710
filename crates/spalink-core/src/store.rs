//! Property store
//!
//! Live values for every property in the descriptor table, with change
//! detection and listener dispatch. Values are mutated from exactly two
//! places: frame decode (authoritative, from hardware) and acknowledged
//! writes (optimistic, pending hardware confirmation).

use crate::protocol::Frame;
use crate::registers::{DecodedValue, PropertyId, TABLE};

/// Change listener, invoked synchronously inside `tick()`; must not block
pub type Listener = Box<dyn Fn(PropertyId, &DecodedValue) + Send>;

#[derive(Default)]
struct PropertyValue {
    current: Option<DecodedValue>,
    previous: Option<DecodedValue>,
    /// Set while a locally written value awaits hardware confirmation
    dirty: bool,
}

/// Table of live property values
pub struct PropertyStore {
    values: Vec<PropertyValue>,
    listeners: Vec<Vec<Listener>>,
}

impl PropertyStore {
    /// Create a store with every property unset
    pub fn new() -> Self {
        Self {
            values: (0..TABLE.len()).map(|_| PropertyValue::default()).collect(),
            listeners: (0..TABLE.len()).map(|_| Vec::new()).collect(),
        }
    }

    /// Decode every property out of a validated frame.
    ///
    /// Returns the set of properties whose value actually changed;
    /// listeners fire once per true transition, never once per poll.
    /// A field that fails its type's validity check is skipped and the old
    /// value kept, so one corrupted field does not poison the rest.
    pub fn decode(&mut self, frame: &Frame) -> Vec<PropertyId> {
        let mut changed = Vec::new();

        for desc in TABLE {
            let Some(raw) = frame.field(desc.group, desc.offset) else {
                continue;
            };
            let Some(value) = desc.kind.decode(raw) else {
                tracing::debug!(
                    property = desc.name,
                    raw,
                    "field failed validity check, keeping previous value"
                );
                continue;
            };

            let slot = &mut self.values[desc.id as usize];
            // A valid frame is hardware truth: any pending write is now
            // either confirmed or superseded
            slot.dirty = false;

            if slot.current.as_ref() != Some(&value) {
                slot.previous = slot.current.take();
                slot.current = Some(value);
                changed.push(desc.id);
            }
        }

        for id in &changed {
            self.notify(*id);
        }
        changed
    }

    /// Current decoded value for a property
    pub fn get(&self, id: PropertyId) -> Option<&DecodedValue> {
        self.values[id as usize].current.as_ref()
    }

    /// Value the property held before its most recent change
    pub fn previous(&self, id: PropertyId) -> Option<&DecodedValue> {
        self.values[id as usize].previous.as_ref()
    }

    /// Whether a locally written value is still awaiting confirmation
    pub fn is_dirty(&self, id: PropertyId) -> bool {
        self.values[id as usize].dirty
    }

    /// Register a change listener for one property
    pub fn subscribe(&mut self, id: PropertyId, listener: Listener) {
        self.listeners[id as usize].push(listener);
    }

    /// Optimistically apply an acknowledged write and mark the property
    /// dirty until the next valid frame confirms it. Called by the
    /// command protocol; not meant for collaborators.
    pub fn apply_write(&mut self, id: PropertyId, value: DecodedValue) {
        let slot = &mut self.values[id as usize];
        slot.dirty = true;
        if slot.current.as_ref() != Some(&value) {
            slot.previous = slot.current.take();
            slot.current = Some(value);
            self.notify(id);
        }
    }

    fn notify(&self, id: PropertyId) {
        if let Some(value) = self.values[id as usize].current.as_ref() {
            for listener in &self.listeners[id as usize] {
                listener(id, value);
            }
        }
    }
}

impl Default for PropertyStore {
    fn default() -> Self {
        Self::new()
    }
}
