//! Snapshot-based undo/redo.
//!
//! A single linear stack of serialized document snapshots with a current
//! position pointer. The manager only ever talks to the document through the
//! [`Document`] trait, so tests can substitute a double and the host can
//! layer it over any item-store implementation.

use serde_json::Value;

/// The two operations the undo manager needs from a document.
pub trait Document {
    /// Serialize the persisted document (items + camera).
    fn serialize(&self) -> Value;

    /// Replace the document contents from a payload. `internal` is true when
    /// the caller is the undo manager restoring a snapshot; implementations
    /// that record their own history must suppress the automatic post-load
    /// snapshot in that case.
    fn load(&mut self, data: &Value, internal: bool);
}

/// Observer invoked with `(can_undo, can_redo)` after every stack change.
pub type UndoObserver = Box<dyn FnMut(bool, bool)>;

pub struct UndoManager {
    /// Canonicalized snapshot strings. `serde_json` orders object keys, so
    /// string equality is content equality.
    stack: Vec<String>,
    /// Current position; -1 denotes an empty stack.
    pointer: isize,
    observer: Option<UndoObserver>,
}

impl std::fmt::Debug for UndoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoManager")
            .field("len", &self.stack.len())
            .field("pointer", &self.pointer)
            .finish()
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoManager {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            pointer: -1,
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: UndoObserver) {
        self.observer = Some(observer);
    }

    fn notify(&mut self) {
        let (can_undo, can_redo) = (self.can_undo(), self.can_redo());
        if let Some(observer) = &mut self.observer {
            observer(can_undo, can_redo);
        }
    }

    /// Capture a snapshot of `doc`. A no-op when the serialization is
    /// content-identical to the snapshot at the pointer, which makes
    /// redundant calls from no-op gestures self-correcting.
    pub fn save_state(&mut self, doc: &impl Document) {
        let snapshot =
            serde_json::to_string(&doc.serialize()).unwrap_or_else(|_| String::from("{}"));
        if self.pointer >= 0 && self.stack[self.pointer as usize] == snapshot {
            return;
        }
        self.stack.truncate((self.pointer + 1) as usize);
        self.stack.push(snapshot);
        self.pointer += 1;
        self.notify();
    }

    /// Step back one snapshot. Returns false at the bottom of the stack.
    pub fn undo(&mut self, doc: &mut impl Document) -> bool {
        if self.pointer <= 0 {
            return false;
        }
        self.pointer -= 1;
        self.restore(doc);
        self.notify();
        true
    }

    /// Step forward one snapshot. Returns false at the top of the stack.
    pub fn redo(&mut self, doc: &mut impl Document) -> bool {
        if self.pointer < 0 || self.pointer as usize >= self.stack.len() - 1 {
            return false;
        }
        self.pointer += 1;
        self.restore(doc);
        self.notify();
        true
    }

    fn restore(&self, doc: &mut impl Document) {
        let snapshot = &self.stack[self.pointer as usize];
        match serde_json::from_str::<Value>(snapshot) {
            Ok(value) => doc.load(&value, true),
            Err(e) => log::warn!("undo snapshot unparseable: {e}"),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer >= 0 && (self.pointer as usize) < self.stack.len() - 1
    }

    /// Drop all history and re-establish a single baseline snapshot of the
    /// current document.
    pub fn clear(&mut self, doc: &impl Document) {
        self.stack.clear();
        self.pointer = -1;
        self.save_state(doc);
    }

    /// Number of snapshots on the stack.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
