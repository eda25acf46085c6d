use std::borrow::Cow;
use std::cell::Cell;
use std::fmt;
use std::ops::Range;
use std::rc::{Rc, Weak};

use xi_rope::delta::{Builder, Transformer};
use xi_rope::{Delta, Rope, RopeInfo};

use crate::anchoring::TrackedPosition;
use crate::workspace::EditError;

/// Identifier of a buffer within a workspace
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct BufferId(pub u32);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// Byte offset that follows edits of the buffer that created it
///
/// The buffer only keeps a weak reference, so dropping every clone of the
/// position stops tracking it.
#[derive(Clone, Debug)]
pub struct Position(Rc<Cell<usize>>);

impl TrackedPosition for Position {
    fn offset(&self) -> usize {
        self.0.get()
    }
}

/// Text of one document, stored in a single xi-rope buffer
pub struct Buffer {
    id: BufferId,
    name: String,
    text: Rope,
    positions: Vec<Weak<Cell<usize>>>,
    version: u64,
}

impl Buffer {
    pub fn new(id: BufferId, name: impl Into<String>, text: &str) -> Self {
        Self {
            id,
            name: name.into(),
            text: Rope::from(text),
            positions: Vec::new(),
            version: 0,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.len() == 0
    }

    /// Version counter incremented on each edit
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    pub fn rope(&self) -> &Rope {
        &self.text
    }

    pub fn slice(&self, range: Range<usize>) -> Result<Cow<'_, str>, EditError> {
        self.check_range(&range)?;
        Ok(self.text.slice_to_cow(range))
    }

    /// Create a position that moves with subsequent edits
    pub fn track(&mut self, offset: usize) -> Position {
        let cell = Rc::new(Cell::new(offset.min(self.len())));
        self.positions.retain(|position| position.strong_count() > 0);
        self.positions.push(Rc::downgrade(&cell));
        Position(cell)
    }

    /// Number of positions still alive
    pub fn tracked_positions(&self) -> usize {
        self.positions
            .iter()
            .filter(|position| position.strong_count() > 0)
            .count()
    }

    pub fn insert(&mut self, at: usize, text: &str) -> Result<Delta<RopeInfo>, EditError> {
        self.check_offset(at)?;
        let mut builder = Builder::new(self.len());
        builder.replace(at..at, Rope::from(text));
        Ok(self.apply(builder.build()))
    }

    pub fn delete(&mut self, range: Range<usize>) -> Result<Delta<RopeInfo>, EditError> {
        self.check_range(&range)?;
        let mut builder = Builder::new(self.len());
        builder.delete(range);
        Ok(self.apply(builder.build()))
    }

    /// Apply a delta and move every tracked position through it
    ///
    /// Text inserted exactly at a position lands before it. Positions inside
    /// a deleted span collapse to the start of the span.
    fn apply(&mut self, delta: Delta<RopeInfo>) -> Delta<RopeInfo> {
        self.text = delta.apply(&self.text);
        let mut transformer = Transformer::new(&delta);
        self.positions.retain(|position| match position.upgrade() {
            Some(cell) => {
                cell.set(transformer.transform(cell.get(), true));
                true
            }
            None => false,
        });
        self.version += 1;
        delta
    }

    pub(crate) fn check_offset(&self, offset: usize) -> Result<(), EditError> {
        if offset > self.len() {
            return Err(EditError::OffsetOutOfBounds {
                offset,
                len: self.len(),
            });
        }
        // UTF-8 continuation bytes are 0b10xx_xxxx
        if offset < self.len() && (self.text.byte_at(offset) as i8) < -0x40 {
            return Err(EditError::NotCharBoundary(offset));
        }
        Ok(())
    }

    pub(crate) fn check_range(&self, range: &Range<usize>) -> Result<(), EditError> {
        if range.start > range.end || range.end > self.len() {
            return Err(EditError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len(),
            });
        }
        self.check_offset(range.start)?;
        self.check_offset(range.end)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("len", &self.len())
            .field("version", &self.version)
            .finish()
    }
}
