//! Append-only byte arena for row data and persisted strings.

use ipspace_error::ValueError;

/// Handle to a block of bytes issued by an [`Arena`].
///
/// Spans are offsets, not pointers, so they stay valid while the arena grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    offset: usize,
    len: usize,
}

impl Span {
    /// Byte offset of the block within the arena.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the block in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the block is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Growable, append-only storage region.
///
/// Every allocation is zero-initialized and lives as long as the arena. Nothing
/// is ever freed or moved relative to its offset.
#[derive(Debug, Default)]
pub struct Arena {
    bytes: Vec<u8>,
}

impl Arena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena with room for `capacity` bytes before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Allocates `len` zeroed bytes.
    pub fn allocate(&mut self, len: usize) -> Span {
        let offset = self.bytes.len();
        self.bytes.resize(offset + len, 0);
        Span { offset, len }
    }

    /// Copies `text` into the arena.
    pub fn persist(&mut self, text: &str) -> Span {
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(text.as_bytes());
        Span {
            offset,
            len: text.len(),
        }
    }

    /// Returns the bytes for `span`, or None if it lies outside the arena.
    pub fn get(&self, span: Span) -> Option<&[u8]> {
        self.bytes.get(span.offset..span.end())
    }

    /// Returns the persisted string for `span`.
    pub fn get_str(&self, span: Span) -> Option<&str> {
        self.get(span).and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Mutable access to the bytes of a span issued by this arena.
    ///
    /// # Panics
    ///
    /// Panics if `span` was not issued by this arena.
    pub fn slice_mut(&mut self, span: Span) -> &mut [u8] {
        &mut self.bytes[span.offset..span.end()]
    }

    /// Returns the number of bytes allocated.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Reference to a persisted string, stored inside a row.
///
/// Layout: 8 bytes, little-endian `offset: u32` then `len: u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringRef {
    offset: u32,
    len: u32,
}

impl StringRef {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8;

    /// Writes the reference into `dest`, which must be [`Self::SIZE`] bytes.
    pub fn encode(&self, dest: &mut [u8]) {
        dest[..4].copy_from_slice(&self.offset.to_le_bytes());
        dest[4..Self::SIZE].copy_from_slice(&self.len.to_le_bytes());
    }

    /// Reads a reference from the first [`Self::SIZE`] bytes of `src`.
    pub fn decode(src: &[u8]) -> Option<Self> {
        let offset = u32::from_le_bytes(src.get(..4)?.try_into().ok()?);
        let len = u32::from_le_bytes(src.get(4..Self::SIZE)?.try_into().ok()?);
        Some(Self { offset, len })
    }

    /// The arena span this reference points at.
    pub fn span(&self) -> Span {
        Span {
            offset: self.offset as usize,
            len: self.len as usize,
        }
    }
}

impl TryFrom<Span> for StringRef {
    type Error = ValueError;

    fn try_from(span: Span) -> Result<Self, Self::Error> {
        let too_large = || ValueError::TooLarge {
            offset: span.offset,
            len: span.len,
        };
        Ok(Self {
            offset: u32::try_from(span.offset).map_err(|_| too_large())?,
            len: u32::try_from(span.len).map_err(|_| too_large())?,
        })
    }
}
