// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Items carried from framers to the processor.

/// One complete, undecoded record.
///
/// The buffer length is the record length announced by blockette 1000
/// (a power of two between 256 and 16384 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Index of the source that produced this record
    pub source: usize,
    /// Raw record bytes
    pub data: Vec<u8>,
}

impl RawRecord {
    /// Create a new RawRecord.
    pub fn new(source: usize, data: Vec<u8>) -> Self {
        Self { source, data }
    }

    /// Record length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Quality indicator byte, if the buffer is long enough to hold it.
    pub fn quality(&self) -> Option<u8> {
        self.data.get(crate::io::formats::mseed::QUALITY_OFFSET).copied()
    }
}

/// Item on the record queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Framed {
    /// A complete record
    Record(RawRecord),
    /// The given source has been exhausted
    EndOfSource(usize),
    /// No more records will follow from any source
    EndOfStream,
}

impl Framed {
    /// Whether this item is a sentinel rather than data.
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Framed::Record(_))
    }
}
