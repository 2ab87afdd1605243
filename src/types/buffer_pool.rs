// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Pool of fixed-size sample blocks.
//!
//! Segments store their samples in blocks of one fixed length. A pool owns
//! every block it has handed out and keeps a free list of handles, so blocks
//! released by a segment that was merged away can back the next append
//! instead of a fresh allocation.
//!
//! Pools are single-owner and are only touched by the thread that owns the
//! segment; there is no locking.

use serde::Serialize;

use crate::{Result, SplitError};

/// Default number of samples per block.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Index of a block inside its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHandle(usize);

/// Pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Samples per block
    pub block_size: usize,
    /// Blocks owned by the pool
    pub total_blocks: usize,
    /// Blocks on the free list
    pub free_blocks: usize,
    /// Blocks allocated by this pool (excluding released foreign blocks)
    pub allocations: usize,
}

/// Arena of `i32` blocks addressed by [`BlockHandle`].
#[derive(Debug)]
pub struct BlockPool {
    block_size: usize,
    blocks: Vec<Box<[i32]>>,
    free: Vec<BlockHandle>,
    allocations: usize,
}

impl BlockPool {
    /// Create an empty pool of `block_size`-sample blocks.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if `block_size` is zero.
    pub fn new(block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(SplitError::config("block size must be greater than zero"));
        }
        Ok(Self {
            block_size,
            blocks: Vec::new(),
            free: Vec::new(),
            allocations: 0,
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Take a block, reusing a free one if available.
    ///
    /// Reused blocks keep their previous contents.
    pub fn acquire(&mut self) -> BlockHandle {
        if let Some(handle) = self.free.pop() {
            return handle;
        }
        self.allocations += 1;
        self.blocks.push(vec![0; self.block_size].into_boxed_slice());
        BlockHandle(self.blocks.len() - 1)
    }

    /// Adopt a block that came from another pool.
    ///
    /// # Errors
    ///
    /// Fails with [`SplitError::BlockSizeMismatch`] if the block length does
    /// not match this pool's block size.
    pub fn release(&mut self, block: Box<[i32]>) -> Result<()> {
        if block.len() != self.block_size {
            return Err(SplitError::block_size_mismatch(self.block_size, block.len()));
        }
        self.blocks.push(block);
        self.free.push(BlockHandle(self.blocks.len() - 1));
        Ok(())
    }

    /// Adopt every block of another pool, returning how many were taken.
    pub fn absorb(&mut self, other: BlockPool) -> Result<usize> {
        if other.block_size != self.block_size {
            return Err(SplitError::block_size_mismatch(
                self.block_size,
                other.block_size,
            ));
        }
        let mut count = 0;
        for block in other.into_blocks() {
            self.release(block)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn get(&self, handle: BlockHandle) -> &[i32] {
        &self.blocks[handle.0]
    }

    pub fn get_mut(&mut self, handle: BlockHandle) -> &mut [i32] {
        &mut self.blocks[handle.0]
    }

    /// Drop every block not listed in `live` and renumber the live handles.
    ///
    /// The free list is emptied. Returns the number of blocks dropped.
    pub fn compact(&mut self, live: &mut [BlockHandle]) -> usize {
        let mut slots: Vec<Option<Box<[i32]>>> = std::mem::take(&mut self.blocks)
            .into_iter()
            .map(Some)
            .collect();
        let mut kept = Vec::with_capacity(live.len());
        for handle in live.iter_mut() {
            if let Some(block) = slots.get_mut(handle.0).and_then(Option::take) {
                kept.push(block);
                *handle = BlockHandle(kept.len() - 1);
            }
        }
        debug_assert_eq!(kept.len(), live.len());
        self.blocks = kept;
        self.free.clear();
        slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Consume the pool, yielding all blocks it owns.
    pub fn into_blocks(self) -> Vec<Box<[i32]>> {
        self.blocks
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            block_size: self.block_size,
            total_blocks: self.blocks.len(),
            free_blocks: self.free.len(),
            allocations: self.allocations,
        }
    }
}

impl Default for BlockPool {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            blocks: Vec::new(),
            free: Vec::new(),
            allocations: 0,
        }
    }
}
