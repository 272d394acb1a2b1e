use async_trait::async_trait;
use hashrace_types::BlockHash;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Read-only view of an ordered, append-only block sequence. The engine
/// only ever reads history; it never mutates it.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Identifying hash of the block `lookback` steps behind the in-progress
    /// block (1 = most recent finalized). `None` for lookback 0 or beyond
    /// retained history.
    async fn block_hash(&self, lookback: u64) -> Option<BlockHash>;

    /// Index of the in-progress block.
    async fn current_index(&self) -> u64;
}

/// In-memory chain for tests and simulation. Block hashes are derived from
/// parent hash, index, and payload, so they are reproducible for a given
/// append sequence but unknowable before the block exists.
#[derive(Clone)]
pub struct MemoryLedger {
    blocks: Arc<RwLock<Vec<BlockHash>>>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            blocks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Finalize the in-progress block with the given payload.
    pub async fn append_block(&self, payload: &[u8]) -> BlockHash {
        let mut blocks = self.blocks.write().await;

        let parent = blocks.last().copied().unwrap_or(BlockHash::from_bytes([0u8; 32]));
        let index = blocks.len() as u64;

        let mut content = Vec::with_capacity(32 + 8 + payload.len());
        content.extend_from_slice(parent.as_bytes());
        content.extend_from_slice(&index.to_le_bytes());
        content.extend_from_slice(payload);

        let hash = BlockHash::new(&content);
        blocks.push(hash);

        debug!(index, hash = hash.short_hex(), "Block appended");

        hash
    }

    /// Finalize `count` empty blocks.
    pub async fn advance(&self, count: u64) {
        for _ in 0..count {
            self.append_block(&[]).await;
        }
    }
}

#[async_trait]
impl LedgerReader for MemoryLedger {
    async fn block_hash(&self, lookback: u64) -> Option<BlockHash> {
        if lookback == 0 {
            return None;
        }
        let blocks = self.blocks.read().await;
        let len = blocks.len() as u64;
        if lookback > len {
            return None;
        }
        blocks.get((len - lookback) as usize).copied()
    }

    async fn current_index(&self) -> u64 {
        self.blocks.read().await.len() as u64
    }
}
