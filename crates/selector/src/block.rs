//! Block building on top of the selector.

use crate::cache::RejectionCache;
use crate::error::SelectorError;
use crate::result::SelectionResult;
use crate::selector::TraceLineLimitSelector;
use std::sync::Arc;
use tracelimit_accounting::LineCountTracer;
use tracelimit_config::{LimitsStore, SelectorConfig};
use tracelimit_types::{BlockHeight, Hash, LineCounts, Transaction};
use tracing::{error, info, warn};

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltBlock {
    /// Height of the block.
    pub height: BlockHeight,
    /// Included transactions, in candidate order.
    pub selected: Vec<Hash>,
    /// Candidates that were evaluated and left out, with the reason.
    pub rejected: Vec<(Hash, SelectionResult)>,
    /// Rows used per module by the included transactions.
    pub line_counts: LineCounts,
}

impl BuiltBlock {
    /// Whether the block includes no transactions.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Drives candidates through the selector and a tracer, one block at a
/// time.
#[derive(Debug)]
pub struct BlockBuilder {
    selector: TraceLineLimitSelector,
    next_height: BlockHeight,
    seal_on_block_full: bool,
    max_transactions: Option<usize>,
}

impl BlockBuilder {
    /// Create a builder starting at the genesis height.
    pub fn new(
        config: &SelectorConfig,
        limits: Arc<LimitsStore>,
        cache: Arc<RejectionCache>,
    ) -> Self {
        Self {
            selector: TraceLineLimitSelector::new(limits, cache),
            next_height: BlockHeight::GENESIS,
            seal_on_block_full: config.seal_on_block_full,
            max_transactions: config.max_transactions_per_block,
        }
    }

    /// Create a builder with its own rejection cache sized from `config`.
    pub fn from_config(config: &SelectorConfig, limits: Arc<LimitsStore>) -> Self {
        let cache = Arc::new(RejectionCache::new(&config.rejection_cache));
        Self::new(config, limits, cache)
    }

    /// Height of the next block.
    pub fn next_height(&self) -> BlockHeight {
        self.next_height
    }

    /// Underlying selector.
    pub fn selector(&self) -> &TraceLineLimitSelector {
        &self.selector
    }

    /// Build one block from `candidates`.
    ///
    /// Seals when candidates run out, when the transaction cap is reached,
    /// or at the first block-full rejection if configured to. Any error
    /// aborts the block: a transaction left executed but unsettled is
    /// retracted from the tracer and the height is not advanced.
    pub fn build_block<T: LineCountTracer + ?Sized>(
        &mut self,
        candidates: &[Transaction],
        tracer: &mut T,
    ) -> Result<BuiltBlock, SelectorError> {
        let height = self.next_height;
        match self.fill(height, candidates, tracer) {
            Ok(block) => {
                self.next_height = height.next();
                info!(
                    height = %block.height,
                    selected = block.selected.len(),
                    rejected = block.rejected.len(),
                    "Built block"
                );
                Ok(block)
            }
            Err(e) => {
                error!(height = %height, error = %e, "Aborted block");
                if let Err(retract) = self.selector.abort_block(tracer) {
                    warn!(
                        height = %height,
                        error = %retract,
                        "Failed to retract transaction on abort"
                    );
                }
                Err(e)
            }
        }
    }

    fn fill<T: LineCountTracer + ?Sized>(
        &mut self,
        height: BlockHeight,
        candidates: &[Transaction],
        tracer: &mut T,
    ) -> Result<BuiltBlock, SelectorError> {
        self.selector.start_block(tracer)?;
        let mut selected = Vec::new();
        let mut rejected = Vec::new();

        for tx in candidates {
            if self
                .max_transactions
                .is_some_and(|max| selected.len() >= max)
            {
                break;
            }

            let result = self.offer(tx, tracer)?;
            if result.is_selected() {
                selected.push(tx.hash());
                continue;
            }

            let block_full = matches!(result, SelectionResult::BlockModuleLineCountFull { .. });
            rejected.push((tx.hash(), result));
            if block_full && self.seal_on_block_full {
                break;
            }
        }

        let line_counts = self.selector.seal_block();
        Ok(BuiltBlock {
            height,
            selected,
            rejected,
            line_counts,
        })
    }

    fn offer<T: LineCountTracer + ?Sized>(
        &mut self,
        tx: &Transaction,
        tracer: &mut T,
    ) -> Result<SelectionResult, SelectorError> {
        let pre = self.selector.evaluate_pre_processing(tx);
        if !pre.is_selected() {
            self.selector.on_transaction_not_selected(tx, &pre, tracer)?;
            return Ok(pre);
        }

        tracer.execute(tx)?;
        let post = self.selector.evaluate_post_processing(tx, tracer)?;
        if post.is_selected() {
            self.selector.on_transaction_selected(tx, tracer)?;
        } else {
            self.selector.on_transaction_not_selected(tx, &post, tracer)?;
        }
        Ok(post)
    }
}
