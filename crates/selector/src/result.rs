//! Selector decisions and state.

use std::fmt;
use tracelimit_types::ModuleName;

/// Outcome of evaluating a transaction against the module line limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionResult {
    /// Fits both the per-transaction and the remaining block budget.
    Selected,

    /// The transaction alone exceeds the module's limit; it never fits in
    /// any block.
    TxModuleLineCountOverflow {
        /// First module found over its limit.
        module: ModuleName,
    },

    /// Same as [`TxModuleLineCountOverflow`](Self::TxModuleLineCountOverflow),
    /// answered from the rejection cache without executing the transaction.
    TxModuleLineCountOverflowCached {
        /// Module recorded in the cache.
        module: ModuleName,
    },

    /// The transaction does not fit in the space left in this block; it may
    /// fit in a later one.
    BlockModuleLineCountFull {
        /// First module whose block budget would be exceeded.
        module: ModuleName,
    },
}

impl SelectionResult {
    /// Whether the transaction may be included.
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected)
    }

    /// Whether the transaction can never fit in any block.
    pub fn is_permanent_overflow(&self) -> bool {
        matches!(
            self,
            Self::TxModuleLineCountOverflow { .. } | Self::TxModuleLineCountOverflowCached { .. }
        )
    }

    /// Module responsible for a rejection.
    pub fn module(&self) -> Option<&ModuleName> {
        match self {
            Self::Selected => None,
            Self::TxModuleLineCountOverflow { module }
            | Self::TxModuleLineCountOverflowCached { module }
            | Self::BlockModuleLineCountFull { module } => Some(module),
        }
    }
}

impl fmt::Display for SelectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selected => f.write_str("SELECTED"),
            Self::TxModuleLineCountOverflow { module } => {
                write!(f, "TX_MODULE_LINE_COUNT_OVERFLOW({module})")
            }
            Self::TxModuleLineCountOverflowCached { module } => {
                write!(f, "TX_MODULE_LINE_COUNT_OVERFLOW_CACHED({module})")
            }
            Self::BlockModuleLineCountFull { module } => {
                write!(f, "BLOCK_MODULE_LINE_COUNT_FULL({module})")
            }
        }
    }
}

/// Where the selector is in the block / transaction lifecycle.
///
/// ```text
/// BlockSealed ─start_block─▶ BlockOpen ─▶ TxCacheCheck ─┬─▶ TxRejectedCached
///                                ▲                      └─▶ TxExecuting ─▶ TxBudgetCheck
///                                │                                           │
///                                └── TxAccepted | TxRejectedTxLimit | TxRejectedBlockFull
/// ```
///
/// Any settled state can move on to the next transaction (`TxCacheCheck`)
/// or to `BlockSealed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorPhase {
    /// Ready for the first transaction of a block.
    BlockOpen,
    /// Checking the rejection cache.
    TxCacheCheck,
    /// Waiting for the tracer to execute the transaction.
    TxExecuting,
    /// Budget evaluated; waiting for the selected / not-selected callback.
    TxBudgetCheck,
    /// Last transaction was included.
    TxAccepted,
    /// Last transaction exceeded a per-transaction limit.
    TxRejectedTxLimit,
    /// Last transaction did not fit in the remaining block space.
    TxRejectedBlockFull,
    /// Last transaction was rejected from the cache.
    TxRejectedCached,
    /// No block is open.
    BlockSealed,
}

impl SelectorPhase {
    /// Whether the selector can start evaluating another transaction.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            Self::BlockOpen
                | Self::TxAccepted
                | Self::TxRejectedTxLimit
                | Self::TxRejectedBlockFull
                | Self::TxRejectedCached
        )
    }
}
