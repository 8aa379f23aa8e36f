//! Budget-enforcement selector.
//!
//! Decides, one transaction at a time, whether a candidate fits the
//! per-module line limits of the block being built.
//!
//! # Protocol
//!
//! ```text
//! start_block(tracer)
//! for each candidate:
//!     evaluate_pre_processing(tx)          // cache check, no execution
//!     tracer.execute(tx)                   // only if pre-processing selected
//!     evaluate_post_processing(tx, tracer) // budget check
//!     on_transaction_selected(tx, tracer)
//!       | on_transaction_not_selected(tx, result, tracer)
//! seal_block()
//! ```
//!
//! Modules are checked in lexicographic order; the first module over its
//! limit is the one reported.

use crate::cache::RejectionCache;
use crate::error::SelectorError;
use crate::result::{SelectionResult, SelectorPhase};
use indexmap::IndexMap;
use std::sync::Arc;
use tracelimit_accounting::LineCountTracer;
use tracelimit_config::LimitsStore;
use tracelimit_types::{LineCounts, ModuleName, Transaction};
use tracing::{debug, info, trace, warn};

/// Outcome of post-processing one transaction.
#[derive(Debug)]
struct Evaluation {
    counts: LineCounts,
    limits_generation: u64,
    result: SelectionResult,
}

/// Transaction currently moving through the selector.
#[derive(Debug)]
struct Trial {
    tx: Transaction,
    executed: bool,
    evaluated: Option<Evaluation>,
}

/// Per-block line-limit selector.
///
/// Holds the counts at block start and the committed baseline (counts
/// after the last selected transaction). Shares the limits store and the
/// rejection cache with other components.
#[derive(Debug)]
pub struct TraceLineLimitSelector {
    limits: Arc<LimitsStore>,
    cache: Arc<RejectionCache>,
    phase: SelectorPhase,
    block_start: LineCounts,
    baseline: LineCounts,
    trial: Option<Trial>,
    selected: usize,
}

impl TraceLineLimitSelector {
    /// Create a selector with no open block.
    pub fn new(limits: Arc<LimitsStore>, cache: Arc<RejectionCache>) -> Self {
        Self {
            limits,
            cache,
            phase: SelectorPhase::BlockSealed,
            block_start: LineCounts::new(),
            baseline: LineCounts::new(),
            trial: None,
            selected: 0,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SelectorPhase {
        self.phase
    }

    /// Committed counts after the last selected transaction.
    pub fn baseline(&self) -> &LineCounts {
        &self.baseline
    }

    /// Transactions selected in the open block.
    pub fn selected_count(&self) -> usize {
        self.selected
    }

    /// Shared limits store.
    pub fn limits(&self) -> &Arc<LimitsStore> {
        &self.limits
    }

    /// Shared rejection cache.
    pub fn cache(&self) -> &Arc<RejectionCache> {
        &self.cache
    }

    /// Open a block at the tracer's current counts.
    ///
    /// # Panics
    ///
    /// Panics if a block is already open.
    pub fn start_block<T: LineCountTracer + ?Sized>(
        &mut self,
        tracer: &T,
    ) -> Result<(), SelectorError> {
        assert_eq!(
            self.phase,
            SelectorPhase::BlockSealed,
            "start_block called while a block is open"
        );
        let counts = tracer.cumulative_line_counts()?;
        self.block_start = counts.clone();
        self.baseline = counts;
        self.trial = None;
        self.selected = 0;
        self.phase = SelectorPhase::BlockOpen;
        debug!(
            limits_generation = self.limits.generation(),
            "Opened block for line-limited selection"
        );
        Ok(())
    }

    /// Check the rejection cache before execution.
    ///
    /// Returns [`SelectionResult::Selected`] when the transaction should be
    /// executed, or the cached overflow otherwise.
    ///
    /// # Panics
    ///
    /// Panics if no block is open or the previous transaction is unsettled.
    pub fn evaluate_pre_processing(&mut self, tx: &Transaction) -> SelectionResult {
        assert!(
            self.phase.is_settled(),
            "pre-processing {} in phase {:?}",
            tx.hash(),
            self.phase
        );
        self.phase = SelectorPhase::TxCacheCheck;
        self.trial = Some(Trial {
            tx: tx.clone(),
            executed: false,
            evaluated: None,
        });

        if let Some(rejection) = self.cache.lookup(&tx.hash(), self.limits.generation()) {
            trace!(tx = %tx.hash(), module = %rejection.module, "Rejected from cache");
            self.phase = SelectorPhase::TxRejectedCached;
            return SelectionResult::TxModuleLineCountOverflowCached {
                module: rejection.module,
            };
        }

        self.phase = SelectorPhase::TxExecuting;
        SelectionResult::Selected
    }

    /// Check the executed transaction against the limits.
    ///
    /// All limits are read from a single snapshot, so a concurrent reload
    /// never mixes old and new values within one evaluation.
    ///
    /// # Panics
    ///
    /// Panics unless `tx` passed pre-processing and has not been evaluated.
    pub fn evaluate_post_processing<T: LineCountTracer + ?Sized>(
        &mut self,
        tx: &Transaction,
        tracer: &T,
    ) -> Result<SelectionResult, SelectorError> {
        assert_eq!(
            self.phase,
            SelectorPhase::TxExecuting,
            "post-processing {} without pre-processing",
            tx.hash()
        );
        let trial = self.trial_for(tx);
        trial.executed = true;

        let after = tracer.cumulative_line_counts()?;
        let limits = self.limits.snapshot();

        for (module, count) in after.iter() {
            if !limits.contains_key(module) {
                return Err(SelectorError::ModuleNotDefined {
                    module: module.clone(),
                });
            }
            let before = self.baseline.get_or_zero(module.as_str());
            if count < before {
                return Err(SelectorError::LineCountRegression {
                    module: module.clone(),
                    before,
                    after: count,
                });
            }
        }

        let result = Self::check_limits(&after, &self.baseline, &self.block_start, &limits);

        debug!(
            tx = %tx.hash(),
            result = %result,
            limits_generation = limits.generation(),
            "Evaluated transaction line counts"
        );

        self.trial_for(tx).evaluated = Some(Evaluation {
            counts: after,
            limits_generation: limits.generation(),
            result: result.clone(),
        });
        self.phase = SelectorPhase::TxBudgetCheck;
        Ok(result)
    }

    fn check_limits(
        after: &LineCounts,
        baseline: &LineCounts,
        block_start: &LineCounts,
        limits: &IndexMap<ModuleName, u64>,
    ) -> SelectionResult {
        let limit_of = |module: &str| limits.get(module).copied().unwrap_or(0);

        for (module, count) in after.iter() {
            let delta = count - baseline.get_or_zero(module.as_str());
            if delta > limit_of(module.as_str()) {
                return SelectionResult::TxModuleLineCountOverflow {
                    module: module.clone(),
                };
            }
        }

        for (module, count) in after.iter() {
            let used = count.saturating_sub(block_start.get_or_zero(module.as_str()));
            if used > limit_of(module.as_str()) {
                return SelectionResult::BlockModuleLineCountFull {
                    module: module.clone(),
                };
            }
        }

        SelectionResult::Selected
    }

    /// Include the evaluated transaction.
    ///
    /// Commits the tracer's trial and advances the baseline.
    ///
    /// # Panics
    ///
    /// Panics unless `tx` was just evaluated by post-processing.
    pub fn on_transaction_selected<T: LineCountTracer + ?Sized>(
        &mut self,
        tx: &Transaction,
        tracer: &mut T,
    ) -> Result<(), SelectorError> {
        assert_eq!(
            self.phase,
            SelectorPhase::TxBudgetCheck,
            "selecting {} which was not evaluated",
            tx.hash()
        );
        let counts = match self.trial_for(tx).evaluated.as_ref() {
            Some(evaluation) => evaluation.counts.clone(),
            None => panic!("selecting {} which was not evaluated", tx.hash()),
        };

        tracer.commit(tx)?;
        self.baseline = counts;
        self.trial = None;
        self.selected += 1;
        self.phase = SelectorPhase::TxAccepted;
        Ok(())
    }

    /// Reject the transaction.
    ///
    /// Retracts the tracer's trial if the transaction was executed. Only an
    /// overflow observed by [`evaluate_post_processing`](Self::evaluate_post_processing)
    /// is remembered in the rejection cache; `result` never is on its own.
    ///
    /// A transaction that evaluated as selected may still be dropped by the
    /// caller; it is retracted and not cached.
    ///
    /// # Panics
    ///
    /// Panics if `result` is [`SelectionResult::Selected`], if `tx` is not
    /// the transaction being evaluated, or if `result` contradicts the
    /// evaluated rejection.
    pub fn on_transaction_not_selected<T: LineCountTracer + ?Sized>(
        &mut self,
        tx: &Transaction,
        result: &SelectionResult,
        tracer: &mut T,
    ) -> Result<(), SelectorError> {
        assert!(
            !result.is_selected(),
            "on_transaction_not_selected called with SELECTED for {}",
            tx.hash()
        );
        assert!(
            matches!(
                self.phase,
                SelectorPhase::TxBudgetCheck | SelectorPhase::TxRejectedCached
            ),
            "rejecting {} in phase {:?}",
            tx.hash(),
            self.phase
        );
        let trial = self.trial_for(tx);
        let executed = trial.executed;
        let observed_overflow = match trial.evaluated.as_ref() {
            Some(evaluation) if !evaluation.result.is_selected() => {
                assert_eq!(
                    &evaluation.result,
                    result,
                    "rejection of {} contradicts its evaluation",
                    tx.hash()
                );
                matches!(
                    evaluation.result,
                    SelectionResult::TxModuleLineCountOverflow { .. }
                )
                .then_some(evaluation.limits_generation)
            }
            _ => None,
        };

        if executed {
            tracer.retract(tx)?;
        }

        self.phase = match result {
            SelectionResult::TxModuleLineCountOverflow { module } => {
                match observed_overflow {
                    Some(generation) => {
                        warn!(
                            tx = %tx.hash(),
                            module = %module,
                            "Transaction exceeds module line count limit on its own"
                        );
                        self.cache.remember(tx.hash(), module.clone(), generation);
                    }
                    None => debug!(
                        tx = %tx.hash(),
                        module = %module,
                        "Not caching an overflow that was not evaluated"
                    ),
                }
                SelectorPhase::TxRejectedTxLimit
            }
            SelectionResult::BlockModuleLineCountFull { module } => {
                debug!(tx = %tx.hash(), module = %module, "Block full for module");
                SelectorPhase::TxRejectedBlockFull
            }
            SelectionResult::TxModuleLineCountOverflowCached { .. } => {
                SelectorPhase::TxRejectedCached
            }
            SelectionResult::Selected => unreachable!(),
        };
        self.trial = None;
        Ok(())
    }

    /// Close the block and return the line counts it used.
    ///
    /// # Panics
    ///
    /// Panics if no block is open or a transaction is mid-evaluation.
    pub fn seal_block(&mut self) -> LineCounts {
        assert!(
            self.phase.is_settled(),
            "sealing block in phase {:?}",
            self.phase
        );
        let used: LineCounts = self
            .baseline
            .iter()
            .map(|(module, count)| {
                let start = self.block_start.get_or_zero(module.as_str());
                (module.clone(), count.saturating_sub(start))
            })
            .collect();

        info!(
            transactions = self.selected,
            rows = used.total(),
            "Sealed block"
        );
        self.phase = SelectorPhase::BlockSealed;
        self.trial = None;
        used
    }

    /// Drop the open block after an error, whatever the phase.
    ///
    /// A transaction executed but not yet settled is retracted from the
    /// tracer first. The selector is reset even if that retraction fails.
    pub fn abort_block<T: LineCountTracer + ?Sized>(
        &mut self,
        tracer: &mut T,
    ) -> Result<(), SelectorError> {
        let trial = self.trial.take();
        self.selected = 0;
        self.phase = SelectorPhase::BlockSealed;

        match trial {
            Some(trial) if trial.executed => {
                debug!(tx = %trial.tx.hash(), "Retracting unsettled transaction on abort");
                tracer.retract(&trial.tx)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn trial_for(&mut self, tx: &Transaction) -> &mut Trial {
        match self.trial.as_mut() {
            Some(trial) if trial.tx.hash() == tx.hash() => trial,
            Some(trial) => panic!(
                "transaction {} is not the one being evaluated ({})",
                tx.hash(),
                trial.tx.hash()
            ),
            None => panic!("no transaction is being evaluated, got {}", tx.hash()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracelimit_accounting::TracerError;
    use tracelimit_test_helpers::{test_limits, test_tx, ScriptedTracer};
    use tracing_test::traced_test;

    fn selector(limits: &[(&str, u64)]) -> TraceLineLimitSelector {
        TraceLineLimitSelector::new(
            test_limits(limits),
            Arc::new(RejectionCache::with_capacity(16)),
        )
    }

    /// Run one candidate through the full protocol.
    fn offer(
        selector: &mut TraceLineLimitSelector,
        tracer: &mut ScriptedTracer,
        tx: &Transaction,
    ) -> SelectionResult {
        let pre = selector.evaluate_pre_processing(tx);
        if !pre.is_selected() {
            selector
                .on_transaction_not_selected(tx, &pre, tracer)
                .unwrap();
            return pre;
        }
        tracer.execute(tx).unwrap();
        let post = selector.evaluate_post_processing(tx, tracer).unwrap();
        if post.is_selected() {
            selector.on_transaction_selected(tx, tracer).unwrap();
        } else {
            selector
                .on_transaction_not_selected(tx, &post, tracer)
                .unwrap();
        }
        post
    }

    #[traced_test]
    #[test]
    fn test_fits_then_block_full() {
        let mut selector = selector(&[("ADD", 10), ("EXT", 10)]);
        let mut tracer = ScriptedTracer::new(&["ADD", "EXT"]);
        let (a, b, c) = (test_tx(1), test_tx(2), test_tx(3));
        tracer.script(&a, &[("ADD", 6)]);
        tracer.script(&b, &[("ADD", 5)]);
        tracer.script(&c, &[("ADD", 4), ("EXT", 3)]);

        selector.start_block(&tracer).unwrap();
        assert_eq!(offer(&mut selector, &mut tracer, &a), SelectionResult::Selected);
        assert_eq!(
            offer(&mut selector, &mut tracer, &b),
            SelectionResult::BlockModuleLineCountFull { module: "ADD".into() }
        );
        assert_eq!(selector.phase(), SelectorPhase::TxRejectedBlockFull);
        // Retracted: b's rows are gone.
        assert_eq!(tracer.line_counts().get("ADD"), Some(6));

        assert_eq!(offer(&mut selector, &mut tracer, &c), SelectionResult::Selected);
        let used = selector.seal_block();
        assert_eq!(used.get("ADD"), Some(10));
        assert_eq!(used.get("EXT"), Some(3));
        assert_eq!(selector.phase(), SelectorPhase::BlockSealed);
        assert!(selector.cache().is_empty());
    }

    #[traced_test]
    #[test]
    fn test_tx_overflow_is_cached() {
        let mut selector = selector(&[("EXT", 5)]);
        let mut tracer = ScriptedTracer::new(&["EXT"]);
        let tx = test_tx(7);
        tracer.script(&tx, &[("EXT", 6)]);

        selector.start_block(&tracer).unwrap();
        assert_eq!(
            offer(&mut selector, &mut tracer, &tx),
            SelectionResult::TxModuleLineCountOverflow { module: "EXT".into() }
        );
        assert_eq!(selector.phase(), SelectorPhase::TxRejectedTxLimit);
        assert!(logs_contain("exceeds module line count limit"));

        assert_eq!(
            offer(&mut selector, &mut tracer, &tx),
            SelectionResult::TxModuleLineCountOverflowCached { module: "EXT".into() }
        );
        assert_eq!(selector.phase(), SelectorPhase::TxRejectedCached);
        assert_eq!(tracer.execution_count(&tx), 1);
        assert_eq!(tracer.line_counts().get("EXT"), Some(0));
    }

    #[traced_test]
    #[test]
    fn test_first_module_in_lexicographic_order_is_reported() {
        let mut selector = selector(&[("ADD", 1), ("EXT", 1), ("MUL", 1)]);
        let mut tracer = ScriptedTracer::new(&["MUL", "EXT", "ADD"]);
        let tx = test_tx(1);
        tracer.script(&tx, &[("MUL", 2), ("EXT", 2)]);

        selector.start_block(&tracer).unwrap();
        assert_eq!(
            offer(&mut selector, &mut tracer, &tx),
            SelectionResult::TxModuleLineCountOverflow { module: "EXT".into() }
        );
    }

    #[traced_test]
    #[test]
    fn test_tx_overflow_takes_precedence_over_block_full() {
        let mut selector = selector(&[("ADD", 4), ("EXT", 4)]);
        let mut tracer = ScriptedTracer::new(&["ADD", "EXT"]);
        let (a, b) = (test_tx(1), test_tx(2));
        tracer.script(&a, &[("ADD", 4)]);
        // Fills ADD but also overflows EXT on its own.
        tracer.script(&b, &[("ADD", 1), ("EXT", 5)]);

        selector.start_block(&tracer).unwrap();
        offer(&mut selector, &mut tracer, &a);
        assert_eq!(
            offer(&mut selector, &mut tracer, &b),
            SelectionResult::TxModuleLineCountOverflow { module: "EXT".into() }
        );
    }

    #[traced_test]
    #[test]
    fn test_block_start_counts_are_excluded_from_usage() {
        let mut selector = selector(&[("ADD", 5)]);
        let mut tracer = ScriptedTracer::new(&["ADD"]);
        tracer.add_rows("ADD", 100);
        let tx = test_tx(1);
        tracer.script(&tx, &[("ADD", 5)]);

        selector.start_block(&tracer).unwrap();
        assert_eq!(offer(&mut selector, &mut tracer, &tx), SelectionResult::Selected);
        assert_eq!(selector.seal_block().get("ADD"), Some(5));
    }

    #[traced_test]
    #[test]
    fn test_undefined_module_is_an_error() {
        let mut selector = selector(&[("ADD", 5)]);
        let mut tracer = ScriptedTracer::new(&["ADD", "KECCAK"]);
        let tx = test_tx(1);
        tracer.script(&tx, &[("ADD", 3)]);

        selector.start_block(&tracer).unwrap();
        assert!(selector.evaluate_pre_processing(&tx).is_selected());
        tracer.execute(&tx).unwrap();
        assert_eq!(
            selector.evaluate_post_processing(&tx, &tracer),
            Err(SelectorError::ModuleNotDefined {
                module: "KECCAK".into()
            })
        );
        selector.abort_block(&mut tracer).unwrap();
        assert_eq!(selector.phase(), SelectorPhase::BlockSealed);
        assert_eq!(tracer.line_counts().get("ADD"), Some(0));
        assert!(logs_contain("Retracting unsettled transaction"));
    }

    #[traced_test]
    #[test]
    fn test_abort_before_execution_leaves_tracer_alone() {
        let mut selector = selector(&[("ADD", 5)]);
        let mut tracer = ScriptedTracer::new(&["ADD"]);
        let tx = test_tx(1);

        selector.start_block(&tracer).unwrap();
        selector.evaluate_pre_processing(&tx);
        // No trial is open in the tracer, so a retraction would fail.
        selector.abort_block(&mut tracer).unwrap();
        assert_eq!(selector.phase(), SelectorPhase::BlockSealed);
    }

    /// Tracer whose counts after `execute` are scripted outright, so they
    /// can go below the committed baseline.
    #[derive(Debug)]
    struct RewindingTracer {
        counts: LineCounts,
        after_execute: LineCounts,
        retracted: Vec<Transaction>,
    }

    impl LineCountTracer for RewindingTracer {
        fn execute(&mut self, _tx: &Transaction) -> Result<(), TracerError> {
            self.counts = self.after_execute.clone();
            Ok(())
        }

        fn cumulative_line_counts(&self) -> Result<LineCounts, TracerError> {
            Ok(self.counts.clone())
        }

        fn retract(&mut self, tx: &Transaction) -> Result<(), TracerError> {
            self.retracted.push(tx.clone());
            Ok(())
        }
    }

    #[traced_test]
    #[test]
    fn test_count_below_baseline_is_a_regression() {
        let mut selector = selector(&[("ADD", 50), ("EXT", 50)]);
        let mut tracer = RewindingTracer {
            counts: [("ADD", 10), ("EXT", 2)].into_iter().collect(),
            after_execute: [("ADD", 4), ("EXT", 3)].into_iter().collect(),
            retracted: Vec::new(),
        };
        let tx = test_tx(1);

        selector.start_block(&tracer).unwrap();
        assert!(selector.evaluate_pre_processing(&tx).is_selected());
        tracer.execute(&tx).unwrap();
        assert_eq!(
            selector.evaluate_post_processing(&tx, &tracer),
            Err(SelectorError::LineCountRegression {
                module: "ADD".into(),
                before: 10,
                after: 4,
            })
        );

        selector.abort_block(&mut tracer).unwrap();
        assert_eq!(selector.phase(), SelectorPhase::BlockSealed);
        assert_eq!(tracer.retracted, vec![tx]);
    }

    #[traced_test]
    #[test]
    fn test_caller_claimed_overflow_is_not_cached() {
        let mut selector = selector(&[("EXT", 5)]);
        let mut tracer = ScriptedTracer::new(&["EXT"]);
        let tx = test_tx(1);
        tracer.script(&tx, &[("EXT", 2)]);

        selector.start_block(&tracer).unwrap();
        selector.evaluate_pre_processing(&tx);
        tracer.execute(&tx).unwrap();
        let evaluated = selector.evaluate_post_processing(&tx, &tracer).unwrap();
        assert!(evaluated.is_selected());

        let claimed = SelectionResult::TxModuleLineCountOverflow { module: "EXT".into() };
        selector
            .on_transaction_not_selected(&tx, &claimed, &mut tracer)
            .unwrap();
        assert!(selector.cache().is_empty());
        assert_eq!(tracer.line_counts().get("EXT"), Some(0));
        assert_eq!(selector.phase(), SelectorPhase::TxRejectedTxLimit);
        assert!(logs_contain("Not caching an overflow that was not evaluated"));

        // The next attempt still executes.
        assert!(selector.evaluate_pre_processing(&tx).is_selected());
    }

    #[test]
    #[should_panic(expected = "contradicts its evaluation")]
    fn test_rejection_contradicting_evaluation_panics() {
        let mut selector = selector(&[("ADD", 5), ("EXT", 5)]);
        let mut tracer = ScriptedTracer::new(&["ADD", "EXT"]);
        let tx = test_tx(1);
        tracer.script(&tx, &[("EXT", 9)]);

        selector.start_block(&tracer).unwrap();
        selector.evaluate_pre_processing(&tx);
        tracer.execute(&tx).unwrap();
        selector.evaluate_post_processing(&tx, &tracer).unwrap();
        let wrong = SelectionResult::TxModuleLineCountOverflow { module: "ADD".into() };
        let _ = selector.on_transaction_not_selected(&tx, &wrong, &mut tracer);
    }

    #[traced_test]
    #[test]
    fn test_limits_reload_applies_to_next_evaluation() {
        let mut selector = selector(&[("EXT", 5)]);
        let mut tracer = ScriptedTracer::new(&["EXT"]);
        let (a, b) = (test_tx(1), test_tx(2));
        tracer.script(&a, &[("EXT", 6)]);
        tracer.script(&b, &[("EXT", 6)]);

        selector.start_block(&tracer).unwrap();
        assert!(!offer(&mut selector, &mut tracer, &a).is_selected());

        let generation = selector
            .limits()
            .swap([("EXT".into(), 20)].into_iter().collect());
        assert_eq!(generation, 1);
        assert_eq!(offer(&mut selector, &mut tracer, &b), SelectionResult::Selected);
        // Stale overflow no longer applies after the reload.
        assert_eq!(offer(&mut selector, &mut tracer, &a), SelectionResult::Selected);
        assert_eq!(tracer.execution_count(&a), 2);
    }

    #[test]
    #[should_panic(expected = "without pre-processing")]
    fn test_post_processing_without_pre_processing_panics() {
        let mut selector = selector(&[("ADD", 5)]);
        let tracer = ScriptedTracer::new(&["ADD"]);
        selector.start_block(&tracer).unwrap();
        let _ = selector.evaluate_post_processing(&test_tx(1), &tracer);
    }

    #[test]
    #[should_panic(expected = "not evaluated")]
    fn test_selecting_unevaluated_tx_panics() {
        let mut selector = selector(&[("ADD", 5)]);
        let mut tracer = ScriptedTracer::new(&["ADD"]);
        selector.start_block(&tracer).unwrap();
        let tx = test_tx(1);
        selector.evaluate_pre_processing(&tx);
        let _ = selector.on_transaction_selected(&tx, &mut tracer);
    }

    #[test]
    #[should_panic(expected = "pre-processing")]
    fn test_pre_processing_without_open_block_panics() {
        let mut selector = selector(&[("ADD", 5)]);
        selector.evaluate_pre_processing(&test_tx(1));
    }
}
