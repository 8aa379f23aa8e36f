//! Test helpers for the line-limit selector.
//!
//! Provides a [`ScriptedTracer`] that plays back per-transaction row counts
//! through real [`CountModule`]s, plus small fixtures for transactions and
//! limits.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracelimit_accounting::{
    CountModule, LineCountTracer, ModuleRegistry, TracerError,
};
use tracelimit_config::{LimitsStore, ModuleLimits};
use tracelimit_types::{Address, Hash, LineCounts, ModuleName, Transaction};

/// Sender used by [`test_tx`].
pub const TEST_SENDER: Address = Address::new([0xAA; 20]);

/// Deterministic transaction number `n` from [`TEST_SENDER`].
pub fn test_tx(n: u64) -> Transaction {
    Transaction::new(TEST_SENDER, n, format!("payload-{n}").into_bytes())
}

/// Limits store holding `entries` at generation 0.
pub fn test_limits(entries: &[(&str, u64)]) -> Arc<LimitsStore> {
    Arc::new(entries.iter().copied().collect::<ModuleLimits>().into_store())
}

/// Tracer that replays scripted row counts.
///
/// Each module is a [`CountModule`] inside a [`ModuleRegistry`], so the
/// stacked accounting is the real one: `execute` opens a trial and adds the
/// scripted rows, `retract` pops it, `commit` keeps it.
#[derive(Debug)]
pub struct ScriptedTracer {
    registry: ModuleRegistry,
    scripts: HashMap<Hash, Vec<(ModuleName, u64)>>,
    failures: HashMap<Hash, TracerError>,
    executions: HashMap<Hash, usize>,
    open_trial: Option<Hash>,
}

impl ScriptedTracer {
    /// Create a tracer reporting the given modules.
    pub fn new(modules: &[&str]) -> Self {
        let mut registry = ModuleRegistry::new();
        for module in modules {
            registry
                .register(Box::new(CountModule::new(*module)))
                .expect("module names must be unique");
        }
        Self {
            registry,
            scripts: HashMap::new(),
            failures: HashMap::new(),
            executions: HashMap::new(),
            open_trial: None,
        }
    }

    /// Rows `tx` adds per module when executed. Unlisted modules get zero.
    pub fn script(&mut self, tx: &Transaction, rows: &[(&str, u64)]) {
        let rows = rows
            .iter()
            .map(|(module, count)| (ModuleName::from(*module), *count))
            .collect();
        self.scripts.insert(tx.hash(), rows);
    }

    /// Make executing `tx` fail with `error`.
    pub fn fail(&mut self, tx: &Transaction, error: TracerError) {
        self.failures.insert(tx.hash(), error);
    }

    /// Number of times `tx` was executed.
    pub fn execution_count(&self, tx: &Transaction) -> usize {
        self.executions.get(&tx.hash()).copied().unwrap_or(0)
    }

    /// Current cumulative counts.
    pub fn line_counts(&self) -> LineCounts {
        self.registry.line_counts()
    }

    /// Add rows outside any transaction trial (e.g. block-level overhead).
    pub fn add_rows(&mut self, module: &str, rows: u64) {
        self.module(module).add(rows);
    }

    fn module(&mut self, module: &str) -> &mut CountModule {
        self.registry
            .module_mut::<CountModule>(module)
            .unwrap_or_else(|| panic!("module {module} is not registered in the tracer"))
    }

    fn close_trial(&mut self, tx: &Transaction) -> Result<(), TracerError> {
        match self.open_trial.take() {
            Some(open) if open == tx.hash() => Ok(()),
            other => {
                self.open_trial = other;
                Err(TracerError::Unavailable(format!(
                    "no trial open for transaction {}",
                    tx.hash()
                )))
            }
        }
    }
}

impl LineCountTracer for ScriptedTracer {
    fn execute(&mut self, tx: &Transaction) -> Result<(), TracerError> {
        *self.executions.entry(tx.hash()).or_default() += 1;
        if let Some(error) = self.failures.get(&tx.hash()) {
            return Err(error.clone());
        }

        self.registry.enter_transaction();
        let rows = self.scripts.get(&tx.hash()).cloned().unwrap_or_default();
        for (module, count) in rows {
            self.module(module.as_str()).add(count);
        }
        self.open_trial = Some(tx.hash());
        Ok(())
    }

    fn cumulative_line_counts(&self) -> Result<LineCounts, TracerError> {
        Ok(self.registry.line_counts())
    }

    fn commit(&mut self, tx: &Transaction) -> Result<(), TracerError> {
        self.close_trial(tx)?;
        self.registry.commit_transaction();
        Ok(())
    }

    fn retract(&mut self, tx: &Transaction) -> Result<(), TracerError> {
        self.close_trial(tx)?;
        self.registry.pop_transaction();
        Ok(())
    }
}

/// Seeded random candidates, each scripted on `tracer` with up to
/// `max_rows` rows per module.
pub fn random_candidates(
    tracer: &mut ScriptedTracer,
    modules: &[&str],
    count: usize,
    max_rows: u64,
    seed: u64,
) -> Vec<Transaction> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count as u64)
        .map(|n| {
            let tx = Transaction::new(TEST_SENDER, n, rng.gen::<[u8; 8]>().to_vec());
            let rows: Vec<(&str, u64)> = modules
                .iter()
                .map(|module| (*module, rng.gen_range(0..=max_rows)))
                .collect();
            tracer.script(&tx, &rows);
            tx
        })
        .collect()
}

/// Module names known to the tracer, for assertions.
pub fn module_names(tracer: &ScriptedTracer) -> Vec<ModuleName> {
    tracer.line_counts().modules().cloned().collect()
}
