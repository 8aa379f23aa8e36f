//! Transaction pool admission checks.
//!
//! Validators run concurrently on pool threads while block building writes
//! to the rejection cache and operators reload configuration. They only
//! read lock-free snapshots.

use crate::cache::RejectionCache;
use std::fmt;
use std::sync::Arc;
use tracelimit_config::{DenyList, LimitsStore};
use tracelimit_types::Transaction;
use tracing::trace;

/// Check applied to a transaction before it enters the pool.
pub trait PoolTransactionValidator: Send + Sync {
    /// `None` to admit the transaction, or the reason it is refused.
    fn validate_transaction(&self, tx: &Transaction) -> Option<String>;
}

/// Refuses transactions already known to overflow a module limit.
#[derive(Debug, Clone)]
pub struct LineCountPoolValidator {
    cache: Arc<RejectionCache>,
    limits: Arc<LimitsStore>,
}

impl LineCountPoolValidator {
    /// Share the block builder's cache and the live limits.
    pub fn new(cache: Arc<RejectionCache>, limits: Arc<LimitsStore>) -> Self {
        Self { cache, limits }
    }
}

impl PoolTransactionValidator for LineCountPoolValidator {
    fn validate_transaction(&self, tx: &Transaction) -> Option<String> {
        let rejection = self.cache.get(&tx.hash(), self.limits.generation())?;
        trace!(tx = %tx.hash(), module = %rejection.module, "Refusing known overflow");
        Some(format!(
            "Transaction {} was already identified to go over line count limit for module {}",
            tx.hash(),
            rejection.module
        ))
    }
}

/// Refuses transactions from senders on the deny list.
#[derive(Debug, Clone)]
pub struct DenyListValidator {
    deny_list: Arc<DenyList>,
}

impl DenyListValidator {
    /// Check senders against `deny_list`.
    pub fn new(deny_list: Arc<DenyList>) -> Self {
        Self { deny_list }
    }
}

impl PoolTransactionValidator for DenyListValidator {
    fn validate_transaction(&self, tx: &Transaction) -> Option<String> {
        self.deny_list.contains(&tx.sender()).then(|| {
            format!(
                "sender {} is blocked as appearing on the deny list",
                tx.sender()
            )
        })
    }
}

/// Runs validators in order; the first refusal wins.
#[derive(Default)]
pub struct ValidatorChain {
    validators: Vec<Box<dyn PoolTransactionValidator>>,
}

impl ValidatorChain {
    /// Empty chain admitting everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validator.
    pub fn with(mut self, validator: impl PoolTransactionValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether the chain has no validators.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl PoolTransactionValidator for ValidatorChain {
    fn validate_transaction(&self, tx: &Transaction) -> Option<String> {
        self.validators
            .iter()
            .find_map(|validator| validator.validate_transaction(tx))
    }
}

impl fmt::Debug for ValidatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorChain")
            .field("validators", &self.validators.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracelimit_config::ReloadableSet;
    use tracelimit_test_helpers::{test_limits, test_tx, TEST_SENDER};
    use tracelimit_types::Address;

    #[test]
    fn test_line_count_validator_reports_module() {
        let cache = Arc::new(RejectionCache::with_capacity(8));
        let limits = test_limits(&[("EXT", 5)]);
        let validator = LineCountPoolValidator::new(Arc::clone(&cache), Arc::clone(&limits));
        let tx = test_tx(1);

        assert_eq!(validator.validate_transaction(&tx), None);

        cache.remember(tx.hash(), "EXT".into(), limits.generation());
        let reason = validator.validate_transaction(&tx).unwrap();
        assert!(reason.contains("already identified to go over line count limit"));
        assert!(reason.contains(&tx.hash().to_string()));
        assert!(reason.ends_with("module EXT"));

        limits.swap([("EXT".into(), 50)].into_iter().collect());
        assert_eq!(validator.validate_transaction(&tx), None);
    }

    #[test]
    fn test_deny_list_and_chain_order() {
        let deny = Arc::new(ReloadableSet::new([TEST_SENDER].into_iter().collect()));
        let cache = Arc::new(RejectionCache::with_capacity(8));
        let limits = test_limits(&[("EXT", 5)]);
        let tx = test_tx(1);
        cache.remember(tx.hash(), "EXT".into(), 0);

        let chain = ValidatorChain::new()
            .with(DenyListValidator::new(Arc::clone(&deny)))
            .with(LineCountPoolValidator::new(cache, limits));
        assert_eq!(chain.len(), 2);

        let reason = chain.validate_transaction(&tx).unwrap();
        assert!(reason.contains("deny list"));

        deny.swap([Address::new([1; 20])].into_iter().collect());
        let reason = chain.validate_transaction(&tx).unwrap();
        assert!(reason.contains("line count limit"));
    }

    #[test]
    fn test_empty_chain_admits() {
        assert_eq!(ValidatorChain::new().validate_transaction(&test_tx(1)), None);
    }
}
