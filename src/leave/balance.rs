//! The leave balance ledger.
//!
//! Balances are derived, persisted running totals. The debit for a fully
//! approved application commits inside the store's decision transaction;
//! this engine covers the HR seed and read surfaces. There is deliberately
//! no credit-back path for applications cancelled or reopened after
//! approval.

use std::sync::Arc;

use crate::leave::domain::{BalanceKey, LeaveBalance};
use crate::store::{LeaveStore, StoreError};

pub struct BalanceLedger<S> {
    store: Arc<S>,
}

impl<S> BalanceLedger<S>
where
    S: LeaveStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Seed or correct a balance bucket (HR surface). The derived balance
    /// is recomputed on write regardless of what the caller supplied.
    pub fn put(&self, balance: LeaveBalance) -> Result<LeaveBalance, StoreError> {
        self.store.put_balance(balance)
    }

    pub fn get(&self, key: &BalanceKey) -> Result<Option<LeaveBalance>, StoreError> {
        self.store.balance(key)
    }
}
