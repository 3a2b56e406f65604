use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use tracing::info;

use common::config::BudgetReset;

struct BudgetState {
    day: NaiveDate,
    used: u32,
}

/// Quota of approved trades.
///
/// A slot is taken with [`TradeBudget::try_reserve`] before the risk call and
/// only kept if the reservation is committed; dropping it gives the slot back.
pub struct TradeBudget {
    limit: u32,
    reset: BudgetReset,
    state: Mutex<BudgetState>,
}

impl TradeBudget {
    pub fn new(limit: u32, reset: BudgetReset) -> Self {
        Self::starting_on(limit, reset, Utc::now().date_naive())
    }

    pub(crate) fn starting_on(limit: u32, reset: BudgetReset, day: NaiveDate) -> Self {
        Self {
            limit,
            reset,
            state: Mutex::new(BudgetState { day, used: 0 }),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Slots reserved or committed in the current window.
    pub fn used(&self) -> u32 {
        self.used_on(Utc::now().date_naive())
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used())
    }

    pub fn try_reserve(&self) -> Option<Reservation<'_>> {
        self.try_reserve_on(Utc::now().date_naive())
    }

    pub(crate) fn used_on(&self, today: NaiveDate) -> u32 {
        self.lock_for(today).used
    }

    pub(crate) fn try_reserve_on(&self, today: NaiveDate) -> Option<Reservation<'_>> {
        let mut state = self.lock_for(today);
        if state.used >= self.limit {
            return None;
        }
        state.used += 1;
        Some(Reservation {
            budget: self,
            day: state.day,
            committed: false,
        })
    }

    fn lock_for(&self, today: NaiveDate) -> MutexGuard<'_, BudgetState> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if self.reset == BudgetReset::Daily && state.day != today {
            info!(
                "Trade budget rolled over to {} ({} of {} used on {})",
                today, state.used, self.limit, state.day
            );
            state.day = today;
            state.used = 0;
        }
        state
    }

    fn release(&self, day: NaiveDate) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        // a slot from a previous day was already wiped by the rollover
        if state.day == day {
            state.used = state.used.saturating_sub(1);
        }
    }
}

/// One reserved slot of a [`TradeBudget`].
pub struct Reservation<'a> {
    budget: &'a TradeBudget,
    day: NaiveDate,
    committed: bool,
}

impl Reservation<'_> {
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.budget.release(self.day);
        }
    }
}
