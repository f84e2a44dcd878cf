//! Statistics overview composition.

mod composer;
mod providers;

pub use composer::{compose, Overview, PERSISTENT_SOURCE};
pub use providers::{GlobalTotals, ModelAggregate, NoPersistence, PeriodCosts, PersistentStats};
