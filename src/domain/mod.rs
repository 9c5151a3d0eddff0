//! UI-free account logic: the store, the reconciliation table, the
//! card-file resolver and the switch write.

pub mod accounts;
pub mod reconcile;
pub mod resolve;
pub mod switch;

pub use accounts::AccountStore;
pub use reconcile::{reconcile, Decision};
pub use resolve::{resolve, Resolution};
pub use switch::switch_to;
