//! Query modules over the local store.
//!
//! Each module provides a query struct that borrows the [`Store`](crate::store::Store)
//! and exposes typed methods returning `Result<T>`.

pub mod cards;
pub mod inventory;
pub mod prices;
pub mod set_imports;
pub mod sync_state;
pub mod trackers;

pub use cards::{CardQuery, CardSearch};
pub use inventory::InventoryQuery;
pub use prices::PriceQuery;
pub use set_imports::SetImportQuery;
pub use sync_state::SyncStateQuery;
pub use trackers::TrackerQuery;
