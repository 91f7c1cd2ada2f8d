pub mod card;
pub mod dashboard;
pub mod inventory;
pub mod price;
pub mod set;
pub mod sync;
pub mod tracker;

pub use card::*;
pub use dashboard::*;
pub use inventory::*;
pub use price::*;
pub use set::*;
pub use sync::*;
pub use tracker::*;
