pub mod cards;
pub mod collection;
pub mod dashboard;
pub mod sets;
pub mod sync;
pub mod trackers;
