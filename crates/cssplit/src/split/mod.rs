//! The split engine.
//!
//! - [`Budget`] - selector count of the fragment under construction
//! - [`region`] - unbreakable / property-bag / nested classification of blocks
//! - [`split_rule`] - dividing one rule's selector list in two
//! - [`extract`] - moving a document-order range into a new tree
//! - [`Partitioner`] - the walk that decides where to cut

mod budget;
mod classify;
mod extract;
mod partition;
mod rule;

pub use budget::Budget;
pub use classify::{Region, is_qualifying, region, rules_within, weighted_selector_count};
pub use extract::extract;
pub use partition::{Partitioner, validate};
pub use rule::split_rule;
