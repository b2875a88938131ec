pub mod ring;
pub mod tier_index;

pub use ring::{ClockRing, NodeId};
pub use tier_index::TierIndex;
