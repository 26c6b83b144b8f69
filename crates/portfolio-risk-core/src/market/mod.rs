//! Caller-supplied inputs: the price history and the portfolio weights.
//!
//! Both types validate their invariants once, at construction (including
//! deserialisation), and are immutable afterwards.

pub mod prices;
pub mod weights;

pub use prices::PriceMatrix;
pub use weights::WeightVector;
