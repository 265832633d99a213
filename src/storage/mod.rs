//!  Storage is organized in two layers.
//!   - [preferences::KeyValueStore] is the boundary to whatever durable key-value facility the
//!     host provides. A JSON file implementation and an in-memory one are included.
//!   - [counters::CounterStore] gives typed access to the three values the rater persists and
//!     swallows write failures, since losing a launch count is harmless.

pub mod counters;
pub mod preferences;
