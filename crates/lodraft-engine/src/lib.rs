// Drafting engine: state mirror, filters, selection, bans, phases and
// options, wired together by `DraftEngine`.

pub mod bans;
pub mod builds;
pub mod engine;
pub mod filter;
pub mod options;
pub mod phase;
pub mod roster;
pub mod selection;
pub mod store;

pub use engine::{DraftEngine, SearchBox};
