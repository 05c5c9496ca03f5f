// Library root: wire protocol, table sync, scheduling, config and the feed
// server shared by the engine and the binary.

pub mod config;
pub mod feed;
pub mod protocol;
pub mod schedule;
pub mod sync;
