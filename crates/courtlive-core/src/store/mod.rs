// ── Two-tier data cache ──
//
// Latest payload per connection and latest payload per court, with
// push-based change notification for the court tier.

mod collection;
mod courts;
mod data_store;

pub use courts::CourtEntry;
pub use data_store::DataStore;
