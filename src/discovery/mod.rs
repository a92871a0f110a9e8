// Discovery pipeline: list view state and detail lookup

pub mod detail;
pub mod state;

pub use detail::{DetailLookup, DetailView};
pub use state::{Commit, DiscoverySnapshot, DiscoveryState, FilterMode};
