pub mod config;
pub mod enrichment;
pub mod error;
pub mod identity;
pub mod store;
pub mod view;

pub use config::ViewConfig;
pub use error::{ErrorKind, LeaderboardError};
pub use store::ScoreStore;
pub use view::LeaderboardView;
