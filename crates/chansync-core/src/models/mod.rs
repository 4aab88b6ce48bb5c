//! Channel snapshots and run-scoped settings.

mod channel;
mod mode;

pub use channel::{join_models, load_channels, parse_channels, parse_models, Channel, ChannelId};
pub use mode::UpdateMode;
