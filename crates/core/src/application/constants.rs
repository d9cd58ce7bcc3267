// Application constants (no magic values)
use std::time::Duration;

/// Default interval between flush cycles (30s)
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// Longest accepted queue name (width of the persisted name column)
pub const MAX_QUEUE_NAME_LEN: usize = 255;

/// Log records returned by `describe` when no limit is given
pub const DEFAULT_LOG_TAIL: usize = 20;
