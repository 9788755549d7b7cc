/// Engine configuration constants.

/// Upper bound on cluster size. Member lists beyond this are truncated.
pub const MAX_MEMBERS: usize = 384;

/// Name of the process group the engine joins for its own traffic.
pub const SYNC_GROUP: &str = "sync";
