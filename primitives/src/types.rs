use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Transport-assigned processor identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of membership configuration event reported by the transport.
///
/// Transitional configurations describe the intermediate view while the
/// membership protocol converges. Only regular (post-transition)
/// configurations carry a stable member list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigurationType {
    Transitional,
    Regular,
}
