/// Virtual-synchrony filter seam.
///
/// The filter decides whether this node sits in the primary component
/// during partitions. Without one, every configuration is treated as
/// primary. The filter's asynchronous primary-designation decision is
/// wired by the host into `SyncEngine::on_primary_designation`.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// No filter with this name exists. Fatal to registration.
    #[error("unknown virtual synchrony filter {0:?}")]
    UnknownFilter(String),
}

pub trait SynchronyFilter {
    fn name(&self) -> &str;

    /// Whether this node is currently designated primary.
    fn is_primary(&self) -> bool;
}

/// Configured filter for an engine instance.
pub enum FilterMode {
    /// No filter: every regular configuration is primary.
    None,
    Plugin(Box<dyn SynchronyFilter>),
}

/// Resolve a configured filter name.
///
/// Only "none" resolves here; plugin instances are supplied
/// programmatically through `SyncEngine::register_with_filter`. Any other
/// name is a load failure, fatal to registration.
pub fn load(kind: &str) -> Result<FilterMode, FilterError> {
    if kind == "none" {
        Ok(FilterMode::None)
    } else {
        Err(FilterError::UnknownFilter(kind.to_owned()))
    }
}
