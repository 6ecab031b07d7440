//! Log output via `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

use scaffold_core::error::{ScaffoldError, ScaffoldResult};

/// Installs a formatting subscriber filtered by `filter` (an `EnvFilter` directive such
/// as `info` or `scaffold=debug,tower_http=warn`).
///
/// Returns `false` when a global subscriber was already installed, which leaves it in place.
///
/// # Errors
///
/// Fails if `filter` is not a valid directive.
pub fn init(filter: &str) -> ScaffoldResult<bool> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|err| ScaffoldError::Initialization(format!("invalid log filter {filter:?}: {err}")))?;

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_directives() {
        assert!(init("scaffold=loud").is_err());
    }
}
