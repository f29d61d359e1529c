//! Context helpers for attaching a human-readable trail to a [`SchedError`]
//! without losing the typed variant, built on `anyhow`'s context-chaining.

use anyhow::{anyhow, Context as AnyhowContext, Result as AnyhowResult};

use crate::error::{SchedError, SchedResult};

pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> AnyhowResult<T>;

    fn with_context<F>(self, f: F) -> AnyhowResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ErrorContext<T> for SchedResult<T> {
    fn context(self, msg: &str) -> AnyhowResult<T> {
        self.map_err(|e| anyhow!("{e}")).context(msg.to_string())
    }

    fn with_context<F>(self, f: F) -> AnyhowResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| anyhow!("{e}")).context(f())
    }
}

/// Converts an `anyhow` chain back into the crate's typed error at a
/// module boundary (a circuit-breaker trip, a materialize failure) that
/// still needs to return `SchedError::Internal` rather than propagate
/// `anyhow::Error` past the core's public API.
pub trait IntoSchedResult<T> {
    fn into_sched_result(self) -> SchedResult<T>;
}

impl<T> IntoSchedResult<T> for AnyhowResult<T> {
    fn into_sched_result(self) -> SchedResult<T> {
        self.map_err(|e| SchedError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prefixes_the_error_message() {
        let result: SchedResult<()> = Err(SchedError::Config("missing token".into()));
        let with_ctx = result.context("loading sched_config");
        assert!(with_ctx.is_err());
        let msg = with_ctx.unwrap_err().to_string();
        assert!(msg.contains("loading sched_config"));
        assert!(msg.contains("missing token"));
    }

    #[test]
    fn with_context_is_lazy_and_only_built_on_error() {
        let result: SchedResult<()> = Err(SchedError::Internal("boom".into()));
        let with_ctx = result.with_context(|| "building universe".to_string());
        let msg = with_ctx.unwrap_err().to_string();
        assert!(msg.contains("building universe"));
    }

    #[test]
    fn into_sched_result_roundtrips_through_internal() {
        let anyhow_err: AnyhowResult<i32> = Err(anyhow!("disk full"));
        let sched = anyhow_err.into_sched_result();
        match sched {
            Err(SchedError::Internal(msg)) => assert!(msg.contains("disk full")),
            _ => panic!("expected Internal"),
        }
    }
}
