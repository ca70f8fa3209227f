//! Scoped acquisition shared by units and composites.

use std::future::Future;

use async_trait::async_trait;

use crate::error::{UowError, UowResult};
use crate::unit::CommitOutcome;

/// The enter/commit/exit contract. Object safe, so units over different
/// stores can sit side by side in a composite.
#[async_trait]
pub trait Scope: Send + Sync {
    async fn enter(&self) -> UowResult<()>;

    async fn commit(&self) -> UowResult<CommitOutcome>;

    /// `failed` tells the scope whether the body errored and must roll back.
    async fn exit(&self, failed: bool) -> UowResult<()>;
}

/// Run `body` inside `scope`.
///
/// Enters the scope, awaits the body, then exits with `failed` set from the
/// body's result. The body's own error wins over an exit error, which is
/// logged instead. The body must commit explicitly; exiting without a commit
/// discards transactional work and staged commands.
pub async fn run<S, F, T, E>(scope: &S, body: F) -> Result<T, E>
where
    S: Scope + ?Sized,
    F: Future<Output = Result<T, E>>,
    E: From<UowError>,
{
    scope.enter().await?;

    let result = body.await;
    let exited = scope.exit(result.is_err()).await;

    match (result, exited) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(exit_err)) => Err(exit_err.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(exit_err)) => {
            tracing::error!(error = %exit_err, "Scope exit failed after body error");
            Err(e)
        }
    }
}
