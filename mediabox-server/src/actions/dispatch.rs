//! Request dispatch
//!
//! Resolves (category, path) against the registry, runs the handler, and
//! turns every outcome (reply, error, panic, timeout) into exactly one
//! result for the caller.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::{ActionClass, ActionQuery, ActionRegistry, ActionReply};
use crate::error::{Error, Result};

/// Upper bound on handler run time, per [`ActionClass`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTimeouts {
    pub quick: Duration,
    pub extended: Duration,
}

impl ActionTimeouts {
    pub fn limit_for(&self, class: ActionClass) -> Duration {
        match class {
            ActionClass::Quick => self.quick,
            ActionClass::Extended => self.extended,
        }
    }
}

impl Default for ActionTimeouts {
    fn default() -> Self {
        Self {
            quick: Duration::from_secs(15),
            extended: Duration::from_secs(300),
        }
    }
}

/// Executes registered actions against a shared context
pub struct Dispatcher<C> {
    registry: Arc<ActionRegistry<C>>,
    context: C,
    timeouts: ActionTimeouts,
}

impl<C: Clone + Send + 'static> Dispatcher<C> {
    pub fn new(registry: ActionRegistry<C>, context: C, timeouts: ActionTimeouts) -> Self {
        Self {
            registry: Arc::new(registry),
            context,
            timeouts,
        }
    }

    pub fn registry(&self) -> &ActionRegistry<C> {
        &self.registry
    }

    /// Resolve and run one action
    ///
    /// Routing failures, handler errors, handler panics and timeouts all come
    /// back as `Err`; none of them propagate past this call.
    pub async fn dispatch(
        &self,
        category: &str,
        path: &str,
        query: ActionQuery,
    ) -> Result<ActionReply> {
        let entry = self.registry.lookup(category, path).map_err(|e| {
            warn!("Invalid API action: {}", e);
            e
        })?;

        let limit = self.timeouts.limit_for(entry.class());
        debug!(category, path, ?limit, "Invoking action");

        let running = AssertUnwindSafe(entry.invoke(self.context.clone(), query)).catch_unwind();

        match tokio::time::timeout(limit, running).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => {
                let detail = panic_message(panic.as_ref());
                error!(category, path, "Action panicked: {}", detail);
                Err(Error::Internal(format!("Error executing {}/{}", category, path)))
            }
            Err(_) => {
                error!(category, path, ?limit, "Action timed out");
                Err(Error::Timeout(limit))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Deserialize)]
    struct FileQuery {
        file: Option<String>,
    }

    async fn play_local(ctx: Arc<AtomicUsize>, query: ActionQuery) -> Result<ActionReply> {
        let query: FileQuery = query.parse()?;
        let file = query
            .file
            .ok_or_else(|| Error::BadRequest("Missing file parameter.".to_string()))?;
        ctx.fetch_add(1, Ordering::SeqCst);
        Ok(ActionReply::ok().with("file", json!(file)))
    }

    async fn play_remote(_ctx: Arc<AtomicUsize>, _query: ActionQuery) -> Result<ActionReply> {
        Ok(ActionReply::ok().with("remote", json!(true)))
    }

    async fn failing(_ctx: Arc<AtomicUsize>, _query: ActionQuery) -> Result<ActionReply> {
        Err(Error::Player("Error during audio playback.".to_string()))
    }

    async fn panicking(_ctx: Arc<AtomicUsize>, _query: ActionQuery) -> Result<ActionReply> {
        panic!("collaborator exploded");
    }

    async fn hanging(_ctx: Arc<AtomicUsize>, _query: ActionQuery) -> Result<ActionReply> {
        futures::future::pending::<()>().await;
        Ok(ActionReply::ok())
    }

    fn dispatcher() -> (Dispatcher<Arc<AtomicUsize>>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ActionRegistry::builder()
            .register("play", "remote", ActionClass::Extended, play_remote)
            .register("play", "local", ActionClass::Quick, play_local)
            .register("test", "fail", ActionClass::Quick, failing)
            .register("test", "panic", ActionClass::Quick, panicking)
            .register("test", "hang", ActionClass::Quick, hanging)
            .build()
            .unwrap();
        let timeouts = ActionTimeouts {
            quick: Duration::from_secs(2),
            extended: Duration::from_secs(60),
        };
        (
            Dispatcher::new(registry, Arc::clone(&calls), timeouts),
            calls,
        )
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let (dispatcher, calls) = dispatcher();
        let query = ActionQuery::from_query_str("file=song.mp3").unwrap();

        let reply = dispatcher.dispatch("play", "local", query).await.unwrap();
        assert_eq!(reply.get("file"), Some(&json!("song.mp3")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_path_leaves_siblings_dispatchable() {
        let (dispatcher, _) = dispatcher();

        let err = dispatcher
            .dispatch("play", "bogus", ActionQuery::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownPath { .. }));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("not found under category"));

        let reply = dispatcher
            .dispatch("play", "remote", ActionQuery::empty())
            .await
            .unwrap();
        assert_eq!(reply.get("remote"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_unknown_category() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher
            .dispatch("nope", "remote", ActionQuery::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCategory(_)));
    }

    #[tokio::test]
    async fn test_missing_parameter_is_bad_request() {
        let (dispatcher, calls) = dispatcher();
        let err = dispatcher
            .dispatch("play", "local", ActionQuery::empty())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Missing file parameter.");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_error_is_contained() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher
            .dispatch("test", "fail", ActionQuery::empty())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Error during audio playback.");
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher
            .dispatch("test", "panic", ActionQuery::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));

        // Dispatcher still usable afterwards
        assert!(dispatcher
            .dispatch("play", "remote", ActionQuery::empty())
            .await
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_action_times_out() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher
            .dispatch("test", "hang", ActionQuery::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(limit) if limit == Duration::from_secs(2)));
    }
}
