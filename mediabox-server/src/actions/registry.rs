//! Static (category, path) → handler table
//!
//! Built once through [`ActionRegistryBuilder`] and never mutated afterwards,
//! so lookups from concurrent requests need no locking.

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

use super::{ActionQuery, ActionReply};
use crate::error::{Error, Result};

/// Future returned by every registered handler
pub type ActionFuture = BoxFuture<'static, Result<ActionReply>>;

type HandlerFn<C> = dyn Fn(C, ActionQuery) -> ActionFuture + Send + Sync;

/// Time-limit class of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    /// Admin, transport and Bluetooth calls that should answer promptly
    Quick,
    /// Downloads and library scans
    Extended,
}

/// One routable action
pub struct ActionEntry<C> {
    category: String,
    path: String,
    class: ActionClass,
    handler: Arc<HandlerFn<C>>,
}

impl<C> ActionEntry<C> {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn class(&self) -> ActionClass {
        self.class
    }

    /// Start the handler; the returned future owns everything it needs
    pub fn invoke(&self, context: C, query: ActionQuery) -> ActionFuture {
        (self.handler)(context, query)
    }
}

impl<C> Clone for ActionEntry<C> {
    fn clone(&self) -> Self {
        Self {
            category: self.category.clone(),
            path: self.path.clone(),
            class: self.class,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<C> std::fmt::Debug for ActionEntry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionEntry")
            .field("category", &self.category)
            .field("path", &self.path)
            .field("class", &self.class)
            .finish()
    }
}

/// Collects registrations and validates them into an [`ActionRegistry`]
pub struct ActionRegistryBuilder<C> {
    entries: Vec<ActionEntry<C>>,
}

impl<C: Send + 'static> ActionRegistryBuilder<C> {
    /// Register `handler` under `category`/`path`
    ///
    /// Duplicates are not rejected here; [`build`](Self::build) reports them so
    /// that a whole table can be declared as one chain.
    pub fn register<F, Fut>(
        mut self,
        category: &str,
        path: &str,
        class: ActionClass,
        handler: F,
    ) -> Self
    where
        F: Fn(C, ActionQuery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionReply>> + Send + 'static,
    {
        let handler: Arc<HandlerFn<C>> =
            Arc::new(move |context: C, query: ActionQuery| handler(context, query).boxed());
        self.entries.push(ActionEntry {
            category: category.to_string(),
            path: path.to_string(),
            class,
            handler,
        });
        self
    }

    /// Validate and freeze the table
    ///
    /// Fails on the first duplicate (category, path) pair or empty category.
    pub fn build(self) -> Result<ActionRegistry<C>> {
        let mut categories: HashMap<String, HashMap<String, ActionEntry<C>>> = HashMap::new();
        let total = self.entries.len();

        for entry in self.entries {
            if entry.category.is_empty() {
                return Err(Error::Config(format!(
                    "Action registered with empty category (path \"{}\")",
                    entry.path
                )));
            }

            let paths = categories.entry(entry.category.clone()).or_default();
            if paths.contains_key(&entry.path) {
                return Err(Error::DuplicateAction {
                    category: entry.category,
                    path: entry.path,
                });
            }
            paths.insert(entry.path.clone(), entry);
        }

        info!(
            "Action registry built: {} actions in {} categories",
            total,
            categories.len()
        );
        Ok(ActionRegistry { categories })
    }
}

/// Immutable routing table
pub struct ActionRegistry<C> {
    categories: HashMap<String, HashMap<String, ActionEntry<C>>>,
}

impl<C: Send + 'static> ActionRegistry<C> {
    pub fn builder() -> ActionRegistryBuilder<C> {
        ActionRegistryBuilder {
            entries: Vec::new(),
        }
    }
}

impl<C> ActionRegistry<C> {
    /// Case-sensitive exact lookup
    ///
    /// An unknown category and an unknown path within a known category are
    /// reported as different errors.
    pub fn lookup(&self, category: &str, path: &str) -> Result<&ActionEntry<C>> {
        let paths = self
            .categories
            .get(category)
            .ok_or_else(|| Error::UnknownCategory(category.to_string()))?;

        paths.get(path).ok_or_else(|| Error::UnknownPath {
            category: category.to_string(),
            path: path.to_string(),
        })
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.categories.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered (category, path) pairs, sorted
    pub fn routes(&self) -> Vec<(String, String)> {
        let mut routes: Vec<(String, String)> = self
            .categories
            .iter()
            .flat_map(|(category, paths)| {
                paths.keys().map(move |path| (category.clone(), path.clone()))
            })
            .collect();
        routes.sort();
        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tagged(tag: &'static str) -> impl Fn((), ActionQuery) -> futures::future::Ready<Result<ActionReply>> {
        move |_, _| futures::future::ready(Ok(ActionReply::ok().with("tag", json!(tag))))
    }

    fn sample_registry() -> ActionRegistry<()> {
        ActionRegistry::builder()
            .register("play", "remote", ActionClass::Extended, tagged("remote"))
            .register("play", "local", ActionClass::Quick, tagged("local"))
            .register("bluetooth", "discovery/start", ActionClass::Quick, tagged("disc"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_lookup_returns_registered_handler() {
        let registry = sample_registry();
        assert_eq!(registry.len(), 3);

        for (category, path, tag) in [
            ("play", "remote", "remote"),
            ("play", "local", "local"),
            ("bluetooth", "discovery/start", "disc"),
        ] {
            let entry = registry.lookup(category, path).unwrap();
            assert_eq!(entry.category(), category);
            assert_eq!(entry.path(), path);
            let reply = entry.invoke((), ActionQuery::empty()).await.unwrap();
            assert_eq!(reply.get("tag"), Some(&json!(tag)));
        }
    }

    #[test]
    fn test_unknown_category_vs_unknown_path() {
        let registry = sample_registry();

        assert!(matches!(
            registry.lookup("nope", "remote"),
            Err(Error::UnknownCategory(c)) if c == "nope"
        ));
        assert!(matches!(
            registry.lookup("play", "bogus"),
            Err(Error::UnknownPath { category, path }) if category == "play" && path == "bogus"
        ));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = sample_registry();
        assert!(registry.lookup("Play", "remote").is_err());
        assert!(registry.lookup("play", "Remote").is_err());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = ActionRegistry::builder()
            .register("play", "local", ActionClass::Quick, tagged("a"))
            .register("play", "local", ActionClass::Quick, tagged("b"))
            .build();

        assert!(matches!(
            result,
            Err(Error::DuplicateAction { category, path }) if category == "play" && path == "local"
        ));
    }

    #[test]
    fn test_same_path_in_different_categories_allowed() {
        let registry = ActionRegistry::builder()
            .register("library", "get", ActionClass::Quick, tagged("lib"))
            .register("content", "get", ActionClass::Quick, tagged("content"))
            .build()
            .unwrap();

        assert_eq!(
            registry.routes(),
            vec![
                ("content".to_string(), "get".to_string()),
                ("library".to_string(), "get".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_category_rejected() {
        let result = ActionRegistry::builder()
            .register("", "x", ActionClass::Quick, tagged("x"))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
