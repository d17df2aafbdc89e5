//! Paginated, filterable search listing
//!
//! [`PaginatedSearchList`] owns the query/pagination state for one listing and
//! talks to a [`DataSource`]. Views read [`PaginatedSearchList::snapshot`] or
//! watch [`PaginatedSearchList::subscribe`] and call `set_query` / `load_more`
//! in response to their own input events.
//!
//! Every fetch is stamped with the request epoch current when it was issued.
//! `set_query` bumps the epoch, so a result that comes back after a newer
//! query was issued is dropped instead of rendered: last writer wins by
//! issuance order, not completion order.

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::error::ListError;
use crate::query::{Cursor, Query};
use crate::source::DataSource;

/// Snapshot of a listing handed to the view.
///
/// `items`, `query` and `cursor` always describe the same result set; `query`
/// switches over when the new query's first page lands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub query: Query,
    pub cursor: Option<Cursor>,
    pub has_more: bool,
    pub is_loading: bool,
    pub error: Option<ListError>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            query: Query::default(),
            cursor: None,
            has_more: false,
            is_loading: false,
            error: None,
        }
    }
}

/// What an operation did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Fetched page was applied
    Applied,
    /// Fetch failed and the error was recorded
    Failed,
    /// A newer query superseded this fetch; its outcome was dropped
    Discarded,
    /// Guard refused to start a fetch (nothing more to load, or already loading)
    Skipped,
}

struct Inner<T> {
    state: ListState<T>,
    epoch: u64,
}

/// Cursor-paginated listing over a [`DataSource`]
pub struct PaginatedSearchList<S: DataSource> {
    source: S,
    inner: Mutex<Inner<S::Item>>,
    updates: watch::Sender<ListState<S::Item>>,
}

impl<S: DataSource> PaginatedSearchList<S> {
    /// Create an empty listing (empty query, nothing loaded)
    pub fn new(source: S) -> Self {
        let (updates, _) = watch::channel(ListState::default());
        Self {
            source,
            inner: Mutex::new(Inner {
                state: ListState::default(),
                epoch: 0,
            }),
            updates,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current state
    pub fn snapshot(&self) -> ListState<S::Item> {
        self.updates.borrow().clone()
    }

    /// Receiver that observes a fresh snapshot after every transition
    pub fn subscribe(&self) -> watch::Receiver<ListState<S::Item>> {
        self.updates.subscribe()
    }

    /// Replace the active query and load its first page.
    ///
    /// Existing items stay visible until the new page arrives. On failure they
    /// are kept and `error` is set.
    pub async fn set_query(&self, query: Query) -> Transition {
        let epoch = {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            inner.state.is_loading = true;
            inner.state.error = None;
            self.publish(&inner.state);
            inner.epoch
        };

        debug!(epoch, term = %query.search_term, filters = ?query.filters, "Fetching first page");
        let result = self.source.fetch_page(&query, None).await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            debug!(epoch, current = inner.epoch, "Discarding superseded query result");
            return Transition::Discarded;
        }

        let state = &mut inner.state;
        let transition = match result {
            Ok(page) => {
                state.items = page.items;
                state.query = query;
                state.has_more = page.next_cursor.is_some();
                state.cursor = page.next_cursor;
                Transition::Applied
            }
            Err(err) => {
                warn!(epoch, error = %err, "Query fetch failed");
                state.error = Some(ListError::from(&err));
                Transition::Failed
            }
        };
        state.is_loading = false;
        self.publish(&inner.state);
        transition
    }

    /// Append the next page of the active query.
    ///
    /// Does nothing unless more results exist and no fetch is in flight, so
    /// repeated triggers cannot start duplicate page loads. On failure the
    /// loaded items and `has_more` are kept so the call can be retried.
    pub async fn load_more(&self) -> Transition {
        let (epoch, query, cursor) = {
            let mut inner = self.inner.lock().await;
            if !inner.state.has_more || inner.state.is_loading {
                return Transition::Skipped;
            }
            inner.state.is_loading = true;
            inner.state.error = None;
            self.publish(&inner.state);
            (
                inner.epoch,
                inner.state.query.clone(),
                inner.state.cursor.clone(),
            )
        };

        debug!(epoch, cursor = ?cursor, "Fetching next page");
        let result = self.source.fetch_page(&query, cursor.as_ref()).await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            debug!(epoch, current = inner.epoch, "Discarding superseded page");
            return Transition::Discarded;
        }

        let state = &mut inner.state;
        let transition = match result {
            Ok(page) => {
                state.items.extend(page.items);
                state.has_more = page.next_cursor.is_some();
                state.cursor = page.next_cursor;
                Transition::Applied
            }
            Err(err) => {
                warn!(epoch, error = %err, "Next page fetch failed");
                state.error = Some(ListError::from(&err));
                Transition::Failed
            }
        };
        state.is_loading = false;
        self.publish(&inner.state);
        transition
    }

    fn publish(&self, state: &ListState<S::Item>) {
        self.updates.send_replace(state.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{ErrorKind, FetchError};
    use crate::query::Page;

    /// Returns queued responses in order and records every call
    #[derive(Default)]
    struct ScriptedSource {
        responses: StdMutex<VecDeque<Result<Page<&'static str>, FetchError>>>,
        calls: StdMutex<Vec<(Query, Option<Cursor>)>>,
    }

    impl ScriptedSource {
        fn respond(self, response: Result<Page<&'static str>, FetchError>) -> Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        fn calls(&self) -> Vec<(Query, Option<Cursor>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DataSource for ScriptedSource {
        type Item = &'static str;

        async fn fetch_page(
            &self,
            query: &Query,
            cursor: Option<&Cursor>,
        ) -> Result<Page<Self::Item>, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((query.clone(), cursor.cloned()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Page::last(vec![])))
        }
    }

    fn page(items: &[&'static str], next: Option<&str>) -> Result<Page<&'static str>, FetchError> {
        Ok(Page::new(items.to_vec(), next.map(Cursor::from)))
    }

    #[tokio::test]
    async fn starts_empty() {
        let list = PaginatedSearchList::new(ScriptedSource::default());
        let state = list.snapshot();
        assert!(state.items.is_empty());
        assert_eq!(state.query, Query::default());
        assert!(!state.has_more);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn query_then_load_more_appends() {
        let source = ScriptedSource::default()
            .respond(page(&["A", "B"], Some("c1")))
            .respond(page(&["C"], None));
        let list = PaginatedSearchList::new(source);

        assert_eq!(list.set_query(Query::new("python")).await, Transition::Applied);
        let state = list.snapshot();
        assert_eq!(state.items, vec!["A", "B"]);
        assert!(state.has_more);
        assert_eq!(state.cursor, Some(Cursor::new("c1")));
        assert_eq!(state.query, Query::new("python"));

        assert_eq!(list.load_more().await, Transition::Applied);
        let state = list.snapshot();
        assert_eq!(state.items, vec!["A", "B", "C"]);
        assert!(!state.has_more);
        assert_eq!(state.cursor, None);

        let calls = list.source().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (Query::new("python"), None));
        assert_eq!(calls[1], (Query::new("python"), Some(Cursor::new("c1"))));
    }

    #[tokio::test]
    async fn load_more_without_more_never_fetches() {
        let source = ScriptedSource::default().respond(page(&["A"], None));
        let list = PaginatedSearchList::new(source);

        // Nothing loaded yet
        assert_eq!(list.load_more().await, Transition::Skipped);
        assert!(list.source().calls().is_empty());

        list.set_query(Query::new("rust")).await;
        assert_eq!(list.load_more().await, Transition::Skipped);
        assert_eq!(list.source().calls().len(), 1);
    }

    #[tokio::test]
    async fn new_query_replaces_items() {
        let source = ScriptedSource::default()
            .respond(page(&["A", "B"], Some("c1")))
            .respond(page(&["X"], None));
        let list = PaginatedSearchList::new(source);

        list.set_query(Query::new("one")).await;
        list.set_query(Query::new("two")).await;

        let state = list.snapshot();
        assert_eq!(state.items, vec!["X"]);
        assert_eq!(state.query, Query::new("two"));
        assert!(!state.has_more);
    }

    #[tokio::test]
    async fn failed_query_keeps_previous_items() {
        let source = ScriptedSource::default()
            .respond(page(&["A", "B"], Some("c1")))
            .respond(Err(FetchError::status(502, "Bad Gateway")));
        let list = PaginatedSearchList::new(source);

        list.set_query(Query::new("one")).await;
        assert_eq!(list.set_query(Query::new("two")).await, Transition::Failed);

        let state = list.snapshot();
        assert_eq!(state.items, vec!["A", "B"]);
        assert!(!state.is_loading);
        assert_eq!(state.error.as_ref().map(|e| e.kind), Some(ErrorKind::Network));
        // Displayed items still belong to the first query, and so does the cursor
        assert_eq!(state.query, Query::new("one"));
        assert_eq!(state.cursor, Some(Cursor::new("c1")));
    }

    #[tokio::test]
    async fn failed_load_more_allows_retry() {
        let source = ScriptedSource::default()
            .respond(page(&["A", "B"], Some("c1")))
            .respond(Err(FetchError::transport("connection reset")))
            .respond(page(&["C"], None));
        let list = PaginatedSearchList::new(source);

        list.set_query(Query::new("python")).await;
        assert_eq!(list.load_more().await, Transition::Failed);

        let state = list.snapshot();
        assert_eq!(state.items, vec!["A", "B"]);
        assert!(state.has_more);
        assert!(!state.is_loading);
        assert!(state.error.is_some());

        assert_eq!(list.load_more().await, Transition::Applied);
        let state = list.snapshot();
        assert_eq!(state.items, vec!["A", "B", "C"]);
        assert!(state.error.is_none());

        let calls = list.source().calls();
        assert_eq!(calls[1].1, Some(Cursor::new("c1")));
        assert_eq!(calls[2].1, Some(Cursor::new("c1")));
    }

    #[tokio::test]
    async fn successful_query_clears_error() {
        let source = ScriptedSource::default()
            .respond(Err(FetchError::transport("dns")))
            .respond(page(&["A"], None));
        let list = PaginatedSearchList::new(source);

        list.set_query(Query::new("x")).await;
        assert!(list.snapshot().error.is_some());

        list.set_query(Query::new("x")).await;
        let state = list.snapshot();
        assert!(state.error.is_none());
        assert_eq!(state.items, vec!["A"]);
    }

    #[tokio::test]
    async fn subscribers_see_every_transition() {
        let source = ScriptedSource::default().respond(page(&["A"], Some("c1")));
        let list = PaginatedSearchList::new(source);
        let mut rx = list.subscribe();

        list.set_query(Query::new("x")).await;
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.items, vec!["A"]);
        assert!(!state.is_loading);
    }
}
