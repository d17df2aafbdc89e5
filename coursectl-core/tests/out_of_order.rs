//! Listing behaviour when fetches complete in a different order than issued.
//!
//! `GatedSource` parks every fetch until the test answers it, so each test
//! decides exactly when and in which order results arrive.

use std::sync::Arc;

use async_trait::async_trait;
use coursectl_core::{
    Cursor, DataSource, ErrorKind, FetchError, Page, PaginatedSearchList, Query, Transition,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type Reply = oneshot::Sender<Result<Page<String>, FetchError>>;

struct PendingFetch {
    query: Query,
    cursor: Option<Cursor>,
    reply: Reply,
}

impl PendingFetch {
    fn resolve(self, items: &[&str], next: Option<&str>) {
        let page = Page::new(
            items.iter().map(|s| s.to_string()).collect(),
            next.map(Cursor::from),
        );
        let _ = self.reply.send(Ok(page));
    }

    fn fail(self, err: FetchError) {
        let _ = self.reply.send(Err(err));
    }
}

struct GatedSource {
    requests: mpsc::UnboundedSender<PendingFetch>,
}

#[async_trait]
impl DataSource for GatedSource {
    type Item = String;

    async fn fetch_page(
        &self,
        query: &Query,
        cursor: Option<&Cursor>,
    ) -> Result<Page<String>, FetchError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(PendingFetch {
                query: query.clone(),
                cursor: cursor.cloned(),
                reply,
            })
            .expect("test dropped the request receiver");
        rx.await
            .unwrap_or_else(|_| Err(FetchError::transport("reply dropped")))
    }
}

type List = Arc<PaginatedSearchList<GatedSource>>;

fn gated_list() -> (List, mpsc::UnboundedReceiver<PendingFetch>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(PaginatedSearchList::new(GatedSource { requests: tx })), rx)
}

fn spawn_query(list: &List, query: Query) -> JoinHandle<Transition> {
    let list = Arc::clone(list);
    tokio::spawn(async move { list.set_query(query).await })
}

fn spawn_load_more(list: &List) -> JoinHandle<Transition> {
    let list = Arc::clone(list);
    tokio::spawn(async move { list.load_more().await })
}

async fn next_request(rx: &mut mpsc::UnboundedReceiver<PendingFetch>) -> PendingFetch {
    rx.recv().await.expect("a fetch was issued")
}

/// Load `items` with a continuation cursor so `load_more` is possible
async fn seed(list: &List, rx: &mut mpsc::UnboundedReceiver<PendingFetch>, items: &[&str]) {
    let handle = spawn_query(list, Query::new("seed"));
    next_request(rx).await.resolve(items, Some("c1"));
    assert_eq!(handle.await.unwrap(), Transition::Applied);
}

#[tokio::test]
async fn later_query_wins_when_earlier_resolves_last() {
    let (list, mut rx) = gated_list();

    let q1 = spawn_query(&list, Query::new("java"));
    let f1 = next_request(&mut rx).await;
    let q2 = spawn_query(&list, Query::new("python"));
    let f2 = next_request(&mut rx).await;
    assert_eq!(f1.query, Query::new("java"));
    assert_eq!(f2.query, Query::new("python"));

    f2.resolve(&["X"], None);
    assert_eq!(q2.await.unwrap(), Transition::Applied);

    f1.resolve(&["Y"], Some("c9"));
    assert_eq!(q1.await.unwrap(), Transition::Discarded);

    let state = list.snapshot();
    assert_eq!(state.items, vec!["X".to_string()]);
    assert_eq!(state.query, Query::new("python"));
    assert!(!state.has_more);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn earlier_query_resolving_first_is_still_dropped() {
    let (list, mut rx) = gated_list();

    let q1 = spawn_query(&list, Query::new("java"));
    let f1 = next_request(&mut rx).await;
    let q2 = spawn_query(&list, Query::new("python"));
    let f2 = next_request(&mut rx).await;

    f1.resolve(&["Y"], None);
    assert_eq!(q1.await.unwrap(), Transition::Discarded);

    // The newer query is still outstanding
    let state = list.snapshot();
    assert!(state.items.is_empty());
    assert!(state.is_loading);

    f2.resolve(&["X"], None);
    assert_eq!(q2.await.unwrap(), Transition::Applied);
    assert_eq!(list.snapshot().items, vec!["X".to_string()]);
}

#[tokio::test]
async fn only_last_of_many_interleaved_queries_is_applied() {
    let (list, mut rx) = gated_list();
    let terms = ["p", "py", "pyt", "pyth", "python"];

    let mut handles = Vec::new();
    let mut fetches = Vec::new();
    for term in terms {
        handles.push(spawn_query(&list, Query::new(term)));
        fetches.push(next_request(&mut rx).await);
    }

    // Resolve newest first, oldest last
    for fetch in fetches.into_iter().rev() {
        let term = fetch.query.search_term.clone();
        fetch.resolve(&[term.as_str()], None);
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }
    assert_eq!(outcomes.last(), Some(&Transition::Applied));
    assert!(outcomes[..outcomes.len() - 1]
        .iter()
        .all(|t| *t == Transition::Discarded));

    let state = list.snapshot();
    assert_eq!(state.items, vec!["python".to_string()]);
    assert_eq!(state.query, Query::new("python"));
}

#[tokio::test]
async fn rapid_load_more_issues_one_fetch() {
    let (list, mut rx) = gated_list();
    seed(&list, &mut rx, &["A", "B"]).await;

    let first = spawn_load_more(&list);
    let fetch = next_request(&mut rx).await;
    assert_eq!(fetch.cursor, Some(Cursor::new("c1")));
    assert_eq!(fetch.query, Query::new("seed"));

    // Second trigger while the first is in flight
    assert_eq!(list.load_more().await, Transition::Skipped);
    assert!(rx.try_recv().is_err());

    fetch.resolve(&["C"], None);
    assert_eq!(first.await.unwrap(), Transition::Applied);

    let state = list.snapshot();
    assert_eq!(state.items, vec!["A", "B", "C"]);
    assert!(!state.has_more);
}

#[tokio::test]
async fn load_more_is_refused_while_query_is_loading() {
    let (list, mut rx) = gated_list();
    seed(&list, &mut rx, &["A"]).await;

    let q = spawn_query(&list, Query::new("other"));
    let fetch = next_request(&mut rx).await;

    assert_eq!(list.load_more().await, Transition::Skipped);
    assert!(rx.try_recv().is_err());

    fetch.resolve(&["Z"], None);
    assert_eq!(q.await.unwrap(), Transition::Applied);
}

#[tokio::test]
async fn page_of_superseded_query_is_not_appended() {
    let (list, mut rx) = gated_list();
    seed(&list, &mut rx, &["A"]).await;

    let more = spawn_load_more(&list);
    let page_fetch = next_request(&mut rx).await;
    let q = spawn_query(&list, Query::new("fresh"));
    let query_fetch = next_request(&mut rx).await;

    page_fetch.resolve(&["B"], Some("c2"));
    assert_eq!(more.await.unwrap(), Transition::Discarded);
    assert_eq!(list.snapshot().items, vec!["A".to_string()]);

    query_fetch.resolve(&["Z"], None);
    assert_eq!(q.await.unwrap(), Transition::Applied);

    let state = list.snapshot();
    assert_eq!(state.items, vec!["Z".to_string()]);
    assert_eq!(state.cursor, None);
}

#[tokio::test]
async fn stale_failure_does_not_surface_an_error() {
    let (list, mut rx) = gated_list();

    let q1 = spawn_query(&list, Query::new("slow"));
    let f1 = next_request(&mut rx).await;
    let q2 = spawn_query(&list, Query::new("fast"));
    let f2 = next_request(&mut rx).await;

    f2.resolve(&["X"], None);
    assert_eq!(q2.await.unwrap(), Transition::Applied);
    f1.fail(FetchError::status(500, "boom"));
    assert_eq!(q1.await.unwrap(), Transition::Discarded);

    let state = list.snapshot();
    assert!(state.error.is_none());
    assert_eq!(state.items, vec!["X".to_string()]);
}

#[tokio::test]
async fn loading_flag_tracks_in_flight_fetch() {
    let (list, mut rx) = gated_list();
    let mut updates = list.subscribe();

    let q = spawn_query(&list, Query::new("rust"));
    let fetch = next_request(&mut rx).await;
    assert!(list.snapshot().is_loading);
    assert!(updates.borrow_and_update().is_loading);

    fetch.fail(FetchError::transport("timed out"));
    assert_eq!(q.await.unwrap(), Transition::Failed);

    let state = updates.borrow_and_update().clone();
    assert!(!state.is_loading);
    assert_eq!(state.error.map(|e| e.kind), Some(ErrorKind::Network));
}
