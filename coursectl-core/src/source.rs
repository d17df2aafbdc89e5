//! Data source abstraction consumed by the listing component

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::query::{Cursor, Page, Query};

/// Fetches one page of results for a query.
///
/// Implementations own the request shape (URL, headers, auth). A `cursor` of
/// `None` asks for the first page.
#[async_trait]
pub trait DataSource: Send + Sync {
    type Item: Clone + Send + Sync + 'static;

    async fn fetch_page(
        &self,
        query: &Query,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Self::Item>, FetchError>;
}

#[async_trait]
impl<S: DataSource + ?Sized> DataSource for Arc<S> {
    type Item = S::Item;

    async fn fetch_page(
        &self,
        query: &Query,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Self::Item>, FetchError> {
        (**self).fetch_page(query, cursor).await
    }
}
