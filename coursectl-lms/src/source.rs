//! Catalog data source: feeds LMS pages of [`Course`] cards to the listing

use async_trait::async_trait;
use coursectl_core::{Cursor, DataSource, FetchError, Page, Query};
use tracing::debug;

use crate::client::LmsClient;
use crate::model::{Course, CourseDetail, ListDocument, Resource, LO_TYPES, LO_TYPES_FILTER};
use crate::skills::MAX_SKILLS_PER_COURSE;

/// Browses the LMS catalog.
///
/// A blank search term lists the catalog by name; anything else goes through
/// relevance search. The `loTypes` filter selects learning object types and
/// falls back to every type when empty.
pub struct CatalogSource {
    client: LmsClient,
}

impl CatalogSource {
    pub fn new(client: LmsClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &LmsClient {
        &self.client
    }

    /// Fetch one learning object with its modules and enrollment status
    pub async fn course(&self, id: &str) -> Result<CourseDetail, FetchError> {
        let doc = self.client.learning_object(id).await?;
        let course = self
            .cards(&[&doc.data])
            .await
            .pop()
            .ok_or_else(|| FetchError::decode("learning object", "empty document"))?;

        Ok(CourseDetail {
            course,
            enrolled: doc.is_enrolled(),
            modules: doc.modules(),
        })
    }

    async fn cards(&self, resources: &[&Resource]) -> Vec<Course> {
        let skill_ids: Vec<&str> = resources.iter().flat_map(|r| r.skill_ids()).collect();
        let names = self.client.skill_names(&skill_ids).await;

        resources
            .iter()
            .map(|resource| {
                let mut course = Course::from_resource(resource);
                course.skills = resource
                    .skill_ids()
                    .filter_map(|id| names.get(id).cloned())
                    .take(MAX_SKILLS_PER_COURSE)
                    .collect();
                course
            })
            .collect()
    }

    async fn into_page(&self, doc: ListDocument) -> Page<Course> {
        let resources = doc.learning_objects();
        let items = self.cards(&resources).await;
        debug!(
            items = items.len(),
            total = ?doc.meta.count,
            has_next = doc.links.next.is_some(),
            "Catalog page decoded"
        );
        Page::new(items, doc.next_cursor())
    }
}

/// Known learning object types selected by the query, or all of them
pub fn active_lo_types(query: &Query) -> Vec<String> {
    let selected: Vec<String> = query
        .filter(LO_TYPES_FILTER)
        .iter()
        .filter(|t| LO_TYPES.contains(&t.as_str()))
        .cloned()
        .collect();

    if selected.is_empty() {
        LO_TYPES.iter().map(|t| t.to_string()).collect()
    } else {
        selected
    }
}

#[async_trait]
impl DataSource for CatalogSource {
    type Item = Course;

    async fn fetch_page(
        &self,
        query: &Query,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Course>, FetchError> {
        let lo_types = active_lo_types(query);
        let doc = match query.term() {
            Some(term) => self.client.search(term, &lo_types, cursor).await?,
            None => self.client.list_learning_objects(&lo_types, cursor).await?,
        };
        Ok(self.into_page(doc).await)
    }
}
