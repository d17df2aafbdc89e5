//! coursectl-core - paginated search listing for course catalogs
//!
//! - `query`: `Query`, `Cursor` and `Page` value types
//! - `source`: the `DataSource` trait a backend implements
//! - `list`: `PaginatedSearchList`, the epoch-guarded listing state machine
//! - `debounce`: trailing-edge debouncer for raw text input
//! - `config`: ~/.coursectl/config.toml loading

pub mod config;
pub mod debounce;
pub mod error;
pub mod list;
pub mod query;
pub mod source;

pub use config::CourseConfig;
pub use debounce::{debounce, Debounced, Debouncer, DEFAULT_DEBOUNCE};
pub use error::{ErrorKind, FetchError, ListError};
pub use list::{ListState, PaginatedSearchList, Transition};
pub use query::{Cursor, Page, Query};
pub use source::DataSource;
