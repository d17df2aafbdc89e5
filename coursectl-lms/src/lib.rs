//! coursectl-lms - LMS catalog client and data source
//!
//! This crate provides:
//! - JSON:API document models for learning objects and search hits
//! - A REST client for the catalog, search and skill endpoints
//! - `CatalogSource`, the [`coursectl_core::DataSource`] behind `coursectl browse`
//!
//! ## Architecture
//!
//! ```text
//! Query { search_term, loTypes } → CatalogSource → LmsClient ─┬→ /learningObjects (blank term)
//!                                       ↓                     └→ /search          (otherwise)
//!                                 Page<Course> ← skill names (LRU, /skills/{id})
//! ```

pub mod client;
pub mod model;
pub mod skills;
pub mod source;

pub use client::LmsClient;
pub use model::{
    Course, CourseDetail, ListDocument, Module, Resource, SingleDocument, LO_TYPES, LO_TYPES_FILTER,
};
pub use skills::{SkillCache, MAX_SKILLS_PER_COURSE};
pub use source::{active_lo_types, CatalogSource};
