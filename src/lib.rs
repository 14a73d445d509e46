//! Statistics for CEE Spring contest submissions on Latvian Wikipedia.
//!
//! The extraction core works on raw wikitext:
//! - [`wikitext`] finds template invocations and strips them,
//! - [`submission`] maps the contest template onto a [`SubmissionRecord`],
//! - [`readable`] measures the prose left after removing markup,
//! - [`suggested`] harvests Wikidata ids from Meta-Wiki structure pages.
//!
//! The remaining modules assemble article records from an offline page
//! bundle, validate them and render the wikitext reports.

pub mod article;
pub mod bundle;
pub mod config;
pub mod error;
pub mod parallel;
pub mod pipeline;
pub mod readable;
pub mod report;
pub mod submission;
pub mod suggested;
pub mod validate;
pub mod wikitext;

pub use article::{ArticleRecord, PageInfo};
pub use config::{ContestConfig, FieldNames};
pub use error::{Error, Result};
pub use readable::{readable_length, readable_text};
pub use submission::{normalize, normalize_topic, SubmissionRecord};
pub use suggested::{harvest, IdentifierHarvester, SuggestedIndex};
pub use validate::{validate_articles, ValidationOutcome};
pub use wikitext::{find_template, strip_templates, TemplateInvocation, TemplateParam};
