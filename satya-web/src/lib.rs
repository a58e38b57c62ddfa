//! Getting text in and evidence out.
//!
//! - Source resolution for URLs, local files and pasted text (`source`)
//! - Google Custom Search client for related coverage (`search`)
//! - Lightweight HTML paragraph extraction (`extract`)

pub mod extract;
pub mod search;
pub mod source;

pub use search::{GoogleSearchClient, NewsItem, RELATED_NEWS_LIMIT};
pub use source::{Source, resolve_source};
