//! Spider contract and registry
//!
//! A spider turns one downloaded page into items, per-page parse issues and
//! a pagination outcome. It never touches the log store itself; the
//! coordinator routes everything it returns.

use crate::classify::ParseFailure;
use crate::config::{Config, SpiderConfig};
use crate::crawler::parser::ListingSpider;
use crate::SentinelError;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// A downloaded page handed to a spider
#[derive(Debug, Clone)]
pub struct Page {
    /// The requested URL (never the proxy URL)
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// One scraped item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Page the item was scraped from
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

/// What a page says about the next page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    /// An absolute URL for the next page
    Next(String),

    /// The next control is present but disabled: the listing is done
    Exhausted,

    /// The page has no next control
    Absent { expected: bool },

    /// The next control is present but no link could be taken from it
    Failed(String),
}

/// Everything a spider extracted from one page
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub items: Vec<Item>,
    /// Recoverable per-page problems, each logged once
    pub issues: Vec<ParseFailure>,
    pub pagination: Pagination,
}

/// Unrecoverable failure to parse a page
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unsupported content type: {0}")]
    ContentType(String),

    #[error("{0}")]
    Malformed(String),
}

/// A crawl job's page-level logic
pub trait Spider {
    fn name(&self) -> &str;

    /// URLs crawled when the caller supplies none
    fn start_urls(&self) -> Vec<String>;

    fn parse(&mut self, page: &Page) -> Result<ParseOutput, ParseError>;
}

/// Spiders available by name
#[derive(Debug, Clone)]
pub struct SpiderRegistry {
    spiders: Vec<SpiderConfig>,
}

impl SpiderRegistry {
    pub fn from_config(config: &Config) -> Self {
        Self {
            spiders: config.spiders.clone(),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.spiders.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.spiders.iter().any(|s| s.name == name)
    }

    /// Builds the named spider
    ///
    /// # Returns
    ///
    /// * `Ok(Box<dyn Spider>)` - The spider, with its selectors compiled
    /// * `Err(SentinelError::SpiderNotFound)` - No spider has that name
    pub fn create(&self, name: &str) -> Result<Box<dyn Spider>, SentinelError> {
        let config = self
            .spiders
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| SentinelError::SpiderNotFound(name.to_string()))?;

        Ok(Box::new(ListingSpider::new(config)?))
    }
}
