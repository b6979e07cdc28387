//! Frontier of pending requests
//!
//! This module handles:
//! - FIFO ordering of requests (seeds first, then follow-ups as found)
//! - Dropping requests for URLs already seen in this run
//! - The per-run `max-pages` request limit

use std::collections::{HashSet, VecDeque};
use std::fmt;
use url::Url;

/// Where a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A start URL of the run
    Seed,

    /// A request derived from a parsed page (pagination)
    FollowUp,
}

/// A URL queued for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Unique within one run
    pub id: u64,
    pub url: String,
    pub kind: RequestKind,
}

/// Why the frontier refused a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Duplicate,
    LimitReached,
    InvalidUrl(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate"),
            Self::LimitReached => write!(f, "page limit reached"),
            Self::InvalidUrl(e) => write!(f, "invalid url: {}", e),
        }
    }
}

/// Pending requests of one run
pub struct Frontier {
    queue: VecDeque<CrawlRequest>,
    seen: HashSet<String>,
    next_id: u64,
    max_pages: u32,
}

impl Frontier {
    /// Creates an empty frontier accepting at most `max_pages` requests
    pub fn new(max_pages: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            next_id: 0,
            max_pages,
        }
    }

    /// Queues a request for `url`
    ///
    /// URLs are compared without their fragment.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlRequest)` - The queued request
    /// * `Err(DropReason)` - The request was not queued
    pub fn push(&mut self, url: &str, kind: RequestKind) -> Result<CrawlRequest, DropReason> {
        let mut parsed = Url::parse(url.trim()).map_err(|e| DropReason::InvalidUrl(e.to_string()))?;
        parsed.set_fragment(None);
        let key = parsed.to_string();

        if self.seen.contains(&key) {
            return Err(DropReason::Duplicate);
        }

        if self.next_id >= u64::from(self.max_pages) {
            return Err(DropReason::LimitReached);
        }

        self.seen.insert(key.clone());
        self.next_id += 1;

        let request = CrawlRequest {
            id: self.next_id,
            url: key,
            kind,
        };
        self.queue.push_back(request.clone());
        Ok(request)
    }

    /// Takes the next request to fetch
    pub fn pop(&mut self) -> Option<CrawlRequest> {
        self.queue.pop_front()
    }

    /// Discards every pending request
    pub fn clear(&mut self) -> usize {
        let pending = self.queue.len();
        self.queue.clear();
        pending
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of requests accepted so far
    pub fn issued(&self) -> u64 {
        self.next_id
    }
}
