//! Cursor-based pagination.
//!
//! # Data Flow
//! ```text
//! fetch page (client executor)
//!     → link.rs (find rel="next" in the Link header)
//!     → PageCursor::advance (cycle check, page cap)
//!     → next URL, or done
//! ```
//!
//! # Design Decisions
//! - A repeated URL fails fast instead of looping forever
//! - Hitting the page cap with a `next` link still present is an error,
//!   never a silently truncated result
//! - The cursor is sans-IO so the blocking and async clients share it

pub mod link;

use std::collections::HashSet;

use url::Url;

use crate::client::error::ClientError;
use crate::client::transport::Response;
use crate::observability::metrics;

pub use link::{next_link, parse_next_link};

/// Pagination state for one paginated call.
#[derive(Debug)]
pub struct PageCursor {
    max_pages: u32,
    pages: u32,
    visited: HashSet<Url>,
}

impl PageCursor {
    /// Start at `start`, allowing at most `max_pages` fetches.
    pub fn new(start: &str, max_pages: u32) -> Result<Self, ClientError> {
        if max_pages < 1 {
            return Err(ClientError::invalid(format!(
                "max_pages must be >= 1, got {max_pages}"
            )));
        }

        let mut visited = HashSet::new();
        if let Ok(url) = Url::parse(start) {
            visited.insert(url);
        }

        Ok(Self {
            max_pages,
            pages: 0,
            visited,
        })
    }

    /// Pages fetched so far.
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Record a fetched page and pick the next URL, if any.
    pub fn advance(&mut self, response: &Response) -> Result<Option<Url>, ClientError> {
        self.pages += 1;
        metrics::record_page();

        let Some(next) = parse_next_link(response) else {
            tracing::debug!(pages = self.pages, "Pagination complete");
            return Ok(None);
        };

        if !self.visited.insert(next.clone()) {
            tracing::warn!(url = %next, pages = self.pages, "Pagination cycle detected");
            return Err(ClientError::PaginationCycle {
                url: next.to_string(),
            });
        }

        if self.pages >= self.max_pages {
            tracing::warn!(max_pages = self.max_pages, next = %next, "Pagination limit reached");
            return Err(ClientError::PaginationLimitExceeded {
                max_pages: self.max_pages,
                next_url: next.to_string(),
            });
        }

        tracing::debug!(next = %next, pages = self.pages, "Following next link");
        Ok(Some(next))
    }
}
