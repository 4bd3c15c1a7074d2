//! Lazy candidate sequence production
//!
//! Candidates reach the allocator through one pull-based iterator: first
//! the caller's priority outputs, then value-sorted pages read from a
//! [`UtxoSource`]. A page is only requested when the allocator asks for a
//! candidate and the previous page has been consumed, so a funding attempt
//! that succeeds early never triggers further reads.

use crate::error::FundingError;
use crate::utxo_selection::types::{Candidate, PriorityOutput};
use crate::utxo_source::{CandidateQuery, Page, SourceError, UtxoSource};
use serde_json::json;
use std::collections::HashSet;
use utxofund_common::config::DEFAULT_PAGE_SIZE;
use utxofund_common::logging::{self, LogLevel};
use utxofund_common::types::OutputId;

/// Converts priority outputs into candidates, skipping forbidden ones
pub fn priority_candidates<'a>(
    outputs: &'a [PriorityOutput],
    forbidden: &'a HashSet<OutputId>,
) -> impl Iterator<Item = Candidate> + 'a {
    outputs
        .iter()
        .filter(move |output| !forbidden.contains(&output.output_id))
        .map(Candidate::from)
}

/// Candidates read page by page from a source
///
/// Reading continues while pages come back full. The first short page, or
/// the first failed read, ends the sequence.
pub struct PagedCandidates<'a, S: ?Sized> {
    source: &'a S,
    query: CandidateQuery<'a>,
    next_page: Page,
    buffer: std::vec::IntoIter<Candidate>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a, S: UtxoSource + ?Sized> PagedCandidates<'a, S> {
    /// Create a paged reader; a zero page size is raised to 1
    pub fn new(source: &'a S, query: CandidateQuery<'a>, page_size: usize) -> Self {
        Self {
            source,
            query,
            next_page: Page::first(page_size.max(1)),
            buffer: Vec::new().into_iter(),
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Number of pages requested from the source so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn fetch_next_page(&mut self) -> Result<(), SourceError> {
        let page = self.next_page;
        let candidates = self.source.find_candidates(&self.query, page)?;
        self.pages_fetched += 1;

        logging::log_storage(
            LogLevel::Debug,
            "candidate_page_fetched",
            Some(json!({
                "basket": self.query.basket,
                "offset": page.offset,
                "limit": page.limit,
                "returned": candidates.len(),
            })),
        );

        if candidates.len() < page.limit {
            self.exhausted = true;
        }
        self.next_page = page.next();
        self.buffer = candidates.into_iter();
        Ok(())
    }
}

impl<'a, S: UtxoSource + ?Sized> Iterator for PagedCandidates<'a, S> {
    type Item = Result<Candidate, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(candidate) = self.buffer.next() {
                return Some(Ok(candidate));
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_next_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
    }
}

/// Priority candidates followed by paged candidates from a source
///
/// Nothing is yielded twice, and sourced candidates that name a forbidden
/// output are dropped even if the source failed to filter them.
pub struct CandidateSequence<'a, S: ?Sized> {
    priority: Box<dyn Iterator<Item = Candidate> + 'a>,
    sourced: PagedCandidates<'a, S>,
    forbidden: &'a HashSet<OutputId>,
    yielded: HashSet<OutputId>,
}

impl<'a, S: UtxoSource + ?Sized> CandidateSequence<'a, S> {
    /// Create a sequence with the default page size
    pub fn new(
        priority_outputs: &'a [PriorityOutput],
        source: &'a S,
        query: CandidateQuery<'a>,
    ) -> Self {
        Self::with_page_size(priority_outputs, source, query, DEFAULT_PAGE_SIZE)
    }

    /// Create a sequence reading `page_size` candidates per page
    pub fn with_page_size(
        priority_outputs: &'a [PriorityOutput],
        source: &'a S,
        query: CandidateQuery<'a>,
        page_size: usize,
    ) -> Self {
        Self {
            priority: Box::new(priority_candidates(priority_outputs, query.forbidden)),
            forbidden: query.forbidden,
            sourced: PagedCandidates::new(source, query, page_size),
            yielded: HashSet::new(),
        }
    }

    /// Number of pages requested from the source so far
    pub fn pages_fetched(&self) -> usize {
        self.sourced.pages_fetched()
    }

    fn next_priority(&mut self) -> Option<Candidate> {
        for candidate in self.priority.by_ref() {
            if self.yielded.insert(candidate.output_id) {
                return Some(candidate);
            }
        }
        None
    }
}

impl<'a, S: UtxoSource + ?Sized> Iterator for CandidateSequence<'a, S> {
    type Item = Result<Candidate, FundingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(candidate) = self.next_priority() {
            return Some(Ok(candidate));
        }

        loop {
            let candidate = match self.sourced.next()? {
                Ok(candidate) => candidate,
                Err(e) => return Some(Err(e.into())),
            };

            if self.forbidden.contains(&candidate.output_id) {
                log::warn!(
                    "UTXO source returned forbidden {}; skipping it",
                    candidate.output_id
                );
                continue;
            }
            if !self.yielded.insert(candidate.output_id) {
                log::debug!("Skipping {} already taken from priority outputs", candidate.output_id);
                continue;
            }

            return Some(Ok(candidate));
        }
    }
}
