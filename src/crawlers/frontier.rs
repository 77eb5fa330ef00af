use crate::filter::normalize_url_str;
use std::collections::HashSet;
use tokio::sync::{Mutex, mpsc};

/// How a queued page is expected to behave once fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLabel {
    /// A page enumerating recipe links and possibly a next page
    List,
    /// A single recipe page
    Recipe,
}

/// One unit of crawl work, consumed exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: String,
    pub label: PageLabel,
    pub page_number: u32,
}

impl CrawlTask {
    pub fn list(url: &str, page_number: u32) -> Self {
        Self {
            url: url.to_string(),
            label: PageLabel::List,
            page_number,
        }
    }

    pub fn recipe(url: &str, page_number: u32) -> Self {
        Self {
            url: url.to_string(),
            label: PageLabel::Recipe,
            page_number,
        }
    }
}

/// What a listing page added to the frontier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingAdmission {
    /// Recipe tasks newly queued
    pub recipes: usize,
    /// The next listing page, when one was queued
    pub next_page: Option<String>,
}

struct FrontierState {
    seen: HashSet<String>,
    emitted: usize,
    pending: usize,
    queue: Option<mpsc::UnboundedSender<CrawlTask>>,
}

impl FrontierState {
    /// Queue a task unless its normalized URL was seen before or the run is over
    fn enqueue(&mut self, mut task: CrawlTask) -> bool {
        task.url = normalize_url_str(&task.url);
        if !self.seen.insert(task.url.clone()) {
            ::log::debug!("Skipping already queued URL: {}", task.url);
            return false;
        }

        let Some(queue) = &self.queue else {
            return false;
        };
        if queue.send(task).is_err() {
            return false;
        }
        self.pending += 1;
        true
    }

    fn close_if_idle(&mut self) {
        if self.pending == 0 && self.queue.take().is_some() {
            ::log::debug!("Frontier drained, closing task queue");
        }
    }

    fn quota_reached(&self, max_records: Option<usize>) -> bool {
        max_records.is_some_and(|max| self.emitted >= max)
    }
}

/// The crawl frontier and cap controller.
///
/// Every mutation of the seen set, the emitted counter and the pending count
/// happens under one lock, so concurrent workers never overshoot the quota.
/// The task queue closes as soon as no task is pending, which ends the run.
pub struct Frontier {
    max_records: Option<usize>,
    max_list_pages: u32,
    state: Mutex<FrontierState>,
}

impl Frontier {
    /// Create a frontier and the receiving end of its task queue
    pub fn new(
        max_records: Option<usize>,
        max_list_pages: u32,
    ) -> (Self, mpsc::UnboundedReceiver<CrawlTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let frontier = Self {
            max_records,
            max_list_pages: max_list_pages.max(1),
            state: Mutex::new(FrontierState {
                seen: HashSet::new(),
                emitted: 0,
                pending: 0,
                queue: Some(tx),
            }),
        };
        (frontier, rx)
    }

    /// Queue the seed URLs as first listing pages; returns how many were queued
    pub async fn seed(&self, urls: &[String]) -> usize {
        let mut state = self.state.lock().await;
        let queued = urls
            .iter()
            .filter(|url| state.enqueue(CrawlTask::list(url, 1)))
            .count();
        state.close_if_idle();
        queued
    }

    pub async fn quota_reached(&self) -> bool {
        self.state.lock().await.quota_reached(self.max_records)
    }

    /// Number of records emitted so far
    pub async fn emitted(&self) -> usize {
        self.state.lock().await.emitted
    }

    pub fn max_records(&self) -> Option<usize> {
        self.max_records
    }

    /// Admit the links found on a listing page.
    ///
    /// Recipe links are queued up to the remaining quota. The next page is
    /// queued only while quota and depth remain and the page yielded at least
    /// one recipe link.
    pub async fn admit_listing(
        &self,
        task: &CrawlTask,
        recipe_links: &[String],
        next_page: Option<&str>,
    ) -> ListingAdmission {
        let mut state = self.state.lock().await;
        let mut admission = ListingAdmission {
            recipes: Self::admit_recipes(&mut state, self.max_records, task, recipe_links),
            next_page: None,
        };

        let depth_left = task.page_number < self.max_list_pages;
        if let Some(next) = next_page {
            if !recipe_links.is_empty() && depth_left && !state.quota_reached(self.max_records) {
                if state.enqueue(CrawlTask::list(next, task.page_number + 1)) {
                    admission.next_page = Some(next.to_string());
                }
            } else if !depth_left {
                ::log::debug!(
                    "Depth cap of {} pages reached at {}",
                    self.max_list_pages,
                    task.url
                );
            }
        }
        admission
    }

    /// Admit links found on a page that turned out not to be a recipe.
    /// Such a page is handled as a listing for its links only; no next page is
    /// queued from it.
    pub async fn admit_reclassified(&self, task: &CrawlTask, recipe_links: &[String]) -> usize {
        let mut state = self.state.lock().await;
        Self::admit_recipes(&mut state, self.max_records, task, recipe_links)
    }

    fn admit_recipes(
        state: &mut FrontierState,
        max_records: Option<usize>,
        task: &CrawlTask,
        recipe_links: &[String],
    ) -> usize {
        let remaining = max_records.map_or(usize::MAX, |max| max.saturating_sub(state.emitted));
        let mut queued = 0;
        for link in recipe_links {
            if queued >= remaining {
                break;
            }
            if state.enqueue(CrawlTask::recipe(link, task.page_number)) {
                queued += 1;
            }
        }
        queued
    }

    /// Reserve a slot for one record; returns the new emitted count, or
    /// `None` when the quota is already used up
    pub async fn claim_record(&self) -> Option<usize> {
        let mut state = self.state.lock().await;
        if state.quota_reached(self.max_records) {
            return None;
        }
        state.emitted += 1;
        Some(state.emitted)
    }

    /// Mark a dequeued task as finished
    pub async fn complete(&self) {
        let mut state = self.state.lock().await;
        state.pending = state.pending.saturating_sub(1);
        state.close_if_idle();
    }
}
