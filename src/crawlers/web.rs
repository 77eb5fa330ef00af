use crate::config::{ConfigError, RunConfig};
use crate::crawlers::classifier::{PageClassifier, PageOutcome};
use crate::crawlers::fetcher::{FetchError, Fetcher};
use crate::crawlers::frontier::{CrawlTask, Frontier, PageLabel};
use crate::filter::UrlFilter;
use crate::results::RecipeRecord;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::timeout;

/// Everything a worker needs, shared across the pool
struct CrawlContext {
    fetcher: Arc<dyn Fetcher>,
    frontier: Frontier,
    classifier: PageClassifier,
    request_timeout: Duration,
}

type TaskReceiver = Arc<Mutex<mpsc::UnboundedReceiver<CrawlTask>>>;

/// Starts a recipe crawl and returns a receiver that yields records as they are scraped.
///
/// The receiver closes once every queued task has been processed.
///
/// # Arguments
///
/// * `config` - Run configuration
/// * `fetcher` - Turns URLs into page bodies
pub async fn start(
    config: &RunConfig,
    fetcher: Arc<dyn Fetcher>,
) -> Result<mpsc::Receiver<RecipeRecord>, ConfigError> {
    let seeds = config.seed_urls()?;
    let url_filter = UrlFilter::new(config.filter.clone())?;
    ::log::info!("Starting recipe crawl from {} seed page(s)", seeds.len());

    let (frontier, task_rx) = Frontier::new(config.max_records(), config.max_list_pages());
    let queued = frontier.seed(&seeds).await;
    ::log::debug!("Queued {} seed page(s)", queued);

    let context = Arc::new(CrawlContext {
        fetcher,
        frontier,
        classifier: PageClassifier::new(
            url_filter,
            config.selectors.clone(),
            config.always_advance,
        ),
        request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
    });

    let (result_tx, result_rx) = mpsc::channel::<RecipeRecord>(10000);
    spawn_workers(
        config.max_concurrency.max(1),
        context,
        Arc::new(Mutex::new(task_rx)),
        result_tx,
    );

    Ok(result_rx)
}

/// Spawns the worker pool plus a task that waits for it to finish
fn spawn_workers(
    num_workers: usize,
    context: Arc<CrawlContext>,
    task_rx: TaskReceiver,
    result_tx: mpsc::Sender<RecipeRecord>,
) {
    let (completion_tx, mut completion_rx) = mpsc::channel::<()>(num_workers);

    for i in 0..num_workers {
        spawn_worker(
            i,
            Arc::clone(&context),
            Arc::clone(&task_rx),
            result_tx.clone(),
            completion_tx.clone(),
        );
    }

    // Each worker holds its own copy
    drop(completion_tx);

    tokio::spawn(async move {
        let mut completed_workers = 0;
        while completion_rx.recv().await.is_some() {
            completed_workers += 1;
            ::log::debug!(
                "Worker completed. {} of {} workers done.",
                completed_workers,
                num_workers
            );
        }

        ::log::info!(
            "All {} workers have completed, {} recipe(s) emitted",
            num_workers,
            context.frontier.emitted().await
        );
        context.fetcher.close().await;

        // Closing the result channel only now lets consumers wait for fetcher cleanup
        drop(result_tx);
    });
}

/// Spawns a single worker that processes tasks until the frontier closes
fn spawn_worker(
    worker_id: usize,
    context: Arc<CrawlContext>,
    task_rx: TaskReceiver,
    result_tx: mpsc::Sender<RecipeRecord>,
    completion_tx: mpsc::Sender<()>,
) {
    ::log::trace!("Spawning worker {}", worker_id);

    tokio::spawn(async move {
        worker_processing_loop(worker_id, &context, &task_rx, &result_tx).await;

        if let Err(e) = completion_tx.send(()).await {
            ::log::error!(
                "Worker {} failed to send completion signal: {}",
                worker_id,
                e
            );
        }
    });
}

async fn worker_processing_loop(
    worker_id: usize,
    context: &CrawlContext,
    task_rx: &TaskReceiver,
    result_tx: &mpsc::Sender<RecipeRecord>,
) {
    ::log::debug!("Worker {} starting processing loop", worker_id);

    while let Some(task) = next_task(worker_id, task_rx).await {
        process_task(worker_id, context, &task, result_tx).await;
        context.frontier.complete().await;
    }

    ::log::debug!("Worker {} completed processing loop", worker_id);
}

/// Gets the next task; `None` once the frontier has closed the queue
async fn next_task(worker_id: usize, task_rx: &TaskReceiver) -> Option<CrawlTask> {
    let task = task_rx.lock().await.recv().await;
    match &task {
        Some(task) => ::log::trace!("Worker {} processing: {}", worker_id, task.url),
        None => ::log::debug!("Worker {} found the task queue closed", worker_id),
    }
    task
}

async fn process_task(
    worker_id: usize,
    context: &CrawlContext,
    task: &CrawlTask,
    result_tx: &mpsc::Sender<RecipeRecord>,
) {
    if task.label == PageLabel::Recipe && context.frontier.quota_reached().await {
        ::log::debug!("Quota reached, skipping {}", task.url);
        return;
    }

    let body = match fetch(context, &task.url).await {
        Ok(body) => body,
        Err(e) => {
            ::log::warn!("Worker {} failed to fetch {}: {}", worker_id, task.url, e);
            return;
        }
    };

    match context.classifier.classify(task, &body) {
        PageOutcome::Listing {
            recipe_links,
            next_page,
        } => {
            let admission = context
                .frontier
                .admit_listing(task, &recipe_links, next_page.as_deref())
                .await;
            ::log::info!(
                "LIST page {} -> found {} recipe links, queued {}",
                task.page_number,
                recipe_links.len(),
                admission.recipes
            );
            if let Some(next) = admission.next_page {
                ::log::info!("Queued LIST page {}: {}", task.page_number + 1, next);
            }
        }
        PageOutcome::Reclassified { recipe_links } => {
            // Reclassified pages feed recipe links only and never extend pagination
            let queued = context
                .frontier
                .admit_reclassified(task, &recipe_links)
                .await;
            ::log::info!(
                "Reclassified {} -> queued {} of {} recipe links",
                task.url,
                queued,
                recipe_links.len()
            );
        }
        PageOutcome::Recipe(fields) => {
            let Some(count) = context.frontier.claim_record().await else {
                ::log::debug!("Quota reached before {} could be emitted", task.url);
                return;
            };

            let record = RecipeRecord::new(fields, task.url.clone(), Utc::now());
            ::log::info!(
                "Scraped recipe: {} ({})",
                record.name.as_deref().unwrap_or("unnamed"),
                progress(count, context.frontier.max_records())
            );
            if let Err(e) = result_tx.send(record).await {
                ::log::error!("Worker {} failed to send result: {}", worker_id, e);
            }
        }
    }
}

/// Fetch a page, bounded by the fetcher's own budget or else the per-task timeout
async fn fetch(context: &CrawlContext, url: &str) -> Result<String, FetchError> {
    let limit = context
        .fetcher
        .fetch_budget()
        .unwrap_or(context.request_timeout);
    match timeout(limit, context.fetcher.fetch(url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(url.to_string())),
    }
}

fn progress(count: usize, max_records: Option<usize>) -> String {
    match max_records {
        Some(max) => format!("{}/{}", count, max),
        None => count.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StartUrl;
    use crate::crawlers::fetcher::testing::StaticFetcher;
    use async_trait::async_trait;
    use tokio::sync::Barrier;

    const SEARCH: &str = "https://www.allrecipes.com/search?q=chicken";

    fn listing(ids: std::ops::RangeInclusive<usize>) -> String {
        let anchors: String = ids
            .map(|i| format!(r#"<a href="/recipe/{}/dish-{}/">Dish {}</a>"#, i, i, i))
            .collect();
        format!("<html><body>{}</body></html>", anchors)
    }

    fn recipe_url(i: usize) -> String {
        format!("https://www.allrecipes.com/recipe/{}/dish-{}/", i, i)
    }

    fn recipe_page(name: &str) -> String {
        format!(
            r#"<html><head><script type="application/ld+json">
                {{"@type":"Recipe","name":"{}","recipeIngredient":["1 egg"]}}
            </script></head><body></body></html>"#,
            name
        )
    }

    fn config(results_wanted: Option<usize>, max_pages: u32) -> RunConfig {
        RunConfig {
            start_urls: vec![StartUrl::Plain(SEARCH.to_string())],
            results_wanted,
            max_pages,
            max_concurrency: 3,
            ..RunConfig::default()
        }
    }

    /// Holds every recipe fetch until two are in flight at once
    struct GatedFetcher {
        inner: StaticFetcher,
        gate: Barrier,
    }

    #[async_trait]
    impl Fetcher for GatedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            if url.contains("/recipe/") {
                self.gate.wait().await;
            }
            self.inner.fetch(url).await
        }
    }

    /// Answers its first request late but reports a budget that covers it
    struct SlowStartFetcher {
        inner: StaticFetcher,
        delayed: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl Fetcher for SlowStartFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            if !self.delayed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(1500)).await;
            }
            self.inner.fetch(url).await
        }

        fn fetch_budget(&self) -> Option<Duration> {
            Some(Duration::from_secs(5))
        }
    }

    async fn collect(mut rx: mpsc::Receiver<RecipeRecord>) -> Vec<RecipeRecord> {
        let mut records = Vec::new();
        while let Some(record) = rx.recv().await {
            records.push(record);
        }
        records
    }

    #[tokio::test]
    async fn test_quota_caps_emitted_records() {
        let mut fetcher = StaticFetcher::default().with_page(SEARCH, &listing(1..=10));
        for i in 1..=10 {
            fetcher = fetcher.with_page(&recipe_url(i), &recipe_page(&format!("Dish {}", i)));
        }

        let rx = start(&config(Some(3), 10), Arc::new(fetcher)).await.unwrap();
        let records = collect(rx).await;

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.ingredients == vec!["1 egg"]));
        let mut urls: Vec<&str> = records.iter().map(|r| r.source_url.as_str()).collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_failures_are_not_fatal() {
        let fetcher = StaticFetcher::default()
            .with_page(SEARCH, &listing(1..=2))
            .with_page(&recipe_url(1), &recipe_page("Only one"));

        let rx = start(&config(None, 1), Arc::new(fetcher)).await.unwrap();
        let records = collect(rx).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("Only one"));
        assert_eq!(records[0].source_url, recipe_url(1));
    }

    #[tokio::test]
    async fn test_pagination_stops_at_depth_cap() {
        let page_two = format!("{}&page=2", SEARCH);
        let fetcher = Arc::new(
            StaticFetcher::default()
                .with_page(SEARCH, &listing(1..=1))
                .with_page(&page_two, &listing(2..=2))
                .with_page(&recipe_url(1), &recipe_page("First"))
                .with_page(&recipe_url(2), &recipe_page("Second")),
        );

        let shared: Arc<dyn Fetcher> = fetcher.clone();
        let rx = start(&config(None, 2), shared).await.unwrap();
        let records = collect(rx).await;

        assert_eq!(records.len(), 2);
        let requested = fetcher.requested();
        assert!(requested.contains(&page_two));
        assert!(!requested.iter().any(|url| url.contains("page=3")));
    }

    #[tokio::test]
    async fn test_queued_recipes_past_quota_are_never_fetched() {
        let soup = "https://www.allrecipes.com/search?q=soup";
        let mut fetcher = StaticFetcher::default()
            .with_page(SEARCH, &listing(1..=3))
            .with_page(soup, &listing(4..=6));
        for i in 1..=6 {
            fetcher = fetcher.with_page(&recipe_url(i), &recipe_page(&format!("Dish {}", i)));
        }
        let fetcher = Arc::new(fetcher);

        // One worker drains the queue in order: both listings queue three
        // recipes each before any record is emitted
        let mut config = config(Some(3), 1);
        config.start_urls.push(StartUrl::Plain(soup.to_string()));
        config.max_concurrency = 1;

        let shared: Arc<dyn Fetcher> = fetcher.clone();
        let records = collect(start(&config, shared).await.unwrap()).await;

        assert_eq!(records.len(), 3);
        let requested = fetcher.requested();
        for i in 1..=3 {
            assert!(requested.contains(&recipe_url(i)));
        }
        for i in 4..=6 {
            assert!(!requested.contains(&recipe_url(i)), "fetched {}", recipe_url(i));
        }
    }

    #[tokio::test]
    async fn test_recipe_fetched_past_quota_is_dropped() {
        let soup = "https://www.allrecipes.com/search?q=soup";
        let fetcher = Arc::new(GatedFetcher {
            inner: StaticFetcher::default()
                .with_page(SEARCH, &listing(1..=1))
                .with_page(soup, &listing(2..=2))
                .with_page(&recipe_url(1), &recipe_page("One"))
                .with_page(&recipe_url(2), &recipe_page("Two")),
            gate: Barrier::new(2),
        });

        // Both recipe tasks pass the quota check before either is emitted
        let mut config = config(Some(1), 1);
        config.start_urls.push(StartUrl::Plain(soup.to_string()));
        config.max_concurrency = 2;

        let shared: Arc<dyn Fetcher> = fetcher.clone();
        let records = collect(start(&config, shared).await.unwrap()).await;

        assert_eq!(records.len(), 1);
        let requested = fetcher.inner.requested();
        assert!(requested.contains(&recipe_url(1)));
        assert!(requested.contains(&recipe_url(2)));
    }

    #[tokio::test]
    async fn test_recipe_titled_next_does_not_end_pagination() {
        let nachos = "https://www.allrecipes.com/search?q=nachos";
        let page_two = format!("{}&page=2", nachos);
        let fetcher = Arc::new(
            StaticFetcher::default()
                .with_page(
                    nachos,
                    r#"<a href="/recipe/1/next-level-nachos/">Next-Level Nachos</a>"#,
                )
                .with_page(&page_two, &listing(2..=2))
                .with_page(
                    "https://www.allrecipes.com/recipe/1/next-level-nachos/",
                    &recipe_page("Next-Level Nachos"),
                )
                .with_page(&recipe_url(2), &recipe_page("Second")),
        );

        let mut config = config(None, 2);
        config.start_urls = vec![StartUrl::Plain(nachos.to_string())];

        let shared: Arc<dyn Fetcher> = fetcher.clone();
        let records = collect(start(&config, shared).await.unwrap()).await;

        assert_eq!(records.len(), 2);
        assert!(fetcher.requested().contains(&page_two));
    }

    #[tokio::test]
    async fn test_fetch_budget_outlasts_request_timeout() {
        let fetcher = SlowStartFetcher {
            inner: StaticFetcher::default()
                .with_page(SEARCH, &listing(1..=1))
                .with_page(&recipe_url(1), &recipe_page("Slow")),
            delayed: std::sync::atomic::AtomicBool::new(false),
        };

        let mut config = config(None, 1);
        config.request_timeout_secs = 1;

        let records = collect(start(&config, Arc::new(fetcher)).await.unwrap()).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("Slow"));
    }

    #[tokio::test]
    async fn test_mislabelled_recipe_links_are_followed() {
        // The gallery is linked with a recipe-shaped URL but holds only links
        let gallery = "https://www.allrecipes.com/recipe/500/dinner-ideas/";
        let fetcher = StaticFetcher::default()
            .with_page(SEARCH, r#"<a href="/recipe/500/dinner-ideas/">Ideas</a>"#)
            .with_page(gallery, &listing(1..=2))
            .with_page(&recipe_url(1), &recipe_page("One"))
            .with_page(&recipe_url(2), &recipe_page("Two"));

        let rx = start(&config(Some(5), 1), Arc::new(fetcher)).await.unwrap();
        let mut names: Vec<String> = collect(rx)
            .await
            .into_iter()
            .filter_map(|r| r.name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_unreachable_seed_ends_run() {
        let rx = start(&config(Some(5), 3), Arc::new(StaticFetcher::default()))
            .await
            .unwrap();
        assert!(collect(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_filter_pattern_is_rejected() {
        let mut config = config(Some(5), 3);
        config.filter.recipe_patterns = vec!["(".to_string()];
        let result = start(&config, Arc::new(StaticFetcher::default())).await;
        assert!(matches!(result, Err(ConfigError::Pattern(_))));
    }
}
