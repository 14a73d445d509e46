//! Batch-parallel article extraction using std::thread.
//!
//! Pages are cut into batches; each batch is split into one chunk per thread
//! and the chunk results are joined back in chunk order, so the output keeps
//! the input order.

use std::thread;
use std::time::{Duration, Instant};

use crate::article::{classify_countries, extract_article, mark_suggested, ArticleRecord};
use crate::bundle::ArticlePage;
use crate::config::ContestConfig;
use crate::suggested::SuggestedIndex;

/// Configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of threads to use
    pub num_threads: usize,
    /// Pages handed to the thread pool at once
    pub batch_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        let cpus = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self {
            num_threads: cpus,
            batch_size: 200,
        }
    }
}

/// Shared read-only inputs of the per-page work.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub config: &'a ContestConfig,
    pub index: &'a SuggestedIndex,
}

/// Outcome of one page
#[derive(Debug)]
pub enum ProcessedPage {
    Article(ArticleRecord),
    NoTalkPage,
    NoTemplate,
    /// Lost with a worker thread that panicked
    Dropped,
}

#[derive(Debug, Default)]
pub struct Stats {
    pub pages_processed: usize,
    pub articles: usize,
    pub no_talk_page: usize,
    pub no_template: usize,
    pub from_suggested: usize,
    pub dropped: usize,
    pub elapsed: Duration,
}

impl Stats {
    fn record(&mut self, page: &ProcessedPage) {
        self.pages_processed += 1;
        match page {
            ProcessedPage::Article(record) => {
                self.articles += 1;
                if record.from_suggested_list {
                    self.from_suggested += 1;
                }
            }
            ProcessedPage::NoTalkPage => self.no_talk_page += 1,
            ProcessedPage::NoTemplate => self.no_template += 1,
            ProcessedPage::Dropped => self.dropped += 1,
        }
    }
}

/// Full per-page pipeline: template extraction, readable length, suggested
/// lookup and country classification.
pub fn process_page(page: &ArticlePage, ctx: ExtractContext<'_>) -> ProcessedPage {
    if page.talk.trim().is_empty() {
        tracing::warn!(title = %page.title, "no talk page found");
        return ProcessedPage::NoTalkPage;
    }

    let info = page.info();
    match extract_article(&page.title, &page.talk, &page.content, &info, ctx.config) {
        Some(mut record) => {
            mark_suggested(&mut record, ctx.index);
            classify_countries(&mut record, &ctx.config.allowed_countries);
            tracing::debug!(
                title = %record.title,
                participant = %record.participant,
                topics = record.topics.len(),
                "processed article"
            );
            ProcessedPage::Article(record)
        }
        None => {
            tracing::warn!(title = %page.title, "contest template not found on talk page");
            ProcessedPage::NoTemplate
        }
    }
}

/// Process every page in batches, calling `on_batch` with the number of pages
/// finished after each batch. Records come back in input order.
pub fn extract_all<F>(
    pages: &[ArticlePage],
    ctx: ExtractContext<'_>,
    config: &ParallelConfig,
    mut on_batch: F,
) -> (Vec<ArticleRecord>, Stats)
where
    F: FnMut(usize),
{
    let start_time = Instant::now();
    let mut stats = Stats::default();
    let mut records = Vec::with_capacity(pages.len());

    for batch in pages.chunks(config.batch_size.max(1)) {
        let results = process_batch_threaded(batch, ctx, config.num_threads);
        for result in results {
            stats.record(&result);
            if let ProcessedPage::Article(record) = result {
                records.push(record);
            }
        }
        on_batch(batch.len());
    }

    stats.elapsed = start_time.elapsed();
    (records, stats)
}

/// Process a batch of pages using multiple threads
fn process_batch_threaded(
    batch: &[ArticlePage],
    ctx: ExtractContext<'_>,
    num_threads: usize,
) -> Vec<ProcessedPage> {
    map_chunks(batch, num_threads, |page| process_page(page, ctx))
}

/// Split `items` into one chunk per thread and join the results in chunk
/// order. A chunk whose thread panics comes back as one `Dropped` per item.
fn map_chunks<T, F>(items: &[T], num_threads: usize, work: F) -> Vec<ProcessedPage>
where
    T: Sync,
    F: Fn(&T) -> ProcessedPage + Sync,
{
    if items.is_empty() {
        return vec![];
    }

    let num_threads = num_threads.min(items.len()).max(1);
    if num_threads == 1 {
        return items.iter().map(&work).collect();
    }
    let chunk_size = (items.len() + num_threads - 1) / num_threads;
    let work = &work;

    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk_size)
            .map(|chunk| {
                let handle = scope.spawn(move || chunk.iter().map(work).collect::<Vec<_>>());
                (chunk.len(), handle)
            })
            .collect();

        let mut results = Vec::with_capacity(items.len());
        for (len, handle) in handles {
            match handle.join() {
                Ok(chunk_results) => results.extend(chunk_results),
                Err(_) => {
                    tracing::error!(pages = len, "worker thread panicked, chunk dropped");
                    results.extend((0..len).map(|_| ProcessedPage::Dropped));
                }
            }
        }
        results
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggested::IdentifierHarvester;

    fn page(i: usize) -> ArticlePage {
        ArticlePage {
            title: format!("Raksts {}", i),
            talk: format!(
                "{{{{CEE Spring 2025|dalībnieks=User{}|tēma=vēsture|valsts=Latvija}}}}",
                i % 3
            ),
            content: "x".repeat(i),
            size: i as u64,
            pageid: i as u64,
            wikidata_id: Some(format!("Q{}", i)),
        }
    }

    fn fixtures() -> (ContestConfig, SuggestedIndex) {
        let config = ContestConfig {
            allowed_countries: vec!["Latvija".to_string()],
            ..ContestConfig::default()
        };
        let index = SuggestedIndex::build(
            vec![("Latvia", "{{#invoke:WikimediaCEETable|table|Q2|Q5}}")],
            &IdentifierHarvester::default(),
        );
        (config, index)
    }

    #[test]
    fn output_order_matches_input_order() {
        let (config, index) = fixtures();
        let ctx = ExtractContext {
            config: &config,
            index: &index,
        };
        let pages: Vec<ArticlePage> = (0..37).map(page).collect();
        let parallel = ParallelConfig {
            num_threads: 4,
            batch_size: 10,
        };

        let mut seen = 0;
        let (records, stats) = extract_all(&pages, ctx, &parallel, |n| seen += n);

        assert_eq!(seen, 37);
        assert_eq!(stats.pages_processed, 37);
        assert_eq!(stats.articles, 37);
        let titles: Vec<String> = records.iter().map(|r| r.title.clone()).collect();
        let expected: Vec<String> = pages.iter().map(|p| p.title.clone()).collect();
        assert_eq!(titles, expected);
        assert_eq!(records[5].readable_length, 5);
    }

    #[test]
    fn parallel_equals_sequential() {
        let (config, index) = fixtures();
        let ctx = ExtractContext {
            config: &config,
            index: &index,
        };
        let pages: Vec<ArticlePage> = (0..25).map(page).collect();

        let sequential = ParallelConfig {
            num_threads: 1,
            batch_size: 1000,
        };
        let threaded = ParallelConfig {
            num_threads: 8,
            batch_size: 7,
        };
        let (a, _) = extract_all(&pages, ctx, &sequential, |_| {});
        let (b, _) = extract_all(&pages, ctx, &threaded, |_| {});
        assert_eq!(a, b);
    }

    #[test]
    fn suggested_and_country_flags_applied() {
        let (config, index) = fixtures();
        let ctx = ExtractContext {
            config: &config,
            index: &index,
        };
        let pages: Vec<ArticlePage> = (0..6).map(page).collect();
        let (records, stats) = extract_all(&pages, ctx, &ParallelConfig::default(), |_| {});

        assert_eq!(stats.from_suggested, 2);
        assert!(records[2].from_suggested_list);
        assert_eq!(records[5].suggested_country, "Latvia");
        assert!(!records[3].from_suggested_list);
        assert!(records.iter().all(|r| r.eligible_for_contest));
    }

    #[test]
    fn pages_without_talk_or_template_are_counted() {
        let (config, index) = fixtures();
        let ctx = ExtractContext {
            config: &config,
            index: &index,
        };
        let mut no_talk = page(1);
        no_talk.talk.clear();
        let mut no_template = page(2);
        no_template.talk = "{{Cits}}".to_string();
        let pages = vec![no_talk, no_template, page(3)];

        let (records, stats) = extract_all(&pages, ctx, &ParallelConfig::default(), |_| {});
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Raksts 3");
        assert_eq!(stats.no_talk_page, 1);
        assert_eq!(stats.no_template, 1);
    }

    #[test]
    fn panicked_chunk_is_counted_as_dropped() {
        let items: Vec<usize> = (0..9).collect();
        let results = map_chunks(&items, 3, |&i| {
            if i == 4 {
                panic!("page {} failed", i);
            }
            ProcessedPage::NoTemplate
        });

        assert_eq!(results.len(), 9);
        assert!(results[3..6]
            .iter()
            .all(|r| matches!(r, ProcessedPage::Dropped)));
        assert!(matches!(results[2], ProcessedPage::NoTemplate));
        assert!(matches!(results[6], ProcessedPage::NoTemplate));

        let mut stats = Stats::default();
        for result in &results {
            stats.record(result);
        }
        assert_eq!(stats.pages_processed, 9);
        assert_eq!(stats.dropped, 3);
        assert_eq!(stats.no_template, 6);
    }

    #[test]
    fn empty_input() {
        let (config, index) = fixtures();
        let ctx = ExtractContext {
            config: &config,
            index: &index,
        };
        let (records, stats) = extract_all(&[], ctx, &ParallelConfig::default(), |_| {});
        assert!(records.is_empty());
        assert_eq!(stats.pages_processed, 0);
    }
}
