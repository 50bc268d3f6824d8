//! Process-lifetime cache of pipelines keyed by document URL
//!
//! Entries are never evicted or refreshed. Each URL owns a single-assignment
//! cell, so concurrent first requests for the same URL share one construction.
//! A failed construction removes the empty cell and the next request retries.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::info;

use crate::errors::Result;
use crate::rag::Pipeline;
use crate::rag::PipelineFactory;

type PipelineCell = Arc<OnceCell<Arc<dyn Pipeline>>>;

/// Cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub failed_builds: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// URL-keyed pipeline cache with atomic get-or-create
pub struct PipelineCache {
    entries: DashMap<String, PipelineCell>,
    factory: Arc<dyn PipelineFactory>,
    hits: AtomicU64,
    misses: AtomicU64,
    failed_builds: AtomicU64,
}

impl PipelineCache {
    pub fn new(factory: Arc<dyn PipelineFactory>) -> Self {
        Self {
            entries: DashMap::new(),
            factory,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            failed_builds: AtomicU64::new(0),
        }
    }

    /// Return the pipeline for `url`, constructing it at most once.
    ///
    /// The key is the exact URL string; no normalization.
    pub async fn get_or_create(&self, url: &str) -> Result<Arc<dyn Pipeline>> {
        // Clone the cell out so the shard lock is released before awaiting
        let cell: PipelineCell = self
            .entries
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        if let Some(pipeline) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Pipeline cache hit for {}", url);
            return Ok(Arc::clone(pipeline));
        }

        let constructed = AtomicBool::new(false);
        let result = cell
            .get_or_try_init(|| async {
                constructed.store(true, Ordering::Relaxed);
                info!("Pipeline cache miss for {}, constructing", url);
                self.factory.build(url).await
            })
            .await;

        match result {
            Ok(pipeline) => {
                if constructed.load(Ordering::Relaxed) {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                } else {
                    // Waited on a construction started by another request
                    self.hits.fetch_add(1, Ordering::Relaxed);
                }
                Ok(Arc::clone(pipeline))
            }
            Err(e) => {
                self.failed_builds.fetch_add(1, Ordering::Relaxed);
                // Drop our empty cell; a replacement or a filled cell stays
                self.entries.remove_if(url, |_, current| {
                    Arc::ptr_eq(current, &cell) && !current.initialized()
                });
                Err(e)
            }
        }
    }

    /// Number of documents with a constructed pipeline
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries
            .get(url)
            .is_some_and(|entry| entry.value().initialized())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failed_builds: self.failed_builds.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::PolicyQaError;
    use crate::rag::QueryAnswer;

    struct EchoPipeline(String);

    #[async_trait]
    impl Pipeline for EchoPipeline {
        async fn query(&self, question: &str) -> Result<QueryAnswer> {
            Ok(QueryAnswer::new(format!("{}: {question}", self.0)))
        }
    }

    /// Counts builds; fails the first `fail_first` attempts
    struct CountingFactory {
        builds: AtomicUsize,
        fail_first: usize,
        delay: Duration,
    }

    impl CountingFactory {
        fn new(fail_first: usize, delay: Duration) -> Self {
            Self {
                builds: AtomicUsize::new(0),
                fail_first,
                delay,
            }
        }
    }

    #[async_trait]
    impl PipelineFactory for CountingFactory {
        async fn build(&self, document_url: &str) -> Result<Arc<dyn Pipeline>> {
            let attempt = self.builds.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if attempt < self.fail_first {
                return Err(PolicyQaError::DocumentFetchError("unreachable".to_string()));
            }
            Ok(Arc::new(EchoPipeline(document_url.to_string())))
        }
    }

    #[tokio::test]
    async fn test_sequential_requests_build_once() {
        let factory = Arc::new(CountingFactory::new(0, Duration::ZERO));
        let cache = PipelineCache::new(factory.clone());

        for _ in 0..3 {
            cache.get_or_create("https://example.com/a.pdf").await.unwrap();
        }

        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 2,
                misses: 1,
                failed_builds: 0
            }
        );
    }

    #[tokio::test]
    async fn test_distinct_urls_build_separately() {
        let factory = Arc::new(CountingFactory::new(0, Duration::ZERO));
        let cache = PipelineCache::new(factory.clone());

        let a = cache.get_or_create("https://example.com/a.pdf").await.unwrap();
        let b = cache.get_or_create("https://example.com/b.pdf").await.unwrap();
        // Exact-match keys: a trailing slash is a different document
        cache.get_or_create("https://example.com/a.pdf/").await.unwrap();

        assert_eq!(factory.builds.load(Ordering::SeqCst), 3);
        assert_eq!(a.query("q").await.unwrap().result, "https://example.com/a.pdf: q");
        assert_eq!(b.query("q").await.unwrap().result, "https://example.com/b.pdf: q");
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_share_construction() {
        let factory = Arc::new(CountingFactory::new(0, Duration::from_millis(50)));
        let cache = Arc::new(PipelineCache::new(factory.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_or_create("https://example.com/p.pdf").await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 7);
    }

    #[tokio::test]
    async fn test_failed_build_is_not_cached() {
        let factory = Arc::new(CountingFactory::new(1, Duration::ZERO));
        let cache = PipelineCache::new(factory.clone());
        let url = "https://example.com/flaky.pdf";

        let err = cache.get_or_create(url).await.err().unwrap();
        assert_eq!(err.kind(), "document_fetch");
        assert!(!cache.contains(url));
        assert!(cache.is_empty());

        // The failed entry is removed, not kept as an empty cell
        assert_eq!(cache.entries.len(), 0);

        assert!(cache.get_or_create(url).await.is_ok());
        assert!(cache.contains(url));
        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().failed_builds, 1);
    }

    #[tokio::test]
    async fn test_distinct_failing_urls_do_not_accumulate() {
        let factory = Arc::new(CountingFactory::new(usize::MAX, Duration::ZERO));
        let cache = PipelineCache::new(factory.clone());

        for i in 0..10 {
            let url = format!("https://example.com/bad-{i}.pdf");
            assert!(cache.get_or_create(&url).await.is_err());
        }

        assert_eq!(cache.entries.len(), 0);
        assert_eq!(cache.stats().failed_builds, 10);
    }

    #[test]
    fn test_hit_rate() {
        assert!(CacheStats::default().hit_rate().abs() < f64::EPSILON);
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            failed_builds: 0,
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
