use async_trait::async_trait;
use background_service::{
    AnalyzeOutcome, AnalyzeRequest, CollectionJob, CollectionQueue, CollectionService, Collector,
    CommunityMap, Freshness, FreshnessGate, Stage,
};
use chrono::{Duration, Utc};
use database::PostStore;
use pulse_core::{
    Classification, ContentSource, CoreError, NewPost, RawPost, RedditApiError, TimeWindow,
    PLATFORM_REDDIT,
};
use sentiment_engine::SentimentClassifier;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeSource {
    search: HashMap<TimeWindow, Vec<RawPost>>,
    failing_windows: HashSet<TimeWindow>,
    hot: HashMap<String, Vec<RawPost>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    fn with_search(mut self, window: TimeWindow, posts: Vec<RawPost>) -> Self {
        self.search.insert(window, posts);
        self
    }

    fn failing(mut self, window: TimeWindow) -> Self {
        self.failing_windows.insert(window);
        self
    }

    fn with_hot(mut self, community: &str, posts: Vec<RawPost>) -> Self {
        self.hot.insert(community.to_string(), posts);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    fn platform(&self) -> &str {
        PLATFORM_REDDIT
    }

    async fn search(
        &self,
        keyword: &str,
        limit: usize,
        window: TimeWindow,
    ) -> Result<Vec<RawPost>, CoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("search:{}:{}:{}", keyword, window, limit));

        if self.failing_windows.contains(&window) {
            return Err(CoreError::RedditApi(RedditApiError::ServerError {
                status_code: 503,
            }));
        }
        let mut posts = self.search.get(&window).cloned().unwrap_or_default();
        posts.truncate(limit);
        Ok(posts)
    }

    async fn list_hot(&self, community: &str, limit: usize) -> Result<Vec<RawPost>, CoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("hot:{}:{}", community, limit));

        match self.hot.get(community) {
            Some(posts) => Ok(posts.iter().take(limit).cloned().collect()),
            None => Err(CoreError::RedditApi(RedditApiError::SubredditNotFound {
                subreddit: community.to_string(),
            })),
        }
    }
}

fn raw(title: &str, body: &str) -> RawPost {
    RawPost {
        title: title.to_string(),
        body: body.to_string(),
        author: Some("poster".to_string()),
    }
}

async fn test_store() -> PostStore {
    let path = std::env::temp_dir().join(format!("pulse_collect_{}.sqlite", uuid::Uuid::new_v4()));
    let store = PostStore::connect(&format!("sqlite://{}", path.display()))
        .await
        .unwrap();
    store.run_migrations().await.unwrap();
    store
}

fn collector(source: Arc<FakeSource>, store: &PostStore) -> Collector {
    Collector::new(
        source,
        store.clone(),
        SentimentClassifier::new(),
        CommunityMap::builtin(),
    )
}

#[tokio::test]
async fn test_search_escalates_windows_with_remaining_limit() {
    let store = test_store().await;
    let source = Arc::new(
        FakeSource::default()
            .with_search(
                TimeWindow::Day,
                vec![
                    raw("Tesla is great", "love the new model"),
                    raw("hi", ""),
                    raw("Tesla service was terrible", ""),
                ],
            )
            .with_search(TimeWindow::Month, vec![raw("Old tesla thread", "still relevant")]),
    );

    let report = collector(source.clone(), &store)
        .collect("  Tesla ", 10)
        .await
        .unwrap();

    assert_eq!(report.keyword, "tesla");
    assert_eq!(report.collected, 3);
    assert!(!report.used_fallback);
    assert_eq!(
        source.calls(),
        vec![
            "search:tesla:day:10",
            "search:tesla:week:8",
            "search:tesla:month:8",
        ]
    );

    let stored = store.fetch(Some("tesla")).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|post| post.keyword == "tesla"));
    assert_eq!(stored[0].text, "Tesla is great love the new model");
    assert_eq!(stored[0].sentiment, "positive");
    assert_eq!(stored[1].sentiment, "negative");
}

#[tokio::test]
async fn test_search_stops_once_limit_reached() {
    let store = test_store().await;
    let posts = (0..5)
        .map(|i| raw(&format!("Rust post number {}", i), ""))
        .collect();
    let source = Arc::new(FakeSource::default().with_search(TimeWindow::Day, posts));

    let report = collector(source.clone(), &store)
        .collect("rust", 3)
        .await
        .unwrap();

    assert_eq!(report.collected, 3);
    assert_eq!(source.calls(), vec!["search:rust:day:3"]);
    assert_eq!(store.fetch(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_search_failure_is_tolerated() {
    let store = test_store().await;
    let source = Arc::new(
        FakeSource::default()
            .failing(TimeWindow::Day)
            .with_search(TimeWindow::Week, vec![raw("Gaming news today", "new console")]),
    );

    let report = collector(source, &store).collect("gaming", 10).await.unwrap();

    assert_eq!(report.collected, 1);
    assert!(!report.used_fallback);
    assert!(report.stages[0].error.is_some());
    assert_eq!(report.stages[0].stage, Stage::Search(TimeWindow::Day));
    assert!(report.stages[1].error.is_none());
}

#[tokio::test]
async fn test_fallback_runs_after_empty_search() {
    let store = test_store().await;
    let source = Arc::new(FakeSource::default().with_hot(
        "cars",
        vec![
            raw("My new CAR arrived", "so happy"),
            raw("Weekly discussion thread", "ask anything"),
            raw("Best car wax?", "looking for tips"),
            raw("car", ""),
        ],
    ));

    let report = collector(source.clone(), &store)
        .collect("car", 100)
        .await
        .unwrap();

    assert!(report.used_fallback);
    assert_eq!(report.collected, 2);
    assert_eq!(
        source.calls(),
        vec![
            "search:car:day:100",
            "search:car:week:100",
            "search:car:month:100",
            "hot:cars:20",
            "hot:autos:20",
        ]
    );

    let autos = report
        .stages
        .iter()
        .find(|stage| stage.stage == Stage::Community("autos".to_string()))
        .unwrap();
    assert!(autos.error.is_some());

    let stored = store.fetch(Some("car")).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored
        .iter()
        .all(|post| post.text.to_lowercase().contains("car")));
}

#[tokio::test]
async fn test_unmapped_keyword_uses_default_communities() {
    let store = test_store().await;
    let source = Arc::new(
        FakeSource::default()
            .with_hot("popular", vec![raw("Quantum computing explained", "")])
            .with_hot("AskReddit", vec![raw("What is quantum anyway?", "")]),
    );

    let report = collector(source.clone(), &store)
        .collect("quantum", 1)
        .await
        .unwrap();

    assert_eq!(report.collected, 1);
    let calls = source.calls();
    assert!(calls.contains(&"hot:popular:20".to_string()));
    assert!(!calls.contains(&"hot:AskReddit:20".to_string()));
}

#[tokio::test]
async fn test_fallback_skipped_when_search_found_posts() {
    let store = test_store().await;
    let source = Arc::new(
        FakeSource::default()
            .with_search(TimeWindow::Week, vec![raw("Food trucks downtown", "")])
            .with_hot("food", vec![raw("Food pictures", "tasty")]),
    );

    let report = collector(source.clone(), &store).collect("food", 50).await.unwrap();

    assert_eq!(report.collected, 1);
    assert!(!report.used_fallback);
    assert!(source.calls().iter().all(|call| call.starts_with("search:")));
}

#[tokio::test]
async fn test_blank_keyword_is_rejected() {
    let store = test_store().await;
    let source = Arc::new(FakeSource::default());

    let result = collector(source.clone(), &store).collect("   ", 10).await;
    assert!(matches!(result, Err(CoreError::InvalidInput { .. })));
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_freshness_gate_window() {
    let store = test_store().await;
    let now = Utc::now();
    let post = |keyword: &str, age: Duration| {
        NewPost::classified(
            PLATFORM_REDDIT,
            None,
            "some stored text",
            Classification::from_score(0.0),
            keyword,
            now - age,
        )
    };
    store
        .insert_batch(&[
            post("old", Duration::hours(2)),
            post("recent", Duration::minutes(30)),
            post("recent", Duration::minutes(59)),
        ])
        .await
        .unwrap();

    let gate = FreshnessGate::new(store);
    assert_eq!(gate.check("old", now).await.unwrap(), Freshness::Stale);
    assert_eq!(
        gate.check("RECENT", now).await.unwrap(),
        Freshness::Fresh { count: 2 }
    );
    assert_eq!(gate.check("never", now).await.unwrap(), Freshness::Stale);
}

#[tokio::test]
async fn test_queue_runs_every_job_then_stops() {
    let store = test_store().await;
    let source = Arc::new(
        FakeSource::default().with_search(TimeWindow::Day, vec![raw("Shared result text", "")]),
    );
    let queue = CollectionQueue::start(Arc::new(collector(source, &store)), 2);

    for keyword in ["alpha", "beta", "gamma"] {
        queue
            .enqueue(CollectionJob {
                keyword: keyword.to_string(),
                limit: 5,
            })
            .await
            .unwrap();
    }

    queue.shutdown().await;
    queue.join().await;

    let counts = store.keyword_counts().await.unwrap();
    assert_eq!(counts.len(), 3);
    assert!(counts.iter().all(|entry| entry.count == 1));

    let late = queue
        .enqueue(CollectionJob {
            keyword: "delta".to_string(),
            limit: 5,
        })
        .await;
    assert!(matches!(late, Err(CoreError::Internal { .. })));
}

#[tokio::test]
async fn test_service_returns_cached_or_starts_collection() {
    let store = test_store().await;
    store
        .insert_batch(&[NewPost::classified(
            PLATFORM_REDDIT,
            Some("someone"),
            "fresh tesla record",
            Classification::from_score(0.3),
            "tesla",
            Utc::now(),
        )])
        .await
        .unwrap();

    let source = Arc::new(
        FakeSource::default().with_search(TimeWindow::Day, vec![raw("Basketball tonight", "")]),
    );
    let queue = Arc::new(CollectionQueue::start(
        Arc::new(collector(source.clone(), &store)),
        1,
    ));
    let service = CollectionService::new(FreshnessGate::new(store.clone()), queue.clone());

    let cached = service
        .request(AnalyzeRequest {
            keyword: "Tesla".to_string(),
            limit: 100,
        })
        .await
        .unwrap();
    assert_eq!(
        cached,
        AnalyzeOutcome::Cached {
            keyword: "tesla".to_string(),
            count: 1
        }
    );

    let started = service
        .request(AnalyzeRequest {
            keyword: " BB ".to_string(),
            limit: 100,
        })
        .await
        .unwrap();
    assert_eq!(
        started,
        AnalyzeOutcome::Started {
            keyword: "bb".to_string()
        }
    );

    queue.shutdown().await;
    queue.join().await;
    assert_eq!(store.keyword_status("bb").await.unwrap().count, 1);
    assert!(source.calls().iter().all(|call| !call.contains("tesla")));

    let blank = service
        .request(AnalyzeRequest {
            keyword: "  ".to_string(),
            limit: 100,
        })
        .await;
    assert!(matches!(blank, Err(CoreError::InvalidInput { .. })));
}

#[tokio::test]
async fn test_same_keyword_goes_stale_after_an_hour() {
    let store = test_store().await;
    let now = Utc::now();
    store
        .insert_batch(&[NewPost::classified(
            PLATFORM_REDDIT,
            Some("someone"),
            "earlier tesla record",
            Classification::from_score(0.3),
            "tesla",
            now,
        )])
        .await
        .unwrap();

    let source = Arc::new(
        FakeSource::default().with_search(TimeWindow::Day, vec![raw("Tesla range update", "")]),
    );
    let queue = Arc::new(CollectionQueue::start(
        Arc::new(collector(source.clone(), &store)),
        1,
    ));
    let service = CollectionService::new(FreshnessGate::new(store.clone()), queue.clone());
    let request = || AnalyzeRequest {
        keyword: "tesla".to_string(),
        limit: 10,
    };

    let cached = service.request_at(request(), now).await.unwrap();
    assert_eq!(
        cached,
        AnalyzeOutcome::Cached {
            keyword: "tesla".to_string(),
            count: 1
        }
    );
    assert!(source.calls().is_empty());

    let later = service
        .request_at(request(), now + Duration::minutes(61))
        .await
        .unwrap();
    assert_eq!(
        later,
        AnalyzeOutcome::Started {
            keyword: "tesla".to_string()
        }
    );

    queue.shutdown().await;
    queue.join().await;
    assert!(source
        .calls()
        .iter()
        .any(|call| call.starts_with("search:tesla:")));
    assert_eq!(store.keyword_status("tesla").await.unwrap().count, 2);
}
