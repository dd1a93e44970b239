// ==============================================
// SEGMENTED CACHE SCENARIOS (integration)
// ==============================================
//
// End-to-end behavior of segmented caches through the public API only:
// routing, per-segment eviction and isolation between segments.

use statcache::builder::CacheBuilder;
use statcache::error::CacheError;
use statcache::segmented::FnSegmenter;
use statcache::traits::Cache;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Page {
    path: String,
    body: Vec<u8>,
}

impl Page {
    fn new(path: &str, body: &str) -> Self {
        Self {
            path: path.to_string(),
            body: body.as_bytes().to_vec(),
        }
    }
}

impl statcache::traits::Keyed<String> for Page {
    fn key(&self) -> &String {
        &self.path
    }
}

fn by_first_letter(key: &String) -> usize {
    match key.as_bytes().first() {
        Some(b'a') => 0,
        Some(b'b') => 1,
        Some(b'c') => 2,
        _ => 3,
    }
}

// ==============================================
// Four segments, one key each
// ==============================================

#[test]
fn four_segments_each_evict_their_own_key() {
    let cache = CacheBuilder::new()
        .size_estimator(|page: &Page| page.body.len() as i64)
        .build_segmented_with::<String, Page, _>(FnSegmenter::new(4, by_first_letter))
        .unwrap();

    for path in ["a", "b", "c", "d"] {
        cache.put(Page::new(path, "body")).unwrap();
    }

    for (index, path) in ["a", "b", "c", "d"].into_iter().enumerate() {
        let segment = cache.segment(index).unwrap();
        let candidates = segment.items_for_eviction().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].key(), path);
        assert_eq!(candidates[0].size(), 4);

        let keys: Vec<String> = candidates.into_iter().map(|c| c.into_key()).collect();
        assert_eq!(segment.evict(&keys).unwrap(), 1);
    }

    for path in ["a", "b", "c", "d"] {
        assert_eq!(cache.get(&path.to_string()), Ok(None));
    }
    assert!(cache.items_for_eviction().unwrap().is_empty());

    // Metadata survives eviction; a re-put makes the key evictable again.
    assert_eq!(cache.len(), 4);
    cache.put(Page::new("b", "again")).unwrap();
    let stats = cache.statistics(&"b".to_string()).unwrap().unwrap();
    assert_eq!(stats.evictions(), 1);
    assert_eq!(stats.size(), 5);
    assert_eq!(cache.items_for_eviction().unwrap().len(), 1);
}

// ==============================================
// Determinism and isolation
// ==============================================

#[test]
fn segment_choice_is_deterministic() {
    let a = CacheBuilder::new().segments(5).seed(17).build_segmented::<u64, (u64, u64)>();
    let b = CacheBuilder::new().segments(5).seed(17).build_segmented::<u64, (u64, u64)>();
    for key in 0..1_000 {
        let first = a.segment_index(&key).unwrap();
        assert_eq!(first, a.segment_index(&key).unwrap());
        assert_eq!(first, b.segment_index(&key).unwrap());
    }
}

#[test]
fn evicting_one_segment_leaves_others_untouched() {
    let cache = CacheBuilder::new()
        .build_segmented_with::<String, Page, _>(FnSegmenter::new(4, by_first_letter))
        .unwrap();
    cache.put(Page::new("apple", "1")).unwrap();
    cache.put(Page::new("avocado", "2")).unwrap();
    cache.put(Page::new("banana", "3")).unwrap();

    let first = cache.segment(0).unwrap();
    let keys: Vec<String> = first
        .items_for_eviction()
        .unwrap()
        .into_iter()
        .map(|c| c.into_key())
        .collect();
    assert_eq!(first.evict(&keys).unwrap(), 2);

    let banana = cache.get(&"banana".to_string()).unwrap().unwrap();
    assert_eq!(banana.body, b"3".to_vec());
    assert_eq!(cache.segment(1).unwrap().metrics().evicted_items, 0);
    assert_eq!(cache.metrics().evicted_items, 2);
}

#[test]
fn misrouting_segmenter_is_an_invalid_argument() {
    let cache = CacheBuilder::new()
        .build_segmented_with::<String, Page, _>(FnSegmenter::new(2, |_: &String| 2usize))
        .unwrap();
    let err = cache.put(Page::new("x", "y")).unwrap_err();
    assert!(matches!(err, CacheError::InvalidArgument(_)));
    assert!(cache.is_empty());
}

#[test]
fn negative_size_estimate_is_rejected() {
    let cache = CacheBuilder::new()
        .size_estimator(|_: &Page| -1i64)
        .segments(2)
        .build_segmented::<String, Page>();
    let err = cache.put(Page::new("neg", "")).unwrap_err();
    assert!(matches!(err, CacheError::InvalidArgument(_)));
    assert_eq!(cache.get(&"neg".to_string()), Ok(None));
}
