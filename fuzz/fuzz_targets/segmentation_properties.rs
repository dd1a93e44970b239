#![no_main]

use libfuzzer_sys::fuzz_target;
use statcache::builder::CacheBuilder;
use statcache::ds::ShardSelector;
use statcache::traits::Segmenter;

// Fuzz segmentation properties
//
// Tests specific invariants:
// - Determinism (same key → same segment)
// - Range validity (segment < segment_count)
// - Zero segments clamped to 1
// - A segmented cache stores each key in exactly the selected segment
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let test_type = data[0] % 4;

    match test_type {
        0 => test_determinism(&data[1..]),
        1 => test_range_validity(&data[1..]),
        2 => test_zero_segments_clamped(&data[1..]),
        3 => test_cache_routing(&data[1..]),
        _ => unreachable!(),
    }
});

// Property: Same key always returns same segment
fn test_determinism(data: &[u8]) {
    if data.len() < 2 {
        return;
    }

    let count = ((data[0] as usize) % 64) + 1;
    let seed = u64::from(data[1]);
    let selector = ShardSelector::new(count, seed);
    let copy = ShardSelector::new(count, seed);

    for &byte in &data[2..] {
        let key = u32::from(byte);
        let first = Segmenter::<u32>::segment(&selector, &key);
        assert_eq!(first, Segmenter::<u32>::segment(&selector, &key));
        assert_eq!(first, Segmenter::<u32>::segment(&copy, &key));
    }
}

// Property: Segment index is always in [0, segment_count)
fn test_range_validity(data: &[u8]) {
    if data.len() < 2 {
        return;
    }

    let count = ((data[0] as usize) % 128) + 1;
    let seed = u64::from(data[1]);
    let selector = ShardSelector::new(count, seed);
    assert_eq!(Segmenter::<u64>::segment_count(&selector), count);

    for &byte in &data[2..] {
        let key = u64::from(byte);
        assert!(Segmenter::<u64>::segment(&selector, &key) < count);
    }
}

// Property: Zero segments is clamped to 1 and every key maps to 0
fn test_zero_segments_clamped(data: &[u8]) {
    let seed = u64::from(data[0]);
    let selector = ShardSelector::new(0, seed);
    assert_eq!(selector.shard_count(), 1);

    for &byte in data {
        assert_eq!(selector.shard_for_key(&u32::from(byte)), 0);
    }
}

// Property: put lands in the selected segment and nowhere else
fn test_cache_routing(data: &[u8]) {
    if data.len() < 2 {
        return;
    }

    let count = ((data[0] as usize) % 8) + 1;
    let seed = u64::from(data[1]);
    let cache = CacheBuilder::new()
        .segments(count)
        .seed(seed)
        .directory_shards(2)
        .build_segmented::<u8, (u8, u8)>();

    for &key in &data[2..] {
        cache.put((key, key)).unwrap();
        let home = cache.segment_index(&key).unwrap();
        for (index, segment) in cache.segments().iter().enumerate() {
            assert_eq!(segment.contains_key(&key), index == home);
        }
    }
}
