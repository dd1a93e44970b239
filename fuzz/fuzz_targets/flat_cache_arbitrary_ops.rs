#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use statcache::builder::CacheBuilder;
use statcache::error::CacheError;

// Fuzz arbitrary operation sequences on FlatCache
//
// Tests random sequences of put, get, evict, expire and purge_expired against
// a model map of the values that should currently be readable.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let cache = CacheBuilder::new()
        .directory_shards(4)
        .size_estimator(|value: &(u8, u8)| i64::from(value.1))
        .build_flat::<u8, (u8, u8)>();
    let mut readable: HashMap<u8, u8> = HashMap::new();
    let mut expired: Vec<u8> = Vec::new();

    let mut idx = 0;
    while idx + 2 < data.len() {
        let op = data[idx] % 6;
        let key = data[idx + 1] % 32;
        let value = data[idx + 2];
        idx += 3;

        match op {
            0 => {
                // put
                match cache.put((key, value)) {
                    Ok(()) => {
                        readable.insert(key, value);
                        assert_eq!(cache.statistics(&key).unwrap().size(), u64::from(value));
                    }
                    Err(CacheError::AlreadyExpired) => assert!(expired.contains(&key)),
                    Err(err) => panic!("unexpected put failure: {err}"),
                }
            }
            1 => {
                // get
                let got = cache.get(&key).unwrap();
                assert_eq!(got.map(|v| v.1), readable.get(&key).copied());
                if expired.contains(&key) {
                    assert!(!cache.contains_key(&key));
                    expired.retain(|k| *k != key);
                }
            }
            2 => {
                // evict
                let evicted = cache.evict([key]).unwrap();
                let was_live = readable.remove(&key).is_some();
                assert_eq!(evicted, usize::from(was_live));
            }
            3 => {
                // expire
                let present = cache.contains_key(&key);
                let latched = cache.expire(&key);
                assert_eq!(latched, present && !expired.contains(&key));
                if latched {
                    readable.remove(&key);
                    expired.push(key);
                }
            }
            4 => {
                // purge_expired
                let purged = cache.purge_expired().unwrap();
                assert_eq!(purged, expired.len());
                expired.clear();
            }
            5 => {
                // candidates match the readable model
                let mut keys: Vec<u8> = cache
                    .items_for_eviction()
                    .unwrap()
                    .into_iter()
                    .map(|s| s.into_key())
                    .collect();
                keys.sort_unstable();
                let mut expected: Vec<u8> = readable.keys().copied().collect();
                expected.sort_unstable();
                assert_eq!(keys, expected);
            }
            _ => unreachable!(),
        }

        cache.check_invariants().unwrap();
    }
});
