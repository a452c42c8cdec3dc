//! Fire-once warnings

use docmap::domain::warnings::{Warning, Warnings};
use std::sync::Arc;

#[test]
fn test_warning_fires_once() {
    let warnings = Warnings::new();
    assert!(!warnings.has_fired(Warning::ShardKeyChanged));
    assert!(warnings.warn_once(Warning::ShardKeyChanged));
    assert!(!warnings.warn_once(Warning::ShardKeyChanged));
    assert!(warnings.has_fired(Warning::ShardKeyChanged));
}

#[test]
fn test_kinds_are_tracked_separately() {
    let warnings = Warnings::new();
    assert!(warnings.warn_once(Warning::UnshardedUpdate));
    assert!(warnings.warn_once(Warning::StringStoredAsBinary));
    assert!(!warnings.has_fired(Warning::CacheOutsideContext));
}

#[test]
fn test_reset_allows_warning_again() {
    let warnings = Warnings::new();
    warnings.warn_once(Warning::CacheOutsideContext);
    warnings.reset();
    assert!(warnings.warn_once(Warning::CacheOutsideContext));
}

#[test]
fn test_concurrent_emission_fires_exactly_once() {
    let warnings = Arc::new(Warnings::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let warnings = warnings.clone();
            std::thread::spawn(move || warnings.warn_once(Warning::ShardKeyChanged))
        })
        .collect();

    let fired = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|fired| *fired)
        .count();
    assert_eq!(fired, 1);
}

#[test]
fn test_ids_are_distinct() {
    let ids = [
        Warning::CacheOutsideContext.id(),
        Warning::ShardKeyChanged.id(),
        Warning::StringStoredAsBinary.id(),
        Warning::UnshardedUpdate.id(),
    ];
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}
