//! Integration tests for ObserveConfig

use vigil_foundation::ObserveConfig;

#[test]
fn defaults() {
    let config = ObserveConfig::default();
    assert_eq!(config.max_flush_rounds, 100);
    assert_eq!(config.sweep_interval, 1024);
    assert!(config.skip_unchanged_writes);
}

#[test]
fn presets_are_stricter() {
    assert!(ObserveConfig::strict().max_flush_rounds < ObserveConfig::default().max_flush_rounds);
    assert!(ObserveConfig::development().sweep_interval < ObserveConfig::default().sweep_interval);
}

#[test]
fn builders_and_install() {
    let config = ObserveConfig::default()
        .with_max_flush_rounds(4)
        .with_sweep_interval(0)
        .with_skip_unchanged_writes(false);
    assert_eq!(config.sweep_interval, 1);
    config.install();

    let current = ObserveConfig::current();
    assert_eq!(current.max_flush_rounds, 4);
    assert!(!current.skip_unchanged_writes);

    ObserveConfig::default().install();
}

#[test]
fn scoped_config_is_restored() {
    let seen = ObserveConfig::default()
        .with_deferred_listeners(true)
        .scope(|| ObserveConfig::current().deferred_listeners);
    assert!(seen);
    assert!(!ObserveConfig::current().deferred_listeners);
}
