//! Integration tests for the result store public API.

use kconftest::cache::ProbeCache;
use kconftest::probe::builtin;
use kconftest::{BuildContext, Classification, ConftestError, ProbeResult, ResultStore};
use std::fs;
use tempfile::TempDir;

#[test]
fn public_api_accessible() {
    let _store = ResultStore::new();
    let _class: Classification = "SUPPORTED".parse().unwrap();
    let _result = ProbeResult::supported("x");
}

#[test]
fn persisted_artifact_survives_a_new_process_view() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("conftest.results");
    let ctx = BuildContext::new("/usr/bin/gcc").with_include_dir("/usr/src/linux/include");

    // 1. Record results as a build would
    let store = ResultStore::for_context(&ctx);
    store.record(ProbeResult::supported("rdma_create_id_net")).unwrap();
    store
        .record(ProbeResult::unsupported(
            "ib_register_device_name",
            Some(1),
            "ib_register_device_name.c:7:9: error: too few arguments to function 'ib_register_device'\n  7 |  return ib_register_device(dev);",
        ))
        .unwrap();
    store.save(&path).unwrap();

    // 2. Reload and query
    let loaded = ResultStore::load(&path).unwrap();
    assert!(loaded.is_current_for(&ctx));
    assert!(loaded.capability("rdma_create_id_net").unwrap());
    assert!(!loaded.capability("ib_register_device_name").unwrap());
    assert_eq!(
        loaded.lookup("ib_register_device_name"),
        store.lookup("ib_register_device_name")
    );

    // 3. Saving again produces the same bytes
    let again = temp.path().join("again.results");
    loaded.save(&again).unwrap();
    assert_eq!(fs::read(&path).unwrap(), fs::read(&again).unwrap());
}

#[test]
fn changed_context_is_detected() {
    let ctx = BuildContext::new("/usr/bin/gcc");
    let store = ResultStore::for_context(&ctx);

    assert!(!store.is_current_for(&ctx.clone().with_flag("-DMODULE")));
}

#[test]
fn hand_edited_artifact_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("conftest.results");
    fs::write(
        &path,
        "# kconftest results v1\nrdma_create_id_net SUPPORTED 0\nrdma_create_id_net yes\n",
    )
    .unwrap();

    let err = ResultStore::load(&path).unwrap_err();
    assert!(matches!(err, ConftestError::StoreCorruption { line: 3, .. }));
}

#[test]
fn comment_like_name_is_refused_instead_of_lost() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("conftest.results");
    let store = ResultStore::new();

    assert!(store.record(ProbeResult::supported("#hidden")).is_err());
    assert!(store.record(ProbeResult::supported("has space")).is_err());
    store.record(ProbeResult::supported("visible")).unwrap();
    store.save(&path).unwrap();

    let loaded = ResultStore::load(&path).unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded.capability("visible").unwrap());
}

#[test]
fn config_header_from_builtin_probes() {
    let store = ResultStore::new();
    for probe in builtin::all() {
        store.record(ProbeResult::supported(probe.name())).unwrap();
    }

    let header = store.config_header().unwrap();
    assert!(header.contains("#define HAVE_RDMA_CREATE_ID_NET 1\n"));
}

#[test]
fn cache_round_trip_through_public_api() {
    let temp = TempDir::new().unwrap();
    let cache = ProbeCache::new(temp.path().join("cache"));
    let ctx = BuildContext::new("/usr/bin/gcc");
    let probe = builtin::rdma_create_id_net();

    assert!(cache.get(&probe, &ctx).is_none());
    cache
        .put(&probe, &ctx, &ProbeResult::supported(probe.name()))
        .unwrap();

    let cached = cache.get(&probe, &ctx).unwrap();
    assert_eq!(cached.classification(), Classification::Supported);
    assert_eq!(cache.list().unwrap().len(), 1);
}
