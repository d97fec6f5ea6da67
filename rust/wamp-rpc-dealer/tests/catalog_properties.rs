use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use wamp_rpc_core::{Arguments, MatchPolicy, RegisterOptions, SessionId};
use wamp_rpc_dealer::{
    CatalogError, CatalogRouter, Dealer, Invocation, OperationCatalog, PrefixCatalog,
    RpcFailure, RpcOperation, WildcardCatalog,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn constant(value: i64) -> Arc<dyn RpcOperation> {
    Arc::new(move |_inv: Invocation| async move {
        Ok::<_, RpcFailure>(Arguments::positional([json!(value)]))
    })
}

#[tokio::test]
async fn registered_exact_procedure_resolves_and_runs() {
    init_tracing();
    let router = CatalogRouter::new();
    let reg = router
        .register(SessionId(1), &RegisterOptions::default(), "com.calc.add", constant(42))
        .unwrap();

    let found = router.matching_operation("com.calc.add").unwrap();
    assert_eq!(found.id(), reg.id());
    assert_eq!(found.policy(), MatchPolicy::Exact);

    let result = found
        .operation()
        .invoke(Invocation::new("com.calc.add", found.id(), Arguments::new()))
        .await
        .unwrap();
    assert_eq!(result.positional, vec![json!(42)]);
}

#[test]
fn duplicate_registration_leaves_first_in_place() {
    init_tracing();
    let router = CatalogRouter::new();
    let first = router
        .register(SessionId(1), &RegisterOptions::default(), "com.a", constant(1))
        .unwrap();

    let err = router
        .register(SessionId(2), &RegisterOptions::default(), "com.a", constant(2))
        .unwrap_err();
    assert_eq!(
        err,
        CatalogError::DuplicateRegistration {
            uri: "com.a".into(),
            policy: MatchPolicy::Exact
        }
    );
    assert_eq!(router.matching_operation("com.a").unwrap().id(), first.id());
    assert_eq!(router.len(), 1);
}

#[test]
fn unregister_then_resolve_and_unregister_again() {
    init_tracing();
    let dealer = Dealer::new();
    let id = dealer
        .register(SessionId(1), "com.a", &RegisterOptions::default(), constant(1))
        .unwrap();

    dealer.unregister(SessionId(1), id).unwrap();
    assert_eq!(
        dealer.router().matching_operation("com.a").unwrap_err(),
        CatalogError::NoSuchProcedure("com.a".into())
    );
    assert_eq!(
        dealer.unregister(SessionId(1), id).unwrap_err(),
        CatalogError::UnknownRegistration(id)
    );
}

#[test]
fn prefix_catalog_prefers_longest_prefix() {
    let catalog = PrefixCatalog::default();
    catalog.register(SessionId(1), "a", constant(1)).unwrap();
    let ab = catalog.register(SessionId(1), "a.b", constant(2)).unwrap();

    assert_eq!(catalog.matching_operation("a.b.c").unwrap().id(), ab.id());
}

#[test]
fn wildcard_catalog_prefers_fewest_wildcards() {
    let catalog = WildcardCatalog::default();
    catalog.register(SessionId(1), "..c", constant(1)).unwrap();
    let specific = catalog.register(SessionId(1), "a..c", constant(2)).unwrap();

    assert_eq!(catalog.matching_operation("a.b.c").unwrap().id(), specific.id());
}

#[test]
fn concurrent_registrations_get_distinct_ids() {
    init_tracing();
    let router = CatalogRouter::new();

    let ids: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..10)
            .map(|worker| {
                let router = &router;
                s.spawn(move || {
                    (0..100)
                        .map(|n| {
                            router
                                .register(
                                    SessionId(worker),
                                    &RegisterOptions::default(),
                                    &format!("com.worker{}.proc{}", worker, n),
                                    constant(n),
                                )
                                .unwrap()
                                .id()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(ids.len(), 1000);
    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 1000);
    assert_eq!(router.len(), 1000);
}

#[test]
fn concurrent_readers_see_consistent_snapshots() {
    let router = CatalogRouter::new();
    router
        .register(SessionId(1), &RegisterOptions::default(), "com.stable", constant(0))
        .unwrap();

    std::thread::scope(|s| {
        let router = &router;
        s.spawn(move || {
            for n in 0..200 {
                let uri = format!("com.churn.{}", n);
                let reg = router
                    .register(SessionId(2), &RegisterOptions::default(), &uri, constant(n))
                    .unwrap();
                router.unregister(SessionId(2), reg.id()).unwrap();
            }
        });
        for _ in 0..4 {
            s.spawn(move || {
                for _ in 0..500 {
                    assert!(router.matching_operation("com.stable").is_ok());
                }
            });
        }
    });

    assert_eq!(router.len(), 1);
}

#[test]
fn registration_ids_do_not_leak_after_exhaustion() {
    let router = CatalogRouter::with_id_limit(2);
    let a = router
        .register(SessionId(1), &RegisterOptions::default(), "com.a", constant(1))
        .unwrap();
    router
        .register(SessionId(1), &RegisterOptions::with_policy(MatchPolicy::Prefix), "com.b", constant(2))
        .unwrap();

    assert_eq!(
        router
            .register(SessionId(1), &RegisterOptions::default(), "com.c", constant(3))
            .unwrap_err(),
        CatalogError::IdSpaceExhausted { limit: 2 }
    );

    router.unregister(SessionId(1), a.id()).unwrap();
    router
        .register(SessionId(1), &RegisterOptions::default(), "com.c", constant(3))
        .unwrap();
}
