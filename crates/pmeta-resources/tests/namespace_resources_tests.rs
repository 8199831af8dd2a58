use std::sync::Arc;
use std::time::Duration;

use pmeta_policies::{
    AutoFailoverPolicyData, LocalPolicies, NamespaceIsolationData, NamespaceName,
    PartitionedTopicMetadata, Policies, TopicDomain, TopicName,
};
use pmeta_resources::{
    NamespaceResources, ResourceError, ResourcesConfig, StoreBindings, UnavailableCause,
};
use pmeta_store::{MetadataStore, NotificationType, Version};
use pmeta_store_backends::MemoryMetadataStore;

struct Harness {
    local: MemoryMetadataStore,
    configuration: MemoryMetadataStore,
    resources: NamespaceResources,
}

fn harness(timeout: Duration) -> Harness {
    let local = MemoryMetadataStore::new();
    let configuration = MemoryMetadataStore::new();
    let resources = NamespaceResources::new(
        StoreBindings::new(Arc::new(local.clone()), Arc::new(configuration.clone())),
        timeout,
    )
    .expect("build namespace resources");
    Harness {
        local,
        configuration,
        resources,
    }
}

fn ns(s: &str) -> NamespaceName {
    s.parse().expect("namespace name")
}

fn isolation_data() -> NamespaceIsolationData {
    NamespaceIsolationData {
        namespaces: vec!["tenant-a/.*".into()],
        primary: vec!["broker-1.*".into()],
        secondary: vec!["broker-2.*".into()],
        auto_failover_policy: AutoFailoverPolicyData::min_available(1, 80),
    }
}

#[tokio::test]
async fn policies_written_are_read_back_equal() {
    let h = harness(Duration::from_secs(5));
    let n = ns("tenant-a/ns1");
    let mut policies = Policies::for_clusters(["us-west", "us-east"]);
    policies.message_ttl_in_seconds = Some(3600);
    policies.properties.insert("owner".into(), "team-a".into());

    h.resources.create_policies(&n, &policies).await.unwrap();
    assert_eq!(h.resources.get_policies(&n).await.unwrap(), Some(policies));
}

#[tokio::test]
async fn absent_resources_are_not_errors() {
    let h = harness(Duration::from_secs(5));
    let res = &h.resources;
    let n = ns("tenant-a/missing");
    let topic: TopicName = "persistent://tenant-a/missing/t".parse().unwrap();

    assert_eq!(res.get_policies(&n).await.unwrap(), None);
    let local = res.local_policies().get_local_policies(&n).await;
    assert_eq!(local.unwrap(), None);
    let isolation = res.isolation_policies();
    let view = isolation.get_isolation_data_policies("us-west").await;
    assert!(view.unwrap().is_none());
    let topics = res.partitioned_topic_resources();
    let metadata = topics.get_partitioned_topic_metadata(&topic).await;
    assert!(metadata.unwrap().is_none());
}

#[tokio::test]
async fn list_returns_exactly_the_children() {
    let h = harness(Duration::from_secs(5));
    let res = &h.resources;
    for s in ["tenant-a/ns1", "tenant-a/ns2", "tenant-a/ns3", "tenant-b/ns1"] {
        res.create_policies(&ns(s), &Policies::default())
            .await
            .unwrap();
    }

    let policies = res.policies();
    let mut names = policies.list("/admin/policies/tenant-a").await.unwrap();
    names.sort();
    assert_eq!(names, vec!["ns1", "ns2", "ns3"]);

    let leaf = policies.list("/admin/policies/tenant-a/ns1").await;
    assert!(leaf.unwrap().is_empty());
    assert!(res.list_namespaces("tenant-c").await.unwrap().is_empty());
}

#[tokio::test]
async fn stale_version_write_is_rejected_and_value_kept() {
    let h = harness(Duration::from_secs(5));
    let policies = h.resources.policies();
    let path = "/admin/policies/tenant-a/ns1";
    let (c1, c2, c3) = (
        Policies::for_clusters(["c1"]),
        Policies::for_clusters(["c2"]),
        Policies::for_clusters(["c3"]),
    );

    let v0 = policies.put(path, &c1, None).await.unwrap();
    let v1 = policies.put(path, &c2, Some(v0)).await.unwrap();
    assert_eq!(v1, v0.next());

    let err = policies.put(path, &c3, Some(v0)).await.unwrap_err();
    assert!(err.is_version_conflict(), "{err}");
    assert_eq!(err.path(), Some(path));

    let (stored, stat) = policies.get_with_stat(path).await.unwrap().unwrap();
    assert_eq!(stored, c2);
    assert_eq!(stat.version, v1);
}

#[tokio::test]
async fn isolation_policies_view_reflects_stored_map() {
    let h = harness(Duration::from_secs(5));
    let isolation = h.resources.isolation_policies();
    let path = "/admin/clusters/us-west/namespaceIsolationPolicies";

    assert!(isolation.get_policies(path).await.unwrap().is_none());

    isolation
        .set_isolation_data_with_create("us-west", |mut map| {
            map.insert("policy1".into(), isolation_data());
            map
        })
        .await
        .unwrap();

    let view = isolation.get_policies(path).await.unwrap().unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view.get_policy_by_name("policy1"), Some(&isolation_data()));
    assert!(h.configuration.exists(path).await.unwrap());
    assert!(!h.local.exists(path).await.unwrap());
}

#[tokio::test]
async fn local_and_configuration_stores_are_isolated() {
    let h = harness(Duration::from_secs(5));
    let res = &h.resources;
    let n = ns("tenant-a/ns1");

    let overrides = LocalPolicies {
        migrated: true,
        ..LocalPolicies::default()
    };
    let local_policies = res.local_policies();
    local_policies
        .create_local_policies(&n, &overrides)
        .await
        .unwrap();

    // Nothing leaks into the configuration store.
    let local_path = "/admin/local-policies/tenant-a/ns1";
    assert!(!h.configuration.exists(local_path).await.unwrap());
    assert_eq!(res.get_policies(&n).await.unwrap(), None);

    res.create_policies(&n, &Policies::default()).await.unwrap();
    let policies_path = "/admin/policies/tenant-a/ns1";
    assert!(!h.local.exists(policies_path).await.unwrap());

    let topic = TopicName::new(TopicDomain::Persistent, n.clone(), "orders").unwrap();
    let metadata = PartitionedTopicMetadata::new(3);
    let topics = res.partitioned_topic_resources();
    topics
        .create_partitioned_topic(&topic, &metadata)
        .await
        .unwrap();
    let topic_path = "/admin/partitioned-topics/tenant-a/ns1/persistent/orders";
    assert!(h.configuration.exists(topic_path).await.unwrap());
    assert!(!h.local.exists("/admin/partitioned-topics").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn concurrent_conditional_writes_have_one_winner() {
    let h = harness(Duration::from_secs(5));
    let policies = h.resources.policies();
    let path = "/admin/policies/tenant-a/ns1";
    let initial = Policies::default();
    let v0 = policies.put(path, &initial, None).await.unwrap();

    // Both writes park in the store before touching the tree.
    h.configuration.set_latency(Some(Duration::from_millis(1)));
    let first = Policies::for_clusters(["a"]);
    let second = Policies::for_clusters(["b"]);
    let (r1, r2) = tokio::join!(
        policies.put(path, &first, Some(v0)),
        policies.put(path, &second, Some(v0)),
    );

    let (winner, loser) = match (r1, r2) {
        (Ok(_), Err(e)) => (first, e),
        (Err(e), Ok(_)) => (second, e),
        other => panic!("expected exactly one winner: {other:?}"),
    };
    assert!(loser.is_version_conflict(), "{loser}");
    assert_eq!(policies.get(path).await.unwrap(), Some(winner));
}

#[tokio::test(start_paused = true)]
async fn racing_read_modify_writes_conflict() {
    let h = harness(Duration::from_secs(5));
    let res = &h.resources;
    let n = ns("tenant-a/ns1");
    res.create_policies(&n, &Policies::default()).await.unwrap();

    // Both reads complete before either write lands.
    h.configuration.set_latency(Some(Duration::from_millis(1)));
    let (r1, r2) = tokio::join!(
        res.set_policies(&n, |p| Policies {
            encryption_required: true,
            ..p
        }),
        res.set_policies(&n, |p| Policies {
            deduplication_enabled: Some(true),
            ..p
        }),
    );

    let (encryption_won, loser) = match (r1, r2) {
        (Ok(_), Err(e)) => (true, e),
        (Err(e), Ok(_)) => (false, e),
        other => panic!("expected exactly one winner: {other:?}"),
    };
    assert!(loser.is_version_conflict(), "{loser}");

    let stored = res.get_policies(&n).await.unwrap().unwrap();
    assert_eq!(stored.encryption_required, encryption_won);
    let dedup = (!encryption_won).then_some(true);
    assert_eq!(stored.deduplication_enabled, dedup);
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out_as_unavailable() {
    let h = harness(Duration::from_secs(2));
    let n = ns("tenant-a/ns1");
    h.configuration.set_latency(Some(Duration::from_secs(10)));

    let err = h.resources.get_policies(&n).await.unwrap_err();
    match &err {
        ResourceError::StoreUnavailable {
            cause: UnavailableCause::Timeout(d),
            path,
            ..
        } => {
            assert_eq!(*d, Duration::from_secs(2));
            assert_eq!(path, "/admin/policies/tenant-a/ns1");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The local store is unaffected.
    let local = h.resources.local_policies().get_local_policies(&n).await;
    assert!(local.unwrap().is_none());
}

#[tokio::test]
async fn transport_failure_is_unavailable() {
    let h = harness(Duration::from_secs(5));
    let n = ns("tenant-a/ns1");
    h.local.fail_next(1);

    let local_policies = h.resources.local_policies();
    let err = local_policies
        .create_local_policies(&n, &LocalPolicies::default())
        .await
        .unwrap_err();
    assert!(err.is_store_unavailable(), "{err}");
}

#[tokio::test]
async fn malformed_document_is_a_deserialization_error() {
    let h = harness(Duration::from_secs(5));
    let path = "/admin/policies/tenant-a/ns1";
    h.configuration.put(path, b"not json", None).await.unwrap();

    let n = ns("tenant-a/ns1");
    let err = h.resources.get_policies(&n).await.unwrap_err();
    let malformed = matches!(err, ResourceError::Deserialization { .. });
    assert!(malformed, "{err}");
}

#[tokio::test]
async fn creating_twice_is_already_exists() {
    let h = harness(Duration::from_secs(5));
    let res = &h.resources;
    let n = ns("tenant-a/ns1");

    let v = res.create_policies(&n, &Policies::default()).await.unwrap();
    assert_eq!(v, Version::INITIAL);
    let err = res.create_policies(&n, &Policies::default()).await;
    assert!(matches!(err, Err(ResourceError::AlreadyExists { .. })));
}

#[tokio::test]
async fn writes_notify_store_listeners() {
    let h = harness(Duration::from_secs(5));
    let mut rx = h.configuration.register_listener();
    let n = ns("tenant-a/ns1");
    let policies = Policies::default();
    h.resources.create_policies(&n, &policies).await.unwrap();

    let mut created = Vec::new();
    while let Ok(n) = rx.try_recv() {
        if n.notification_type == NotificationType::Created {
            created.push(n.path);
        }
    }
    assert!(created.iter().any(|p| p == "/admin/policies/tenant-a/ns1"));
}

#[tokio::test]
async fn config_drives_operation_timeout() {
    let config = ResourcesConfig {
        operation_timeout_secs: 7,
        ..ResourcesConfig::default()
    };
    let store: Arc<dyn MetadataStore> = Arc::new(MemoryMetadataStore::new());
    let stores = StoreBindings::shared(store);
    let resources = NamespaceResources::from_config(stores, &config).unwrap();

    let seven = Duration::from_secs(7);
    assert_eq!(resources.operation_timeout(), seven);
    let topics = resources.partitioned_topic_resources();
    assert_eq!(topics.operation_timeout(), seven);
}
