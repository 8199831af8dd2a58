use std::io::ErrorKind;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pmeta_config::{Config, ConfigError, ConfigManager};
use pmeta_logging::LogConfig;
use pmeta_policies::{
    AutoFailoverPolicyData, LocalPolicies, NamespaceIsolationData, NamespaceName,
    PartitionedTopicMetadata, Policies, TopicDomain, TopicName,
};
use pmeta_resources::{NamespaceResources, ResourcesConfig, StoreBindings};
use pmeta_store::MetadataStore;
use pmeta_store_backends::MemoryMetadataStore;

/// Namespace resources demo
///
/// Builds a local and a configuration store in memory, wires them to the
/// namespace resources, writes one of each resource and reads it back.
#[derive(Parser, Debug)]
#[command(name = "pmeta-resources-demo", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "pmeta-resources-demo.toml")]
    config: String,

    /// Namespace to populate
    #[arg(short, long, default_value = "public/default")]
    namespace: String,

    /// Dump default configuration and exit
    #[arg(long)]
    dump_default_config: bool,
}

/// `[log]` and `[resources]` sections of the demo config file.
#[derive(Debug, Clone, Default)]
struct DemoConfig {
    log: LogConfig,
    resources: ResourcesConfig,
}

impl Config for DemoConfig {
    fn from_toml(value: &toml::Value) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(log) = value.get("log") {
            cfg.log = LogConfig::from_toml(log)?;
        }
        if let Some(resources) = value.get("resources") {
            cfg.resources = ResourcesConfig::from_toml(resources)?;
        }
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.log.validate()?;
        self.resources.validate()
    }

    fn hot_update(&mut self, other: &Self) {
        self.log.hot_update(&other.log);
        self.resources.hot_update(&other.resources);
    }

    fn render(&self) -> String {
        let mut table = toml::Table::new();
        table.insert("log".into(), self.log.to_table().into());
        table.insert("resources".into(), self.resources.to_table().into());
        table.to_string()
    }
}

fn load_config(path: &str) -> anyhow::Result<(DemoConfig, bool)> {
    match ConfigManager::<DemoConfig>::load(path) {
        Ok(mgr) => Ok((mgr.snapshot(), true)),
        Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            Ok((DemoConfig::default(), false))
        }
        Err(e) => Err(e).with_context(|| format!("loading {path}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.dump_default_config {
        print!("{}", DemoConfig::default().render());
        return Ok(());
    }

    let (config, from_file) = load_config(&args.config)?;
    let _guard = pmeta_logging::init_logging(&config.log)?;
    if from_file {
        tracing::info!(config = %args.config, "Starting namespace resources demo");
    } else {
        tracing::warn!(config = %args.config, "Config file not found, using defaults");
    }

    let ns: NamespaceName = args
        .namespace
        .parse()
        .with_context(|| format!("invalid namespace {:?}", args.namespace))?;

    let local: Arc<dyn MetadataStore> = Arc::new(MemoryMetadataStore::new());
    let configuration: Arc<dyn MetadataStore> = Arc::new(MemoryMetadataStore::new());
    let stores = StoreBindings::new(local, configuration);
    let resources = NamespaceResources::from_config(stores, &config.resources)?;

    let cluster = config.resources.cluster_name.as_str();
    populate(&resources, &ns, cluster).await?;
    report(&resources, &ns, cluster).await?;

    resources.close().await?;
    tracing::info!("Namespace resources demo finished");
    Ok(())
}

async fn populate(
    resources: &NamespaceResources,
    ns: &NamespaceName,
    cluster: &str,
) -> anyhow::Result<()> {
    let mut policies = Policies::for_clusters([cluster]);
    policies.message_ttl_in_seconds = Some(3600);
    resources.create_policies(ns, &policies).await?;

    resources
        .local_policies()
        .set_local_policies_with_create(ns, |lp: Option<LocalPolicies>| lp.unwrap_or_default())
        .await?;

    let isolation = NamespaceIsolationData {
        namespaces: vec![format!("{}/.*", ns.tenant())],
        primary: vec![format!("{cluster}-broker-[0-9]+")],
        secondary: Vec::new(),
        auto_failover_policy: AutoFailoverPolicyData::min_available(1, 80),
    };
    isolation.validate()?;
    resources
        .isolation_policies()
        .set_isolation_data_with_create(cluster, |mut map| {
            map.insert(format!("{}-isolation", ns.tenant()), isolation);
            map
        })
        .await?;

    let topic = TopicName::new(TopicDomain::Persistent, ns.clone(), "demo-topic")?;
    resources
        .partitioned_topic_resources()
        .create_partitioned_topic(&topic, &PartitionedTopicMetadata::new(4))
        .await?;
    Ok(())
}

async fn report(
    resources: &NamespaceResources,
    ns: &NamespaceName,
    cluster: &str,
) -> anyhow::Result<()> {
    let policies = resources.get_policies(ns).await?;
    tracing::info!(namespace = %ns, ?policies, "namespace policies");

    let local = resources.local_policies().get_local_policies(ns).await?;
    tracing::info!(namespace = %ns, ?local, "local policies");

    if let Some(view) = resources
        .isolation_policies()
        .get_isolation_data_policies(cluster)
        .await?
    {
        for (name, data) in view.policies() {
            tracing::info!(cluster, policy = %name, ?data, "isolation policy");
        }
    }

    let topics = resources
        .partitioned_topic_resources()
        .list_partitioned_topics(ns, TopicDomain::Persistent)
        .await?;
    for topic in &topics {
        let metadata = resources
            .partitioned_topic_resources()
            .get_partitioned_topic_metadata(topic)
            .await?;
        tracing::info!(topic = %topic, ?metadata, "partitioned topic");
    }

    let count = resources.list_namespaces(ns.tenant()).await?.len();
    tracing::info!(tenant = ns.tenant(), count, "namespaces listed");
    Ok(())
}
