use clap::{Parser, Subcommand};
use drydock_core::{ClusterSpec, InstanceGroup, ValidationReport};
use drydock_validator::{
    ClusterSnapshot, ClusterValidator, HostResolver, SnapshotInventory, SnapshotOrchestrator,
    StaticResolver, SystemResolver,
};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "drydock", about = "Drydock fleet topology auditor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a cluster snapshot against its desired topology
    Validate {
        /// Cluster descriptor manifest (YAML)
        #[arg(long)]
        cluster: PathBuf,
        /// Instance group list manifest (YAML)
        #[arg(long)]
        instance_groups: PathBuf,
        /// Observed-state snapshot: cloud groups, nodes, pods (YAML)
        #[arg(long)]
        snapshot: PathBuf,
        /// Static DNS entry host=ip (repeatable); system resolver when absent
        #[arg(long = "resolve", value_name = "HOST=IP")]
        resolve: Vec<String>,
        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            cluster,
            instance_groups,
            snapshot,
            resolve,
            pretty,
        } => run_validate(&cluster, &instance_groups, &snapshot, &resolve, pretty).await,
    }
}

/// Run one validation pass and print the report as JSON
async fn run_validate(
    cluster_path: &Path,
    groups_path: &Path,
    snapshot_path: &Path,
    resolve: &[String],
    pretty: bool,
) -> miette::Result<()> {
    let cluster: ClusterSpec = load_manifest(cluster_path)?;
    let instance_groups: Vec<InstanceGroup> = load_manifest(groups_path)?;
    let snapshot: ClusterSnapshot = load_manifest(snapshot_path)?;

    info!(
        cluster = %cluster.name,
        groups = instance_groups.len(),
        "validating cluster snapshot"
    );

    let resolver: Arc<dyn HostResolver> = if resolve.is_empty() {
        Arc::new(SystemResolver)
    } else {
        Arc::new(parse_resolver_entries(resolve)?)
    };

    let validator = ClusterValidator::new(
        cluster,
        instance_groups,
        Arc::new(SnapshotInventory::new(snapshot.cloud_groups)),
        Arc::new(SnapshotOrchestrator::new(snapshot.nodes, snapshot.pods)),
        resolver,
        None,
        None,
    )
    .map_err(|e| miette::miette!("{}", e))?;

    // Ctrl-C aborts the run; a canceled run yields no report
    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; canceling validation");
            ctrl_c_token.cancel();
        }
    });

    let report = validator
        .validate(token)
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    let json = if pretty {
        drydock_core::to_json_pretty(&report)
    } else {
        drydock_core::to_json(&report)
    }
    .map_err(|e| miette::miette!("{}", e))?;
    println!("{}", json);

    if !report.is_healthy() {
        report_failure_summary(&report);
        std::process::exit(2);
    }

    info!("cluster validated clean");
    Ok(())
}

/// Load a YAML manifest from disk
fn load_manifest<T: for<'de> serde::Deserialize<'de>>(path: &Path) -> miette::Result<T> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read manifest '{}': {}", path.display(), e))?;
    drydock_core::from_yaml(&data)
        .map_err(|e| miette::miette!("Failed to parse manifest '{}': {}", path.display(), e))
}

/// Parse repeated `host=ip` flags into a static resolver
fn parse_resolver_entries(entries: &[String]) -> miette::Result<StaticResolver> {
    let mut resolver = StaticResolver::new();
    for entry in entries {
        let (host, ip) = entry
            .split_once('=')
            .ok_or_else(|| miette::miette!("Invalid --resolve entry '{}': expected HOST=IP", entry))?;
        let address: IpAddr = ip
            .parse()
            .map_err(|e| miette::miette!("Invalid address in --resolve entry '{}': {}", entry, e))?;
        resolver = resolver.with_entry(host, vec![address]);
    }
    Ok(resolver)
}

/// Log each failure so the summary survives when stdout is piped to a file
fn report_failure_summary(report: &ValidationReport) {
    for failure in &report.failures {
        warn!(kind = %failure.kind, subject = %failure.name, "{}", failure.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drydock_core::{DnsMode, GroupRole};
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_cluster_manifest() {
        let file = write_temp(
            "name: test.example.com\ndnsMode: gossip\napiHost: https://api.test.example.com\n",
        );
        let cluster: ClusterSpec = load_manifest(file.path()).unwrap();
        assert_eq!(cluster.name, "test.example.com");
        assert_eq!(cluster.dns_mode, DnsMode::Gossip);
    }

    #[test]
    fn test_load_instance_groups_manifest() {
        let file = write_temp(
            "- name: control-plane-a\n  role: control-plane\n  minSize: 1\n- name: workers\n  role: node\n  minSize: 3\n",
        );
        let groups: Vec<InstanceGroup> = load_manifest(file.path()).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].role, GroupRole::ControlPlane);
    }

    #[test]
    fn test_load_snapshot_manifest() {
        let file = write_temp(
            "cloudGroups:\n  - name: workers\n    targetSize: 2\n    ready:\n      - id: i-1\n        nodeName: node-1\n",
        );
        let snapshot: ClusterSnapshot = load_manifest(file.path()).unwrap();
        assert_eq!(snapshot.cloud_groups.len(), 1);
        assert!(snapshot.nodes.is_empty());
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let result: miette::Result<ClusterSpec> =
            load_manifest(Path::new("/nonexistent/cluster.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_resolver_entries() {
        let resolver = parse_resolver_entries(&[
            "api.test.example.com=192.0.2.10".to_string(),
        ])
        .unwrap();
        // resolved through the trait to prove the table entry landed
        let addrs = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(resolver.resolve("api.test.example.com"))
            .unwrap();
        assert_eq!(addrs, vec!["192.0.2.10".parse::<IpAddr>().unwrap()]);
    }

    #[test]
    fn test_bad_resolver_entry_is_rejected() {
        assert!(parse_resolver_entries(&["no-equals-sign".to_string()]).is_err());
        assert!(parse_resolver_entries(&["host=not-an-ip".to_string()]).is_err());
    }
}
