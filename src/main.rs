use object_cluster::config::NodeConfig;
use object_cluster::server::router::router;
use object_cluster::server::state::AppState;
use object_cluster::topology::service::ClusterTopology;
use object_cluster::topology::types::NodeId;
use std::net::SocketAddr;
use std::path::PathBuf;

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} --config <path> [--bind <addr:port>] [--node-id <id>] [--verbose]",
        program
    );
    eprintln!("Example: {} --config config/node.example.json", program);
    eprintln!("Example: {} --bind 127.0.0.1:8000 --node-id node-a", program);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut bind_addr: Option<SocketAddr> = None;
    let mut node_id: Option<String> = None;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "--bind" | "--node-id" if i + 1 >= args.len() => usage(&args[0]),
            "--config" => {
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--node-id" => {
                node_id = Some(args[i + 1].clone());
                i += 2;
            }
            "--verbose" => {
                verbose = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    if config_path.is_none() && bind_addr.is_none() {
        usage(&args[0]);
    }

    tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let mut config = match &config_path {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    if let Some(bind) = bind_addr {
        config.node.bind = bind;
    }
    if let Some(id) = node_id {
        config.node.id = Some(id);
    }

    let local_id = config
        .node
        .id
        .clone()
        .map(NodeId)
        .unwrap_or_else(NodeId::new);

    tracing::info!("Starting node {} on {}", local_id, config.node.bind);
    tracing::info!(
        "{} peer(s), {} container(s) held locally",
        config.peers.len(),
        config.containers.len()
    );

    // 1. Topology and health probing:
    let topology = ClusterTopology::from_config(&config, local_id);
    topology.clone().start().await;

    // 2. Node state and HTTP router:
    let state = AppState::from_config(&config, topology.clone());
    let app = router(state);

    // 3. Periodic cluster view:
    let stats_topology = topology.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));

        loop {
            interval.tick().await;
            let alive = stats_topology.get_alive_members();
            tracing::info!("Cluster stats: {} alive node(s)", alive.len());
            for node in alive {
                let last_seen = node
                    .last_seen
                    .map(|at| format!("{:.1}s ago", at.elapsed().as_secs_f64()))
                    .unwrap_or_else(|| "never".to_string());
                tracing::debug!(
                    "  - {} http={} ({:?}, last seen {})",
                    node.id,
                    node.http_addr,
                    node.state,
                    last_seen
                );
            }
        }
    });

    // 4. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.node.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.node.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
