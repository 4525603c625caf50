use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use super::types::{Node, NodeId, NodeState};
use crate::config::{HealthConfig, NodeConfig};

/// Liveness endpoint every node serves.
pub const ENDPOINT_HEALTH: &str = "/_cluster/health";

const PROBE_TIMEOUT: Duration = Duration::from_millis(1_000);

pub struct ClusterTopology {
    pub local_node: Node,
    /// Peers only; the local node is never stored here.
    pub members: Arc<DashMap<NodeId, Node>>,
    health: HealthConfig,
    http_client: reqwest::Client,
}

impl ClusterTopology {
    pub fn new(
        local_node: Node,
        peers: Vec<(NodeId, SocketAddr)>,
        health: HealthConfig,
    ) -> Arc<Self> {
        let members = Arc::new(DashMap::new());
        for (id, addr) in peers {
            if id == local_node.id {
                continue;
            }
            members.insert(id.clone(), Node::new(id, addr));
        }

        Arc::new(Self {
            local_node,
            members,
            health,
            http_client: reqwest::Client::new(),
        })
    }

    pub fn from_config(config: &NodeConfig, local_id: NodeId) -> Arc<Self> {
        let local_node = Node::new(local_id, config.node.bind);
        let peers = config
            .peers
            .iter()
            .map(|peer| (NodeId(peer.id.clone()), peer.addr))
            .collect();

        Self::new(local_node, peers, config.health.clone())
    }

    pub fn local_id(&self) -> &NodeId {
        &self.local_node.id
    }

    pub fn is_local(&self, id: &NodeId) -> bool {
        &self.local_node.id == id
    }

    /// Looks up any node, the local one included.
    pub fn get_member(&self, id: &NodeId) -> Option<Node> {
        if self.is_local(id) {
            return Some(self.local_node.clone());
        }
        self.members.get(id).map(|entry| entry.value().clone())
    }

    /// All peers ordered by node id.
    pub fn peers(&self) -> Vec<Node> {
        let mut peers: Vec<Node> = self
            .members
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        peers.sort_by(|a, b| a.id.cmp(&b.id));
        peers
    }

    /// Peers that are not known to be dead, ordered by node id.
    pub fn reachable_peers(&self) -> Vec<Node> {
        self.peers()
            .into_iter()
            .filter(|node| node.state != NodeState::Dead)
            .collect()
    }

    pub fn get_alive_members(&self) -> Vec<Node> {
        let mut alive = vec![self.local_node.clone()];
        alive.extend(
            self.peers()
                .into_iter()
                .filter(|node| node.state == NodeState::Alive),
        );
        alive
    }

    pub async fn start(self: Arc<Self>) {
        if self.members.is_empty() {
            info!("No peers configured, running as a single node");
            return;
        }

        let service = self.clone();
        tokio::spawn(async move {
            service.health_loop().await;
        });

        info!("Health probing started for {} peer(s)", self.members.len());
    }

    async fn health_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.health.interval());

        loop {
            interval.tick().await;

            for node in self.peers() {
                let ok = self.probe(&node).await;
                self.record_probe(&node.id, ok);
            }
        }
    }

    async fn probe(&self, node: &Node) -> bool {
        let url = format!("{}{}", node.base_url(), ENDPOINT_HEALTH);
        match self
            .http_client
            .get(url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!("Health probe to {} failed: {}", node.id, e);
                false
            }
        }
    }

    /// Applies one probe result to a peer and returns its resulting state.
    pub fn record_probe(&self, id: &NodeId, ok: bool) -> Option<NodeState> {
        let mut member = self.members.get_mut(id)?;
        let previous = member.state;

        if ok {
            member.failures = 0;
            member.last_seen = Some(Instant::now());
        } else {
            member.failures = member.failures.saturating_add(1);
        }
        member.state = next_state(member.failures, &self.health);

        if member.state != previous {
            match member.state {
                NodeState::Alive => info!("Node {} at {} is Alive again", member.id, member.http_addr),
                NodeState::Suspect => tracing::warn!(
                    "Node {} suspected ({} failed probes)",
                    member.id,
                    member.failures
                ),
                NodeState::Dead => tracing::warn!(
                    "Node {} declared DEAD ({} failed probes)",
                    member.id,
                    member.failures
                ),
            }
        }

        Some(member.state)
    }
}

/// State implied by a run of consecutive failed probes.
pub fn next_state(failures: u32, health: &HealthConfig) -> NodeState {
    if failures >= health.dead_after {
        NodeState::Dead
    } else if failures >= health.suspect_after {
        NodeState::Suspect
    } else {
        NodeState::Alive
    }
}
