use std::net::SocketAddr;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::store::NodeStore;
use crate::transport::UdpTransport;

mod heartbeat;
mod idle;

pub use heartbeat::heartbeat_loop;
pub use idle::idle_check_loop;

/// Spawn the background maintenance loops. The caller owns cancellation.
pub(crate) fn start_task(
    transport: &UdpTransport,
    store: &NodeStore,
    server_addr: Option<SocketAddr>,
    heartbeat_interval: Duration,
    node_idle_time: Duration,
) -> JoinSet<()> {
    let mut join_set = JoinSet::new();
    if let Some(server_addr) = server_addr {
        join_set.spawn(heartbeat::heartbeat_loop(
            transport.clone(),
            server_addr,
            heartbeat_interval,
        ));
    }
    join_set.spawn(idle::idle_check_loop(store.clone(), node_idle_time));
    join_set
}
