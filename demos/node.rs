use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use env_logger::Env;
use p2p_overlay::config::EndpointConfig;
use p2p_overlay::error::*;
use p2p_overlay::protocol::protocol_type::MainType;
use p2p_overlay::Endpoint;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Listen local port
    #[arg(short, long, default_value_t = 0)]
    port: u16,
    /// Coordination server to send heartbeats to.
    /// example: --server 192.168.10.13:27182
    #[arg(short, long)]
    server: Option<SocketAddr>,
    /// Peer to greet once started.
    #[arg(long)]
    peer: Option<SocketAddr>,
    /// Shared key, 16 or 32 bytes.
    #[arg(short, long)]
    key: Option<String>,
    /// Admitted sources.
    /// example: --access 10.0.0.0/8,192.168.1.10-192.168.1.20
    #[arg(short, long)]
    access: Option<String>,
    /// Load settings from a JSON file instead of the flags above.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
pub async fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();
    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            serde_json::from_str(&json).map_err(|e| Error::InvalidArgument(e.to_string()))?
        }
        None => {
            let mut config = EndpointConfig::empty()
                .set_bind_addr(SocketAddr::from(([0, 0, 0, 0], args.port)))
                .set_heartbeat_interval(Duration::from_secs(5));
            if let Some(server) = args.server {
                config = config.set_server_addr(server);
            }
            if let Some(key) = args.key {
                config = config.set_key(key);
            }
            if let Some(access) = args.access {
                config = config.set_access_list(access);
            }
            config
        }
    };
    let endpoint = Endpoint::new(config).await?;
    log::info!("listen {}", endpoint.local_addr()?);
    if let Some(peer) = args.peer {
        endpoint
            .send_to(peer, MainType::P2P.into(), 0, b"hello")
            .await?;
    }
    loop {
        tokio::select! {
            rs = endpoint.recv_from() => {
                let datagram = rs?;
                log::info!(
                    "recv {} {:?} sub={} {:?}",
                    datagram.addr(),
                    MainType::from(datagram.main_type()),
                    datagram.sub_type(),
                    String::from_utf8_lossy(datagram.payload())
                );
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("ctrl-c, shutdown");
                endpoint.shutdown()?;
                return Ok(());
            }
        }
    }
}
