use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::protocol::protocol_type::{HeartbeatType, MainType};
use crate::transport::UdpTransport;

/// Ping `server_addr` every `heartbeat_interval`. The payload is the send
/// time in unix milliseconds, big-endian.
pub async fn heartbeat_loop(
    transport: UdpTransport,
    server_addr: SocketAddr,
    heartbeat_interval: Duration,
) {
    let mut interval = tokio::time::interval(heartbeat_interval.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let payload = now_millis().to_be_bytes();
        if let Err(e) = transport
            .send(
                Some(server_addr),
                MainType::Heartbeat.into(),
                HeartbeatType::Ping.into(),
                &payload,
            )
            .await
        {
            log::warn!("heartbeat_request {server_addr} e={e:?}");
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
