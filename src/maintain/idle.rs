use std::time::Duration;

use crate::store::NodeStore;

pub async fn idle_check_loop(store: NodeStore, node_idle_time: Duration) {
    let period = (node_idle_time / 2).max(Duration::from_millis(10));
    loop {
        tokio::time::sleep(period).await;
        for node in store.remove_expired(node_idle_time) {
            log::info!("idle {} {}", node.name, node.addr);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_idle_check_loop() {
        let store = NodeStore::new();
        store.register("alpha", "10.0.0.1:1000".parse().unwrap(), None);
        let task = tokio::spawn(idle_check_loop(store.clone(), Duration::from_millis(30)));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.is_empty());
        task.abort();
    }
}
