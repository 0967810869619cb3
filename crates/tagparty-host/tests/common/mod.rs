use std::time::Duration;

use tokio::sync::mpsc;

use tagparty_core::mode_trait::PlayerId;
use tagparty_host::{ReplicaPeer, SessionBroadcast};

pub const WAIT: Duration = Duration::from_secs(5);

/// Feed broadcasts into `peer` until `done` holds, panicking after `WAIT`.
/// Returns every broadcast seen on the way.
pub async fn pump_until(
    rx: &mut mpsc::UnboundedReceiver<SessionBroadcast>,
    peer: &mut ReplicaPeer,
    mut done: impl FnMut(&ReplicaPeer) -> bool,
) -> Vec<SessionBroadcast> {
    let mut seen = Vec::new();
    let result = tokio::time::timeout(WAIT, async {
        while !done(peer) {
            let Some(msg) = rx.recv().await else {
                panic!("session closed before condition was met");
            };
            if let SessionBroadcast::Snapshot { .. } = msg {
                peer.apply(&msg).expect("snapshot should apply");
            }
            seen.push(msg);
        }
    })
    .await;
    assert!(result.is_ok(), "condition not met within {WAIT:?}");
    seen
}

/// Drain until the session reports it has ended.
pub async fn drain_until_ended(rx: &mut mpsc::UnboundedReceiver<SessionBroadcast>) {
    let result = tokio::time::timeout(WAIT, async {
        while let Some(msg) = rx.recv().await {
            if matches!(msg, SessionBroadcast::Ended) {
                return true;
            }
        }
        false
    })
    .await;
    assert_eq!(result, Ok(true), "session should end with Ended");
}

/// Ids the replica renders with `material`.
pub fn with_material(peer: &ReplicaPeer, ids: &[PlayerId], material: u8) -> Vec<PlayerId> {
    ids.iter()
        .copied()
        .filter(|id| peer.material_index(*id) == material)
        .collect()
}
