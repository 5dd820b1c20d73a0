//! Per-connection state
//!
//! Lives on the read half of the connection task; nothing here is shared, so
//! no locking.

use crate::db::users::User;
use crate::rooms::ConnId;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

/// Leading-edge throttle for upstream TTL refreshes.
///
/// The first trigger fires immediately; subsequent triggers are swallowed
/// until `interval` has elapsed since the last one that fired.
pub struct TtlThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl TtlThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Returns true when a refresh should be sent upstream now
    pub fn try_trigger(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// State carried by one WebSocket connection
pub struct ConnCtx {
    pub conn_id: ConnId,
    pub user: User,
    /// Room this connection has joined, if any
    pub session_id: Option<Uuid>,
    /// Media chunks received so far, keyed by client-assigned index
    upload_buf: BTreeMap<u32, Vec<u8>>,
    pub ttl: TtlThrottle,
}

impl ConnCtx {
    pub fn new(conn_id: ConnId, user: User, ttl_interval: Duration) -> Self {
        Self {
            conn_id,
            user,
            session_id: None,
            upload_buf: BTreeMap::new(),
            ttl: TtlThrottle::new(ttl_interval),
        }
    }

    pub fn buffer_chunk(&mut self, index: u32, bytes: Vec<u8>) {
        self.upload_buf.insert(index, bytes);
    }

    /// Assemble buffered chunks in index order and clear the buffer.
    ///
    /// Gaps are tolerated (the client may have dropped a chunk mid-recording)
    /// but logged, since the resulting media may be truncated.
    pub fn take_upload(&mut self) -> Vec<u8> {
        let buf = std::mem::take(&mut self.upload_buf);
        if let (Some(first), Some(last)) = (buf.keys().next(), buf.keys().next_back()) {
            let expected = (last - first + 1) as usize;
            if buf.len() != expected {
                warn!(
                    conn_id = %self.conn_id,
                    received = buf.len(),
                    expected,
                    "Upload has missing chunks, assembling anyway"
                );
            }
        }
        buf.into_values().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_fires_on_first_trigger() {
        let mut throttle = TtlThrottle::new(Duration::from_millis(100));
        assert!(throttle.try_trigger());
        assert!(!throttle.try_trigger());
    }

    #[test]
    fn throttle_fires_again_after_interval() {
        let mut throttle = TtlThrottle::new(Duration::from_millis(50));
        assert!(throttle.try_trigger());
        std::thread::sleep(Duration::from_millis(60));
        assert!(throttle.try_trigger());
    }

    #[test]
    fn throttle_swallows_triggers_within_interval() {
        let mut throttle = TtlThrottle::new(Duration::from_millis(200));
        assert!(throttle.try_trigger());
        for _ in 0..5 {
            std::thread::sleep(Duration::from_millis(10));
            assert!(!throttle.try_trigger());
        }
    }

    fn test_ctx() -> ConnCtx {
        let user = User {
            id: Uuid::new_v4(),
            name: "test".to_string(),
        };
        ConnCtx::new(Uuid::new_v4(), user, Duration::from_secs(300))
    }

    #[test]
    fn upload_assembles_chunks_in_index_order() {
        let mut ctx = test_ctx();
        ctx.buffer_chunk(2, vec![5, 6]);
        ctx.buffer_chunk(0, vec![1, 2]);
        ctx.buffer_chunk(1, vec![3, 4]);

        assert_eq!(ctx.take_upload(), vec![1, 2, 3, 4, 5, 6]);
        // Buffer is consumed
        assert!(ctx.take_upload().is_empty());
    }

    #[test]
    fn upload_with_gap_still_assembles() {
        let mut ctx = test_ctx();
        ctx.buffer_chunk(0, vec![1]);
        ctx.buffer_chunk(2, vec![3]);

        assert_eq!(ctx.take_upload(), vec![1, 3]);
    }
}
