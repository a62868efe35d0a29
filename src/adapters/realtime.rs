//! Change feed for the remote backend.
//!
//! A listener polls the table and diffs consecutive snapshots by id: new ids
//! are inserts, changed rows are updates, vanished ids are deletes. The first
//! snapshot only establishes the baseline.

use crate::domain::events::{
    ChangeCallback, ChangeEvent, ChangeKind, Subscription, SubscriptionState,
};
use crate::domain::table::Table;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Full-table reads the change feed diffs against.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self, table: Table) -> Result<Vec<Value>>;
}

#[derive(Clone)]
pub struct ChangeFeed {
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
}

impl ChangeFeed {
    pub fn new(source: Arc<dyn SnapshotSource>, interval: Duration) -> Self {
        Self { source, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn subscribe(&self, table: Table, callback: ChangeCallback) -> Subscription {
        let source = self.source.clone();
        let interval = self.interval;
        tracing::debug!(table = %table, interval_ms = interval.as_millis() as u64, "attaching change feed");
        Subscription::spawn(table.as_str(), move |state| {
            listen(source, table, interval, state, callback)
        })
    }
}

async fn listen(
    source: Arc<dyn SnapshotSource>,
    table: Table,
    interval: Duration,
    state: Arc<SubscriptionState>,
    callback: ChangeCallback,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut known: Option<BTreeMap<String, Value>> = None;

    loop {
        ticker.tick().await;
        if !state.is_active() {
            break;
        }

        let rows = match source.snapshot(table).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "change feed poll failed");
                continue;
            }
        };
        let current = by_id(table, rows);

        if let Some(previous) = &known {
            for event in diff(table, previous, &current) {
                if !state.deliver(&callback, event) {
                    return;
                }
            }
        }
        known = Some(current);
    }
}

fn by_id(table: Table, rows: Vec<Value>) -> BTreeMap<String, Value> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get(table.id_column())?.as_str()?.to_string();
            Some((id, row))
        })
        .collect()
}

pub(crate) fn diff(
    table: Table,
    previous: &BTreeMap<String, Value>,
    current: &BTreeMap<String, Value>,
) -> Vec<ChangeEvent> {
    let event = |event_type, record: &Value| ChangeEvent {
        table: table.as_str().to_string(),
        event_type,
        record: record.clone(),
    };

    let mut events = Vec::new();
    for (id, row) in current {
        match previous.get(id) {
            None => events.push(event(ChangeKind::Insert, row)),
            Some(before) if before != row => events.push(event(ChangeKind::Update, row)),
            Some(_) => {}
        }
    }
    for (id, row) in previous {
        if !current.contains_key(id) {
            events.push(event(ChangeKind::Delete, row));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Serves queued snapshots in order, then repeats the last one.
    struct ScriptedSource {
        snapshots: Mutex<VecDeque<Vec<Value>>>,
        last: Mutex<Vec<Value>>,
    }

    impl ScriptedSource {
        fn new(snapshots: Vec<Vec<Value>>) -> Self {
            Self {
                snapshots: Mutex::new(snapshots.into()),
                last: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SnapshotSource for ScriptedSource {
        async fn snapshot(&self, _table: Table) -> Result<Vec<Value>> {
            let next = self.snapshots.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(next) = next {
                *last = next;
            }
            Ok(last.clone())
        }
    }

    #[test]
    fn test_diff_classifies_changes() {
        let before = by_id(
            Table::Children,
            vec![
                json!({"child_id": "c1", "first_name": "Ann"}),
                json!({"child_id": "c2", "first_name": "Ben"}),
            ],
        );
        let after = by_id(
            Table::Children,
            vec![
                json!({"child_id": "c1", "first_name": "Anne"}),
                json!({"child_id": "c3", "first_name": "Cal"}),
            ],
        );

        let kinds: Vec<(ChangeKind, String)> = diff(Table::Children, &before, &after)
            .into_iter()
            .map(|e| (e.event_type, e.record["child_id"].as_str().unwrap().to_string()))
            .collect();

        assert_eq!(
            kinds,
            vec![
                (ChangeKind::Update, "c1".to_string()),
                (ChangeKind::Insert, "c3".to_string()),
                (ChangeKind::Delete, "c2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_feed_delivers_insert_update_delete() {
        let source = Arc::new(ScriptedSource::new(vec![
            vec![],
            vec![json!({"child_id": "c1", "first_name": "Ann"})],
            vec![json!({"child_id": "c1", "first_name": "Anne"})],
            vec![],
        ]));
        let feed = ChangeFeed::new(source, Duration::from_millis(5));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = feed.subscribe(
            Table::Children,
            Arc::new(move |event: ChangeEvent| {
                let _ = tx.send(event);
            }),
        );

        let mut kinds = Vec::new();
        for _ in 0..3 {
            let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("change event")
                .expect("channel open");
            assert_eq!(event.table, "children");
            kinds.push(event.event_type);
        }
        assert_eq!(
            kinds,
            vec![ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]
        );

        subscription.unsubscribe();
        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_no_events_after_unsubscribe() {
        let source = Arc::new(ScriptedSource::new(vec![vec![]]));
        let feed = ChangeFeed::new(source.clone(), Duration::from_millis(5));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = feed.subscribe(
            Table::Households,
            Arc::new(move |event: ChangeEvent| {
                let _ = tx.send(event);
            }),
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        subscription.unsubscribe();

        source
            .snapshots
            .lock()
            .unwrap()
            .push_back(vec![json!({"household_id": "h1"})]);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(rx.try_recv().is_err());
    }
}
