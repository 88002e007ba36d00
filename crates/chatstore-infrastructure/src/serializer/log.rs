//! Activity-log flattening and rebuilding.

use crate::dto::{LogItemRecord, LogRecord};
use chatstore_core::context::{Log, LogItem};

/// Flattens the last `window` items, reindexed from 0.
pub fn flatten_log(log: &Log, window: usize) -> LogRecord {
    LogRecord {
        guid: Some(log.guid.clone()),
        logs: log
            .tail(window)
            .iter()
            .enumerate()
            .map(|(index, item)| LogItemRecord {
                index,
                item_type: item.item_type.clone(),
                heading: item.heading.clone(),
                content: item.content.clone(),
                kvps: item.kvps.clone(),
                temp: item.temp,
            })
            .collect(),
        progress: log.progress().to_string(),
        progress_no: log.progress_no(),
    }
}

/// Replays persisted items into a fresh log.
///
/// Progress counters start from their initial state; every item gets one
/// update marker. A record without a guid gets a fresh one.
pub fn rebuild_log(record: Option<LogRecord>) -> Log {
    let Some(record) = record else {
        return Log::new();
    };

    let mut log = match record.guid {
        Some(guid) => Log::with_guid(guid),
        None => Log::new(),
    };
    log.set_initial_progress();

    for item in record.logs {
        log.replay(LogItem {
            no: item.index,
            item_type: item.item_type,
            heading: item.heading,
            content: item.content,
            kvps: item.kvps.filter(|kvps| !kvps.is_empty()),
            temp: item.temp,
        });
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filled(count: usize) -> Log {
        let mut log = Log::with_guid("guid-1");
        for i in 0..count {
            log.log("info", format!("h{}", i), format!("c{}", i), None, false);
        }
        log
    }

    #[test]
    fn test_window_keeps_most_recent_reindexed() {
        let record = flatten_log(&filled(1500), 1000);
        assert_eq!(record.logs.len(), 1000);
        assert_eq!(record.logs[0].heading, "h500");
        assert_eq!(record.logs[999].heading, "h1499");
        assert!(record.logs.iter().enumerate().all(|(i, item)| item.index == i));
    }

    #[test]
    fn test_rebuild_replays_from_zero() {
        let record = flatten_log(&filled(3), 2);
        let log = rebuild_log(Some(record));
        assert_eq!(log.guid, "guid-1");
        assert_eq!(log.len(), 2);
        assert_eq!(log.items()[0].no, 0);
        assert_eq!(log.items()[0].heading, "h1");
        assert_eq!(log.version(), 2);
        assert_eq!(log.progress(), "");
        assert_eq!(log.progress_no(), 0);
    }

    #[test]
    fn test_missing_record_or_guid() {
        let log = rebuild_log(None);
        assert!(log.is_empty());
        assert!(!log.guid.is_empty());

        let log = rebuild_log(Some(LogRecord::default()));
        assert!(!log.guid.is_empty());
    }

    #[test]
    fn test_kvps_preserved() {
        let mut log = Log::with_guid("g");
        let kvps = json!({"tool": "search", "args": {"q": "x"}});
        log.log("tool", "Search", "", kvps.as_object().cloned(), false);

        let rebuilt = rebuild_log(Some(flatten_log(&log, 10)));
        assert_eq!(rebuilt.items()[0].kvps.as_ref(), kvps.as_object());
    }
}
