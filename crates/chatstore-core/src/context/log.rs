//! Append-only activity log attached to a context.

use serde_json::{Map, Value};

/// Number of most recent log items kept when a context is persisted.
pub const DEFAULT_LOG_WINDOW: usize = 1000;

/// One entry of the activity log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogItem {
    /// Position in the log
    pub no: usize,
    /// Item kind ("user", "agent", "tool", "info", ...)
    pub item_type: String,
    pub heading: String,
    pub content: String,
    /// Ordered key-value payload
    pub kvps: Option<Map<String, Value>>,
    /// Transient items are replaced by the next update and never drive progress
    pub temp: bool,
}

/// Activity log with progress counters used by pollers.
///
/// Every append pushes an update marker; a poller that remembers
/// [`Log::version`] can ask for [`Log::updates_since`] and get nothing back
/// when nothing changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    pub guid: String,
    items: Vec<LogItem>,
    updates: Vec<usize>,
    progress: String,
    progress_no: usize,
}

impl Log {
    pub fn new() -> Self {
        Self::with_guid(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_guid(guid: impl Into<String>) -> Self {
        let mut log = Self {
            guid: guid.into(),
            items: Vec::new(),
            updates: Vec::new(),
            progress: String::new(),
            progress_no: 0,
        };
        log.set_initial_progress();
        log
    }

    /// Appends an item and returns its index.
    pub fn log(
        &mut self,
        item_type: impl Into<String>,
        heading: impl Into<String>,
        content: impl Into<String>,
        kvps: Option<Map<String, Value>>,
        temp: bool,
    ) -> usize {
        let no = self.items.len();
        self.push(LogItem {
            no,
            item_type: item_type.into(),
            heading: heading.into(),
            content: content.into(),
            kvps,
            temp,
        });
        no
    }

    /// Appends a fully built item, renumbering it to the next index.
    pub fn push(&mut self, mut item: LogItem) {
        item.no = self.items.len();
        if !item.temp && !item.heading.is_empty() {
            self.progress = item.heading.clone();
            self.progress_no = item.no;
        }
        self.updates.push(item.no);
        self.items.push(item);
    }

    /// Appends a restored item without touching the progress counters.
    pub fn replay(&mut self, mut item: LogItem) {
        item.no = self.items.len();
        self.updates.push(item.no);
        self.items.push(item);
    }

    pub fn set_initial_progress(&mut self) {
        self.progress = String::new();
        self.progress_no = 0;
    }

    pub fn items(&self) -> &[LogItem] {
        &self.items
    }

    /// The last `window` items, oldest first.
    pub fn tail(&self, window: usize) -> &[LogItem] {
        let start = self.items.len().saturating_sub(window);
        &self.items[start..]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn progress(&self) -> &str {
        &self.progress
    }

    pub fn progress_no(&self) -> usize {
        self.progress_no
    }

    /// Number of update markers recorded so far.
    pub fn version(&self) -> usize {
        self.updates.len()
    }

    /// Item indices updated after the poller's last seen `version`.
    pub fn updates_since(&self, version: usize) -> &[usize] {
        self.updates.get(version..).unwrap_or(&[])
    }
}

impl Default for Log {
    fn default() -> Self {
        Self::new()
    }
}
