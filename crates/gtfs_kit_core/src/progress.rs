/// Receives progress events while a feed is loaded.
pub trait ProgressHandler: Send + Sync {
    /// Called when a table is opened.
    fn on_start_table(&self, file: &str);

    /// Called when a table has been read completely.
    fn on_finish_table(&self, file: &str, rows: u64);

    /// Number of tables the parser will try to load.
    fn set_total_tables(&self, _count: usize) {}
}

/// A no-op progress handler
pub struct NoOpProgressHandler;

impl ProgressHandler for NoOpProgressHandler {
    fn on_start_table(&self, _file: &str) {}
    fn on_finish_table(&self, _file: &str, _rows: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ProgressHandler for Recorder {
        fn on_start_table(&self, file: &str) {
            self.events.lock().unwrap().push(format!("start {}", file));
        }

        fn on_finish_table(&self, file: &str, rows: u64) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finish {} {}", file, rows));
        }
    }

    #[test]
    fn table_count_hook_is_optional() {
        let recorder = Recorder::default();
        recorder.set_total_tables(16);
        recorder.on_start_table("stops.txt");
        recorder.on_finish_table("stops.txt", 2);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            ["start stops.txt", "finish stops.txt 2"]
        );
        NoOpProgressHandler.set_total_tables(16);
    }
}
