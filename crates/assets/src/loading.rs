use serde::Serialize;

/// Snapshot of loading progress after an item started or ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub url: String,
    pub loaded: usize,
    pub total: usize,
}

impl Progress {
    /// Fraction of items finished, in [0, 1].
    pub fn ratio(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.loaded as f32 / self.total as f32
        }
    }
}

/// Notification produced by the [`LoadingManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Progress(Progress),
    /// Every registered item has ended. Produced at most once per manager.
    AllLoaded,
}

/// Tracks outstanding fetches against a shared item counter.
///
/// Loaders register each fetch with [`item_start`](Self::item_start) and close
/// it with [`item_end`](Self::item_end) or [`item_error`](Self::item_error).
/// A failed item still ends; there is no retry.
#[derive(Debug, Default)]
pub struct LoadingManager {
    loaded: usize,
    total: usize,
    completed: bool,
}

impl LoadingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_start(&mut self, url: &str) -> Notice {
        self.total += 1;
        tracing::debug!(url, loaded = self.loaded, total = self.total, "item started");
        Notice::Progress(self.progress(url))
    }

    /// Close an item. Returns its progress notice and, when it was the last
    /// outstanding item and completion has not fired yet, [`Notice::AllLoaded`].
    pub fn item_end(&mut self, url: &str) -> Vec<Notice> {
        if self.loaded < self.total {
            self.loaded += 1;
        } else {
            tracing::warn!(url, "item ended without a matching start");
        }
        tracing::debug!(url, loaded = self.loaded, total = self.total, "item ended");

        let mut notices = vec![Notice::Progress(self.progress(url))];
        if self.loaded == self.total && !self.completed {
            self.completed = true;
            tracing::info!(total = self.total, "all items loaded");
            notices.push(Notice::AllLoaded);
        }
        notices
    }

    pub fn item_error(&mut self, url: &str, reason: &str) -> Vec<Notice> {
        tracing::error!(url, reason, "failed to load item");
        self.item_end(url)
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    fn progress(&self, url: &str) -> Progress {
        Progress {
            url: url.to_string(),
            loaded: self.loaded,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_loaded_count(notices: &[Notice]) -> usize {
        notices.iter().filter(|n| **n == Notice::AllLoaded).count()
    }

    #[test]
    fn start_reports_progress() {
        let mut mgr = LoadingManager::new();
        let notice = mgr.item_start("Model/spider.glb");
        assert_eq!(
            notice,
            Notice::Progress(Progress {
                url: "Model/spider.glb".into(),
                loaded: 0,
                total: 1,
            })
        );
    }

    #[test]
    fn completion_fires_after_last_item() {
        let mut mgr = LoadingManager::new();
        mgr.item_start("a");
        mgr.item_start("b");

        let first = mgr.item_end("a");
        assert_eq!(all_loaded_count(&first), 0);
        assert!(!mgr.is_complete());

        let second = mgr.item_end("b");
        assert_eq!(all_loaded_count(&second), 1);
        assert!(mgr.is_complete());
    }

    #[test]
    fn completion_fires_exactly_once() {
        let mut mgr = LoadingManager::new();
        mgr.item_start("a");
        let mut fired = all_loaded_count(&mgr.item_end("a"));

        mgr.item_start("late");
        fired += all_loaded_count(&mgr.item_end("late"));
        assert_eq!(fired, 1);
    }

    #[test]
    fn errors_still_end_the_item() {
        let mut mgr = LoadingManager::new();
        mgr.item_start("missing.png");
        let notices = mgr.item_error("missing.png", "not found");
        assert_eq!(all_loaded_count(&notices), 1);
        assert_eq!(mgr.loaded(), 1);
    }

    #[test]
    fn unmatched_end_does_not_overflow() {
        let mut mgr = LoadingManager::new();
        mgr.item_end("ghost");
        assert_eq!(mgr.loaded(), 0);
        assert_eq!(mgr.total(), 0);
    }

    #[test]
    fn progress_counts_are_monotone() {
        let mut mgr = LoadingManager::new();
        let mut seen = Vec::new();
        for url in ["a", "b", "c"] {
            if let Notice::Progress(p) = mgr.item_start(url) {
                seen.push(p);
            }
        }
        for url in ["b", "a", "c"] {
            for n in mgr.item_end(url) {
                if let Notice::Progress(p) = n {
                    seen.push(p);
                }
            }
        }
        for pair in seen.windows(2) {
            assert!(pair[1].loaded >= pair[0].loaded);
            assert!(pair[1].total >= pair[0].total);
        }
        assert_eq!(seen.last().unwrap().ratio(), 1.0);
    }
}
