//! Change notification coalescer
//!
//! Watches a project's git metadata, working tree, notes and task
//! definitions, and turns bursts of raw filesystem events into one
//! categorized notification per quiet period.
//!
//! ## Architecture
//!
//! ```text
//! notify threads                       owning thread
//! ┌─────────────┐  TimedChange   ┌──────────────────────────────────────┐
//! │ WatchHandle │ ─────────────► │ FileMonitor::dispatch(now)           │
//! │ WatchHandle │     (mpsc)     │   classify → PendingSignals → notify │
//! └─────────────┘                │   subscribers per Category           │
//!                                └──────────────────────────────────────┘
//! ```
//!
//! Watch callbacks only enqueue. Every state change (scheduling, firing,
//! registration, teardown) happens on the thread that owns the
//! [`FileMonitor`], so none of it needs locking.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use companion_core::config::MonitorConfig;
//! use companion_core::monitor::{Category, FileMonitor, Notification};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let mut monitor = FileMonitor::new("/home/me/project", MonitorConfig::default());
//! monitor.add_working_tree_watch(Path::new("/home/me/project"));
//! monitor.connect(Category::GitStatus, Box::new(|n: &Notification| println!("{}", n)));
//! loop {
//!     monitor.wait_and_dispatch(Duration::from_secs(1));
//! }
//! ```

mod classify;
mod debounce;
mod signal;
mod watch;

pub use classify::{
    changes_from_event, classify, has_git_component, ChangeKind, RawChange, WatchSource,
};
pub use debounce::PendingSignals;
pub use signal::{Category, Notification, SignalKey};
pub use watch::{watch, TimedChange, WatchHandle, WatchTarget};

use crate::config::MonitorConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// Callback invoked for each notification on a subscribed channel
pub type Handler = Box<dyn FnMut(&Notification) + Send>;

/// Identifies a subscription for [`FileMonitor::disconnect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    category: Category,
    handler: Handler,
}

/// Debounced, categorized file change notifications for one project.
pub struct FileMonitor {
    project_path: PathBuf,
    config: MonitorConfig,
    is_git_repo: bool,
    /// Git metadata, notes and tasks; live until shutdown
    fixed_watches: Vec<WatchHandle>,
    /// Working-tree directories, added and removed on demand
    working_tree: HashMap<PathBuf, WatchHandle>,
    tx: Sender<TimedChange>,
    rx: Receiver<TimedChange>,
    pending: PendingSignals<SignalKey>,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
    shut_down: bool,
}

impl FileMonitor {
    /// Create a monitor and install the always-on watches.
    ///
    /// Git watches are installed only when `<project>/.git` is a directory.
    /// Targets that do not exist, or that the platform refuses to watch,
    /// are skipped; the monitor keeps working with the rest.
    pub fn new(project_path: impl Into<PathBuf>, config: MonitorConfig) -> Self {
        let project_path = project_path.into();
        let (tx, rx) = channel();
        let is_git_repo = project_path.join(".git").is_dir();

        let mut monitor = Self {
            project_path,
            config,
            is_git_repo,
            fixed_watches: Vec::new(),
            working_tree: HashMap::new(),
            tx,
            rx,
            pending: PendingSignals::new(),
            subscriptions: Vec::new(),
            next_subscription: 0,
            shut_down: false,
        };

        for (target, source) in monitor.fixed_targets() {
            monitor.install_fixed(target, source);
        }

        tracing::info!(
            project = %monitor.project_path.display(),
            git = monitor.is_git_repo,
            watches = monitor.fixed_watches.len(),
            "File monitor started"
        );

        monitor
    }

    fn fixed_targets(&self) -> Vec<(WatchTarget, WatchSource)> {
        let root = &self.project_path;
        let mut targets = Vec::new();

        if self.is_git_repo {
            let git = root.join(".git");
            targets.push((WatchTarget::File(git.join("index")), WatchSource::GitIndex));
            targets.push((
                WatchTarget::Directory(git.join("refs").join("heads")),
                WatchSource::GitRefs,
            ));
            targets.push((WatchTarget::File(git.join("HEAD")), WatchSource::GitHead));
            targets.push((
                WatchTarget::File(git.join("logs").join("HEAD")),
                WatchSource::GitLog,
            ));
        }

        for dir in &self.config.notes_dirs {
            targets.push((WatchTarget::Directory(root.join(dir)), WatchSource::Notes));
        }
        for file in &self.config.notes_files {
            targets.push((WatchTarget::File(root.join(file)), WatchSource::Notes));
        }
        targets.push((
            WatchTarget::Directory(root.join(&self.config.tasks_dir)),
            WatchSource::Tasks,
        ));

        targets
    }

    fn install_fixed(&mut self, target: WatchTarget, source: WatchSource) {
        if !target.exists() {
            tracing::debug!(
                path = %target.path().display(),
                ?source,
                "Watch target missing, skipping"
            );
            return;
        }

        let path = target.path().to_path_buf();
        match watch(target, source, self.tx.clone()) {
            Ok(handle) => self.fixed_watches.push(handle),
            Err(e) => {
                tracing::warn!(path = %path.display(), ?source, error = %e, "Failed to watch");
            }
        }
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Whether the project has a `.git` directory
    pub fn is_git_repo(&self) -> bool {
        self.is_git_repo
    }

    /// Number of always-on watches that were installed
    pub fn fixed_watch_count(&self) -> usize {
        self.fixed_watches.len()
    }

    // ============================================
    // Working-tree interest
    // ============================================

    /// Start watching a working-tree directory's direct children.
    ///
    /// Returns `true` if a new watch was installed. Already-watched
    /// directories, directories under `.git`, missing directories and
    /// watch failures all return `false` and leave the registry unchanged.
    pub fn add_working_tree_watch(&mut self, dir: &Path) -> bool {
        if self.shut_down || self.working_tree.contains_key(dir) {
            return false;
        }
        if has_git_component(dir) {
            tracing::debug!(path = %dir.display(), "Refusing working-tree watch inside .git");
            return false;
        }

        let target = WatchTarget::Directory(dir.to_path_buf());
        if !target.exists() {
            return false;
        }

        match watch(target, WatchSource::WorkingTree, self.tx.clone()) {
            Ok(handle) => {
                self.working_tree.insert(dir.to_path_buf(), handle);
                tracing::debug!(path = %dir.display(), "Working-tree watch added");
                true
            }
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Failed to watch directory");
                false
            }
        }
    }

    /// Stop watching a working-tree directory. Returns `false` if it was not watched.
    pub fn remove_working_tree_watch(&mut self, dir: &Path) -> bool {
        let removed = self.working_tree.remove(dir).is_some();
        if removed {
            tracing::debug!(path = %dir.display(), "Working-tree watch removed");
        }
        removed
    }

    pub fn is_watching(&self, dir: &Path) -> bool {
        self.working_tree.contains_key(dir)
    }

    /// Currently watched working-tree directories, sorted
    pub fn watched_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.working_tree.keys().cloned().collect();
        dirs.sort();
        dirs
    }

    // ============================================
    // Subscriptions
    // ============================================

    /// Subscribe to one notification channel.
    pub fn connect(&mut self, category: Category, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            id,
            category,
            handler,
        });
        id
    }

    pub fn disconnect(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    // ============================================
    // Debouncing
    // ============================================

    /// Feed one raw change observed at `at`.
    ///
    /// Watches call this indirectly through the channel; it is public so
    /// hosts and tests can inject changes directly.
    pub fn ingest(&mut self, change: RawChange, at: Instant) {
        if self.shut_down {
            return;
        }

        for key in classify(&change, &self.config) {
            let delay = self.config.debounce_for(key.category());
            let armed = self.pending.schedule(key.clone(), at, delay);
            tracing::trace!(%key, armed, kind = ?change.kind, "Change scheduled");
        }
    }

    /// Whether a notification is pending for `key`
    pub fn is_pending(&self, key: &SignalKey) -> bool {
        self.pending.is_pending(key)
    }

    /// Earliest time a pending notification is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.next_deadline()
    }

    /// Drain queued changes, then fire every notification due at `now`.
    ///
    /// Subscribers are called before this returns; the fired notifications
    /// are also returned, earliest deadline first.
    pub fn dispatch(&mut self, now: Instant) -> Vec<Notification> {
        if self.shut_down {
            return Vec::new();
        }

        let queued: Vec<TimedChange> = self.rx.try_iter().collect();
        for TimedChange { at, change } in queued {
            self.ingest(change, at);
        }

        let fired: Vec<Notification> = self
            .pending
            .take_expired(now)
            .into_iter()
            .map(SignalKey::into_notification)
            .collect();

        for notification in &fired {
            tracing::debug!(%notification, "Notification fired");
            let category = notification.category();
            for sub in self
                .subscriptions
                .iter_mut()
                .filter(|s| s.category == category)
            {
                (sub.handler)(notification);
            }
        }

        fired
    }

    /// Block until something fires or `max_wait` elapses.
    ///
    /// Sleeps on the change channel until the next pending deadline, so a
    /// host without its own event loop can simply call this repeatedly.
    pub fn wait_and_dispatch(&mut self, max_wait: Duration) -> Vec<Notification> {
        let limit = Instant::now() + max_wait;

        loop {
            if self.shut_down {
                return Vec::new();
            }

            let now = Instant::now();
            let fired = self.dispatch(now);
            if !fired.is_empty() || now >= limit {
                return fired;
            }

            let wake = self
                .pending
                .next_deadline()
                .map_or(limit, |deadline| deadline.min(limit));

            match self.rx.recv_timeout(wake.saturating_duration_since(now)) {
                Ok(TimedChange { at, change }) => self.ingest(change, at),
                Err(RecvTimeoutError::Timeout) => {}
                // We hold a sender, so this only happens if it was dropped
                Err(RecvTimeoutError::Disconnected) => return Vec::new(),
            }
        }
    }

    // ============================================
    // Teardown
    // ============================================

    /// Cancel every pending notification and every watch.
    ///
    /// Idempotent. After this returns nothing fires again, including
    /// notifications whose window was still open.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let cancelled = self.pending.len();
        self.pending.clear();
        self.working_tree.clear();
        self.fixed_watches.clear();
        while self.rx.try_recv().is_ok() {}
        self.subscriptions.clear();

        tracing::info!(
            project = %self.project_path.display(),
            cancelled,
            "File monitor shut down"
        );
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl Drop for FileMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
