use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::preview::PreviewStore;
use crate::services::product_form::ProductForm;
use crate::services::product_list::ProductListView;

/// Identifier stored in the browser's session cookie.
pub type SessionKey = u64;

/// How long an untouched console session is kept by default.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// UI state owned by one browser session.
pub struct ConsoleSession {
    pub form: ProductForm,
    pub list: ProductListView,
}

struct SessionSlot {
    session: ConsoleSession,
    last_seen: Instant,
}

/// All console sessions of the running server.
///
/// Each session is only touched inside [`ConsoleSessions::with`]; callers must
/// not hold on to the guard across an `.await`. Sessions idle for longer than
/// the configured timeout are dropped on the next access to the registry,
/// which also releases the previews held by their drafts.
pub struct ConsoleSessions {
    previews: Arc<dyn PreviewStore>,
    idle_timeout: Duration,
    next_key: AtomicU64,
    sessions: Mutex<HashMap<SessionKey, SessionSlot>>,
}

impl ConsoleSessions {
    pub fn new(previews: Arc<dyn PreviewStore>) -> Self {
        Self::with_idle_timeout(previews, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(previews: Arc<dyn PreviewStore>, idle_timeout: Duration) -> Self {
        // Keys from a previous run may still sit in browser cookies.
        let first_key = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(1);
        Self {
            previews,
            idle_timeout,
            next_key: AtomicU64::new(first_key),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a key for a new browser session.
    pub fn create_key(&self) -> SessionKey {
        self.next_key.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` on the session stored under `key`, creating it when missing.
    pub fn with<R>(&self, key: SessionKey, f: impl FnOnce(&mut ConsoleSession) -> R) -> R {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        let before = sessions.len();
        sessions.retain(|other, slot| {
            *other == key || now.duration_since(slot.last_seen) <= self.idle_timeout
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            log::debug!("Dropped {evicted} idle console session(s)");
        }

        let slot = sessions.entry(key).or_insert_with(|| SessionSlot {
            session: ConsoleSession {
                form: ProductForm::new(Arc::clone(&self.previews)),
                list: ProductListView::new(),
            },
            last_seen: now,
        });
        slot.last_seen = now;
        f(&mut slot.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::draft::DraftField;
    use crate::domain::upload::{UploadBatch, UploadKind, UploadedImage};
    use crate::preview::PreviewRegistry;

    #[test]
    fn sessions_are_isolated_by_key() {
        let sessions = ConsoleSessions::new(Arc::new(PreviewRegistry::new()));
        let first = sessions.create_key();
        let second = sessions.create_key();
        assert_ne!(first, second);

        sessions.with(first, |session| {
            session
                .form
                .set_field(DraftField::ProductName, "Mug")
                .expect("editable")
        });

        let first_name = sessions.with(first, |session| session.form.draft().product_name.clone());
        let second_name =
            sessions.with(second, |session| session.form.draft().product_name.clone());

        assert_eq!(first_name, "Mug");
        assert!(second_name.is_empty());
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn idle_session_is_dropped_and_releases_previews() {
        let registry = Arc::new(PreviewRegistry::new());
        let sessions = ConsoleSessions::with_idle_timeout(registry.clone(), Duration::from_millis(20));
        let idle = sessions.create_key();
        let active = sessions.create_key();

        sessions.with(idle, |session| {
            session
                .form
                .receive_upload(
                    UploadKind::Gallery,
                    UploadBatch::single(UploadedImage::new("https://img/1.png", "1.png")),
                )
                .expect("gallery upload")
        });
        assert_eq!(registry.live_count(), 1);

        std::thread::sleep(Duration::from_millis(50));
        sessions.with(active, |_| ());

        assert_eq!(sessions.len(), 1);
        assert_eq!(registry.live_count(), 0);

        // The evicted key starts over with an empty form.
        let gallery_len = sessions.with(idle, |session| session.form.draft().gallery().len());
        assert_eq!(gallery_len, 0);
    }

    #[test]
    fn recently_used_sessions_are_kept() {
        let sessions = ConsoleSessions::new(Arc::new(PreviewRegistry::new()));
        let first = sessions.create_key();
        let second = sessions.create_key();

        sessions.with(first, |_| ());
        sessions.with(second, |_| ());
        sessions.with(first, |_| ());

        assert_eq!(sessions.len(), 2);
    }
}
