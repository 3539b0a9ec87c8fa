use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

/// Where a chat currently is in the /split conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SplitStage {
    #[default]
    Idle,
    AwaitingStartLink,
    AwaitingEndLink {
        start_link: String,
    },
}

/// A gallery download in flight for one chat. The limit stays `None` until
/// the user has answered the "how many images" prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryRequest {
    pub page_url: String,
    pub directory: PathBuf,
    pub limit: Option<usize>,
}

/// Per-chat conversational context. Created on the first command that needs
/// it and cleared when the flow completes or errors out.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Episode name template, may contain the `{episode}` placeholder.
    pub anime_name: Option<String>,
    pub awaiting_anime_name: bool,
    pub quality: Option<String>,
    pub split: SplitStage,
    pub gallery: Option<GalleryRequest>,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<i64, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `apply` against the chat's session, creating it if absent.
    pub fn update<F, R>(&self, chat_id: i64, apply: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.lock();
        apply(sessions.entry(chat_id).or_default())
    }

    pub fn get(&self, chat_id: i64) -> Option<Session> {
        self.sessions.lock().get(&chat_id).cloned()
    }

    pub fn clear(&self, chat_id: i64) {
        self.sessions.lock().remove(&chat_id);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            sessions: SessionStore::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_creates_a_session_and_clear_removes_it() {
        let store = SessionStore::new();
        assert!(store.get(7).is_none());

        store.update(7, |session| {
            session.anime_name = Some("Show {episode}".to_string());
        });
        let session = store.get(7).expect("session should exist");
        assert_eq!(session.anime_name.as_deref(), Some("Show {episode}"));

        store.clear(7);
        assert!(store.get(7).is_none());
    }

    #[test]
    fn split_stage_transitions_keep_the_start_link() {
        let store = SessionStore::new();
        store.update(1, |session| session.split = SplitStage::AwaitingStartLink);
        store.update(1, |session| {
            session.split = SplitStage::AwaitingEndLink {
                start_link: "https://t.me/chan/10".to_string(),
            }
        });

        match store.get(1).expect("session").split {
            SplitStage::AwaitingEndLink { start_link } => {
                assert_eq!(start_link, "https://t.me/chan/10");
            }
            other => panic!("unexpected stage: {other:?}"),
        }
    }
}
