#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use gemini_chat_backend::{
    error::UpstreamError,
    services::generation::{Conversation, ConversationHandle, GenerationClient},
};

/// Test double: echoes prompts, counts calls, and fails on demand.
#[derive(Default)]
pub struct FakeClient {
    pub conversations_created: AtomicUsize,
    pub fail: Arc<AtomicBool>,
    created: std::sync::Mutex<Vec<Arc<FakeConversation>>>,
}

impl FakeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let client = Self::default();
        client.fail.store(true, Ordering::SeqCst);
        Arc::new(client)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.conversations_created.load(Ordering::SeqCst)
    }

    /// Calls made on each created conversation, in creation order.
    pub fn call_counts(&self) -> Vec<usize> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.calls.load(Ordering::SeqCst))
            .collect()
    }
}

impl GenerationClient for FakeClient {
    fn new_conversation(&self) -> ConversationHandle {
        self.conversations_created.fetch_add(1, Ordering::SeqCst);
        let conversation = Arc::new(FakeConversation {
            calls: AtomicUsize::new(0),
            fail: Arc::clone(&self.fail),
        });
        self.created.lock().unwrap().push(Arc::clone(&conversation));
        conversation
    }
}

pub struct FakeConversation {
    pub calls: AtomicUsize,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl Conversation for FakeConversation {
    async fn send_message(&self, text: &str) -> Result<String, UpstreamError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(UpstreamError::Other("provider unavailable".into()));
        }
        Ok(format!("echo #{n}: {text}"))
    }
}

pub fn is_canonical_uuid(id: &str) -> bool {
    id.len() == 36
        && id.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit() && !c.is_ascii_uppercase(),
        })
}
