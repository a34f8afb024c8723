//! crates/support_chat_core/src/conversation.rs
//!
//! The conversation controller. Owns the submit cycle: append the user turn,
//! build the grounded request, await the completion service and append its
//! reply (or a fixed apology when anything goes wrong).

use crate::domain::{CompletionRequest, Message, Role, Turn};
use crate::knowledge::{build_knowledge_base, build_prompt};
use crate::ports::{CompletionService, PortResult};
use crate::state::{Phase, SharedState, CLEARED_GREETING};
use crate::store::{Slot, SlotStore};
use std::sync::Arc;
use tracing::{error, info, warn};

/// How many prior messages travel with each question.
pub const HISTORY_WINDOW: usize = 6;

pub const FALLBACK_REPLY: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

/// Model parameters copied into every outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSettings {
    pub model: String,
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1000,
        }
    }
}

/// Why a submission was refused without touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyInput,
    Busy,
}

/// The result of one call to [`ConversationController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    /// The completion service replied; the message is the appended reply.
    Answered(Message),
    /// The completion service failed; the message is the appended apology.
    Fallback(Message),
}

#[derive(Clone)]
pub struct ConversationController {
    state: SharedState,
    store: SlotStore,
    completion: Arc<dyn CompletionService>,
    settings: CompletionSettings,
}

impl ConversationController {
    pub fn new(
        state: SharedState,
        store: SlotStore,
        completion: Arc<dyn CompletionService>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            state,
            store,
            completion,
            settings,
        }
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.messages.clone()
    }

    pub async fn is_sending(&self) -> bool {
        self.state.lock().await.phase == Phase::Sending
    }

    pub async fn input(&self) -> String {
        self.state.lock().await.input.clone()
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.state.lock().await.input = text.into();
    }

    /// Submits whatever is in the pending input buffer.
    pub async fn submit_input(&self) -> SubmitOutcome {
        let input = self.input().await;
        self.submit(&input).await
    }

    /// Runs one question/answer cycle. The user's text is stored exactly as
    /// typed; only the emptiness check trims it.
    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let request = {
            let mut state = self.state.lock().await;
            if input.trim().is_empty() {
                return SubmitOutcome::Rejected(RejectReason::EmptyInput);
            }
            if state.phase == Phase::Sending {
                return SubmitOutcome::Rejected(RejectReason::Busy);
            }

            let mut turns = recent_history(&state.messages);

            state.messages.push(Message::user(input));
            state.input.clear();
            state.phase = Phase::Sending;
            self.persist_messages(&state.messages).await;

            let knowledge_base = build_knowledge_base(&state.faqs, &state.documents);
            turns.push(Turn {
                role: Role::User,
                content: build_prompt(&knowledge_base, input),
            });

            CompletionRequest {
                model: self.settings.model.clone(),
                max_tokens: self.settings.max_tokens,
                messages: turns,
            }
        };

        // Runs on its own task: the reply is recorded and the phase reset even
        // if the caller is dropped.
        let controller = self.clone();
        let cycle = tokio::spawn(async move { controller.answer(request).await });
        match cycle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Completion task failed: {}", e);
                self.record(SubmitOutcome::Fallback(Message::assistant(FALLBACK_REPLY)))
                    .await
            }
        }
    }

    async fn answer(&self, request: CompletionRequest) -> SubmitOutcome {
        info!(turns = request.messages.len(), "Sending question to completion service");
        let outcome = match self.completion.complete(&request).await {
            Ok(text) => SubmitOutcome::Answered(Message::assistant(text)),
            Err(e) => {
                error!("Completion request failed: {}", e);
                SubmitOutcome::Fallback(Message::assistant(FALLBACK_REPLY))
            }
        };
        self.record(outcome).await
    }

    /// Appends the reply, returns to idle and persists the transcript.
    async fn record(&self, outcome: SubmitOutcome) -> SubmitOutcome {
        let mut state = self.state.lock().await;
        if let SubmitOutcome::Answered(reply) | SubmitOutcome::Fallback(reply) = &outcome {
            state.messages.push(reply.clone());
        }
        state.phase = Phase::Idle;
        self.persist_messages(&state.messages).await;

        outcome
    }

    /// Replaces the whole transcript with a single greeting.
    pub async fn clear_chat(&self) -> PortResult<Vec<Message>> {
        let mut state = self.state.lock().await;
        state.messages = vec![Message::assistant(CLEARED_GREETING)];
        info!("Chat cleared");
        self.store.save(Slot::Messages, &state.messages).await?;
        Ok(state.messages.clone())
    }

    async fn persist_messages(&self, messages: &[Message]) {
        if let Err(e) = self.store.save(Slot::Messages, messages).await {
            warn!("Failed to persist messages: {}", e);
        }
    }
}

/// The messages that precede a new user turn, trimmed to the history window.
fn recent_history(messages: &[Message]) -> Vec<Turn> {
    let start = messages.len().saturating_sub(HISTORY_WINDOW);
    messages[start..].iter().map(Message::to_turn).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FaqEntry;
    use crate::ports::{KeyValueStore, PortError};
    use crate::state::{ChatState, WELCOME_GREETING};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::Notify;
    use uuid::Uuid;

    /// Replies from a queue and records every request it receives.
    #[derive(Default)]
    struct ScriptedCompletion {
        replies: StdMutex<VecDeque<PortResult<String>>>,
        requests: StdMutex<Vec<CompletionRequest>>,
    }

    impl ScriptedCompletion {
        fn replying(replies: Vec<PortResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: StdMutex::new(replies.into()),
                requests: StdMutex::default(),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletion {
        async fn complete(&self, request: &CompletionRequest) -> PortResult<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default reply".to_string()))
        }
    }

    /// Blocks inside `complete` until released.
    struct GatedCompletion {
        started: Notify,
        release: Notify,
        calls: StdMutex<usize>,
    }

    #[async_trait]
    impl CompletionService for GatedCompletion {
        async fn complete(&self, _request: &CompletionRequest) -> PortResult<String> {
            *self.calls.lock().unwrap() += 1;
            self.started.notify_one();
            self.release.notified().await;
            Ok("finally".to_string())
        }
    }

    /// Holds the first call until released; later calls reply at once.
    struct StallsFirstCall {
        release: Notify,
        calls: StdMutex<usize>,
    }

    #[async_trait]
    impl CompletionService for StallsFirstCall {
        async fn complete(&self, _request: &CompletionRequest) -> PortResult<String> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if call == 1 {
                self.release.notified().await;
            }
            Ok(format!("reply {call}"))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> PortResult<Option<String>> {
            Ok(None)
        }
        async fn set(&self, _key: &str, _value: &str) -> PortResult<()> {
            Err(PortError::Storage("disk full".to_string()))
        }
    }

    fn controller_with(
        state: ChatState,
        completion: Arc<dyn CompletionService>,
    ) -> (ConversationController, SlotStore) {
        let store = SlotStore::new(Arc::new(MemoryStore::new()));
        let controller = ConversationController::new(
            state.shared(),
            store.clone(),
            completion,
            CompletionSettings::default(),
        );
        (controller, store)
    }

    #[tokio::test]
    async fn successful_submit_appends_user_and_assistant_messages() {
        let completion = ScriptedCompletion::replying(vec![Ok("We ship worldwide.".to_string())]);
        let (controller, store) = controller_with(ChatState::default(), completion.clone());

        let outcome = controller.submit("Do you ship abroad?").await;

        let messages = controller.messages().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Do you ship abroad?");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "We ship worldwide.");
        assert_eq!(outcome, SubmitOutcome::Answered(messages[2].clone()));
        assert!(!controller.is_sending().await);

        let persisted: Vec<Message> = store.load(Slot::Messages).await.unwrap();
        assert_eq!(persisted, messages);
    }

    #[tokio::test]
    async fn request_carries_model_settings_and_grounded_prompt() {
        let completion = ScriptedCompletion::replying(vec![]);
        let (controller, _) = controller_with(ChatState::default(), completion.clone());

        controller.submit("Hours?").await;

        let requests = completion.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, "claude-sonnet-4-20250514");
        assert_eq!(request.max_tokens, 1000);
        // The welcome greeting is the only prior message.
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::Assistant);
        assert_eq!(request.messages[0].content, WELCOME_GREETING);
        let last = request.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert!(last.content.starts_with("COMPANY KNOWLEDGE BASE:"));
        assert!(last.content.contains("No FAQs or documents have been added yet."));
        assert!(last.content.ends_with("USER QUESTION: Hours?"));
    }

    #[tokio::test]
    async fn history_is_the_six_messages_before_the_new_turn() {
        let mut state = ChatState::default();
        state.messages = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {i}"))
                } else {
                    Message::assistant(format!("answer {i}"))
                }
            })
            .collect();
        let expected: Vec<Turn> = state.messages[4..].iter().map(Message::to_turn).collect();

        let completion = ScriptedCompletion::replying(vec![]);
        let (controller, _) = controller_with(state, completion.clone());
        controller.submit("question 10").await;

        let requests = completion.requests();
        let request = &requests[0];
        assert_eq!(request.messages.len(), HISTORY_WINDOW + 1);
        assert_eq!(&request.messages[..HISTORY_WINDOW], expected.as_slice());
        assert_eq!(request.messages[0].content, "question 4");
        assert_eq!(request.messages[5].content, "answer 9");
    }

    #[tokio::test]
    async fn knowledge_base_is_read_at_submission_time() {
        let state = ChatState::default().shared();
        let completion = ScriptedCompletion::replying(vec![]);
        let controller = ConversationController::new(
            state.clone(),
            SlotStore::new(Arc::new(MemoryStore::new())),
            completion.clone(),
            CompletionSettings::default(),
        );

        state.lock().await.faqs.push(FaqEntry {
            id: Uuid::new_v4(),
            question: "Refund window?".to_string(),
            answer: "30 days".to_string(),
        });
        controller.submit("Can I get a refund?").await;

        let requests = completion.requests();
        let prompt = &requests[0].messages.last().unwrap().content;
        assert!(prompt.contains("Q1: Refund window?\nA1: 30 days"));
    }

    #[tokio::test]
    async fn blank_input_is_rejected_without_request() {
        let completion = ScriptedCompletion::replying(vec![]);
        let (controller, _) = controller_with(ChatState::default(), completion.clone());

        for blank in ["", "   ", "\n\t "] {
            assert_eq!(
                controller.submit(blank).await,
                SubmitOutcome::Rejected(RejectReason::EmptyInput)
            );
        }
        assert_eq!(controller.messages().await.len(), 1);
        assert!(completion.requests().is_empty());
    }

    #[tokio::test]
    async fn second_submit_while_sending_is_rejected() {
        let completion = Arc::new(GatedCompletion {
            started: Notify::new(),
            release: Notify::new(),
            calls: StdMutex::new(0),
        });
        let (controller, _) = controller_with(ChatState::default(), completion.clone());

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit("first").await })
        };
        completion.started.notified().await;
        assert!(controller.is_sending().await);

        let second = controller.submit("second").await;
        assert_eq!(second, SubmitOutcome::Rejected(RejectReason::Busy));
        assert_eq!(controller.messages().await.len(), 2);

        completion.release.notify_one();
        let first = first.await.unwrap();
        assert!(matches!(first, SubmitOutcome::Answered(_)));
        assert_eq!(*completion.calls.lock().unwrap(), 1);

        let messages = controller.messages().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "first");
        assert!(!controller.is_sending().await);
    }

    #[tokio::test]
    async fn abandoned_submit_still_finishes_and_frees_the_chat() {
        let completion = Arc::new(StallsFirstCall {
            release: Notify::new(),
            calls: StdMutex::new(0),
        });
        let (controller, _) = controller_with(ChatState::default(), completion.clone());

        let attempt =
            tokio::time::timeout(Duration::from_millis(50), controller.submit("hi")).await;
        assert!(attempt.is_err());

        completion.release.notify_one();
        while controller.is_sending().await {
            tokio::task::yield_now().await;
        }
        let messages = controller.messages().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].content, "reply 1");

        let next = controller.submit("anyone?").await;
        assert!(matches!(next, SubmitOutcome::Answered(ref m) if m.content == "reply 2"));
        assert_eq!(controller.messages().await.len(), 5);
    }

    #[tokio::test]
    async fn malformed_response_appends_single_fallback_and_returns_to_idle() {
        let completion = ScriptedCompletion::replying(vec![
            Err(PortError::MalformedResponse("missing content[0].text".to_string())),
            Ok("Back online.".to_string()),
        ]);
        let (controller, _) = controller_with(ChatState::default(), completion.clone());

        let outcome = controller.submit("Hello?").await;
        let messages = controller.messages().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].content, FALLBACK_REPLY);
        assert!(matches!(outcome, SubmitOutcome::Fallback(_)));
        assert!(!controller.is_sending().await);

        let retry = controller.submit("Hello again?").await;
        assert!(matches!(retry, SubmitOutcome::Answered(_)));
        assert_eq!(controller.messages().await.len(), 5);
    }

    #[tokio::test]
    async fn store_failures_do_not_block_the_chat() {
        let completion = ScriptedCompletion::replying(vec![Ok("ok".to_string())]);
        let controller = ConversationController::new(
            ChatState::default().shared(),
            SlotStore::new(Arc::new(BrokenStore)),
            completion,
            CompletionSettings::default(),
        );

        let outcome = controller.submit("still there?").await;
        assert!(matches!(outcome, SubmitOutcome::Answered(_)));
        assert_eq!(controller.messages().await.len(), 3);
        assert!(!controller.is_sending().await);
        assert!(controller.clear_chat().await.is_err());
    }

    #[tokio::test]
    async fn submit_input_takes_and_clears_the_buffer() {
        let completion = ScriptedCompletion::replying(vec![]);
        let (controller, _) = controller_with(ChatState::default(), completion.clone());

        controller.set_input("What are your hours?").await;
        controller.submit_input().await;

        assert_eq!(controller.input().await, "");
        assert_eq!(controller.messages().await[1].content, "What are your hours?");
    }

    #[tokio::test]
    async fn clear_chat_leaves_exactly_one_greeting() {
        let mut state = ChatState::default();
        state.messages.extend((0..12).map(|i| Message::user(format!("m{i}"))));
        let (controller, store) = controller_with(state, ScriptedCompletion::replying(vec![]));

        let cleared = controller.clear_chat().await.unwrap();
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].role, Role::Assistant);
        assert_eq!(cleared[0].content, CLEARED_GREETING);

        let persisted: Vec<Message> = store.load(Slot::Messages).await.unwrap();
        assert_eq!(persisted, cleared);
    }
}
