//! LLM-backed content generators.
//!
//! | Generator | Module | LLM calls | Failure result |
//! |-----------|--------|-----------|----------------|
//! | Summary | [`summarizer`] | 1 | `None` |
//! | Campaign topics | [`topics`] | 1 | empty list |
//! | Email + LinkedIn sequences | [`sequences`] | 2 per topic | [`sequences::SequenceError`] |
//!
//! LLM output is untrusted text: topics are parsed line by line against a
//! bullet grammar and sequences must parse as JSON before they are kept.

pub mod sequences;
pub mod summarizer;
pub mod topics;

#[cfg(test)]
pub mod fake {
    //! Scripted [`ChatModel`] for tests.

    use crate::api::{ChatModel, ChatRequest, LlmError};
    use crate::config::ApiKey;
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

    /// Answers each prompt with the first responder that returns `Some`.
    /// A prompt nobody answers fails with a 500 status error.
    #[derive(Default)]
    pub struct FakeModel {
        responders: Vec<Responder>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeModel {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer prompts containing `needle` with `reply`.
        pub fn when(mut self, needle: &str, reply: &str) -> Self {
            let needle = needle.to_string();
            let reply = reply.to_string();
            self.responders.push(Box::new(move |prompt| {
                prompt.contains(needle.as_str()).then(|| reply.clone())
            }));
            self
        }

        /// Every prompt received, in order.
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        /// Number of prompts containing `needle`.
        pub fn calls_containing(&self, needle: &str) -> usize {
            self.prompts().iter().filter(|p| p.contains(needle)).count()
        }
    }

    impl ChatModel for FakeModel {
        async fn complete(
            &self,
            _credential: &ApiKey,
            request: ChatRequest<'_>,
        ) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(request.prompt.to_string());
            self.responders
                .iter()
                .find_map(|r| r(request.prompt))
                .map(|text| text.trim().to_string())
                .ok_or_else(|| LlmError::Status {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "no scripted reply".to_string(),
                })
        }
    }
}
