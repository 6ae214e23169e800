use chrono::Local;

use crate::domain::{Action, ClientError, FieldErrors, Message, Sender};
use crate::use_cases::api::LegalApi;
use crate::use_cases::lifecycle::RequestLifecycle;

pub const APOLOGY: &str =
    "Sorry, I encountered an error while processing your question. Please try again.";

// Question-answering page: a transcript driven by one request lifecycle.
pub struct AskPage {
    api: LegalApi,
    transcript: Vec<Message>,
    next_id: u64,
    lifecycle: RequestLifecycle<String, String>,
}

impl AskPage {
    pub fn open(api: LegalApi) -> Result<Self, ClientError> {
        if !api.session().is_authenticated() {
            return Err(ClientError::SignInRequired);
        }
        Ok(Self {
            api,
            transcript: Vec::new(),
            next_id: 1,
            lifecycle: RequestLifecycle::new(Action::AskQuestion),
        })
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn lifecycle(&self) -> &RequestLifecycle<String, String> {
        &self.lifecycle
    }

    /// Ask one question. The user message is appended before dispatch and the
    /// reply (or an apology) after the call settles.
    pub async fn ask(&mut self, question: &str) -> Result<String, ClientError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ClientError::Validation(FieldErrors::single(
                "question",
                "Please enter a question",
            )));
        }
        if self.lifecycle.is_pending() {
            return Err(ClientError::GuardViolation);
        }

        self.append(question.to_string(), Sender::User, false);
        let api = self.api.clone();
        let outcome = self
            .lifecycle
            .submit(question.to_string(), |question| async move {
                api.ask(&question).await
            })
            .await;

        match &outcome {
            Ok(answer) => self.append(answer.clone(), Sender::Assistant, false),
            // Raw failures never reach the transcript.
            Err(_) => self.append(APOLOGY.to_string(), Sender::Assistant, true),
        }
        outcome
    }

    pub fn clear_chat(&mut self) {
        self.transcript.clear();
        self.lifecycle.reset();
    }

    fn append(&mut self, text: String, sender: Sender, is_error: bool) {
        self.transcript.push(Message {
            id: self.next_id,
            text,
            sender,
            timestamp: Local::now(),
            is_error,
        });
        self.next_id += 1;
    }
}
