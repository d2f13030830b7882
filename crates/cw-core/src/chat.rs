//! Assistant chat about a patient's report.
//!
//! A [`ChatSession`] owns the rolling history sent with each message and a
//! transcript of everything shown to the user (including local notices),
//! which can be exported as HTML.

use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use cw_client::{ApiError, ReportingApi};
use cw_common::{ChatMessage, ChatRole, PatientId};
use cw_report::template::html_escape;
use pulldown_cmark::{html, Event, Options, Parser};
use thiserror::Error;

/// Greeting shown when a conversation starts.
pub const WELCOME: &str =
    "Hello! I'm your AI nutrition assistant. How can I help you analyze this patient's data?";

/// Canned report questions offered as shortcuts.
pub const QUICK_QUESTIONS: [&str; 6] = [
    "What does this report tell me about my nutrition?",
    "How can I improve my macronutrient balance?",
    "What's the most concerning part of this report?",
    "Can you suggest a meal plan based on this report?",
    "What nutritional deficiencies does this report suggest?",
    "How do I reach my nutritional targets shown in this report?",
];

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Please select a patient before starting a chat")]
    NoPatient,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// One conversation with the assistant.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    patient: Option<PatientId>,
    history: Vec<ChatMessage>,
    transcript: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(patient: Option<PatientId>) -> Self {
        Self {
            patient: patient.filter(|p| !p.is_blank()),
            history: Vec::new(),
            transcript: vec![system(WELCOME)],
        }
    }

    pub fn patient(&self) -> Option<&PatientId> {
        self.patient.as_ref()
    }

    /// History sent with the next message.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Everything shown so far, in order.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Switch patient; the conversation starts over when it changes.
    pub fn set_patient(&mut self, patient: Option<PatientId>, ctx: &LogContext) {
        let patient = patient.filter(|p| !p.is_blank());
        if patient == self.patient {
            return;
        }
        log_event!(
            ctx,
            INFO,
            event_names::CHAT_RESET,
            Stage::Chat,
            "chat history reset",
            turns = self.history.len()
        );
        *self = Self::new(patient);
    }

    /// Send `message` and return the assistant's markdown reply.
    ///
    /// Blank messages are ignored and return `Ok(None)` without a request.
    pub fn send<A: ReportingApi + ?Sized>(
        &mut self,
        api: &A,
        message: &str,
        ctx: &LogContext,
    ) -> Result<Option<String>, ChatError> {
        if message.trim().is_empty() {
            return Ok(None);
        }
        let patient = self.patient.clone().ok_or(ChatError::NoPatient)?;

        self.transcript.push(ChatMessage::user(message));
        let response = match api.send_chat_message(&patient, message, &self.history) {
            Ok(r) => r,
            Err(e) => {
                self.transcript.push(system(format!("Error: {e}")));
                return Err(e.into());
            }
        };

        match response.chat_history {
            Some(history) => self.history = history,
            None => {
                self.history.push(ChatMessage::user(message));
                self.history
                    .push(ChatMessage::assistant(response.response.clone()));
            }
        }
        self.transcript
            .push(ChatMessage::assistant(response.response.clone()));

        log_event!(
            ctx,
            INFO,
            event_names::CHAT_SENT,
            Stage::Chat,
            "chat reply received",
            patient_id = patient.as_str(),
            history_len = self.history.len()
        );
        Ok(Some(response.response))
    }

    /// Standalone HTML page of the transcript.
    pub fn transcript_html(&self) -> String {
        let title = match &self.patient {
            Some(p) => format!("Chat transcript: patient {}", html_escape(p.as_str())),
            None => "Chat transcript".to_string(),
        };
        let mut body = String::new();
        for msg in &self.transcript {
            let content = match msg.role {
                ChatRole::User => format!("<p>{}</p>", html_escape(&msg.content)),
                ChatRole::Assistant | ChatRole::System => render_markdown(&msg.content),
            };
            body.push_str(&format!(
                "<div class=\"message {role}-message\">\n<div class=\"message-sender\">{sender}</div>\n<div class=\"message-content\">{content}</div>\n</div>\n",
                role = role_class(msg.role),
                sender = msg.role.sender_name(),
                content = content,
            ));
        }
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{TRANSCRIPT_CSS}</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n"
        )
    }
}

const TRANSCRIPT_CSS: &str = "body { font-family: Arial, sans-serif; max-width: 860px; margin: 2em auto; }
.message { border-radius: 8px; padding: 8px 12px; margin: 8px 0; }
.user-message { background: #e8f4fd; }
.assistant-message { background: #f4f6f7; }
.message-sender { font-weight: bold; font-size: 12px; color: #7f8c8d; }
table { border-collapse: collapse; }
th, td { border: 1px solid #dcdde1; padding: 4px 8px; }
";

fn system(content: impl Into<String>) -> ChatMessage {
    ChatMessage {
        role: ChatRole::System,
        content: content.into(),
    }
}

fn role_class(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        // System notices share the assistant styling.
        ChatRole::Assistant | ChatRole::System => "assistant",
    }
}

/// Render assistant markdown to an HTML fragment.
///
/// Tables, strikethrough and task lists are enabled. Raw HTML in the input
/// is escaped rather than passed through.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
