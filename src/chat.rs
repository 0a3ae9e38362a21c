//! Chat session state
//!
//! Holds the transcript sent to the assistant and the lines shown in the chat
//! window. Requests go out one at a time: extra submissions are shown right
//! away but wait in a FIFO queue. Chat payloads are built only when dispatched
//! so they see every earlier reply; a routine request keeps the selection it
//! was submitted with.

use crate::assistant::{ChatError, ChatResult, Prompts};
use crate::types::{ChatMessage, Product};
use std::collections::VecDeque;
use time::OffsetDateTime;
use tracing::{debug, warn};

pub const GREETING: &str = "Select your routine!!!";
pub const EMPTY_SELECTION_NOTICE: &str = "Please select some products before generating a routine.";
pub const ROUTINE_REQUEST_LINE: &str = "Generate a routine with my selected products.";
pub const CHAT_FAILURE: &str = "Sorry, there was a problem connecting. Please try again later.";
pub const ROUTINE_FAILURE: &str =
    "Sorry, there was a problem generating your routine. Please try again later.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnMode {
    Chat,
    Routine,
}

impl TurnMode {
    fn failure_line(self) -> &'static str {
        match self {
            TurnMode::Chat => CHAT_FAILURE,
            TurnMode::Routine => ROUTINE_FAILURE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    Sending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    User,
    Assistant,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatLine {
    pub kind: LineKind,
    pub text: String,
    pub created_at: OffsetDateTime,
}

impl ChatLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// One request ready to be sent. Hand the outcome back to [`ChatSession::finish`]
/// together with its ticket.
#[derive(Clone, Debug, PartialEq)]
pub struct AssistantRequest {
    pub ticket: u64,
    pub mode: TurnMode,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, PartialEq)]
pub enum Submission {
    /// Nothing is in flight; send this now.
    Dispatch(AssistantRequest),
    /// Another request is in flight; this one goes out after it.
    Queued,
    /// Blank input, nothing happened.
    Ignored,
    /// Routine requested with nothing selected; a notice line was shown.
    EmptySelection,
}

#[derive(Debug)]
enum PendingTurn {
    Chat(String),
    /// Request body built from the selection at the time the routine was asked for.
    Routine(String),
}

#[derive(Debug)]
struct InFlight {
    ticket: u64,
    mode: TurnMode,
}

#[derive(Debug)]
pub struct ChatSession {
    prompts: Prompts,
    transcript: Vec<ChatMessage>,
    lines: Vec<ChatLine>,
    queue: VecDeque<PendingTurn>,
    in_flight: Option<InFlight>,
    next_ticket: u64,
}

impl ChatSession {
    pub fn new(prompts: Prompts) -> Self {
        Self {
            prompts,
            transcript: Vec::new(),
            lines: vec![ChatLine::new(LineKind::Assistant, GREETING)],
            queue: VecDeque::new(),
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn lines(&self) -> &[ChatLine] {
        &self.lines
    }

    pub fn phase(&self) -> ChatPhase {
        if self.in_flight.is_some() {
            ChatPhase::Sending
        } else {
            ChatPhase::Idle
        }
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn submit_chat(&mut self, text: &str) -> Submission {
        let text = text.trim();
        if text.is_empty() {
            return Submission::Ignored;
        }

        self.lines.push(ChatLine::new(LineKind::User, text));
        self.queue.push_back(PendingTurn::Chat(text.to_string()));
        self.dispatch_or_queue()
    }

    pub fn submit_routine(&mut self, selected: &[&Product]) -> ChatResult<Submission> {
        if selected.is_empty() {
            self.lines
                .push(ChatLine::new(LineKind::Assistant, EMPTY_SELECTION_NOTICE));
            return Ok(Submission::EmptySelection);
        }

        let body = routine_request_body(selected)?;
        self.lines
            .push(ChatLine::new(LineKind::User, ROUTINE_REQUEST_LINE));
        self.queue.push_back(PendingTurn::Routine(body));
        Ok(self.dispatch_or_queue())
    }

    /// Applies the outcome of the in-flight request and returns the next
    /// request to send, if any is queued.
    ///
    /// Outcomes for any other ticket are stale and dropped.
    pub fn finish(&mut self, ticket: u64, outcome: ChatResult<String>) -> Option<AssistantRequest> {
        let mode = match &self.in_flight {
            Some(in_flight) if in_flight.ticket == ticket => in_flight.mode,
            _ => {
                warn!(ticket, "ignoring assistant reply for a request that is not in flight");
                return None;
            }
        };
        self.in_flight = None;

        match outcome {
            Ok(reply) => {
                debug!(ticket, ?mode, "assistant replied");
                // Routine replies join the free-chat context as well.
                self.transcript.push(ChatMessage::assistant(reply.clone()));
                self.lines.push(ChatLine::new(LineKind::Assistant, reply));
            }
            Err(err) => {
                warn!(ticket, ?mode, error = %err, "assistant request failed");
                self.lines
                    .push(ChatLine::new(LineKind::Error, mode.failure_line()));
            }
        }

        self.next_request()
    }

    fn dispatch_or_queue(&mut self) -> Submission {
        match self.next_request() {
            Some(request) => Submission::Dispatch(request),
            None => Submission::Queued,
        }
    }

    fn next_request(&mut self) -> Option<AssistantRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        let turn = self.queue.pop_front()?;

        let (mode, messages) = match turn {
            PendingTurn::Chat(text) => {
                self.transcript.push(ChatMessage::user(text));
                let mut messages = Vec::with_capacity(self.transcript.len() + 1);
                messages.push(ChatMessage::system(self.prompts.chat.clone()));
                messages.extend(self.transcript.iter().cloned());
                (TurnMode::Chat, messages)
            }
            PendingTurn::Routine(body) => (
                TurnMode::Routine,
                vec![
                    ChatMessage::system(self.prompts.routine.clone()),
                    ChatMessage::user(body),
                ],
            ),
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(InFlight { ticket, mode });
        debug!(ticket, ?mode, queued = self.queue.len(), "dispatching assistant request");

        Some(AssistantRequest {
            ticket,
            mode,
            messages,
        })
    }
}

fn routine_request_body(selected: &[&Product]) -> Result<String, ChatError> {
    let listing = serde_json::to_string_pretty(selected)?;
    Ok(format!(
        "Here are my selected products:\n{listing}\nPlease build a routine using only these products."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn session() -> ChatSession {
        ChatSession::new(Prompts::for_brand("L'Oréal"))
    }

    fn serum() -> Product {
        Product {
            id: 1,
            name: "Revitalift Serum".into(),
            brand: "L'Oréal Paris".into(),
            category: "skincare".into(),
            description: "Hyaluronic acid".into(),
            image: "serum.png".into(),
        }
    }

    fn dispatched(submission: Submission) -> AssistantRequest {
        match submission {
            Submission::Dispatch(request) => request,
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn starts_idle_with_greeting() {
        let session = session();
        assert_eq!(session.phase(), ChatPhase::Idle);
        assert!(session.transcript().is_empty());
        assert_eq!(session.lines().len(), 1);
        assert_eq!(session.lines()[0].text, GREETING);
    }

    #[test]
    fn blank_chat_input_is_ignored() {
        let mut session = session();
        assert_eq!(session.submit_chat("   "), Submission::Ignored);
        assert_eq!(session.lines().len(), 1);
        assert_eq!(session.phase(), ChatPhase::Idle);
    }

    #[test]
    fn chat_request_carries_system_prompt_and_transcript() {
        let mut session = session();
        let request = dispatched(session.submit_chat("  Which cleanser?  "));

        assert_eq!(session.phase(), ChatPhase::Sending);
        assert_eq!(request.mode, TurnMode::Chat);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1], ChatMessage::user("Which cleanser?"));

        let next = session.finish(request.ticket, Ok("Try the foaming one.".into()));
        assert!(next.is_none());
        assert_eq!(session.phase(), ChatPhase::Idle);
        assert_eq!(
            session.transcript(),
            &[
                ChatMessage::user("Which cleanser?"),
                ChatMessage::assistant("Try the foaming one.")
            ]
        );
        assert_eq!(session.lines().last().unwrap().kind, LineKind::Assistant);
    }

    #[test]
    fn failed_chat_keeps_transcript_and_shows_one_error_line() {
        let mut session = session();
        let request = dispatched(session.submit_chat("hello"));
        let lines_before = session.lines().len();

        session.finish(request.ticket, Err(ChatError::MissingReply));

        assert_eq!(session.transcript(), &[ChatMessage::user("hello")]);
        assert_eq!(session.lines().len(), lines_before + 1);
        let last = session.lines().last().unwrap();
        assert_eq!(last.kind, LineKind::Error);
        assert_eq!(last.text, CHAT_FAILURE);
        assert_eq!(session.phase(), ChatPhase::Idle);
    }

    #[test]
    fn empty_routine_shows_notice_without_request() {
        let mut session = session();
        let submission = session.submit_routine(&[]).unwrap();

        assert_eq!(submission, Submission::EmptySelection);
        assert_eq!(session.phase(), ChatPhase::Idle);
        assert_eq!(session.lines().len(), 2);
        assert_eq!(session.lines()[1].text, EMPTY_SELECTION_NOTICE);
    }

    #[test]
    fn routine_payload_is_independent_of_transcript() {
        let mut session = session();
        let chat = dispatched(session.submit_chat("hi"));
        session.finish(chat.ticket, Ok("hello".into()));

        let product = serum();
        let request = dispatched(session.submit_routine(&[&product]).unwrap());

        assert_eq!(request.mode, TurnMode::Routine);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[1].content.starts_with("Here are my selected products:\n"));
        assert!(request.messages[1].content.contains("\"name\": \"Revitalift Serum\""));
        assert_eq!(session.lines().last().unwrap().text, ROUTINE_REQUEST_LINE);

        session.finish(request.ticket, Ok("Step 1: serum".into()));
        assert_eq!(
            session.transcript().last(),
            Some(&ChatMessage::assistant("Step 1: serum"))
        );
    }

    #[test]
    fn failed_routine_uses_routine_apology() {
        let mut session = session();
        let product = serum();
        let request = dispatched(session.submit_routine(&[&product]).unwrap());

        session.finish(request.ticket, Err(ChatError::Status { status: 502, body: String::new() }));

        assert!(session.transcript().is_empty());
        assert_eq!(session.lines().last().unwrap().text, ROUTINE_FAILURE);
    }

    #[test]
    fn queued_turns_go_out_in_order_after_previous_reply() {
        let mut session = session();
        let first = dispatched(session.submit_chat("first"));
        let product = serum();

        assert_eq!(session.submit_routine(&[&product]).unwrap(), Submission::Queued);
        assert_eq!(session.submit_chat("second"), Submission::Queued);
        assert_eq!(session.queued(), 2);

        let routine = session.finish(first.ticket, Ok("reply one".into())).unwrap();
        assert_eq!(routine.mode, TurnMode::Routine);

        let second = session.finish(routine.ticket, Ok("routine".into())).unwrap();
        assert_eq!(second.mode, TurnMode::Chat);
        let contents: Vec<_> = second.messages.iter().skip(1).map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "reply one", "routine", "second"]);

        assert!(session.finish(second.ticket, Ok("reply two".into())).is_none());
        assert_eq!(session.transcript().len(), 5);
        assert_eq!(session.phase(), ChatPhase::Idle);
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let mut session = session();
        let request = dispatched(session.submit_chat("hi"));

        assert!(session.finish(request.ticket + 7, Ok("late".into())).is_none());
        assert_eq!(session.phase(), ChatPhase::Sending);
        assert_eq!(session.transcript().len(), 1);

        session.finish(request.ticket, Ok("on time".into()));
        assert!(session.finish(request.ticket, Ok("duplicate".into())).is_none());
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn queued_routine_keeps_products_from_submit_time() {
        let mut session = session();
        let first = dispatched(session.submit_chat("hello"));

        let serum = serum();
        assert_eq!(session.submit_routine(&[&serum]).unwrap(), Submission::Queued);

        let routine = session
            .finish(first.ticket, Ok("hi there".into()))
            .expect("routine dispatches after the chat reply");
        assert_eq!(routine.mode, TurnMode::Routine);
        assert_eq!(routine.messages.len(), 2);
        assert!(routine.messages[1].content.contains("Revitalift Serum"));
        assert!(!routine.messages[1].content.contains("hi there"));
    }
}
