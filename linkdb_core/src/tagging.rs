//! Interactive tagging session.
//!
//! The session walks the members of one key. Each member is displayed, then
//! the operator answers with `p` (next member), `e` (exit) or any words to
//! associate with the member. The state machine is driven by discrete events
//! so it can be exercised without a chat platform.

/// Reply that advances to the next member.
pub const NEXT: &str = "p";
/// Reply that ends the session.
pub const EXIT: &str = "e";
/// Message sent when the tagged key has no members.
pub const NO_DATA: &str = "no data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggingState {
    Prompting(usize),
    AwaitingReply(usize),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggingEvent<'a> {
    Reply(&'a str),
    /// No reply arrived in time.
    Timeout,
}

/// What the driver has to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggingStep {
    /// Show this member; the session now awaits a reply about it.
    Display(String),
    /// Wait for the next reply about this member.
    Await(String),
    Finished { empty: bool },
}

#[derive(Debug, Clone)]
pub struct TaggingSession {
    members: Vec<String>,
    state: TaggingState,
}

impl TaggingSession {
    #[must_use]
    pub fn new(members: Vec<String>) -> Self {
        let state = if members.is_empty() {
            TaggingState::Done
        } else {
            TaggingState::Prompting(0)
        };
        Self { members, state }
    }

    #[must_use]
    pub const fn state(&self) -> TaggingState {
        self.state
    }

    /// Advance past a display and report the next step.
    pub fn poll(&mut self) -> TaggingStep {
        match self.state {
            TaggingState::Prompting(index) => {
                self.state = TaggingState::AwaitingReply(index);
                TaggingStep::Display(self.members[index].clone())
            }
            TaggingState::AwaitingReply(index) => TaggingStep::Await(self.members[index].clone()),
            TaggingState::Done => TaggingStep::Finished {
                empty: self.members.is_empty(),
            },
        }
    }

    /// Apply an event. Returns the member and the words to associate with it
    /// when the reply was neither `p` nor `e`.
    pub fn handle(&mut self, event: TaggingEvent<'_>) -> Option<(String, Vec<String>)> {
        let TaggingState::AwaitingReply(index) = self.state else {
            return None;
        };
        match event {
            TaggingEvent::Timeout => {
                self.state = TaggingState::Done;
                None
            }
            TaggingEvent::Reply(text) => match text.trim() {
                NEXT => {
                    let next = index + 1;
                    self.state = if next < self.members.len() {
                        TaggingState::Prompting(next)
                    } else {
                        TaggingState::Done
                    };
                    None
                }
                EXIT => {
                    self.state = TaggingState::Done;
                    None
                }
                words => {
                    let values: Vec<String> =
                        words.split_whitespace().map(str::to_string).collect();
                    if values.is_empty() {
                        None
                    } else {
                        Some((self.members[index].clone(), values))
                    }
                }
            },
        }
    }
}

/// Message showing a member followed by its own members.
#[must_use]
pub fn prompt_text(member: &str, elements: &[String]) -> String {
    let elements: Vec<String> = elements.iter().map(|e| format!("`{e}`")).collect();
    format!("{member}\n{}", elements.join(" "))
}
