//! The assistant side of Foreman.
//!
//! Each assistant follows a **Ask → Act → Observe** cycle:
//!
//! 1. **Receive** a user message and append it to the conversation
//! 2. **Send** the whole conversation, persona and tool catalogue to the model
//! 3. **If tool calls**: run them all concurrently, append the results, go to 2
//! 4. **If text only**: return the first text block to the caller
//!
//! The loop stops on a text-only answer, on the turn limit, or on the
//! wall-clock deadline. Assistants that produce findings publish them as
//! [`AgentEvent`](foreman_core::AgentEvent)s through an [`EventPublisher`].

pub mod assistant;
pub mod loop_runner;
pub mod output;
pub mod publisher;

#[cfg(test)]
mod test_support;

pub use assistant::Assistant;
pub use loop_runner::{AgentLoop, ChatOutcome, ToolLogEntry};
pub use output::parse_structured_output;
pub use publisher::EventPublisher;
