//! Mythos — narrator implementations.
//!
//! [`scripted::ScriptedNarrator`] plays a fixed seven-beat scenario and
//! needs no network. [`generative::GenerativeNarrator`] asks a language
//! model for JSON beats through a [`backend::CompletionBackend`], with
//! [`backend::MessagesBackend`] talking to an Anthropic-style Messages API.

pub mod backend;
pub mod generative;
pub mod prompts;
pub mod scripted;
