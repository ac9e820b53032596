//! Terminal front ends.
//!
//! - [`chat_loop`]: the chat session, reading lines while replies arrive in
//!   the background.
//! - [`register`]: the step-by-step registration form.
//! - [`render`]: text views shared by both.
//!
//! This layer only presents and captures input; [`crate::core`] owns the
//! state and talks to the backend.

pub mod chat_loop;
pub mod register;
pub mod render;
