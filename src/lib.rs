//! Preinscription is a terminal client for a pre-registration service: a chat
//! with the service's assistant and a four-step registration form.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: the form wizard, chat sessions and their
//!   history, notifications, authentication helpers, storage and config.
//! - [`api`] defines the wire payloads and the [`api::Backend`] seam, with
//!   the reqwest implementation in [`api::http`].
//! - [`ui`] renders state as text and runs the interactive loops.
//! - [`cli`] parses arguments and dispatches into [`core::app`] and [`ui`].
//! - [`utils`] holds URL helpers and logging setup.
//!
//! The binary (`src/main.rs`) only calls [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
