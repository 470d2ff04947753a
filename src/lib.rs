//! Causerie is a terminal chat client for Replicate-hosted Llama 2 models.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation transcript, the static model catalog,
//!   generation parameters, prompt assembly, and the response orchestration
//!   that folds streamed fragments into finished turns.
//! - [`api`] defines the prediction payloads, the [`api::StreamingGenerator`]
//!   boundary, and the Replicate client that implements it over server-sent
//!   events.
//! - [`auth`] stores the API credential in the system keyring with an
//!   environment fallback.
//! - [`ui`] runs the line-oriented chat loop that streams replies to the
//!   terminal.
//! - [`cli`] parses arguments and dispatches subcommands.
//!
//! The runtime entrypoint lives in the binary crate (`src/main.rs`) and
//! routes through [`cli::run`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
