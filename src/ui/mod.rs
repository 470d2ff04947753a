//! Line-oriented chat loop
//!
//! Reads one message per line from stdin, streams the reply to stdout as it
//! arrives, and handles the `/clear` and `/quit` session commands. This is
//! deliberately plain: the conversational core treats display as a callback,
//! and this module is just one adapter for it.

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::api::StreamingGenerator;
use crate::core::session::{ChatSession, SessionError};
use crate::logging::TranscriptLog;

const HELP_TEXT: &str =
    "Commands:\n  /clear   Start the conversation over\n  /help    Show this help\n  /quit    Exit";

/// Prints only the not-yet-printed suffix of the growing accumulator, so a
/// callback that always receives the full text renders as a smooth stream.
struct DeltaPrinter {
    printed: usize,
}

impl DeltaPrinter {
    fn new() -> Self {
        Self { printed: 0 }
    }

    fn update(&mut self, full_text: &str) {
        if full_text.len() > self.printed {
            print!("{}", &full_text[self.printed..]);
            let _ = std::io::stdout().flush();
            self.printed = full_text.len();
        }
    }
}

fn print_greeting(session: &ChatSession) {
    if let Some(turn) = session.transcript().all().first() {
        println!("Assistant: {}\n", turn.content);
    }
}

pub async fn run_chat(
    mut session: ChatSession,
    generator: &dyn StreamingGenerator,
    log: TranscriptLog,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "causerie {} ({})",
        env!("CARGO_PKG_VERSION"),
        session.config().model.display_name()
    );
    println!("Type /help for commands.\n");
    print_greeting(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "/quit" | "/exit" => break,
            "/help" => {
                println!("{HELP_TEXT}\n");
                continue;
            }
            "/clear" => {
                session.clear();
                println!("Conversation cleared.\n");
                print_greeting(&session);
                continue;
            }
            _ => {}
        }

        // Blank submissions are ignored rather than rejected.
        if !session.submit(input) {
            continue;
        }
        if let Some(turn) = session.transcript().all().last() {
            log.log_turn(turn)?;
        }

        print!("Assistant: ");
        let _ = std::io::stdout().flush();

        let cancel = CancellationToken::new();
        let mut printer = DeltaPrinter::new();
        let result = tokio::select! {
            result = session.respond(generator, cancel.clone(), |so_far| printer.update(so_far)) => result,
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                Err(SessionError::Cancelled)
            }
        };

        match result {
            Ok(turn) => {
                log.log_turn(turn)?;
                println!("\n");
            }
            Err(SessionError::Cancelled) => {
                println!("\n[generation interrupted]\n");
            }
            Err(err) => {
                // Terminal for this attempt; the user can resubmit.
                println!("\nError: {err}\n");
            }
        }
    }

    Ok(())
}
