use std::fs::OpenOptions;
use std::io::Write;

use tracing_subscriber::EnvFilter;

use crate::core::message::Turn;

/// Installs the diagnostic subscriber. Filtered by `RUST_LOG`, quiet by
/// default, and writes to stderr so it never interleaves with the chat
/// output on stdout.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Optional transcript log: finished turns are appended to a user-chosen
/// file, prefixed the same way they are rendered on screen.
pub struct TranscriptLog {
    file_path: Option<String>,
}

impl TranscriptLog {
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = &log_file {
            Self::test_file_access(path)?;
        }
        Ok(TranscriptLog {
            file_path: log_file,
        })
    }

    pub fn is_active(&self) -> bool {
        self.file_path.is_some()
    }

    pub fn log_turn(&self, turn: &Turn) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = &self.file_path else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        writeln!(file, "{}: {}", turn.role.prompt_label(), turn.content)?;
        // Blank line between turns, matching the on-screen spacing.
        writeln!(file)?;
        file.flush()?;
        Ok(())
    }

    fn test_file_access(path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use tempfile::TempDir;

    #[test]
    fn disabled_log_is_a_no_op() {
        let log = TranscriptLog::new(None).expect("no file to touch");
        assert!(!log.is_active());
        log.log_turn(&Turn::new(Role::User, "hi")).expect("no-op");
    }

    #[test]
    fn turns_are_appended_with_role_labels() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("chat.log");
        let log = TranscriptLog::new(Some(path.to_string_lossy().into_owned())).expect("writable");

        log.log_turn(&Turn::user("Hi")).expect("writes");
        log.log_turn(&Turn::assistant("Hello")).expect("writes");

        let contents = std::fs::read_to_string(&path).expect("readable");
        assert_eq!(contents, "User: Hi\n\nAssistant: Hello\n\n");
    }

    #[test]
    fn unwritable_path_is_reported_up_front() {
        let result = TranscriptLog::new(Some("/definitely/not/a/dir/chat.log".to_string()));
        assert!(result.is_err());
    }
}
