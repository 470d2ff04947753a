use keyring::Entry;

const KEYRING_SERVICE: &str = "causerie";
const KEYRING_ACCOUNT: &str = "replicate";

/// Environment fallback consulted when no keyring entry exists.
pub const TOKEN_ENV_VAR: &str = "REPLICATE_API_TOKEN";

const TOKEN_PREFIX: &str = "r8_";
const TOKEN_LENGTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidToken;

impl std::fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "API tokens start with \"{TOKEN_PREFIX}\" and are {TOKEN_LENGTH} characters long"
        )
    }
}

impl std::error::Error for InvalidToken {}

/// Shape check applied before a token is stored or a session starts. A
/// passing token can still be rejected by the service; this only catches
/// obvious paste mistakes.
pub fn validate_token_format(token: &str) -> Result<(), InvalidToken> {
    if token.starts_with(TOKEN_PREFIX) && token.len() == TOKEN_LENGTH {
        Ok(())
    } else {
        Err(InvalidToken)
    }
}

/// Single-credential store: the system keyring holds the API token, with an
/// environment variable fallback for CI and containers.
pub struct CredentialStore {
    use_keyring: bool,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::with_keyring(true)
    }

    /// Construct a store with keyring access disabled (useful for tests).
    pub fn with_keyring(use_keyring: bool) -> Self {
        Self { use_keyring }
    }

    pub fn store_token(&self, token: &str) -> Result<(), Box<dyn std::error::Error>> {
        validate_token_format(token)?;
        if !self.use_keyring {
            return Ok(());
        }
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?;
        entry.set_password(token)?;
        Ok(())
    }

    pub fn remove_token(&self) -> Result<bool, Box<dyn std::error::Error>> {
        if !self.use_keyring {
            return Ok(false);
        }
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?;
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(Box::new(err)),
        }
    }

    /// Resolves the session credential: keyring entry first, environment
    /// variable as last resort. `None` means chat must be blocked before any
    /// generation is attempted.
    pub fn resolve_token(&self) -> Result<Option<String>, Box<dyn std::error::Error>> {
        if self.use_keyring {
            let entry = Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)?;
            match entry.get_password() {
                Ok(token) => return Ok(Some(token)),
                Err(keyring::Error::NoEntry) => {}
                Err(err) => return Err(Box::new(err)),
            }
        }

        match std::env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.is_empty() => Ok(Some(token)),
            _ => Ok(None),
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
