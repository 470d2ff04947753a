use crate::core::models::ModelKind;

/// Repetition is never discouraged in this client; the parameter is sent but
/// not user-configurable.
pub const REPETITION_PENALTY: f64 = 1.0;

pub const MAX_TEMPERATURE: f64 = 5.0;
pub const MAX_LENGTH_CEILING: u32 = 4096;

/// Sampling parameters for one generation call.
///
/// Owned by the session, mutated only by explicit reconfiguration, and read
/// only during a call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model: ModelKind,
    pub temperature: f64,
    pub top_p: f64,
    pub max_length: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            temperature: 0.1,
            top_p: 0.9,
            max_length: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvalidConfig {
    Temperature(f64),
    TopP(f64),
    MaxLength(u32),
}

impl std::fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidConfig::Temperature(value) => write!(
                f,
                "temperature must be in (0, {MAX_TEMPERATURE}], got {value}"
            ),
            InvalidConfig::TopP(value) => {
                write!(f, "top_p must be in (0, 1], got {value}")
            }
            InvalidConfig::MaxLength(value) => write!(
                f,
                "max_length must be in [1, {MAX_LENGTH_CEILING}], got {value}"
            ),
        }
    }
}

impl std::error::Error for InvalidConfig {}

impl GenerationConfig {
    /// Rejects out-of-range parameters before any remote call is attempted.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if !self.temperature.is_finite()
            || self.temperature <= 0.0
            || self.temperature > MAX_TEMPERATURE
        {
            return Err(InvalidConfig::Temperature(self.temperature));
        }
        if !self.top_p.is_finite() || self.top_p <= 0.0 || self.top_p > 1.0 {
            return Err(InvalidConfig::TopP(self.top_p));
        }
        if self.max_length == 0 || self.max_length > MAX_LENGTH_CEILING {
            return Err(InvalidConfig::MaxLength(self.max_length));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(GenerationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn top_p_must_be_in_unit_interval_excluding_zero() {
        let mut config = GenerationConfig::default();

        config.top_p = 0.0;
        assert_eq!(config.validate(), Err(InvalidConfig::TopP(0.0)));

        config.top_p = 1.5;
        assert_eq!(config.validate(), Err(InvalidConfig::TopP(1.5)));

        config.top_p = 1.0;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn max_length_zero_is_rejected() {
        let mut config = GenerationConfig::default();
        config.max_length = 0;
        assert_eq!(config.validate(), Err(InvalidConfig::MaxLength(0)));
    }

    #[test]
    fn max_length_above_ceiling_is_rejected() {
        let mut config = GenerationConfig::default();
        config.max_length = MAX_LENGTH_CEILING + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn temperature_must_be_positive_and_bounded() {
        let mut config = GenerationConfig::default();

        config.temperature = 0.0;
        assert!(config.validate().is_err());

        config.temperature = f64::NAN;
        assert!(config.validate().is_err());

        config.temperature = 5.0;
        assert_eq!(config.validate(), Ok(()));

        config.temperature = 5.1;
        assert!(config.validate().is_err());
    }
}
