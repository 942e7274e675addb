use thiserror::Error;

/// All errors produced by the rudpstream session engine.
#[derive(Debug, Error)]
pub enum RudpError {
    #[error("cannot send an empty payload")]
    EmptyPayload,

    #[error("datagram too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("truncated frame: payload declares {declared} bytes, {available} available")]
    Truncated { declared: usize, available: usize },

    #[error("unknown command: {0}")]
    UnknownCommand(u8),

    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error("message codec error: {0}")]
    Codec(String),
}

impl RudpError {
    /// Numeric result code for embedders that report integer diagnostics.
    ///
    /// Input failures map to `-1` (too short), `-2` (truncated) and `-3`
    /// (unknown command). Caller-side failures share `-1`.
    pub fn code(&self) -> i32 {
        match self {
            RudpError::TooShort { .. } => -1,
            RudpError::Truncated { .. } => -2,
            RudpError::UnknownCommand(_) => -3,
            RudpError::EmptyPayload
            | RudpError::InvalidConfig(_)
            | RudpError::Codec(_) => -1,
        }
    }
}

pub type Result<T> = std::result::Result<T, RudpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_codes_are_distinct() {
        let too_short = RudpError::TooShort {
            expected: 45,
            actual: 3,
        };
        let truncated = RudpError::Truncated {
            declared: 10,
            available: 2,
        };
        let unknown = RudpError::UnknownCommand(0x42);

        assert_eq!(too_short.code(), -1);
        assert_eq!(truncated.code(), -2);
        assert_eq!(unknown.code(), -3);
    }

    #[test]
    fn display_mentions_command_byte() {
        let msg = RudpError::UnknownCommand(7).to_string();
        assert!(msg.contains('7'), "{msg}");
    }
}
