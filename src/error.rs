use thiserror::Error;

/// Failures that halt the simulator. Anything recoverable is folded
/// into the upload buffer's redelivery instead of surfacing here.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("realm identifier unavailable: {0}")]
    Realm(String),

    #[error("failed to initialise transport: {0}")]
    TransportInit(String),

    #[error("collector exchange failed: {0}")]
    Transport(String),

    #[error("unsupported response version: {0}")]
    UnsupportedVersion(f64),

    #[error("collector response has no usable version: {0}")]
    UnversionedResponse(String),

    #[error("unsupported response type: {0}")]
    UnsupportedResponseType(i64),

    #[error("failed to encode payload: {0}")]
    Encode(String),
}

impl SimError {
    // Process exit status
    pub fn code(&self) -> u8 {
        match self {
            SimError::Config(_) => 2,
            SimError::Realm(_) => 3,
            SimError::TransportInit(_) => 4,
            SimError::Transport(_) => 5,
            SimError::UnsupportedVersion(_) => 6,
            SimError::UnsupportedResponseType(_) => 7,
            SimError::Encode(_) => 8,
            SimError::UnversionedResponse(_) => 9,
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Encode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_and_nonzero() {
        let errors = [
            SimError::Config(String::new()),
            SimError::Realm(String::new()),
            SimError::TransportInit(String::new()),
            SimError::Transport(String::new()),
            SimError::UnsupportedVersion(2.0),
            SimError::UnsupportedResponseType(9),
            SimError::Encode(String::new()),
            SimError::UnversionedResponse(String::new()),
        ];
        let mut codes: Vec<u8> = errors.iter().map(SimError::code).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
