use serde::{Deserialize, Serialize};

/// Coarse classification of everything that can go wrong in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Wallet absent, locked or not trusted.
    Environment,
    /// Operation attempted before the session was ready; nothing was sent.
    Precondition,
    /// Submission, confirmation or RPC transport failure.
    Network,
    /// Account missing or undecodable; treated as "not yet initialized".
    StateRead,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorReport {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_kind_in_snake_case() {
        let report = ErrorReport::new(ErrorKind::Precondition, "wallet is not connected");
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["kind"], "precondition");
        assert_eq!(json["message"], "wallet is not connected");
    }
}
