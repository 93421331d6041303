use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a fiscal document.
///
/// `Draft → Pending → {Accepted, Rejected}`; `Pending | Accepted → Void`.
/// `Rejected` and `Void` are terminal and nothing re-enters `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentStatus {
    Draft,
    Pending,
    Accepted,
    Rejected,
    Void,
}

/// Something that happens to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Submit,
    /// Resend the numbered payload to the gateway.
    Dispatch,
    GatewayAccepted,
    GatewayRejected,
    Void,
}

/// Outcome of a legal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The document moves to a new status.
    Move(DocumentStatus),
    /// The event is legal but changes nothing (idempotent repeat).
    Stay,
}

/// Why an event was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Not in the transition table.
    Illegal,
    /// Voiding a document that is already final.
    AlreadyTerminal,
}

impl DocumentStatus {
    /// The transition table. Every status check in the engine goes through here.
    pub fn apply(self, event: LifecycleEvent) -> Result<Transition, Refusal> {
        use DocumentStatus::*;
        use LifecycleEvent as E;

        match (self, event) {
            (Draft, E::Submit) => Ok(Transition::Move(Pending)),
            (Pending, E::Dispatch) => Ok(Transition::Stay),
            (Pending, E::GatewayAccepted) => Ok(Transition::Move(Accepted)),
            (Accepted, E::GatewayAccepted) => Ok(Transition::Stay),
            (Pending, E::GatewayRejected) => Ok(Transition::Move(Rejected)),
            (Pending | Accepted, E::Void) => Ok(Transition::Move(Void)),
            (Rejected | Void, E::Void) => Err(Refusal::AlreadyTerminal),
            _ => Err(Refusal::Illegal),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Void)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Void => "VOID",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submit => "submit",
            Self::Dispatch => "dispatch",
            Self::GatewayAccepted => "gateway acceptance",
            Self::GatewayRejected => "gateway rejection",
            Self::Void => "void",
        };
        f.write_str(name)
    }
}
