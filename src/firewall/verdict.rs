//! Evaluation verdicts returned by the policy engine

use std::fmt;

use tracing::warn;

/// Event id reported when the response carries none
pub const MISSING_EVENT_ID: &str = "N/A";

/// Action the policy engine wants taken on the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Allow,
    Deny,
    /// Held for manual review; resolve out of band using the event id
    NeedsApproval,
    /// Missing or unrecognized `actionToTake`
    Unknown,
}

impl Action {
    /// Map the raw `actionToTake` value, case-insensitively
    pub fn from_wire(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            warn!("Policy response has no actionToTake");
            return Action::Unknown;
        };

        match raw.to_lowercase().as_str() {
            "allow" => Action::Allow,
            "deny" => Action::Deny,
            "needsapproval" => Action::NeedsApproval,
            _ => {
                warn!("Unrecognized policy action: {:?}", raw);
                Action::Unknown
            }
        }
    }

    /// Whether someone has to act before the transaction can be settled
    pub fn requires_follow_up(&self) -> bool {
        matches!(self, Action::NeedsApproval | Action::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "ALLOW",
            Action::Deny => "DENY",
            Action::NeedsApproval => "NEEDS_APPROVAL",
            Action::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one evaluation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationVerdict {
    event_id: String,
    action: Action,
}

impl EvaluationVerdict {
    pub fn new(event_id: Option<String>, action: Action) -> Self {
        Self {
            event_id: event_id.unwrap_or_else(|| MISSING_EVENT_ID.to_string()),
            action,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

impl fmt::Display for EvaluationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (event {})", self.action, self.event_id)
    }
}
