/// Controls the "escalate to a human" prompt
#[derive(Debug, Clone)]
pub struct EscalationGate {
    marker: String,
    url: String,
    visible: bool,
}

/// User's answer to the escalation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationChoice {
    Yes,
    No,
}

impl EscalationGate {
    pub fn new(marker: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            marker: marker.into().to_lowercase(),
            url: url.into(),
            visible: false,
        }
    }

    /// Re-evaluate the gate against a fresh bot answer. The prompt shows when
    /// the backend flags the answer as not contextual or the text carries the
    /// marker.
    pub fn observe_answer(&mut self, answer: &str, contextual: bool) -> bool {
        let has_marker = !self.marker.is_empty() && answer.to_lowercase().contains(&self.marker);
        self.visible = !contextual || has_marker;
        if self.visible {
            tracing::debug!(contextual, has_marker, "answer has no context, offering escalation");
        }
        self.visible
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Resolve the prompt. `Yes` returns the escalation target.
    pub fn resolve(&mut self, choice: EscalationChoice) -> Option<&str> {
        if !self.visible {
            return None;
        }
        self.visible = false;
        match choice {
            EscalationChoice::Yes => Some(&self.url),
            EscalationChoice::No => None,
        }
    }

    pub fn reset(&mut self) {
        self.visible = false;
    }
}
