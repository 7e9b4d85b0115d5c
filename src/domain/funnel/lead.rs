//! Lead wizard progress.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{LeadId, StateMachine, Timestamp};

/// Wizard position. Leads only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Started,
    Step1,
    Step2,
    Completed,
}

impl LeadStatus {
    fn rank(&self) -> u8 {
        match self {
            LeadStatus::Started => 0,
            LeadStatus::Step1 => 1,
            LeadStatus::Step2 => 2,
            LeadStatus::Completed => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Started => "started",
            LeadStatus::Step1 => "step1",
            LeadStatus::Step2 => "step2",
            LeadStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<LeadStatus> {
        match raw {
            "started" => Some(LeadStatus::Started),
            "step1" => Some(LeadStatus::Step1),
            "step2" => Some(LeadStatus::Step2),
            "completed" => Some(LeadStatus::Completed),
            _ => None,
        }
    }

    /// Step a visitor dropped off at, if they stop here.
    pub fn abandoned_at_step(&self) -> Option<i16> {
        match self {
            LeadStatus::Started | LeadStatus::Step1 => Some(1),
            LeadStatus::Step2 => Some(2),
            LeadStatus::Completed => None,
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for LeadStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        target.rank() > self.rank()
    }

    fn valid_transitions(&self) -> Vec<Self> {
        [
            LeadStatus::Started,
            LeadStatus::Step1,
            LeadStatus::Step2,
            LeadStatus::Completed,
        ]
        .into_iter()
        .filter(|s| self.can_transition_to(s))
        .collect()
    }
}

/// Revenue calculator answers from wizard step one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatorInputs {
    pub total_patients: Option<i32>,
    pub average_ticket: Option<f64>,
    pub inactive_percent: Option<f64>,
    pub lost_revenue: Option<f64>,
}

/// Contact details from wizard step two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub clinic_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    /// Browser session that owns this lead.
    pub session_id: String,
    pub status: LeadStatus,
    pub calculator: CalculatorInputs,
    pub contact: ContactDetails,
    pub abandoned_at_step: Option<i16>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl Lead {
    pub fn start(id: LeadId, session_id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id,
            session_id: session_id.into(),
            status: LeadStatus::Started,
            calculator: CalculatorInputs::default(),
            contact: ContactDetails::default(),
            abandoned_at_step: LeadStatus::Started.abandoned_at_step(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn record_calculator(&mut self, inputs: CalculatorInputs, now: Timestamp) {
        self.calculator = inputs;
        self.advance(LeadStatus::Step1, now);
    }

    pub fn record_contact(&mut self, contact: ContactDetails, now: Timestamp) {
        self.contact = contact;
        self.advance(LeadStatus::Step2, now);
    }

    pub fn complete(&mut self, contact: ContactDetails, inputs: CalculatorInputs, now: Timestamp) {
        self.contact = contact;
        self.calculator = inputs;
        if self.advance(LeadStatus::Completed, now) {
            self.completed_at = Some(now);
        }
    }

    /// Moves forward when allowed; replays of an earlier step keep the
    /// status where it is. Returns whether the status changed.
    fn advance(&mut self, target: LeadStatus, now: Timestamp) -> bool {
        self.updated_at = now;
        match self.status.transition_to(target) {
            Ok(next) => {
                self.status = next;
                self.abandoned_at_step = next.abandoned_at_step().or(self.abandoned_at_step);
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactDetails {
        ContactDetails {
            clinic_name: Some("Sorriso".to_string()),
            name: Some("Ana".to_string()),
            email: Some("ana@sorriso.com".to_string()),
            whatsapp: Some("+5511999990000".to_string()),
        }
    }

    #[test]
    fn wizard_moves_forward() {
        let now = Timestamp::now();
        let mut lead = Lead::start(LeadId::new(), "sess-1", now);
        assert_eq!(lead.abandoned_at_step, Some(1));

        lead.record_calculator(
            CalculatorInputs {
                total_patients: Some(800),
                ..Default::default()
            },
            now,
        );
        assert_eq!(lead.status, LeadStatus::Step1);

        lead.record_contact(contact(), now);
        assert_eq!(lead.status, LeadStatus::Step2);
        assert_eq!(lead.abandoned_at_step, Some(2));

        lead.complete(contact(), lead.calculator.clone(), now);
        assert_eq!(lead.status, LeadStatus::Completed);
        assert_eq!(lead.completed_at, Some(now));
        // drop-off step kept for reporting
        assert_eq!(lead.abandoned_at_step, Some(2));
    }

    #[test]
    fn replaying_earlier_step_keeps_status() {
        let now = Timestamp::now();
        let mut lead = Lead::start(LeadId::new(), "sess-2", now);
        lead.record_contact(contact(), now);

        lead.record_calculator(CalculatorInputs::default(), now);
        assert_eq!(lead.status, LeadStatus::Step2);
    }

    #[test]
    fn completed_is_terminal() {
        assert!(LeadStatus::Completed.is_terminal());
        assert_eq!(
            LeadStatus::Started.valid_transitions(),
            vec![LeadStatus::Step1, LeadStatus::Step2, LeadStatus::Completed]
        );
    }

    #[test]
    fn completing_twice_keeps_first_timestamp() {
        let first = Timestamp::now();
        let mut lead = Lead::start(LeadId::new(), "sess-3", first);
        lead.complete(contact(), CalculatorInputs::default(), first);

        lead.complete(contact(), CalculatorInputs::default(), first.plus_secs(60));
        assert_eq!(lead.completed_at, Some(first));
    }
}
