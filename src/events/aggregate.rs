//! Per-item reconstruction of an approval history from its event set.

use chrono::{Months, NaiveDate};

use super::WorkflowEvent;

/// One approval notice, after the cycle-week requirement has been enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Approval {
    pub occurred_at: NaiveDate,
    pub week: u32,
}

/// Everything the chronological fold recovers for a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalHistory {
    pub first: Approval,
    pub rejections_before_first: u32,
    /// Approvals after the first, in date order.
    pub resubmissions: Vec<Approval>,
    pub rework: Option<Rework>,
}

/// A resubmission approved long after the original sign-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rework {
    pub approval: Approval,
    /// Approvals recorded after the rework event.
    pub later_approvals: u32,
}

/// How far past the first approval a resubmission must land to count as
/// rework rather than a routine follow-up cycle.
const REWORK_THRESHOLD_MONTHS: u32 = 3;

/// Rebuild an item's approval history from its unordered event set.
///
/// Returns `None` when the item never reached an approval. Events are
/// walked in date order (stable for same-day ties): rejections accumulate
/// in a pending counter, the first approval captures that counter, and
/// every approval resets it. Rejections between later approvals are thus
/// dropped; only the pre-first-approval count is reported.
pub fn reconstruct(mut events: Vec<WorkflowEvent>) -> Option<ApprovalHistory> {
    events.sort_by_key(WorkflowEvent::occurred_at);

    let mut pending_rejections = 0u32;
    let mut first: Option<Approval> = None;
    let mut rejections_before_first = 0u32;
    let mut resubmissions = Vec::new();

    for event in &events {
        match *event {
            WorkflowEvent::Rejected { .. } => pending_rejections += 1,
            WorkflowEvent::Approved { occurred_at, week } => {
                let approval = Approval { occurred_at, week };
                if first.is_none() {
                    first = Some(approval);
                    rejections_before_first = pending_rejections;
                } else {
                    resubmissions.push(approval);
                }
                pending_rejections = 0;
            }
        }
    }

    let first = first?;
    let rework = classify_rework(first, &resubmissions);

    Some(ApprovalHistory {
        first,
        rejections_before_first,
        resubmissions,
        rework,
    })
}

/// Second pass over the resubmissions: the earliest one landing strictly
/// more than three calendar months after the first approval, plus a count
/// of what came after it. Resubmissions inside the window never affect the
/// rework fields.
fn classify_rework(first: Approval, resubmissions: &[Approval]) -> Option<Rework> {
    let threshold = first
        .occurred_at
        .checked_add_months(Months::new(REWORK_THRESHOLD_MONTHS))?;
    let position = resubmissions
        .iter()
        .position(|approval| approval.occurred_at > threshold)?;
    Some(Rework {
        approval: resubmissions[position],
        later_approvals: (resubmissions.len() - position - 1) as u32,
    })
}
