//! State machines for Assets domain entities
//!
//! - Photo editorial review: EDITING → EDITED → APPROVED, with reject as the
//!   only backward edge
//! - Upload batch completion: NOT_YET closes exactly once into a status that
//!   is a pure function of the reported counters

use shutterdesk_common::StateError;

use crate::domain::entities::{BatchStatus, ProcessingStatus};

// ============================================================================
// Photo Review State Machine
// ============================================================================

/// Events that move a photo through editorial review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEvent {
    /// The editing workflow recorded an edited rendition
    MarkEdited,
    /// A reviewer approved the photo for delivery
    Approve,
    /// A reviewer sent the photo back to editing
    Reject,
}

impl std::fmt::Display for ReviewEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarkEdited => write!(f, "mark_edited"),
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

impl ProcessingStatus {
    /// Get all states reachable in one event
    pub fn valid_transitions(&self) -> &'static [ProcessingStatus] {
        match self {
            Self::Editing => &[Self::Edited, Self::Approved],
            Self::Edited => &[Self::Approved, Self::Editing],
            Self::Approved => &[Self::Editing],
        }
    }
}

/// Photo review state machine
pub struct PhotoReviewMachine;

impl PhotoReviewMachine {
    /// Attempt a transition.
    ///
    /// Approve and reject are idempotent: approving an APPROVED photo or
    /// rejecting an EDITING photo yields the same state.
    pub fn transition(
        current: ProcessingStatus,
        event: ReviewEvent,
    ) -> Result<ProcessingStatus, StateError> {
        let next = match (current, event) {
            (ProcessingStatus::Editing | ProcessingStatus::Edited, ReviewEvent::MarkEdited) => {
                ProcessingStatus::Edited
            }
            (_, ReviewEvent::Approve) => ProcessingStatus::Approved,
            (_, ReviewEvent::Reject) => ProcessingStatus::Editing,
            (ProcessingStatus::Approved, ReviewEvent::MarkEdited) => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };
        Ok(next)
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: ProcessingStatus, event: ReviewEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}

// ============================================================================
// Batch Completion
// ============================================================================

/// Upload batch completion rules
pub struct BatchCompletion;

impl BatchCompletion {
    /// Status implied by the reported counters
    pub fn status_for(uploaded_files: i32, failed_files: i32) -> BatchStatus {
        if uploaded_files == 0 {
            BatchStatus::Failed
        } else if failed_files > 0 {
            BatchStatus::InReview
        } else {
            BatchStatus::Completed
        }
    }

    /// Close a batch. Only an open (NOT_YET) batch may be closed, once.
    pub fn complete(
        current: BatchStatus,
        total_files: i32,
        uploaded_files: i32,
        failed_files: i32,
    ) -> Result<BatchStatus, StateError> {
        if current != BatchStatus::NotYet {
            return Err(StateError::TerminalState(format!(
                "batch is already {}",
                current
            )));
        }
        if uploaded_files < 0 || failed_files < 0 {
            return Err(StateError::GuardFailed(
                "Uploaded and failed counts must not be negative".to_string(),
            ));
        }
        if i64::from(uploaded_files) + i64::from(failed_files) > i64::from(total_files) {
            return Err(StateError::GuardFailed(format!(
                "Reported {} uploaded and {} failed files for a batch of {}",
                uploaded_files, failed_files, total_files
            )));
        }
        Ok(Self::status_for(uploaded_files, failed_files))
    }

    /// Status after every photo of the booking has been approved.
    ///
    /// Closed batches that carry uploads become COMPLETED; open and failed
    /// batches are left alone.
    pub fn promote_on_all_approved(current: BatchStatus) -> BatchStatus {
        match current {
            BatchStatus::InReview | BatchStatus::Completed => BatchStatus::Completed,
            other => other,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
