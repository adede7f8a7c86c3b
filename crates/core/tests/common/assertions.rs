//! Assertion helpers over stage records.

use bk_protocol::step_models::{StepKey, StepRecord, StepStatus};

/// Find the record for `key`.
pub fn step(steps: &[StepRecord], key: StepKey) -> &StepRecord {
    steps
        .iter()
        .find(|record| record.key == key)
        .unwrap_or_else(|| panic!("no record for {key}"))
}

/// Assert the status of each listed stage.
pub fn assert_statuses(steps: &[StepRecord], expected: &[(StepKey, StepStatus)]) {
    for (key, status) in expected {
        assert_eq!(
            step(steps, *key).status,
            *status,
            "stage {key}: {:?}",
            step(steps, *key)
        );
    }
}

/// Assert every stage reached `completed`.
pub fn assert_all_completed(steps: &[StepRecord]) {
    for record in steps {
        assert_eq!(
            record.status,
            StepStatus::Completed,
            "stage {} should be completed: {}",
            record.key,
            record.message
        );
    }
}
