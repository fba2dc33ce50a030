// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `idlingresource.rs`

#[cfg(test)]
mod tests {
    use super::super::{restore_note, wake_note};
    use crate::idlers::WakeOutcome;

    #[test]
    fn test_wake_note_for_replicated_workloads() {
        assert_eq!(wake_note(WakeOutcome::ScaledTo(3)), "Scaled to 3");
        assert_eq!(wake_note(WakeOutcome::ScaledTo(1)), "Scaled to 1");
    }

    #[test]
    fn test_wake_note_for_scheduled_workloads() {
        // No replica count applies to a resumed schedule.
        assert_eq!(wake_note(WakeOutcome::Resumed), "WakedUp");
    }

    #[test]
    fn test_restore_note() {
        assert_eq!(restore_note(WakeOutcome::ScaledTo(2)), "Restored to 2");
        assert_eq!(restore_note(WakeOutcome::Resumed), "WakedUp");
    }
}
