// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `retry.rs`

#[cfg(test)]
mod tests {
    use super::super::{is_conflict, ConflictBackoff};
    use std::time::Duration;

    /// Test the delay sequence: 100ms doubling, ±10% jitter
    #[test]
    fn test_delay_progression() {
        let mut backoff = ConflictBackoff::new();

        let first = backoff.next_delay();
        assert!(
            first >= Duration::from_millis(90) && first <= Duration::from_millis(110),
            "first delay should be ~100ms (±10%), got {first:?}"
        );

        let second = backoff.next_delay();
        assert!(
            second >= Duration::from_millis(180) && second <= Duration::from_millis(220),
            "second delay should be ~200ms (±10%), got {second:?}"
        );

        let third = backoff.next_delay();
        assert!(
            third >= Duration::from_millis(360) && third <= Duration::from_millis(440),
            "third delay should be ~400ms (±10%), got {third:?}"
        );
    }

    /// Test that the delay caps at 30 seconds
    #[test]
    fn test_delay_caps_at_maximum() {
        let mut backoff = ConflictBackoff::new();

        // 100ms doubles past 30s after ~19 steps
        let mut last = Duration::ZERO;
        for _ in 0..25 {
            last = backoff.next_delay();
        }

        assert!(
            last >= Duration::from_secs(27) && last <= Duration::from_secs(33),
            "capped delay should be ~30s (±10%), got {last:?}"
        );
    }

    /// Test that successive delays never shrink below the jitter window
    #[test]
    fn test_delays_grow_monotonically_up_to_jitter() {
        let mut backoff = ConflictBackoff::new();
        let mut previous = backoff.next_delay();

        // Stay below the cap, where doubling dominates the ±10% jitter.
        for _ in 0..7 {
            let next = backoff.next_delay();
            assert!(next > previous, "expected {next:?} > {previous:?}");
            previous = next;
        }
    }

    /// Test that HTTP 409 is classified as a conflict
    #[test]
    fn test_409_is_conflict() {
        let err = kube::Error::Api(kube::error::ErrorResponse {
            status: "Conflict".to_string(),
            message: "the object has been modified".to_string(),
            reason: "Conflict".to_string(),
            code: 409,
        });

        assert!(is_conflict(&err), "HTTP 409 should be a conflict");
    }

    /// Test that other API errors are not conflicts
    #[test]
    fn test_non_409_is_not_conflict() {
        let err_404 = kube::Error::Api(kube::error::ErrorResponse {
            status: "Not Found".to_string(),
            message: "resource not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        });
        assert!(!is_conflict(&err_404), "HTTP 404 is not a conflict");

        let err_500 = kube::Error::Api(kube::error::ErrorResponse {
            status: "Internal Server Error".to_string(),
            message: "server error".to_string(),
            reason: "InternalServerError".to_string(),
            code: 500,
        });
        assert!(!is_conflict(&err_500), "HTTP 500 is not a conflict");
    }

    /// Test that service/network errors are not conflicts
    #[test]
    fn test_service_errors_are_not_conflicts() {
        let service_error: Box<dyn std::error::Error + Send + Sync> = Box::new(
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection failed"),
        );

        let err = kube::Error::Service(service_error);
        assert!(!is_conflict(&err));
    }
}
