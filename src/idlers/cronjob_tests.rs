// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the cronjob idler decision logic

#[cfg(test)]
mod tests {
    use crate::crd::{CrossVersionObjectReference, IdlingResource, IdlingResourceSpec};
    use crate::idlers::cronjob::{needs_idle, needs_wakeup};
    use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec};

    fn instance(idle: bool) -> IdlingResource {
        IdlingResource::new(
            "hello-idler",
            IdlingResourceSpec {
                idling_resource_ref: CrossVersionObjectReference {
                    kind: "CronJob".to_string(),
                    name: "hello".to_string(),
                    api_version: Some("batch/v1".to_string()),
                },
                idle,
                idling_strategy: None,
                wakeup_strategy: None,
            },
        )
    }

    fn cronjob(suspend: Option<bool>) -> CronJob {
        CronJob {
            spec: Some(CronJobSpec {
                suspend,
                schedule: "*/1 * * * *".to_string(),
                ..CronJobSpec::default()
            }),
            ..CronJob::default()
        }
    }

    #[test]
    fn test_needs_idle_only_while_schedule_runs() {
        assert!(needs_idle(&instance(true), &cronjob(Some(false))));
        assert!(!needs_idle(&instance(true), &cronjob(Some(true))));
        assert!(!needs_idle(&instance(false), &cronjob(Some(false))));
    }

    #[test]
    fn test_needs_wakeup_only_while_suspended() {
        assert!(needs_wakeup(&instance(false), &cronjob(Some(true))));
        assert!(!needs_wakeup(&instance(false), &cronjob(Some(false))));
        assert!(!needs_wakeup(&instance(true), &cronjob(Some(true))));
    }

    #[test]
    fn test_nil_suspend_counts_as_running() {
        assert!(needs_idle(&instance(true), &cronjob(None)));
        assert!(!needs_wakeup(&instance(false), &cronjob(None)));
    }
}
