use hoster_security::{AuthContext, PlanLimits};

/// Create-deployment quota: allowed iff authenticated and the caller's
/// current running-or-owned deployment count is below the plan's limit.
pub fn can_create_deployment(caller: &AuthContext, current_deployment_count: i64) -> (bool, Option<String>) {
    if !caller.is_authenticated() {
        return (false, Some("authentication required".to_string()));
    }
    let max = caller.plan_limits.max_deployments;
    if current_deployment_count < max {
        (true, None)
    } else {
        (
            false,
            Some(format!("plan limit reached: max {max} deployments")),
        )
    }
}

/// Resource envelope: allowed iff `current + requested` stays within the
/// plan for every dimension. The first dimension that fails determines the
/// returned reason, checked in a fixed order (CPU, then memory, then disk)
/// so the message is deterministic.
pub fn check_resource_envelope(
    limits: &PlanLimits,
    current_cpu_cores: i64,
    current_memory_mb: i64,
    current_disk_mb: i64,
    requested_cpu_cores: i64,
    requested_memory_mb: i64,
    requested_disk_mb: i64,
) -> (bool, Option<String>) {
    if current_cpu_cores + requested_cpu_cores > limits.max_cpu_cores {
        return (
            false,
            Some(format!(
                "plan limit reached: max {} CPU cores",
                limits.max_cpu_cores
            )),
        );
    }
    if current_memory_mb + requested_memory_mb > limits.max_memory_mb {
        return (
            false,
            Some(format!(
                "plan limit reached: max {} MB memory",
                limits.max_memory_mb
            )),
        );
    }
    if current_disk_mb + requested_disk_mb > limits.max_disk_mb {
        return (
            false,
            Some(format!("plan limit reached: max {} MB disk", limits.max_disk_mb)),
        );
    }
    (true, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authed(max_deployments: i64) -> AuthContext {
        let mut ctx = hoster_security::resolve(&std::collections::HashMap::from([("X-User-ID", "u1")]));
        ctx.plan_limits.max_deployments = max_deployments;
        ctx
    }

    #[test]
    fn unauthenticated_caller_is_always_denied() {
        let ctx = AuthContext::unauthenticated();
        let (allowed, reason) = can_create_deployment(&ctx, 0);
        assert!(!allowed);
        assert!(reason.is_some());
    }

    #[test]
    fn denies_at_the_limit_and_allows_below_it() {
        let ctx = authed(1);
        assert!(can_create_deployment(&ctx, 0).0);
        let (allowed, reason) = can_create_deployment(&ctx, 1);
        assert!(!allowed);
        assert_eq!(reason.unwrap(), "plan limit reached: max 1 deployments");
    }

    #[test]
    fn envelope_reports_first_failing_dimension() {
        let limits = PlanLimits {
            max_cpu_cores: 2,
            max_memory_mb: 2048,
            max_disk_mb: 10240,
            ..PlanLimits::default()
        };
        let (allowed, reason) = check_resource_envelope(&limits, 1, 0, 0, 2, 0, 0);
        assert!(!allowed);
        assert!(reason.unwrap().contains("CPU"));

        let (allowed, reason) = check_resource_envelope(&limits, 0, 2000, 0, 1, 100, 0);
        assert!(!allowed);
        assert!(reason.unwrap().contains("memory"));
    }

    #[test]
    fn envelope_allows_exact_fit() {
        let limits = PlanLimits::default();
        let (allowed, _) = check_resource_envelope(
            &limits,
            0,
            0,
            0,
            limits.max_cpu_cores,
            limits.max_memory_mb,
            limits.max_disk_mb,
        );
        assert!(allowed);
    }
}
