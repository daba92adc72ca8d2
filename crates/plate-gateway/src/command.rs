//! Mapping from [`Command`] to gateway calls.

use plate_core::ServiceConfig;
use tracing::{debug, warn};

use crate::docker::CommandGateway;
use crate::types::{Command, CommandOutcome};

/// Run one command against the gateway and fold the result into an outcome.
///
/// Never fails: every gateway error becomes the failure payload of the
/// matching [`CommandOutcome`] variant.
pub async fn run_command<G>(gateway: &G, service: &ServiceConfig, command: &Command) -> CommandOutcome
where
    G: CommandGateway + ?Sized,
{
    let resource = service.resource_name();
    debug!(resource = %resource, command = command.label(), "Running command");

    let outcome = match command {
        Command::Inspect => CommandOutcome::Inspected(gateway.inspect(&resource).await),
        Command::CheckImage => CommandOutcome::ImageChecked {
            present: gateway.image_present(&service.image()).await,
        },
        Command::Pull => CommandOutcome::Pulled(flatten(gateway.pull(&service.image()).await)),
        Command::Provision => {
            CommandOutcome::Provisioned(flatten(gateway.provision(service).await))
        }
        Command::Resume { handle } => CommandOutcome::Resumed(flatten(gateway.resume(handle).await)),
        Command::Stop { handle } => CommandOutcome::Stopped(flatten(gateway.stop(handle).await)),
        Command::Remove { handle, is_reset } => CommandOutcome::Removed {
            result: flatten(gateway.remove(handle).await),
            is_reset: *is_reset,
        },
    };

    if let Some(error) = outcome.error() {
        warn!(resource = %resource, command = command.label(), error, "Command failed");
    }

    outcome
}

fn flatten<T>(result: crate::Result<T>) -> Result<T, String> {
    result.map_err(|e| {
        debug!(command_line = e.command(), retriable = e.is_retriable(), "Gateway error");
        e.to_string()
    })
}

#[cfg(test)]
mod tests {
    use plate_core::ServiceKind;

    use super::*;
    use crate::docker::mock::{MockGateway, MockOp};
    use crate::types::{ContainerState, Inspection};

    fn redis() -> ServiceConfig {
        ServiceConfig::new(ServiceKind::Redis, "cache", "7", 6379)
    }

    #[tokio::test]
    async fn inspect_reports_existing_container() {
        let gateway = MockGateway::new().with_container("plate-redis-cache", "abc123", true);
        let outcome = run_command(&gateway, &redis(), &Command::Inspect).await;
        assert_eq!(
            outcome,
            CommandOutcome::Inspected(Inspection::Found {
                handle: "abc123".to_string(),
                state: ContainerState::Running,
            })
        );
    }

    #[tokio::test]
    async fn check_image_uses_service_image() {
        let gateway = MockGateway::new().with_image("redis:7");
        let outcome = run_command(&gateway, &redis(), &Command::CheckImage).await;
        assert_eq!(outcome, CommandOutcome::ImageChecked { present: true });
    }

    #[tokio::test]
    async fn failures_become_payloads() {
        let gateway = MockGateway::new();
        gateway.fail(MockOp::Pull, "manifest unknown");

        let outcome = run_command(&gateway, &redis(), &Command::Pull).await;
        assert_eq!(outcome, CommandOutcome::Pulled(Err("manifest unknown".to_string())));
    }

    #[tokio::test]
    async fn remove_echoes_reset_flag() {
        let gateway = MockGateway::new().with_container("plate-redis-cache", "abc123", false);
        let outcome = run_command(
            &gateway,
            &redis(),
            &Command::Remove {
                handle: "abc123".to_string(),
                is_reset: true,
            },
        )
        .await;
        assert_eq!(
            outcome,
            CommandOutcome::Removed {
                result: Ok(()),
                is_reset: true
            }
        );
        assert!(gateway.container("plate-redis-cache").is_none());
    }
}
