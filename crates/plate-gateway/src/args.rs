//! Argument builders for docker invocations.
//!
//! These helpers construct the argument vectors passed to the docker binary.
//! They are pure so the exact command lines can be checked without a daemon.

use plate_core::ServiceConfig;

/// Build the `docker run` arguments that provision a service.
///
/// Produces `run -d --name <resource> [-e VAR=value]... -p <host>:<internal> <image>`.
#[must_use]
pub fn run_args(service: &ServiceConfig) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        service.resource_name(),
    ];

    for var in service.kind.environment() {
        args.push("-e".to_string());
        args.push(var);
    }

    args.push("-p".to_string());
    args.push(service.port_mapping());
    args.push(service.image());
    args
}

/// Build the `docker ps` arguments that look up a container by exact name.
#[must_use]
pub fn inspect_args(resource_name: &str) -> Vec<String> {
    vec![
        "ps".to_string(),
        "-a".to_string(),
        "--filter".to_string(),
        format!("name=^{resource_name}$"),
        "--format".to_string(),
        "{{.ID}}\t{{.State}}".to_string(),
    ]
}
