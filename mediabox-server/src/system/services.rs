//! User service management through systemd

use async_trait::async_trait;
use std::fmt;
use tracing::info;

use super::command::{self, CommandOutput};
use crate::error::{Error, Result};

/// Markers in `systemctl status` output meaning the unit is not running
const INACTIVE_MARKERS: &[&str] = &[
    "inactive",
    "dead",
    "not running",
    "failed",
    "exited",
    "killed",
];

/// Lifecycle operation on a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceVerb {
    Start,
    Stop,
    Restart,
}

impl ServiceVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceVerb::Start => "start",
            ServiceVerb::Stop => "stop",
            ServiceVerb::Restart => "restart",
        }
    }

    pub fn gerund(&self) -> &'static str {
        match self {
            ServiceVerb::Start => "starting",
            ServiceVerb::Stop => "stopping",
            ServiceVerb::Restart => "restarting",
        }
    }

    /// Past tense used in replies ("started", ...)
    pub fn past_tense(&self) -> &'static str {
        match self {
            ServiceVerb::Start => "started",
            ServiceVerb::Stop => "stopped",
            ServiceVerb::Restart => "restarted",
        }
    }
}

impl fmt::Display for ServiceVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Running(String),
    NotRunning(String),
}

/// Host service and power control
#[async_trait]
pub trait ServiceControl: Send + Sync {
    async fn control(&self, verb: ServiceVerb, service: &str) -> Result<()>;

    async fn status(&self, service: &str) -> Result<ServiceStatus>;

    async fn reboot(&self) -> Result<()>;
}

/// Check a unit name before it is handed to the service manager
pub fn validate_service_name(service: &str) -> Result<()> {
    let valid = !service.is_empty()
        && !service.starts_with('-')
        && service
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(Error::BadRequest("Invalid service name.".to_string()))
    }
}

/// True if status output says the unit is stopped rather than unknown
pub fn reports_not_running(output: &str) -> bool {
    INACTIVE_MARKERS.iter().any(|marker| output.contains(marker))
}

/// `systemctl --user` backed [`ServiceControl`]
#[derive(Debug, Clone, Default)]
pub struct Systemctl;

impl Systemctl {
    pub fn new() -> Self {
        Self
    }

    async fn systemctl(&self, verb: &str, service: &str) -> Result<CommandOutput> {
        validate_service_name(service)?;
        command::run("systemctl", &["--user", verb, service])
            .await
            .map_err(|e| Error::Service(format!("Failed to run systemctl: {}", e)))
    }
}

#[async_trait]
impl ServiceControl for Systemctl {
    async fn control(&self, verb: ServiceVerb, service: &str) -> Result<()> {
        let output = self.systemctl(verb.as_str(), service).await?;
        if output.success {
            info!("{} {}", service, verb.past_tense());
            Ok(())
        } else {
            tracing::error!("systemctl {} {} failed: {}", verb, service, output.stderr.trim());
            Err(Error::Service(format!("Error {} service.", verb.gerund())))
        }
    }

    async fn status(&self, service: &str) -> Result<ServiceStatus> {
        let output = self.systemctl("status", service).await?;
        if output.success {
            Ok(ServiceStatus::Running(output.stdout))
        } else if reports_not_running(&output.stdout) {
            Ok(ServiceStatus::NotRunning(output.stdout))
        } else {
            tracing::error!("systemctl status {} failed: {}", service, output.stderr.trim());
            Err(Error::Service("Error retrieving service status.".to_string()))
        }
    }

    async fn reboot(&self) -> Result<()> {
        let output = command::run("sudo", &["reboot"])
            .await
            .map_err(|e| Error::Service(format!("Failed to run reboot: {}", e)))?;
        if output.success {
            info!("Reboot requested");
            Ok(())
        } else {
            tracing::error!("Error rebooting: {}", output.stderr.trim());
            Err(Error::Service("Error rebooting.".to_string()))
        }
    }
}
