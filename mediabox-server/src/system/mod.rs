//! Host integration: external commands and service management

pub mod command;
pub mod services;

pub use command::CommandOutput;
pub use services::{
    reports_not_running, validate_service_name, ServiceControl, ServiceStatus, ServiceVerb,
    Systemctl,
};
