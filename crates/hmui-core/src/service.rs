#![forbid(unsafe_code)]

//! Remote collaborator contract.
//!
//! The backend is reached through the [`Service`] trait: a transport-agnostic
//! set of fallible calls. Every call may fail; failures carry only a
//! human-readable message — the engine never branches on error codes, it
//! keeps last-known-good state and surfaces the message to the user.

use std::fmt;

use crate::config::AppConfig;
use crate::module::{Module, ModuleRules};
use crate::status::{DeviceInfo, StorageStatus, SystemInfo, VersionInfo};

/// Failure from a remote call. Message only, by design.
#[derive(Debug, Clone)]
pub struct ServiceError {
    message: String,
}

impl ServiceError {
    /// Create an error with the given user-facing message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Result type for remote calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// The remote backend surface.
///
/// Implementations must be `Send + Sync`: calls are issued from queued task
/// closures, off the model's update path. All calls are synchronous from the
/// implementation's point of view; the runtime provides the asynchrony.
pub trait Service: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn load_config(&self) -> ServiceResult<AppConfig>;
    fn save_config(&self, config: &AppConfig) -> ServiceResult<()>;
    fn reset_config(&self) -> ServiceResult<()>;

    fn scan_modules(&self) -> ServiceResult<Vec<Module>>;
    fn save_module_rules(&self, id: &str, rules: &ModuleRules) -> ServiceResult<()>;

    fn device_status(&self) -> ServiceResult<DeviceInfo>;
    fn version(&self) -> ServiceResult<VersionInfo>;
    fn storage_usage(&self) -> ServiceResult<StorageStatus>;
    fn system_info(&self) -> ServiceResult<SystemInfo>;

    /// Fire-and-forget; a successful return only means the request was sent.
    fn reboot(&self) -> ServiceResult<()>;
}
