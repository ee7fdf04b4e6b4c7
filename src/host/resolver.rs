//! Process resolver
//!
//! The GPU reports bare PIDs; the resolver looks each one up in the OS
//! process table. A process may exit between the GPU snapshot and the
//! lookup, so every resolution can fail on its own.

use crate::domain::NOT_AVAILABLE;
use crate::error::ProcessLookupError;

use std::sync::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, System, UpdateKind, Users};

/// OS metadata of a single process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    /// Process name
    pub name: String,
    /// Name of the owning user
    pub user: String,
    /// Parent process ID (0 when there is no parent)
    pub parent_pid: u32,
    /// Parent process name
    pub parent_name: String,
    /// Start time in seconds since the epoch
    pub create_time_epoch_seconds: u64,
}

/// Lookup of process metadata by PID
pub trait ProcessResolver: Send + Sync {
    /// Resolve one PID
    fn resolve(&self, pid: u32) -> Result<ProcessIdentity, ProcessLookupError>;
}

impl<T: ProcessResolver + ?Sized> ProcessResolver for &T {
    fn resolve(&self, pid: u32) -> Result<ProcessIdentity, ProcessLookupError> {
        (**self).resolve(pid)
    }
}

/// Process resolver backed by the `sysinfo` crate
///
/// Only the requested PID and its parent are refreshed per lookup.
pub struct SysinfoResolver {
    system: Mutex<System>,
    users: Users,
}

impl SysinfoResolver {
    /// Create a resolver with a fresh user list
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            users: Users::new_with_refreshed_list(),
        }
    }

    fn refresh_kind() -> ProcessRefreshKind {
        ProcessRefreshKind::new().with_user(UpdateKind::OnlyIfNotSet)
    }
}

impl Default for SysinfoResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessResolver for SysinfoResolver {
    fn resolve(&self, pid: u32) -> Result<ProcessIdentity, ProcessLookupError> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| ProcessLookupError::Unreadable(pid))?;

        let os_pid = Pid::from_u32(pid);
        if !system.refresh_process_specifics(os_pid, Self::refresh_kind()) {
            return Err(ProcessLookupError::NotFound(pid));
        }

        let (name, user, parent, start_time) = {
            let process = system
                .process(os_pid)
                .ok_or(ProcessLookupError::Unreadable(pid))?;
            let user = process
                .user_id()
                .and_then(|uid| self.users.get_user_by_id(uid))
                .map(|user| user.name().to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            (
                process.name().to_string(),
                user,
                process.parent(),
                process.start_time(),
            )
        };

        let (parent_pid, parent_name) = match parent {
            Some(parent) => {
                system.refresh_process_specifics(parent, ProcessRefreshKind::new());
                let parent_name = system
                    .process(parent)
                    .map(|p| p.name().to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                (parent.as_u32(), parent_name)
            }
            None => (0, NOT_AVAILABLE.to_string()),
        };

        Ok(ProcessIdentity {
            name,
            user,
            parent_pid,
            parent_name,
            create_time_epoch_seconds: start_time,
        })
    }
}
