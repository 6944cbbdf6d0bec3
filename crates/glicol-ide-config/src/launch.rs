//! Launch descriptors for the external language server process.

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::defaults::{SERVER_LOG_KEY, SERVER_LOG_VALUE};

/// Configuration for spawning the Glicol language server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLaunch {
    /// The executable path or command name.
    pub command: PathBuf,
    /// Arguments passed to the server.
    pub args: Vec<String>,
    /// Environment entries layered over the inherited environment.
    pub env_overrides: Vec<(OsString, OsString)>,
    /// Working directory for the spawned process.
    pub working_dir: Option<PathBuf>,
}

impl ServerLaunch {
    /// Builds a descriptor for the given command.
    ///
    /// The spawned process inherits the full ambient environment with the
    /// server logging verbosity (`RUST_LOG=debug`) layered on top; no other
    /// entries are added or removed.
    #[must_use]
    pub fn from_command(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env_overrides: vec![(
                OsString::from(SERVER_LOG_KEY),
                OsString::from(SERVER_LOG_VALUE),
            )],
            working_dir: None,
        }
    }

    /// Sets a custom working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Appends an argument for the server invocation.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Full environment the spawned process will observe.
    ///
    /// A superset of the ambient environment: every inherited entry is kept
    /// and the overrides are layered on top.
    #[must_use]
    pub fn environment(&self) -> BTreeMap<OsString, OsString> {
        let mut merged: BTreeMap<OsString, OsString> = env::vars_os().collect();
        for (key, value) in &self.env_overrides {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// Run and debug launch descriptors handed to the language client.
///
/// The host distinguishes the two when the extension itself is being
/// debugged; this integration has no separate debug setup, so both carry
/// the same command and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchVariants {
    /// Descriptor used for normal sessions.
    pub run: ServerLaunch,
    /// Descriptor used when the host runs the extension under a debugger.
    pub debug: ServerLaunch,
}

impl LaunchVariants {
    /// Builds both variants from a single descriptor.
    #[must_use]
    pub fn identical(launch: ServerLaunch) -> Self {
        Self {
            debug: launch.clone(),
            run: launch,
        }
    }
}
