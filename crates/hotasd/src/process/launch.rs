//! Supervises daemon launch sequencing and runtime orchestration.

use std::env;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{error, info};

use hotas_config::RuntimePaths;

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::daemon::{DaemonCore, DaemonEvent, EventSender, SessionRegistry, event_queue};
use crate::device::{HotasDriver, SimulatedDriver};
use crate::dispatch::Dispatcher;
use crate::health::HealthReporter;
use crate::transport::{PrivilegePolicy, SessionHandler, SocketListener};

use super::daemonizer::{Daemonizer, SystemDaemonizer};
use super::errors::LaunchError;
use super::guard::{HealthState, ProcessGuard};
use super::signals::{SignalSource, SystemSignals};
use super::{FOREGROUND_ENV_VAR, PROCESS_TARGET};

/// Launch mode for the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Fork into the background and detach from the controlling terminal.
    Background,
    /// Remain attached to the terminal; used for debugging, supervisors and
    /// tests.
    Foreground,
}

impl LaunchMode {
    fn detect() -> Self {
        if env::var_os(FOREGROUND_ENV_VAR).is_some() {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}

/// Process-level collaborators needed to control daemon lifecycle.
pub(crate) struct ProcessControl<D, S> {
    pub(crate) mode: LaunchMode,
    pub(crate) daemonizer: D,
    pub(crate) signals: S,
}

/// Service dependencies required to construct the daemon runtime.
pub(crate) struct ServiceDeps<L> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) driver: Box<dyn HotasDriver>,
    pub(crate) events: EventSender,
    pub(crate) queue: Receiver<DaemonEvent>,
}

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, D, S> {
    pub(crate) process: ProcessControl<D, S>,
    pub(crate) services: ServiceDeps<L>,
}

/// Runs the daemon using the production collaborators.
pub fn run_daemon() -> Result<(), LaunchError> {
    let (events, queue) = event_queue();
    let driver = SimulatedDriver::default().with_notifier(events.clone());
    let plan = LaunchPlan {
        process: ProcessControl {
            mode: LaunchMode::detect(),
            daemonizer: SystemDaemonizer,
            signals: SystemSignals,
        },
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
            driver: Box::new(driver),
            events,
            queue,
        },
    };
    run_daemon_with(plan)
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, D, S>(plan: LaunchPlan<L, D, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    D: Daemonizer,
    S: SignalSource,
{
    let LaunchPlan { process, services } = plan;
    let ProcessControl {
        mode,
        daemonizer,
        signals,
    } = process;
    let ServiceDeps {
        loader,
        reporter,
        driver,
        events,
        queue,
    } = services;

    info!(
        target: PROCESS_TARGET,
        ?mode,
        "starting daemon runtime"
    );
    let config = loader.load()?;
    config.daemon_socket().prepare_filesystem()?;
    let mut guard = ProcessGuard::acquire(RuntimePaths::from_config(&config)?)?;
    if matches!(mode, LaunchMode::Background) {
        daemonizer.daemonize(guard.paths())?;
    }
    guard.write_pid(std::process::id())?;
    guard.write_health(HealthState::Starting)?;
    let listener = SocketListener::bind(config.daemon_socket())?;

    let static_loader = StaticConfigLoader::new(config.clone());
    let daemon = bootstrap_with(&static_loader, Arc::clone(&reporter), driver)?;

    let core = DaemonCore::new(daemon.state(), queue, reporter)
        .spawn()
        .map_err(|source| LaunchError::Core {
            message: source.to_string(),
        })?;
    let handler = SessionHandler::new(
        Dispatcher::new(daemon.state()),
        SessionRegistry::new(config.max_clients()),
        PrivilegePolicy::from_config(&config),
        config.idle_timeout(),
    );
    let listener_handle = match listener.start(handler.into_handler()) {
        Ok(handle) => handle,
        Err(error) => {
            events.send(DaemonEvent::Shutdown);
            return Err(error.into());
        }
    };
    guard.write_health(HealthState::Ready)?;

    let forwarded = signals.forward(&events);
    if let Err(error) = &forwarded {
        error!(target: PROCESS_TARGET, %error, "signal forwarding stopped");
        events.send(DaemonEvent::Shutdown);
    }
    guard.write_health(HealthState::Stopping)?;
    listener_handle.shutdown();
    listener_handle.join()?;
    core.join().map_err(|_| LaunchError::Core {
        message: "core thread panicked".to_owned(),
    })?;
    forwarded?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}
