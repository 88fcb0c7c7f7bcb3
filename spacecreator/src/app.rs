mod channels;
mod dispatch;
mod hotkey;

pub use channels::IpcCommandWithResponse;

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use objc2_foundation::MainThreadMarker;
use tokio::task::LocalSet;

use spacecreator_ipc::Command;

use crate::core::{Config, Orchestrator, PermissionGate, TrustState};
use crate::ipc::IpcServer;
use crate::macos::{self, format_hotkey_symbols, HotkeyManager, MenuBar};
use crate::platform::MacOSPlatform;
use channels::{create_channels, AutomationChannels, MainChannels};
use dispatch::{dispatch_command, Flow};
use hotkey::{install_on_main_thread, request_install, HotkeyRetry, HotkeyStatus};

/// How often trust is polled while the hotkey tap is missing.
const TRUST_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(self) -> Result<()> {
        let mtm = MainThreadMarker::new().context("spacecreator must start on the main thread")?;

        // Trust is not required to start; every invocation checks again.
        PermissionGate::new(&MacOSPlatform).request_if_needed();

        let (automation_channels, main_channels) = create_channels();
        let hotkey_status = Arc::new(HotkeyStatus::starting());

        let config = self.config.clone();
        let status = Arc::clone(&hotkey_status);
        std::thread::Builder::new()
            .name("automation".to_string())
            .spawn(move || run_automation_thread(automation_channels, config, status))
            .context("Failed to spawn automation thread")?;

        self.run_main_loop(mtm, main_channels, &hotkey_status);
        Ok(())
    }

    fn run_main_loop(
        self,
        mtm: MainThreadMarker,
        channels: MainChannels,
        hotkey_status: &HotkeyStatus,
    ) {
        let app = macos::accessory_application(mtm);

        let chord = format_hotkey_symbols(&self.config.hotkey);
        let _menu_bar = self
            .config
            .menu_bar
            .then(|| MenuBar::new(mtm, channels.trigger_tx.clone(), &chord));

        // Without trust the tap fails here; the automation loop asks for
        // another attempt once trust is granted.
        let mut hotkeys = HotkeyManager::new(channels.trigger_tx);
        hotkeys.bind(self.config.hotkey, Command::CreateSpace);
        install_on_main_thread(hotkeys, hotkey_status);

        tracing::info!("Entering application run loop");
        unsafe { app.run() };
        tracing::info!("Application run loop exited");
    }
}

fn run_automation_thread(
    channels: AutomationChannels,
    config: Config,
    hotkey_status: Arc<HotkeyStatus>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to build automation runtime: {}", e);
            return;
        }
    };

    let local = LocalSet::new();
    local.block_on(&runtime, run_automation(channels, config, hotkey_status));
}

async fn run_automation(
    channels: AutomationChannels,
    config: Config,
    hotkey_status: Arc<HotkeyStatus>,
) {
    let AutomationChannels {
        mut trigger_rx,
        ipc_server_tx,
        mut ipc_rx,
    } = channels;

    tracing::info!("Automation loop started");

    let ipc_server = IpcServer::new(ipc_server_tx);
    tokio::spawn(async move {
        if let Err(e) = ipc_server.run().await {
            tracing::error!("IPC server error: {}", e);
        }
    });

    let orchestrator = Rc::new(Orchestrator::new(MacOSPlatform, &config));
    let status = Arc::clone(&hotkey_status);
    let hotkeys = Rc::new(HotkeyRetry::new(hotkey_status, move || {
        request_install(Arc::clone(&status))
    }));

    let mut trust_poll = tokio::time::interval(TRUST_POLL_INTERVAL);
    trust_poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        let flow = tokio::select! {
            Some(cmd) = trigger_rx.recv() => dispatch_command(&orchestrator, &hotkeys, cmd, None),
            Some((cmd, resp_tx)) = ipc_rx.recv() => {
                dispatch_command(&orchestrator, &hotkeys, cmd, Some(resp_tx))
            }
            _ = trust_poll.tick(), if !hotkeys.is_installed() => {
                if orchestrator.permission_gate().check() == TrustState::Granted {
                    hotkeys.observe(TrustState::Granted);
                }
                Flow::Continue
            }
            else => break,
        };
        if flow == Flow::Quit {
            macos::request_terminate();
        }
    }

    tracing::info!("Automation loop exiting");
}
