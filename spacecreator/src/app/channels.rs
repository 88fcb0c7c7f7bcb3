use tokio::sync::mpsc;

use spacecreator_ipc::{Command, Response};

pub type IpcCommandWithResponse = (Command, mpsc::Sender<Response>);

/// Receiving ends owned by the automation thread.
pub struct AutomationChannels {
    /// Hotkey and menu triggers. Unbounded so the event tap callback never
    /// blocks.
    pub trigger_rx: mpsc::UnboundedReceiver<Command>,
    pub ipc_server_tx: mpsc::Sender<IpcCommandWithResponse>,
    pub ipc_rx: mpsc::Receiver<IpcCommandWithResponse>,
}

/// Sending ends handed to main-thread trigger sources.
pub struct MainChannels {
    pub trigger_tx: mpsc::UnboundedSender<Command>,
}

pub fn create_channels() -> (AutomationChannels, MainChannels) {
    // Channel: main thread triggers -> automation thread
    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel::<Command>();

    // Channel: IPC server -> automation thread
    let (ipc_server_tx, ipc_rx) = mpsc::channel::<IpcCommandWithResponse>(64);

    (
        AutomationChannels {
            trigger_rx,
            ipc_server_tx,
            ipc_rx,
        },
        MainChannels { trigger_tx },
    )
}
