use std::rc::Rc;

use tokio::sync::mpsc;

use spacecreator_ipc::{Command, Response};

use crate::core::{Orchestrator, TrustState};
use crate::platform::Platform;

use super::hotkey::HotkeyRetry;

/// What the automation loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Handle one command on the automation thread. `reply` is set for IPC
/// clients; hotkey and menu triggers have nobody to answer.
///
/// Must be called inside a `LocalSet`: space creation runs as a local task
/// so the loop keeps receiving while it waits.
pub fn dispatch_command<P: Platform + 'static>(
    orchestrator: &Rc<Orchestrator<P>>,
    hotkeys: &Rc<HotkeyRetry>,
    cmd: Command,
    reply: Option<mpsc::Sender<Response>>,
) -> Flow {
    tracing::debug!("Dispatching {:?}", cmd);
    match cmd {
        Command::CreateSpace => {
            let orchestrator = Rc::clone(orchestrator);
            let hotkeys = Rc::clone(hotkeys);
            tokio::task::spawn_local(async move {
                let report = orchestrator.create_space().await;
                hotkeys.observe(report.trust);
                if let Some(reply) = reply {
                    let response = Response::Outcome {
                        outcome: report.outcome,
                    };
                    if reply.send(response).await.is_err() {
                        tracing::warn!("Client went away before the outcome was sent");
                    }
                }
            });
            Flow::Continue
        }
        Command::CheckPermissions => {
            let state = orchestrator.permission_gate().report();
            hotkeys.observe(state);
            respond(
                reply,
                Response::Permission {
                    trusted: state == TrustState::Granted,
                },
            );
            Flow::Continue
        }
        Command::Status => {
            respond(
                reply,
                Response::Status {
                    phase: orchestrator.phase().to_string(),
                },
            );
            Flow::Continue
        }
        Command::Quit => {
            tracing::info!("Quit command received");
            respond(reply, Response::Ok);
            Flow::Quit
        }
    }
}

fn respond(reply: Option<mpsc::Sender<Response>>, response: Response) {
    if let Some(reply) = reply {
        if reply.try_send(response).is_err() {
            tracing::warn!("Client went away before the response was sent");
        }
    }
}
