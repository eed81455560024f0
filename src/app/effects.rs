use tracing::warn;

use crate::app::{EditorContext, Message, ToastLevel, update};
use crate::editor::Surface;
use crate::protocol::{ClientEvent, Command, SyncClient, Transport};

/// Hand every queued command to the client.
///
/// A save that reaches the transport clears the modified flag right away;
/// there is no acknowledgment to wait for. Commands that cannot be sent are
/// dropped with a toast, never queued for later.
pub fn dispatch_outbox<S: Surface, T: Transport>(
    ctx: &mut EditorContext<S>,
    client: &mut SyncClient<T>,
) {
    for command in ctx.take_outbox() {
        match client.send(&command) {
            Ok(()) => {
                if matches!(command, Command::Save(_)) {
                    ctx.session.mark_saved();
                    ctx.show_toast(ToastLevel::Info, "Saved");
                }
            }
            Err(err) => {
                warn!(cmd = command.name(), %err, "command not sent");
                ctx.show_toast(
                    ToastLevel::Warning,
                    format!("{} not sent: {err}", command.name()),
                );
            }
        }
    }
}

/// Feed every pending client event through [`update`], in receipt order.
///
/// Returns `true` if anything was applied.
pub fn pump_client<S: Surface, T: Transport>(
    ctx: &mut EditorContext<S>,
    client: &mut SyncClient<T>,
) -> bool {
    let mut applied = false;
    while let Some(event) = client.poll() {
        let msg = match event {
            ClientEvent::Connected | ClientEvent::Disconnected(_) => {
                Message::Connection(client.state())
            }
            ClientEvent::Message(inbound) => Message::Inbound(inbound),
        };
        update(ctx, msg);
        applied = true;
    }
    applied
}

/// Apply a message and flush whatever it queued.
pub fn step<S: Surface, T: Transport>(
    ctx: &mut EditorContext<S>,
    client: &mut SyncClient<T>,
    msg: Message,
) {
    update(ctx, msg);
    dispatch_outbox(ctx, client);
}
