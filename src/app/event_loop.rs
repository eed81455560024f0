use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::{debug, info};

use crate::app::{App, EditorContext, Message, ToastLevel, dispatch_outbox, pump_client, update};
use crate::protocol::{Endpoint, SyncClient, Transport, WsTransport};
use crate::ui::{self, TerminalSurface};

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop hits
    /// an I/O failure. Connection failures are reported in the UI instead.
    pub fn run(&mut self) -> Result<()> {
        let endpoint = Endpoint::new(self.server.clone(), &self.subpath);
        let mut client =
            SyncClient::new(WsTransport::new(), endpoint).with_reconnect(self.reconnect);

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal: fuzzynote requires an interactive terminal")?;
        execute!(stdout(), EnableBracketedPaste)?;
        let size = terminal.size()?;

        let mut ctx = EditorContext::new(TerminalSurface::new(), self.editing)
            .with_max_snippets(self.max_snippets);
        update(&mut ctx, Message::Resize(size.width, size.height));
        ctx.surface.set_body_rows(ui::body_rows(size.height));

        if let Err(err) = client.connect() {
            ctx.show_toast(
                ToastLevel::Error,
                format!("Cannot reach {}: {err}", client.endpoint().url()),
            );
        }
        update(&mut ctx, Message::Connection(client.state()));

        let result = Self::event_loop(&mut terminal, &mut ctx, &mut client);

        client.disconnect();
        let _ = execute!(stdout(), DisableBracketedPaste);
        ratatui::restore();

        result
    }

    fn sync_connection<T: Transport>(
        ctx: &mut EditorContext<TerminalSurface>,
        client: &SyncClient<T>,
    ) -> bool {
        if ctx.connection == client.state() {
            return false;
        }
        update(ctx, Message::Connection(client.state()));
        true
    }

    fn apply(
        ctx: &mut EditorContext<TerminalSurface>,
        client: &mut SyncClient<impl Transport>,
        msg: Message,
    ) {
        debug!(?msg, "message");
        update(ctx, msg);
        dispatch_outbox(ctx, client);
    }

    fn apply_resize(ctx: &mut EditorContext<TerminalSurface>, width: u16, height: u16) {
        update(ctx, Message::Resize(width, height));
        ctx.surface.set_body_rows(ui::body_rows(height));
    }

    fn event_loop<T: Transport>(
        terminal: &mut DefaultTerminal,
        ctx: &mut EditorContext<TerminalSurface>,
        client: &mut SyncClient<T>,
    ) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut needs_render = true;

        loop {
            let now = Instant::now();
            if ctx.expire_toast(now) {
                needs_render = true;
            }
            if client.tick(now) {
                info!(url = %client.endpoint().url(), "reconnect attempt");
            }
            if pump_client(ctx, client) {
                needs_render = true;
            }
            if Self::sync_connection(ctx, client) {
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                Self::apply_resize(ctx, width, height);
                needs_render = true;
            }

            let poll_ms = if needs_render {
                0
            } else if resize_debouncer.is_pending() {
                10
            } else {
                50
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Drain bursts (typing, pastes) before drawing once.
                loop {
                    let event = event::read()?;
                    if let event::Event::Resize(width, height) = event {
                        let event_ms =
                            u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                        resize_debouncer.queue(width, height, event_ms);
                    } else if let Some(msg) = crate::app::message_for_event(ctx, &event) {
                        Self::apply(ctx, client, msg);
                        needs_render = true;
                    }
                    if ctx.should_quit || !event::poll(Duration::from_millis(0))? {
                        break;
                    }
                }
            }

            if needs_render {
                terminal.draw(|frame| ui::render(ctx, frame))?;
                needs_render = false;
            }

            if ctx.should_quit {
                break;
            }
        }
        Ok(())
    }
}
