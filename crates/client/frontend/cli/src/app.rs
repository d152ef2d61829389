//! Prompt loop tying stdin, runtime events and rendering together.
use std::io::Write;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, broadcast::error::RecvError, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use client_blockchain_core::TransactionId;
use client_frontend_core::{Frontend, FrontendConfig, ViewModel};
use runtime::{ConnectionStep, Event, Route, RuntimeError, RuntimeHandle, Topic};

use crate::commands::{self, CliCommand, HELP};
use crate::config::CliConfig;
use crate::render;

const TOPICS: [Topic; 5] = [
    Topic::GameData,
    Topic::Alert,
    Topic::Navigation,
    Topic::Cue,
    Topic::Session,
];

/// Messages from the per-topic forwarders.
enum Forwarded {
    Event(Event),
    /// A receiver fell behind; the view must be rebuilt from a snapshot.
    Lagged(Topic),
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Line-oriented terminal frontend.
pub struct CliFrontend {
    frontend_config: FrontendConfig,
    cli_config: CliConfig,
}

impl CliFrontend {
    pub fn new(frontend_config: FrontendConfig, cli_config: CliConfig) -> Self {
        Self {
            frontend_config,
            cli_config,
        }
    }

    fn prompt(&self) {
        print!("{}", self.cli_config.prompt);
        let _ = std::io::stdout().flush();
    }

    fn show_event(&self, vm: &mut ViewModel, event: &Event) {
        let previous_step = vm.session.step;
        let impact = vm.apply(event);
        if !impact.requires_redraw {
            return;
        }

        match event {
            Event::Alert(alert) if alert.visible => println!("{}", render::alert_line(alert)),
            Event::Navigation(navigation) if self.cli_config.announce_routes => {
                println!("{}", render::route_line(&navigation.route))
            }
            Event::Cue(_) => {
                if let Some(entry) = vm.messages().recent(1).next() {
                    println!("  {}", entry.text);
                }
            }
            Event::Session(session) if session.step != previous_step => {
                if session.step == ConnectionStep::Ready {
                    println!("wallet ready");
                } else {
                    println!("onboarding: {}", session.step.instructions());
                }
            }
            _ => {}
        }
    }

    async fn dispatch(&self, handle: &RuntimeHandle, vm: &ViewModel, line: &str) -> Result<Flow> {
        let command = match commands::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(error) => {
                println!("{error}");
                return Ok(Flow::Continue);
            }
        };
        debug!(?command, "dispatching command");

        match command {
            CliCommand::Register(name) => report(handle.register_player(name).await)?,
            CliCommand::Create(name) => report(handle.create_battle(name).await)?,
            CliCommand::Join(name) => report(handle.join_battle(name).await)?,
            CliCommand::Quit => report(handle.quit_battle().await)?,
            CliCommand::Attack => report(handle.attack().await)?,
            CliCommand::Defend => report(handle.defend().await)?,
            CliCommand::Battles => print_lines(render::lobby_lines(vm)),
            CliCommand::Status => print_lines(render::status_lines(
                vm,
                self.frontend_config.messages.display_limit,
            )),
            CliCommand::Vitals => match recoverable(handle.battle_view().await)? {
                Some(Some(view)) => print_lines(render::vitals_lines(&view)),
                Some(None) => println!("not in a battle"),
                None => {}
            },
            CliCommand::Ground(None) => {
                print_lines(render::battleground_lines(&vm.session.battleground));
                recoverable(handle.navigate(Route::Battleground).await)?;
            }
            CliCommand::Ground(Some(id)) => {
                recoverable(handle.choose_battleground(id).await)?;
            }
            CliCommand::Go(route) => {
                match recoverable(handle.navigate(route.clone()).await)? {
                    Some(reached) if reached != route => {
                        println!("not available yet, still at {}", reached.path())
                    }
                    _ => {}
                }
            }
            CliCommand::Refresh => {
                recoverable(handle.refresh().await)?;
            }
            CliCommand::Help => println!("{HELP}"),
            CliCommand::Exit => return Ok(Flow::Exit),
        }

        Ok(Flow::Continue)
    }
}

#[async_trait]
impl Frontend for CliFrontend {
    async fn run(&mut self, handle: RuntimeHandle) -> Result<()> {
        // Subscribe before the snapshot so nothing falls in between.
        let subscriptions = handle.subscribe_multiple(&TOPICS);
        let snapshot = handle
            .snapshot()
            .await
            .context("reading initial runtime snapshot")?;
        let mut vm = ViewModel::from_snapshot(&snapshot, &self.frontend_config.messages);

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let forwarders: Vec<JoinHandle<()>> = subscriptions
            .into_iter()
            .map(|(topic, rx)| tokio::spawn(forward(topic, rx, event_tx.clone())))
            .collect();
        drop(event_tx);

        println!("card battle client, type `help` for commands");
        print_lines(render::status_lines(&vm, 0));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        self.prompt();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("reading stdin")? else {
                        break;
                    };
                    if self.dispatch(&handle, &vm, &line).await? == Flow::Exit {
                        break;
                    }
                    self.prompt();
                }
                forwarded = event_rx.recv() => match forwarded {
                    Some(Forwarded::Event(event)) => self.show_event(&mut vm, &event),
                    Some(Forwarded::Lagged(topic)) => {
                        warn!(?topic, "event receiver lagged, resyncing");
                        let snapshot = handle.snapshot().await.context("resyncing view")?;
                        vm.resync(&snapshot);
                    }
                    None => break,
                },
            }
        }

        for forwarder in forwarders {
            forwarder.abort();
        }
        Ok(())
    }
}

async fn forward(
    topic: Topic,
    mut rx: broadcast::Receiver<Event>,
    tx: mpsc::UnboundedSender<Forwarded>,
) {
    loop {
        let forwarded = match rx.recv().await {
            Ok(event) => Forwarded::Event(event),
            Err(RecvError::Lagged(skipped)) => {
                debug!(?topic, skipped, "forwarder lagged");
                Forwarded::Lagged(topic)
            }
            Err(RecvError::Closed) => break,
        };
        if tx.send(forwarded).is_err() {
            break;
        }
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

/// Print user-level failures and keep going; only a dead runtime is fatal.
fn recoverable<T>(result: runtime::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error @ (RuntimeError::CommandChannelClosed | RuntimeError::ReplyChannelClosed(_))) => {
            Err(error).context("runtime stopped")
        }
        Err(error) => {
            println!("error: {error}");
            Ok(None)
        }
    }
}

fn report(result: runtime::Result<Option<TransactionId>>) -> Result<()> {
    match recoverable(result)? {
        Some(Some(transaction)) => println!("submitted {transaction}"),
        Some(None) => println!("nothing to submit"),
        None => {}
    }
    Ok(())
}
