//! commandcenter-host: runs the background service over stdin/stdout.
//!
//! Frames are 4-byte little-endian length-prefixed JSON in both directions.
//! Logs go to stderr since stdout carries frames.
//!
//! Usage:
//!   commandcenter-host                      # Empty in-memory browser
//!   commandcenter-host --fixture tabs.json  # Seed tabs, bookmarks, history
//!   commandcenter-host --options opts.json  # Use this options file

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use commandcenter::background::{BackgroundHandle, BackgroundService};
use commandcenter::config::OptionsStore;
use commandcenter::error::ProtocolError;
use commandcenter::platform::{MemoryBrowser, MemoryFixture, TabEvent};
use commandcenter::protocol::{framing, HostFrame, HostReply, UnreadableFrame};

const LOG_ENV: &str = "COMMANDCENTER_LOG";

#[derive(Debug, Default)]
struct Args {
    fixture: Option<PathBuf>,
    options: Option<PathBuf>,
}

fn print_help() {
    println!("commandcenter-host: background service over a framed stdin/stdout pipe");
    println!();
    println!("Usage:");
    println!("  commandcenter-host                      Empty in-memory browser");
    println!("  commandcenter-host --fixture <path>     Seed tabs, bookmarks and history from JSON");
    println!("  commandcenter-host --options <path>     Read options from this file");
    println!();
    println!("Set {LOG_ENV} (e.g. {LOG_ENV}=debug) to change log verbosity.");
}

/// `None` when help was printed.
fn parse_args() -> Result<Option<Args>> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--fixture" => {
                args.fixture = Some(iter.next().context("--fixture needs a path")?.into());
            }
            "--options" => {
                args.options = Some(iter.next().context("--options needs a path")?.into());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            other => bail!("Unknown argument: {other}"),
        }
    }
    Ok(Some(args))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

type Inbound = Result<HostFrame, UnreadableFrame>;

fn read_frames(frames: UnboundedSender<Inbound>) {
    let mut input = io::stdin().lock();
    loop {
        match framing::read_message::<_, Value>(&mut input) {
            Ok(Some(body)) => {
                if frames.send(HostFrame::from_value(body)).is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("stdin closed");
                break;
            }
            // The whole body was consumed, so the stream is still in sync.
            Err(ProtocolError::Malformed(e)) => warn!("skipping frame that is not JSON: {e}"),
            Err(e) => {
                error!("stopping on unreadable input: {e}");
                break;
            }
        }
    }
}

/// Replies that can't be framed are replaced by an empty reply so the caller
/// is never left waiting. Stops only when the output itself fails.
fn write_replies<W: Write>(output: &mut W, mut replies: UnboundedReceiver<HostReply>) {
    while let Some(reply) = replies.blocking_recv() {
        let reply_id = reply.reply_id;
        let written = match framing::write_message(output, &reply) {
            Err(e @ (ProtocolError::FrameTooLarge(_) | ProtocolError::Malformed(_))) => {
                error!(reply_id, "reply could not be framed, sending none: {e}");
                framing::write_message(output, &HostReply { reply_id, response: None })
            }
            other => other,
        };
        if let Err(e) = written {
            error!(reply_id, "failed to write reply: {e}");
            break;
        }
    }
}

fn send_reply(replies: &UnboundedSender<HostReply>, reply: HostReply) {
    let reply_id = reply.reply_id;
    if replies.send(reply).is_err() {
        debug!(reply_id, "reply writer is gone");
    }
}

/// Feeds inbound frames to the background service and routes every answer
/// to the reply writer.
struct FramePump {
    events: UnboundedSender<TabEvent>,
    handle: BackgroundHandle,
    replies: UnboundedSender<HostReply>,
    in_flight: JoinSet<()>,
}

impl FramePump {
    fn new(events: UnboundedSender<TabEvent>, handle: BackgroundHandle, replies: UnboundedSender<HostReply>) -> Self {
        Self {
            events,
            handle,
            replies,
            in_flight: JoinSet::new(),
        }
    }

    /// Handle one inbound frame. Returns `false` once tab events can no
    /// longer be delivered.
    fn accept(&mut self, frame: Inbound) -> bool {
        match frame {
            Ok(HostFrame::Event(event)) => {
                if self.events.send(event).is_err() {
                    return false;
                }
            }
            Ok(HostFrame::Request { reply_id, envelope }) => {
                let answer = self.handle.submit(envelope);
                let replies = self.replies.clone();
                self.in_flight.spawn(async move {
                    let response = answer.await.ok();
                    send_reply(&replies, HostReply { reply_id, response });
                });
            }
            Err(UnreadableFrame {
                reply_id: Some(reply_id),
                error,
            }) => {
                error!(reply_id, "dropping unreadable request: {error}");
                send_reply(&self.replies, HostReply { reply_id, response: None });
            }
            Err(UnreadableFrame { reply_id: None, error }) => {
                warn!("skipping unreadable frame: {error}");
            }
        }
        self.reap();
        true
    }

    /// Collect reply tasks that have already finished.
    fn reap(&mut self) {
        while let Some(finished) = self.in_flight.try_join_next() {
            if let Err(e) = finished {
                warn!("reply task failed: {e}");
            }
        }
    }

    /// Wait for every outstanding reply, then let go of the service.
    async fn finish(mut self) {
        while let Some(finished) = self.in_flight.join_next().await {
            if let Err(e) = finished {
                warn!("reply task failed: {e}");
            }
        }
    }
}

async fn serve(args: Args) -> Result<()> {
    let options = match args.options {
        Some(path) => OptionsStore::at(path),
        None => OptionsStore::open_default()?,
    };
    let fixture = match &args.fixture {
        Some(path) => MemoryFixture::load(path)?,
        None => MemoryFixture::default(),
    };

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let browser = Arc::new(MemoryBrowser::from_fixture(fixture).with_events(events_tx.clone()));
    let (service, handle) = BackgroundService::new(browser, options, events_rx);
    let service = tokio::spawn(service.run());

    let (replies_tx, replies_rx) = mpsc::unbounded_channel();
    let writer = thread::spawn(move || write_replies(&mut io::stdout().lock(), replies_rx));

    let (frames_tx, mut frames_rx) = mpsc::unbounded_channel();
    thread::spawn(move || read_frames(frames_tx));

    info!("commandcenter-host ready");

    let mut pump = FramePump::new(events_tx, handle, replies_tx);
    while let Some(frame) = frames_rx.recv().await {
        if !pump.accept(frame) {
            break;
        }
    }

    pump.finish().await;
    service.await.context("Background service panicked")?;
    if writer.join().is_err() {
        bail!("Reply writer panicked");
    }

    info!("commandcenter-host stopped");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };
    init_tracing();
    serve(args).await
}
