//! Gateway — the main event loop connecting channels to the burst tracker.
//!
//! Includes: command replies, burst tracking, echo dispatch, the expiry
//! sweeper, and graceful shutdown.

mod echo;


use crate::commands::{self, Command, CommandContext};
use chorus_core::{
    config::EchoConfig,
    message::{IncomingMessage, MessageContent, OutgoingMessage},
    traits::Channel,
};
use chorus_tracker::{normalize, Decision, Sweeper, Tracker};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The central gateway that routes messages between channels and the tracker.
pub struct Gateway {
    pub(super) channels: HashMap<String, Arc<dyn Channel>>,
    pub(super) tracker: Arc<Tracker>,
    pub(super) echo_config: EchoConfig,
    pub(super) uptime: Instant,
}

impl Gateway {
    /// Create a new gateway with an empty tracker.
    pub fn new(channels: HashMap<String, Arc<dyn Channel>>, echo_config: EchoConfig) -> Self {
        Self {
            channels,
            tracker: Arc::new(Tracker::from_config(&echo_config)),
            echo_config,
            uptime: Instant::now(),
        }
    }

    /// Run the main event loop.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Chorus gateway running | channels: {} | threshold: {} | window: {}s",
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            self.echo_config.trigger_count,
            self.echo_config.time_window_secs,
        );

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        let sweeper = Sweeper::spawn(self.tracker.clone(), self.echo_config.time_window());

        // Main event loop with graceful shutdown. Tracking runs inline so
        // messages are observed in arrival order; sends are spawned so a slow
        // transport never holds up the next message.
        loop {
            tokio::select! {
                incoming = rx.recv() => {
                    let Some(incoming) = incoming else {
                        warn!("all channels closed");
                        break;
                    };
                    if let Some(reply) = self.route(&incoming) {
                        let gw = self.clone();
                        tokio::spawn(async move {
                            gw.deliver(&incoming.channel, reply).await;
                        });
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown(sweeper).await;
        Ok(())
    }

    /// Decide what, if anything, to send in response to `incoming`.
    ///
    /// Commands are answered and never tracked. Everything else goes through
    /// the tracker; a fired burst yields the echo. The tracker lock is
    /// released before this returns.
    pub(super) fn route(&self, incoming: &IncomingMessage) -> Option<OutgoingMessage> {
        if let MessageContent::Text(ref text) = incoming.content {
            if commands::is_command(text) {
                return self.command_reply(incoming, text);
            }
        }

        let Some(key) = normalize(&incoming.content) else {
            debug!(
                "[{}] skipping untrackable {} message from {} in chat {}",
                incoming.id,
                incoming.content.kind(),
                incoming.sender_label(),
                incoming.chat_id
            );
            return None;
        };

        match self.tracker.observe(
            &incoming.chat_id,
            &incoming.sender_id,
            &key,
            incoming.timestamp,
        ) {
            Decision::NoAction => {
                debug!(
                    "[{}] tracked {key} from {} in chat {}",
                    incoming.id,
                    incoming.sender_label(),
                    incoming.chat_id
                );
                None
            }
            Decision::Fire(record) => {
                info!(
                    "[{}] echo fired in chat {} by {}: {key} ({} senders since {})",
                    incoming.id,
                    incoming.chat_id,
                    incoming.sender_label(),
                    record.distinct_senders(),
                    record.first_seen().format("%H:%M:%S"),
                );
                echo::echo_for(incoming)
            }
        }
    }

    fn command_reply(&self, incoming: &IncomingMessage, text: &str) -> Option<OutgoingMessage> {
        let Some(cmd) = Command::parse(text) else {
            debug!("ignoring unknown command in chat {}", incoming.chat_id);
            return None;
        };
        let ctx = CommandContext {
            uptime: &self.uptime,
            trigger_count: self.echo_config.trigger_count,
            time_window_secs: self.echo_config.time_window_secs,
            stats: self.tracker.stats(),
        };
        Some(OutgoingMessage {
            reply_to: incoming.message_id,
            ..OutgoingMessage::text(&incoming.chat_id, commands::handle(cmd, &ctx))
        })
    }

    /// Send through the named channel. Failures are logged, never retried.
    pub(super) async fn deliver(&self, channel_name: &str, message: OutgoingMessage) {
        let Some(channel) = self.channels.get(channel_name) else {
            warn!("no channel named {channel_name}, dropping reply");
            return;
        };
        let chat_id = message.chat_id.clone();
        if let Err(e) = channel.send(message).await {
            error!("failed to send to chat {chat_id} via {channel_name}: {e}");
        }
    }

    /// Graceful shutdown: stop the sweeper, stop channels.
    async fn shutdown(&self, sweeper: Sweeper) {
        info!("Shutting down...");

        sweeper.shutdown().await;

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        let stats = self.tracker.stats();
        info!(
            "Shutdown complete. Discarded {} pending records in {} chats.",
            stats.records, stats.chats
        );
    }
}
