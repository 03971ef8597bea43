//! Built-in bot commands. Answered directly and never counted as content.

use chorus_tracker::TrackerStats;
use std::time::Instant;

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    pub uptime: &'a Instant,
    pub trigger_count: usize,
    pub time_window_secs: u64,
    pub stats: TrackerStats,
}

/// Known bot commands.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Status,
}

impl Command {
    /// Parse a command from message text. Returns `None` for unknown `/`
    /// prefixes and for text that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        // Strip @botname suffix (e.g. "/start@chorus_bot" → "/start").
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd {
            "/start" => Some(Self::Start),
            "/status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// Whether the text is addressed to the bot as a command, known or not.
pub fn is_command(text: &str) -> bool {
    text.starts_with('/')
}

/// Build the reply for a command.
pub fn handle(cmd: Command, ctx: &CommandContext<'_>) -> String {
    match cmd {
        Command::Start => format!(
            "🤖 Chorus is running! When {} different people send the same thing \
             within {} seconds, I'll repeat it.",
            ctx.trigger_count, ctx.time_window_secs
        ),
        Command::Status => format!(
            "Chorus status\n\
             Uptime: {}\n\
             Threshold: {} distinct senders\n\
             Window: {}s\n\
             Pending records: {}\n\
             Active chats: {}",
            format_uptime(ctx.uptime.elapsed().as_secs()),
            ctx.trigger_count,
            ctx.time_window_secs,
            ctx.stats.records,
            ctx.stats.chats,
        ),
    }
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
