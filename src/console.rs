//! Console front ends: interactive chat and the autonomous loop.
//!
//! Both are generic over their IO so they can be driven from tests.

use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::agent::dispatcher::Dispatcher;

pub const AUTONOMOUS_PROMPT: &str = "Be creative and do something interesting on the blockchain. \
Choose an action or set of actions and execute it that highlights your abilities.";

pub const AUTONOMOUS_THREAD_ID: &str = "autonomous";

const SEPARATOR: &str = "-------------------";

/// Reads instructions line by line until `exit` or end of input.
pub async fn run_chat_mode<R, W>(
    dispatcher: &Dispatcher,
    thread_id: &str,
    reader: R,
    mut writer: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(thread_id, "Starting chat mode... Type 'exit' to end.");
    let mut lines = reader.lines();

    loop {
        writer.write_all(b"\nPrompt: ").await?;
        writer.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => {
                debug!("EOF received, leaving chat mode");
                break;
            }
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let reply = dispatcher.handle(thread_id, input).await;
        writer
            .write_all(format!("{}\n{}\n", reply, SEPARATOR).as_bytes())
            .await?;
        writer.flush().await?;
    }

    info!(thread_id, "Chat mode finished");
    Ok(())
}

/// Sends [`AUTONOMOUS_PROMPT`] every `interval`. Runs forever unless
/// `max_turns` is given.
pub async fn run_autonomous_mode<W>(
    dispatcher: &Dispatcher,
    interval: Duration,
    max_turns: Option<usize>,
    mut writer: W,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    info!("Starting autonomous mode...");
    let mut turns = 0usize;

    loop {
        let reply = dispatcher.handle(AUTONOMOUS_THREAD_ID, AUTONOMOUS_PROMPT).await;
        writer
            .write_all(format!("{}\n{}\n", reply, SEPARATOR).as_bytes())
            .await?;
        writer.flush().await?;

        turns += 1;
        if max_turns.map_or(false, |max| turns >= max) {
            break;
        }
        tokio::time::sleep(interval).await;
    }

    info!(turns, "Autonomous mode finished");
    Ok(())
}
