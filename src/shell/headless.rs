//! Scripted sessions.
//!
//! Lines come from `--command` arguments or standard input. Each is echoed
//! after the prompt it was typed at, followed by its output, so a transcript
//! reads like an interactive session.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::commands::CommandRouter;
use crate::error::{CliError, Result};

/// Runs every line of `input` until it ends or a command ends the session.
/// Returns the number of lines run.
pub async fn run<R, W>(router: &mut CommandRouter, input: R, mut output: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut count = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| CliError::terminal(format!("Failed to read input: {e}")))?
    {
        let mut transcript = format!("{}{}\n", router.prompt(), line.trim_end());
        let dispatch = router.dispatch(&line).await;
        for text in dispatch.lines() {
            transcript.push_str(&text);
            transcript.push('\n');
        }
        output
            .write_all(transcript.as_bytes())
            .await
            .map_err(|e| CliError::terminal(format!("Failed to write output: {e}")))?;
        count += 1;

        if dispatch.terminate {
            info!(target: "cli", lines = count, "session terminated by command");
            break;
        }
    }

    output
        .flush()
        .await
        .map_err(|e| CliError::terminal(format!("Failed to write output: {e}")))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{register_builtin, Registry};
    use crate::db::MockDatabaseClient;
    use crate::logging::DebugKeys;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn router() -> CommandRouter {
        let mut registry = Registry::new();
        register_builtin(&mut registry).unwrap();
        CommandRouter::new(
            registry,
            Arc::new(MockDatabaseClient::new()),
            DebugKeys::detached(""),
            "switch",
        )
    }

    #[tokio::test]
    async fn test_transcript_echoes_prompts() {
        let mut router = router();
        let script = "configure terminal\nvlan 10\npwc\n";
        let mut out = Vec::new();
        let count = run(&mut router, script.as_bytes(), &mut out).await.unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "switch> configure terminal\n\
             switch(config)# vlan 10\n\
             switch(vlan-10)# pwc\n\
             config\n  vlan 10\n"
        );
    }

    #[tokio::test]
    async fn test_stops_when_session_ends() {
        let mut router = router();
        let mut out = Vec::new();
        let count = run(&mut router, "quit\npwc\n".as_bytes(), &mut out)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "switch> quit\n");
    }

    #[tokio::test]
    async fn test_errors_do_not_stop_the_script() {
        let mut router = router();
        let mut out = Vec::new();
        run(&mut router, "bogus\nshow vlan summary".as_bytes(), &mut out)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "switch> bogus\n% No such command.\nswitch> show vlan summary\nNumber of existing VLANs: 1\n"
        );
    }
}
