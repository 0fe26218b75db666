//! The user-facing session: interactive line editing or a scripted run.

pub mod editor;
pub mod headless;
pub mod history;

pub use editor::LineEditor;
pub use history::InputHistory;

use tracing::info;

use crate::commands::CommandRouter;
use crate::config::ShellConfig;
use crate::error::Result;

/// Runs an interactive session until end of input or a terminating command.
pub async fn run_interactive(router: &mut CommandRouter, settings: &ShellConfig) -> Result<()> {
    if !settings.motd.is_empty() {
        println!("{}", settings.motd);
    }

    let mut editor = LineEditor::new(settings.history_size);
    loop {
        let prompt = router.prompt();
        let Some(line) = editor.read_line(&prompt, router).await? else {
            info!(target: "cli", "end of input");
            break;
        };

        let dispatch = router.dispatch(&line).await;
        for text in dispatch.lines() {
            println!("{text}");
        }
        if dispatch.terminate {
            break;
        }
    }
    Ok(())
}
