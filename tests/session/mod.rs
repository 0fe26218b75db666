//! Session-level tests against the in-memory database.

pub mod completion_test;
pub mod dispatch_test;

use std::sync::Arc;

use ops_cli::commands::{register_builtin, CommandRouter, Registry};
use ops_cli::db::MockDatabaseClient;
use ops_cli::logging::DebugKeys;

/// A router with every built-in command, on a fresh mock database.
pub fn session() -> CommandRouter {
    session_on(Arc::new(MockDatabaseClient::new()))
}

/// A router with every built-in command, on `db`.
pub fn session_on(db: Arc<MockDatabaseClient>) -> CommandRouter {
    let mut registry = Registry::new();
    register_builtin(&mut registry).unwrap();
    CommandRouter::new(registry, db, DebugKeys::detached("warn"), "switch")
}

/// Runs `lines` in order and returns the output of the last one.
pub async fn run(router: &mut CommandRouter, lines: &[&str]) -> Vec<String> {
    let mut last = Vec::new();
    for line in lines {
        last = router.dispatch(line).await.lines();
    }
    last
}
