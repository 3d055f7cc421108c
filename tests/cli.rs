use assert_cmd::Command;
use predicates::prelude::*;
use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

use gitlab_contributors::cli::{run, Cli, Commands, CountArgs};

#[test]
fn count_help_lists_target_flags() {
    let mut cmd = Command::cargo_bin("gitlab-contributors").expect("Binary exists");
    cmd.arg("count").arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("--project")
            .and(predicate::str::contains("--groups"))
            .and(predicate::str::contains("--since")),
    );
}

#[test]
fn count_without_token_fails_with_hint() {
    // Run outside the workspace so no .env supplies a token.
    let workdir = tempfile::tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("gitlab-contributors").expect("Binary exists");
    cmd.arg("count")
        .arg("--project")
        .arg("org/repo")
        .env_remove("GITLAB_TOKEN")
        .current_dir(workdir.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("GITLAB_TOKEN"));
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    // A missing config file fails early, after the first event.
    let cli = Cli {
        command: Commands::Count(CountArgs {
            config: Some(std::path::PathBuf::from("does-not-exist.yaml")),
            ..Default::default()
        }),
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
