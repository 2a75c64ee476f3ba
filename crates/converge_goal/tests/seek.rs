//! End-to-end seek scenarios.
//!
//! Covers the literal scenarios from the engine's contract: filesystem
//! self-healing (create-if-missing, config-line ensure with a mapped
//! pre-condition), operator short-circuit and launch semantics, rejection
//! absorption, blocked pre-conditions, and tuple aggregation.


use std::path::PathBuf;

use converge_goal::{Goal, Seeker, always, never};
use converge_goal::log::RecordingLogger;
use converge_state::{Action, ActionError, State, StateError, StateNotFound, Test};
use test_utils::{
    SnapshotLog, World, broken_probe, cell_equals, ensure_cell, probe_spy, stuck_with_action,
};

// ═══════════════════════════════════════════════════════════════════════════════
// FILESYSTEM SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════════

/// Context for the filesystem goals: the path being converged on.
#[derive(Clone)]
struct FileCtx {
    path: PathBuf,
}

fn scratch_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("converge-{tag}-{}", nanoid::nanoid!()))
}

/// A goal asserting that the file exists, creating it when missing.
fn file_exists() -> Goal<FileCtx, bool> {
    let state = State::new(|ctx: FileCtx| async move { Ok(ctx.path.exists()) });
    let action = Action::new(|ctx: FileCtx, _snapshot: Option<bool>| async move {
        std::fs::write(&ctx.path, "").map_err(ActionError::new)?;
        Ok(())
    });
    Goal::of(state).action(action).named("file exists")
}

#[tokio::test]
async fn creates_a_missing_file_once() {
    let ctx = FileCtx {
        path: scratch_path("exists"),
    };
    let goal = file_exists();

    assert!(goal.seek(ctx.clone()).await.unwrap());
    assert!(ctx.path.exists());

    // Re-seeking an already satisfied goal performs no further writes.
    let modified = std::fs::metadata(&ctx.path).unwrap().modified().unwrap();
    assert!(goal.seek(ctx.clone()).await.unwrap());
    assert_eq!(
        std::fs::metadata(&ctx.path).unwrap().modified().unwrap(),
        modified
    );

    std::fs::remove_file(&ctx.path).unwrap();
}

/// Context for the config goal: where the config file lives.
#[derive(Clone)]
struct ConfigCtx {
    config: PathBuf,
}

const LOG_LINE: &str = "loglevel=info";

/// A goal asserting that the config file contains the log-level line,
/// rewriting the file (duplicates stripped, line appended) when it does
/// not. Requires the file to exist first.
fn log_level_set() -> Goal<ConfigCtx, String> {
    let state = State::new(|ctx: ConfigCtx| async move {
        std::fs::read_to_string(&ctx.config).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StateNotFound::with_cause("config file missing", err).into()
            } else {
                StateError::read(err)
            }
        })
    });
    let test = Test::new(|_, contents: &String| contents.lines().any(|line| line == LOG_LINE));
    let action = Action::new(|ctx: ConfigCtx, snapshot: Option<String>| async move {
        let contents = snapshot.unwrap_or_default();
        let mut lines: Vec<&str> = contents
            .lines()
            .filter(|line| !line.is_empty() && *line != LOG_LINE)
            .collect();
        lines.push(LOG_LINE);
        std::fs::write(&ctx.config, lines.join("\n") + "\n").map_err(ActionError::new)?;
        Ok(())
    });

    Goal::new(state, test)
        .action(action)
        .requires(file_exists().map(|ctx: ConfigCtx| FileCtx { path: ctx.config }))
        .named("log level configured")
}

#[tokio::test]
async fn config_line_ensure_runs_the_precondition_first() {
    let ctx = ConfigCtx {
        config: scratch_path("config"),
    };

    assert!(log_level_set().seek(ctx.clone()).await.unwrap());

    let contents = std::fs::read_to_string(&ctx.config).unwrap();
    let matches: Vec<_> = contents.lines().filter(|line| *line == LOG_LINE).collect();
    assert_eq!(matches.len(), 1);
    assert!(contents.ends_with(&format!("{LOG_LINE}\n")));

    std::fs::remove_file(&ctx.config).unwrap();
}

#[tokio::test]
async fn config_line_ensure_strips_duplicates() {
    let ctx = ConfigCtx {
        config: scratch_path("dupes"),
    };
    std::fs::write(&ctx.config, "a=1\nloglevel=debug\n").unwrap();

    assert!(log_level_set().seek(ctx.clone()).await.unwrap());

    let contents = std::fs::read_to_string(&ctx.config).unwrap();
    assert_eq!(contents, format!("a=1\nloglevel=debug\n{LOG_LINE}\n"));

    std::fs::remove_file(&ctx.config).unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPERATOR SEMANTICS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn all_launches_every_child() {
    let (spied, probes) = probe_spy(true);
    let goal = Goal::all((always(), never(), spied));

    assert!(!goal.seek(World::new()).await.unwrap());
    // The concurrent conjunction launches every child, ready or not.
    assert_eq!(probes.calls(), 1);
}

#[tokio::test]
async fn and_short_circuits_at_the_first_failure() {
    let (spied, probes) = probe_spy(true);
    let goal = Goal::and((always(), never(), spied));

    assert!(!goal.seek(World::new()).await.unwrap());
    assert_eq!(probes.calls(), 0);
}

#[tokio::test]
async fn or_stops_at_the_first_ready_child() {
    let (spied, probes) = probe_spy(false);
    let goal = Goal::or((never(), always(), spied));

    assert!(goal.seek(World::new()).await.unwrap());
    assert_eq!(probes.calls(), 0);
}

#[tokio::test]
async fn or_treats_a_rejected_child_as_not_yet_true() {
    let goal = Goal::or((broken_probe("transient probe fault"), always()));
    assert!(goal.seek(World::new()).await.unwrap());
}

#[tokio::test]
async fn or_with_no_ready_child_yields_false() {
    let goal = Goal::or((broken_probe("transient probe fault"), never()));
    assert!(!goal.seek(World::new()).await.unwrap());
}

#[tokio::test]
async fn and_propagates_a_child_fault() {
    let goal = Goal::and((always(), broken_probe("daemon unreachable")));
    let err = goal.seek(World::new()).await.unwrap_err();
    assert_eq!(err.goal(), "daemon unreachable");
}

#[tokio::test]
async fn and_never_reaches_a_fault_behind_a_failure() {
    let goal = Goal::and((never(), broken_probe("daemon unreachable")));
    assert!(!goal.seek(World::new()).await.unwrap());
}

#[tokio::test]
async fn all_aborts_on_a_child_fault() {
    let goal = Goal::all((always(), broken_probe("daemon unreachable")));
    assert!(goal.seek(World::new()).await.is_err());
}

#[tokio::test]
async fn any_absorbs_child_faults() {
    let goal = Goal::any((broken_probe("daemon unreachable"), always()));
    assert!(goal.seek(World::new()).await.unwrap());

    let goal = Goal::any((broken_probe("daemon unreachable"), never()));
    assert!(!goal.seek(World::new()).await.unwrap());
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRE-CONDITIONS AND REMEDIATION
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn blocked_precondition_keeps_the_action_from_running() {
    let (goal, actions) = stuck_with_action();
    let goal = goal.requires(never());

    assert!(!goal.seek(World::new()).await.unwrap());
    assert_eq!(actions.calls(), 0);
}

#[tokio::test]
async fn preconditions_repair_the_world_before_the_action() {
    let world = World::new();
    let (daemon_up, daemon_actions) = ensure_cell("daemon", "running");
    let (service_up, service_actions) = ensure_cell("service", "running");
    let goal = service_up.requires(daemon_up);

    assert!(goal.seek(world.clone()).await.unwrap());
    assert_eq!(daemon_actions.calls(), 1);
    assert_eq!(service_actions.calls(), 1);
    assert_eq!(world.get("daemon").as_deref(), Some("running"));
    assert_eq!(world.get("service").as_deref(), Some("running"));
}

#[tokio::test]
async fn requires_alone_relies_on_the_reprobe() {
    // No action of its own: the pre-condition writes the very cell the
    // outer goal probes, so the re-probe after the pre-conditions passes.
    let world = World::new();
    let (fills_cell, actions) = ensure_cell("shared", "ready");
    let goal = cell_equals("shared", "ready").requires(fills_cell);

    assert!(goal.seek(world.clone()).await.unwrap());
    assert_eq!(actions.calls(), 1);
}

#[tokio::test]
async fn not_found_demotes_and_the_action_runs_blind() {
    let world = World::new();
    let log = SnapshotLog::default();
    let seen = log.clone();
    let action = Action::new(move |world: World, snapshot: Option<String>| {
        let seen = seen.clone();
        async move {
            seen.record(snapshot);
            world.set("greeting", "hello");
            Ok(())
        }
    });
    let goal = cell_equals("greeting", "hello").action(action);

    assert!(goal.seek(world.clone()).await.unwrap());
    // The cell was absent on both the probe and the re-read, so the action
    // saw an empty snapshot.
    assert_eq!(log.seen(), vec![None]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// AGGREGATION AND BOUNDARIES
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn tuple_goal_aggregates_typed_snapshots() {
    let number = Goal::new(
        State::new(|_: World| async move { Ok(10) }),
        Test::new(|_, n: &i64| *n == 10),
    );
    let text = Goal::new(
        State::new(|_: World| async move { Ok("hello".to_owned()) }),
        Test::new(|_, s: &String| s == "hello"),
    );

    let both = Goal::of((number, text));
    assert_eq!(both.state(World::new()).await.unwrap(), (10, "hello".to_owned()));
    assert!(both.test(World::new()).await.unwrap());
    assert!(both.seek(World::new()).await.unwrap());
}

#[tokio::test]
async fn constants_and_unit_context() {
    assert!(always::<()>().seek(()).await.unwrap());
    assert!(!never::<()>().seek(()).await.unwrap());
}

#[tokio::test]
async fn trace_covers_the_precondition_walk() {
    let world = World::new();
    let trace = RecordingLogger::new();
    let (daemon_up, _) = ensure_cell("daemon", "running");
    let (service_up, _) = ensure_cell("service", "running");
    let goal = service_up.requires(daemon_up.named("daemon running"));

    assert!(
        Seeker::with_logger(trace.clone())
            .seek(&goal, world)
            .await
            .unwrap()
    );

    let lines = trace.lines();
    assert_eq!(lines[0], "cell service = running: checking...");
    assert!(lines.contains(&"cell service = running: seeking preconditions...".to_owned()));
    assert!(lines.contains(&"daemon running: running the action...".to_owned()));
    assert!(lines.contains(&"cell service = running: preconditions met!".to_owned()));
    assert_eq!(lines.last().unwrap(), "cell service = running: ready!");
}
