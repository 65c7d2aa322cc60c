//! Interactive kitchen session.
//!
//! The kitchen driver ticks in the background while this loop reads
//! commands from stdin and prints alarms and lifecycle messages as they
//! arrive. Tasks live only as long as the session.

use std::io::IsTerminal;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::Args;
use cookclock_core::runtime::{self, lock, SharedKitchen};
use cookclock_core::storage::SCHEDULED_CATEGORY;
use cookclock_core::{
    AlarmNotice, ChannelSink, Config, CoreError, Event, Kitchen, KitchenDriver, NewTask,
    RemovalReason, SystemClock, TaskId, TaskStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::input::{self, Command, HELP};
use crate::render::{self, Style};

#[derive(Args)]
pub struct RunArgs {
    /// Tick interval in milliseconds (defaults to engine.tick_interval_ms)
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Redraw the task list on every tick
    #[arg(long)]
    watch: bool,
    /// Do not ring the terminal bell on completion
    #[arg(long)]
    no_bell: bool,
    /// After stdin closes, keep running until every task is gone
    #[arg(long)]
    until_idle: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(Session::new(config, args).run())
}

enum Flow {
    Continue,
    Quit,
}

struct Session {
    config: Config,
    style: Style,
    tick: Duration,
    bell: bool,
    watch: bool,
    until_idle: bool,
}

impl Session {
    fn new(config: Config, args: RunArgs) -> Self {
        let tick = args
            .tick_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or_else(|| config.tick_interval());
        Self {
            style: Style {
                color: std::io::stdout().is_terminal(),
            },
            tick,
            bell: config.alarm.bell && !args.no_bell,
            watch: args.watch,
            until_idle: args.until_idle,
            config,
        }
    }

    async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let (sink, mut alarms) = ChannelSink::new();
        let kitchen = runtime::shared(Kitchen::new(
            self.config.kitchen(),
            Arc::new(SystemClock),
            Arc::new(sink),
        ));
        let (tx, mut events) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let driver = tokio::spawn(
            KitchenDriver::new(kitchen.clone(), tx, cancel.child_token())
                .with_tick_interval(self.tick)
                .run(),
        );
        info!(tick_ms = self.tick.as_millis() as u64, "session started");

        if !self.watch {
            println!("cookclock ready. type 'help' for commands.");
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let mut redraw = tokio::time::interval(self.tick);

        loop {
            if !stdin_open && (!self.until_idle || lock(&kitchen).is_empty()) {
                break;
            }

            tokio::select! {
                line = lines.next_line(), if stdin_open => match line? {
                    Some(line) => {
                        if let Flow::Quit = self.handle_line(&kitchen, &line) {
                            break;
                        }
                    }
                    None => {
                        debug!("stdin closed");
                        stdin_open = false;
                    }
                },
                Some(notice) = alarms.recv() => self.ring(&notice),
                Some(event) = events.recv() => self.announce(&event),
                _ = redraw.tick(), if self.watch => {
                    if self.style.color {
                        print!("\x1b[2J\x1b[H");
                    }
                    self.print_tasks(&kitchen);
                }
            }
        }

        cancel.cancel();
        driver.await?;
        while let Ok(notice) = alarms.try_recv() {
            self.ring(&notice);
        }
        info!("session ended");
        Ok(())
    }

    fn handle_line(&self, kitchen: &SharedKitchen, line: &str) -> Flow {
        match input::parse_command(line, Local::now()) {
            Ok(None) => Flow::Continue,
            Ok(Some(command)) => match self.execute(kitchen, command) {
                Ok(flow) => flow,
                Err(e) => {
                    println!("error: {e}");
                    Flow::Continue
                }
            },
            Err(message) => {
                println!("error: {message}");
                Flow::Continue
            }
        }
    }

    fn execute(&self, kitchen: &SharedKitchen, command: Command) -> Result<Flow, CoreError> {
        match command {
            Command::Start(name) => {
                let preset = self.config.preset(&name)?;
                let id = lock(kitchen).create_from_preset(preset)?;
                println!("started #{id} {}", preset.name);
            }
            Command::Custom { name, secs } => {
                let id = lock(kitchen).create(NewTask::new(name.clone(), secs))?;
                println!("started #{id} {name}");
            }
            Command::Schedule { name, secs, at } => {
                let request = NewTask::new(name.clone(), secs)
                    .category(SCHEDULED_CATEGORY)
                    .scheduled_at(at);
                let mut k = lock(kitchen);
                let id = k.create(request)?;
                if k.get(id).map(|t| t.status()) == Some(TaskStatus::Scheduled) {
                    let local = at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
                    println!("scheduled #{id} {name} for {local}");
                } else {
                    println!("start time already passed; started #{id} {name}");
                }
            }
            Command::Pause(id) => {
                // Bind first: explain_noop takes the lock again.
                let changed = lock(kitchen).pause(id);
                match changed {
                    Some(_) => println!("paused #{id}"),
                    None => self.explain_noop(kitchen, id),
                }
            }
            Command::Resume(id) => {
                let changed = lock(kitchen).resume(id);
                match changed {
                    Some(_) => println!("resumed #{id}"),
                    None => self.explain_noop(kitchen, id),
                }
            }
            Command::Clear(id) => {
                let removed = lock(kitchen).remove(id);
                match removed {
                    Some(task) => println!("cleared #{id} {}", task.name()),
                    None => println!("task {id} no longer exists"),
                }
            }
            Command::ClearDone => {
                let cleared = lock(kitchen).clear_done();
                println!("cleared {} finished task(s)", cleared.len());
            }
            Command::List => self.print_tasks(kitchen),
            Command::Presets => {
                println!(
                    "{}",
                    render::preset_table(&self.config.presets, &self.config, self.style)
                );
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn explain_noop(&self, kitchen: &SharedKitchen, id: TaskId) {
        match lock(kitchen).get(id) {
            Some(task) => println!("task {id} is {}; nothing to do", task.status()),
            None => println!("task {id} no longer exists"),
        }
    }

    fn print_tasks(&self, kitchen: &SharedKitchen) {
        let k = lock(kitchen);
        let tasks = k.list_all();
        println!("{}", render::task_table(&tasks, &self.config, self.style));
    }

    fn ring(&self, notice: &AlarmNotice) {
        let bell = if self.bell { "\x07" } else { "" };
        println!("{bell}Task '{}' completed!", notice.task_name);
        if let Some(command) = &self.config.alarm.command {
            // The waiter task is detached and outlives this call.
            drop(play_alarm(command, notice));
        }
    }

    fn announce(&self, event: &Event) {
        match event {
            Event::TaskActivated { task_id, .. } => println!("task #{task_id} started"),
            Event::TaskRemoved {
                task_id,
                reason: RemovalReason::Expired,
                ..
            } => println!("task #{task_id} cleared after grace period"),
            other => debug!(?other, "event"),
        }
    }
}

/// Run the user's alarm command in the background. Failures are logged, never fatal.
///
/// Must be called inside the runtime: the returned handle waits on the child
/// so that finished alarms do not linger as zombies.
fn play_alarm(command: &str, notice: &AlarmNotice) -> Option<JoinHandle<()>> {
    let spawned = alarm_command(command, notice).spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            warn!(command, error = %e, "alarm command failed to start");
            return None;
        }
    };
    let command = command.to_string();
    Some(tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if !status.success() => {
                warn!(command = %command, %status, "alarm command exited with failure");
            }
            Ok(_) => {}
            Err(e) => warn!(command = %command, error = %e, "alarm command could not be awaited"),
        }
    }))
}

fn alarm_command(command: &str, notice: &AlarmNotice) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .env("COOKCLOCK_TASK", &notice.task_name)
        .env("COOKCLOCK_TASK_ID", notice.task_id.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notice() -> AlarmNotice {
        AlarmNotice {
            task_id: TaskId(4),
            task_name: "Kebab Frying".into(),
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn alarm_command_is_awaited_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("rang");
        let command = format!(
            "printf '%s %s' \"$COOKCLOCK_TASK_ID\" \"$COOKCLOCK_TASK\" > '{}'",
            marker.display()
        );

        let handle = play_alarm(&command, &notice()).expect("sh is available");
        handle.await.unwrap();
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "4 Kebab Frying");
    }

    #[tokio::test]
    async fn failing_alarm_command_is_not_fatal() {
        let handle = play_alarm("exit 3", &notice()).expect("sh is available");
        handle.await.unwrap();
    }
}
