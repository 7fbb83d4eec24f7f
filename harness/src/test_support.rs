//! Test-only doubles: a scripted executor and a manually advanced clock.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use crate::core::types::{CommandResult, ExecutionContext};
use crate::io::config::HarnessConfig;
use crate::io::executor::Executor;
use crate::poll::Clock;

/// Clock whose time only moves when `sleep` is called.
#[derive(Debug)]
pub struct FakeClock {
    origin: Instant,
    elapsed: Cell<Duration>,
    sleeps: Cell<u32>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
            sleeps: Cell::new(0),
        }
    }

    /// Total simulated time slept.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn sleep(&self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
        self.sleeps.set(self.sleeps.get() + 1);
    }
}

/// Executor that replays canned results keyed by context and command line.
///
/// Results queued for the same command are returned in order; the last one
/// repeats once the queue is down to a single entry. Unscripted commands fail.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: RefCell<BTreeMap<String, VecDeque<CommandResult>>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `result` for `command` (tokens joined by single spaces).
    pub fn on(self, context: ExecutionContext, command: &str, result: CommandResult) -> Self {
        self.push(context, command, result);
        self
    }

    /// Queue a successful result with `output`.
    pub fn ok(self, context: ExecutionContext, command: &str, output: &str) -> Self {
        self.on(context, command, CommandResult::success(output))
    }

    /// Queue a failing result whose diagnostic is `diagnostic`.
    pub fn fail(self, context: ExecutionContext, command: &str, diagnostic: &str) -> Self {
        self.on(context, command, CommandResult::failure("", diagnostic))
    }

    /// Replace any queued results for `command`.
    pub fn replace(&self, context: ExecutionContext, command: &str, result: CommandResult) {
        let key = key(context, command);
        self.responses
            .borrow_mut()
            .insert(key, VecDeque::from([result]));
    }

    pub fn push(&self, context: ExecutionContext, command: &str, result: CommandResult) {
        self.responses
            .borrow_mut()
            .entry(key(context, command))
            .or_default()
            .push_back(result);
    }

    /// Every executed command, in order, as `"<context>: <command>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of times `command` ran in `context`.
    pub fn count(&self, context: ExecutionContext, command: &str) -> usize {
        let key = key(context, command);
        self.calls.borrow().iter().filter(|c| **c == key).count()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, context: ExecutionContext, command: &[&str]) -> CommandResult {
        let key = key(context, &command.join(" "));
        self.calls.borrow_mut().push(key.clone());
        let mut responses = self.responses.borrow_mut();
        match responses.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(unscripted),
            Some(queue) => queue.front().cloned().unwrap_or_else(unscripted),
            None => unscripted(),
        }
    }
}

fn key(context: ExecutionContext, command: &str) -> String {
    format!("{context}: {command}")
}

fn unscripted() -> CommandResult {
    CommandResult::failure("", "unscripted command")
}

pub const OS_RELEASE_JAMMY: &str = r#"PRETTY_NAME="Ubuntu 22.04.1 LTS"
NAME="Ubuntu"
VERSION_ID="22.04"
VERSION="22.04.1 LTS (Jammy Jellyfish)"
VERSION_CODENAME=jammy
ID=ubuntu
ID_LIKE=debian
"#;

/// `/etc/update-manager/release-upgrades` with the given `Prompt` value.
pub fn release_upgrades(prompt: &str) -> String {
    format!(
        "# Default behavior for the release upgrader.\n\n[DEFAULT]\n# Default prompting and upgrade behavior, valid options:\n#  never  - Never check for, or allow upgrading to, a new release.\n#  normal - Check to see if a new release is available.\n#  lts    - Check to see if a new LTS release is available.\nPrompt={prompt}\n"
    )
}

/// Scripted guest that passes every scenario step for `cfg`.
///
/// `os_release` and `prompt` are what the guest reports; tests adjust
/// individual commands afterwards with [`ScriptedExecutor::replace`].
pub fn healthy_guest(cfg: &HarnessConfig, os_release: &str, prompt: &str) -> ScriptedExecutor {
    let launcher = cfg.launcher.display().to_string();
    let restart = cfg.restart_command().join(" ");
    ScriptedExecutor::new()
        .ok(
            ExecutionContext::Host,
            &format!("{launcher} install --ui={}", cfg.install_ui),
            "Installing, this may take a few minutes...\nInstallation successful!\n",
        )
        .ok(ExecutionContext::Guest, "whoami", "u\n")
        .ok(
            ExecutionContext::Guest,
            "apt-mark showinstall language-pack\\*",
            "language-pack-en\nlanguage-pack-en-base\n",
        )
        .ok(ExecutionContext::Guest, "cat /etc/os-release", os_release)
        .ok(
            ExecutionContext::Guest,
            "bash -ec systemctl is-system-running || exit 0",
            "starting\n",
        )
        .ok(
            ExecutionContext::Guest,
            "bash -ec systemctl is-system-running || exit 0",
            "running\n",
        )
        .ok(
            ExecutionContext::Guest,
            "systemctl status systemd-sysusers.service",
            "systemd-sysusers.service - Create System Users\n   Active: active (exited)\n",
        )
        .ok(ExecutionContext::Host, &restart, "")
        .ok(ExecutionContext::Host, &format!("{launcher} run echo Hello"), "Hello\n")
        .ok(
            ExecutionContext::Guest,
            "cat /etc/update-manager/release-upgrades",
            &release_upgrades(prompt),
        )
        .ok(
            ExecutionContext::Guest,
            "date -r /etc/update-manager/release-upgrades",
            "Wed Oct 19 09:12:44 UTC 2022\n",
        )
}
