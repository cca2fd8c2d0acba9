//! Desktop platform bridge.
//!
//! Notifications ring the terminal bell and print a line to stderr. The wake
//! hold is a `systemd-inhibit` child process that lives until released.

use std::io::{ErrorKind, Write};
use std::process::{Child, Command, Stdio};

use routimer_core::{BridgeError, NotifyPhase, PlatformBridge};
use tracing::debug;

#[derive(Default)]
pub struct DesktopBridge {
    inhibitor: Option<Child>,
}

impl DesktopBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn kill_inhibitor(&mut self) -> Result<(), BridgeError> {
        let Some(mut child) = self.inhibitor.take() else {
            return Ok(());
        };
        child
            .kill()
            .map_err(|e| BridgeError::Failed(format!("kill systemd-inhibit: {e}")))?;
        let _ = child.wait();
        debug!("wake hold released");
        Ok(())
    }
}

impl PlatformBridge for DesktopBridge {
    fn request_wake_hold(&mut self) -> Result<(), BridgeError> {
        self.kill_inhibitor()?;
        let child = Command::new("systemd-inhibit")
            .args([
                "--what=idle:sleep",
                "--who=routimer",
                "--why=Routine in progress",
                "--mode=block",
                "sleep",
                "infinity",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => BridgeError::Unsupported("wake hold"),
                _ => BridgeError::Failed(format!("spawn systemd-inhibit: {e}")),
            })?;
        debug!(pid = child.id(), "wake hold acquired");
        self.inhibitor = Some(child);
        Ok(())
    }

    fn release_wake_hold(&mut self) -> Result<(), BridgeError> {
        self.kill_inhibitor()
    }

    fn notify(&mut self, task_name: &str, phase: NotifyPhase) -> Result<(), BridgeError> {
        let verb = match phase {
            NotifyPhase::Start => "started",
            NotifyPhase::End => "finished",
        };
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "\x07[routimer] {task_name} {verb}")
            .map_err(|e| BridgeError::Failed(e.to_string()))
    }
}

impl Drop for DesktopBridge {
    fn drop(&mut self) {
        let _ = self.kill_inhibitor();
    }
}
