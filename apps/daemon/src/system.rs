//! Host power control.

use std::process::Command;
use std::sync::Arc;

use cyfi_core::{FrameSink, SystemControl};

/// Shows a goodbye message and runs the configured shutdown command.
pub struct HostShutdown {
    command: Vec<String>,
    display: Arc<dyn FrameSink>,
}

impl HostShutdown {
    pub fn new(command: Vec<String>, display: Arc<dyn FrameSink>) -> Self {
        Self { command, display }
    }
}

impl SystemControl for HostShutdown {
    fn shutdown(&self) {
        log::info!("System: Shutdown requested");
        self.display.clear();
        self.display.show_text(&["Goodbye".to_string()]);

        let Some((program, args)) = self.command.split_first() else {
            log::error!("System: No shutdown command configured");
            return;
        };
        match Command::new(program).args(args).spawn() {
            Ok(child) => log::info!("System: Running {:?} (pid {})", self.command, child.id()),
            Err(e) => log::error!("System: Failed to run {:?}: {}", self.command, e),
        }
    }
}
