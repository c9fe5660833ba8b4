//! Per-extension lifecycle: Unloaded -> Started -> Stopped, or Failed.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use glirc_extension_api::{Command, Message, ProcessResult};

use crate::context::HostContext;
use crate::driver::{DescriptorInfo, ExtensionDriver, InstanceHandle};
use crate::error::ExtensionHostError;

/// State of an installed extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionState {
    /// Installed but not yet started
    Unloaded,
    /// Started; receives messages and commands
    Started,
    /// Stopped; never called again
    Stopped,
    /// Start failed or a callback panicked; never called again
    Failed { error: String },
}

impl ExtensionState {
    pub fn is_started(&self) -> bool {
        matches!(self, ExtensionState::Started)
    }
}

impl std::fmt::Display for ExtensionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtensionState::Unloaded => f.write_str("unloaded"),
            ExtensionState::Started => f.write_str("started"),
            ExtensionState::Stopped => f.write_str("stopped"),
            ExtensionState::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// One installed extension: its driver, its handle once started, and the
/// state machine guarding every call.
pub(crate) struct ExtensionSlot {
    driver: Box<dyn ExtensionDriver>,
    path: Option<PathBuf>,
    handle: Option<InstanceHandle>,
    state: ExtensionState,
}

impl ExtensionSlot {
    pub fn new(driver: Box<dyn ExtensionDriver>, path: Option<PathBuf>) -> Self {
        Self {
            driver,
            path,
            handle: None,
            state: ExtensionState::Unloaded,
        }
    }

    pub fn info(&self) -> &DescriptorInfo {
        self.driver.info()
    }

    pub fn name(&self) -> &str {
        &self.driver.info().name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> &ExtensionState {
        &self.state
    }

    fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        tracing::error!(extension = %self.name(), error = %error, "Extension disabled");
        self.handle = None;
        self.state = ExtensionState::Failed { error };
    }

    /// Start the extension. Only valid from `Unloaded`.
    pub fn start(&mut self, ctx: &mut HostContext<'_>) -> Result<(), ExtensionHostError> {
        if self.state != ExtensionState::Unloaded {
            return Ok(());
        }
        let path = self.path.clone().unwrap_or_default();
        let driver = &self.driver;

        match panic::catch_unwind(AssertUnwindSafe(|| driver.start(ctx, &path))) {
            Ok(Some(handle)) => {
                tracing::info!(
                    extension = %self.name(),
                    version = %self.info().version(),
                    "Extension started"
                );
                self.handle = Some(handle);
                self.state = ExtensionState::Started;
                Ok(())
            }
            Ok(None) => {
                self.fail("start reported failure");
                Err(ExtensionHostError::StartFailed {
                    name: self.name().to_string(),
                })
            }
            Err(_) => {
                self.fail("panicked in start");
                Err(ExtensionHostError::StartFailed {
                    name: self.name().to_string(),
                })
            }
        }
    }

    /// Offer a message. Extensions that are not started pass.
    pub fn process_message(&mut self, ctx: &mut HostContext<'_>, message: &Message<'_>) -> ProcessResult {
        let Some(handle) = self.handle.as_mut().filter(|_| self.state.is_started()) else {
            return ProcessResult::Pass;
        };
        let driver = &self.driver;

        match panic::catch_unwind(AssertUnwindSafe(|| {
            driver.process_message(ctx, handle, message)
        })) {
            Ok(verdict) => verdict,
            Err(_) => {
                self.fail("panicked in process_message");
                ProcessResult::Pass
            }
        }
    }

    pub fn process_command(&mut self, ctx: &mut HostContext<'_>, command: &Command<'_>) {
        let Some(handle) = self.handle.as_mut().filter(|_| self.state.is_started()) else {
            return;
        };
        let driver = &self.driver;

        if panic::catch_unwind(AssertUnwindSafe(|| {
            driver.process_command(ctx, handle, command)
        }))
        .is_err()
        {
            self.fail("panicked in process_command");
        }
    }

    /// Stop a started extension. A no-op in every other state, so calling
    /// it twice stops once.
    pub fn stop(&mut self, ctx: &mut HostContext<'_>) {
        if !self.state.is_started() {
            return;
        }
        let Some(handle) = self.handle.take() else {
            return;
        };
        let driver = &self.driver;

        if panic::catch_unwind(AssertUnwindSafe(|| driver.stop(ctx, handle))).is_err() {
            self.fail("panicked in stop");
            return;
        }
        tracing::info!(extension = %self.name(), "Extension stopped");
        self.state = ExtensionState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientModel;
    use crate::driver::{NativeDriver, Slots};
    use glirc_extension_api::{Extension, ExtensionError, Host};

    struct Recorder;

    impl Extension for Recorder {
        fn start(host: &mut dyn Host, _path: &Path) -> Result<Self, ExtensionError> {
            host.print_info("start")?;
            Ok(Recorder)
        }

        fn stop(self, host: &mut dyn Host) {
            let _ = host.print_info("stop");
        }

        fn process_message(&mut self, host: &mut dyn Host, message: &Message<'_>) -> ProcessResult {
            let _ = host.print_info(&format!("message {}", message.command_str()));
            ProcessResult::Drop
        }

        fn process_command(&mut self, host: &mut dyn Host, command: &Command<'_>) {
            let _ = host.print_info(&format!("command {}", command.name().unwrap_or_default()));
        }
    }

    struct Fragile;

    impl Extension for Fragile {
        fn start(_host: &mut dyn Host, _path: &Path) -> Result<Self, ExtensionError> {
            Ok(Fragile)
        }

        fn stop(self, host: &mut dyn Host) {
            let _ = host.print_info("fragile stop");
        }

        fn process_message(&mut self, _host: &mut dyn Host, _message: &Message<'_>) -> ProcessResult {
            panic!("fragile extension");
        }
    }

    /// Driver whose start always fails and which panics if called again.
    struct NeverStarts(DescriptorInfo);

    impl ExtensionDriver for NeverStarts {
        fn info(&self) -> &DescriptorInfo {
            &self.0
        }
        fn start(&self, _ctx: &mut HostContext<'_>, _path: &Path) -> Option<InstanceHandle> {
            None
        }
        fn stop(&self, _ctx: &mut HostContext<'_>, _handle: InstanceHandle) {
            unreachable!("stop after failed start");
        }
        fn process_message(
            &self,
            _ctx: &mut HostContext<'_>,
            _handle: &mut InstanceHandle,
            _message: &Message<'_>,
        ) -> ProcessResult {
            unreachable!("dispatch after failed start");
        }
        fn process_command(
            &self,
            _ctx: &mut HostContext<'_>,
            _handle: &mut InstanceHandle,
            _command: &Command<'_>,
        ) {
            unreachable!("dispatch after failed start");
        }
    }

    fn printed(client: &ClientModel) -> Vec<&str> {
        client.printed().iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_calls_before_start_are_ignored() {
        let mut client = ClientModel::new();
        let mut slot = ExtensionSlot::new(Box::new(NativeDriver::<Recorder>::new("rec")), None);
        {
            let mut ctx = HostContext::new(&mut client);
            let verdict = slot.process_message(&mut ctx, &Message::new("n", "PING"));
            assert_eq!(verdict, ProcessResult::Pass);
            slot.process_command(&mut ctx, &Command::new(&["x"]));
            slot.stop(&mut ctx);
        }
        assert_eq!(slot.state(), &ExtensionState::Unloaded);
        assert!(client.printed().is_empty());
    }

    #[test]
    fn test_full_lifecycle_stops_once() {
        let mut client = ClientModel::new();
        let mut slot = ExtensionSlot::new(Box::new(NativeDriver::<Recorder>::new("rec")), None);
        {
            let mut ctx = HostContext::new(&mut client);
            slot.start(&mut ctx).unwrap();
            assert!(slot.state().is_started());
            let verdict = slot.process_message(&mut ctx, &Message::new("n", "PRIVMSG"));
            assert_eq!(verdict, ProcessResult::Drop);
            slot.process_command(&mut ctx, &Command::new(&["greet", "bob"]));
            slot.stop(&mut ctx);
            slot.stop(&mut ctx);
            slot.process_message(&mut ctx, &Message::new("n", "PRIVMSG"));
        }
        assert_eq!(slot.state(), &ExtensionState::Stopped);
        assert_eq!(
            printed(&client),
            vec!["start", "message PRIVMSG", "command greet", "stop"]
        );
    }

    #[test]
    fn test_failed_start_is_terminal() {
        let info = DescriptorInfo {
            name: "never".to_string(),
            major_version: 0,
            minor_version: 1,
            slots: Slots::ALL,
        };
        let mut client = ClientModel::new();
        let mut ctx = HostContext::new(&mut client);
        let mut slot = ExtensionSlot::new(Box::new(NeverStarts(info)), Some("/x/never.so".into()));

        let err = slot.start(&mut ctx).unwrap_err();
        assert!(matches!(err, ExtensionHostError::StartFailed { ref name } if name == "never"));
        assert!(matches!(slot.state(), ExtensionState::Failed { .. }));

        slot.start(&mut ctx).unwrap();
        slot.process_message(&mut ctx, &Message::new("n", "PING"));
        slot.process_command(&mut ctx, &Command::new(&["x"]));
        slot.stop(&mut ctx);
        assert_eq!(slot.path(), Some(Path::new("/x/never.so")));
    }

    #[test]
    fn test_panic_marks_failed_without_stop() {
        let mut client = ClientModel::new();
        let mut slot = ExtensionSlot::new(Box::new(NativeDriver::<Fragile>::new("fragile")), None);
        {
            let mut ctx = HostContext::new(&mut client);
            slot.start(&mut ctx).unwrap();
            let verdict = slot.process_message(&mut ctx, &Message::new("n", "PING"));
            assert_eq!(verdict, ProcessResult::Pass);
            slot.stop(&mut ctx);
        }
        assert_eq!(
            slot.state(),
            &ExtensionState::Failed {
                error: "panicked in process_message".to_string()
            }
        );
        assert!(client.printed().is_empty());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ExtensionState::Started.to_string(), "started");
        assert_eq!(
            ExtensionState::Failed {
                error: "boom".to_string()
            }
            .to_string(),
            "failed: boom"
        );
    }
}
