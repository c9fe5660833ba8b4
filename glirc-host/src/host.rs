//! ExtensionHost - manages extension lifecycle and dispatch

use std::path::{Path, PathBuf};

use glirc_extension_api::abi::ExtensionDescriptor;
use glirc_extension_api::{Command, Extension, Message, ProcessResult};

use crate::client::{ClientModel, ClientState};
use crate::config::{DropPolicy, HostConfig};
use crate::context::HostContext;
use crate::driver::{ExtensionDriver, ForeignDriver, NativeDriver};
use crate::error::ExtensionHostError;
use crate::lifecycle::{ExtensionSlot, ExtensionState};
use crate::loader;
use crate::registry::ExtensionRegistry;

/// Information about an installed extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub name: String,
    pub major_version: i32,
    pub minor_version: i32,
    /// Module path; `None` for extensions linked into the process
    pub path: Option<PathBuf>,
    pub state: ExtensionState,
}

impl ExtensionInfo {
    fn of(slot: &ExtensionSlot) -> Self {
        let info = slot.info();
        Self {
            name: info.name.clone(),
            major_version: info.major_version,
            minor_version: info.minor_version,
            path: slot.path().map(Path::to_path_buf),
            state: slot.state().clone(),
        }
    }
}

/// The extension host: owns the client state and every installed
/// extension, and routes messages and commands through them in load order.
///
/// Dropping the host stops every started extension.
pub struct ExtensionHost<C: ClientState = ClientModel> {
    config: HostConfig,
    client: C,
    /// In load order
    extensions: Vec<ExtensionSlot>,
}

impl<C: ClientState> ExtensionHost<C> {
    pub fn new(config: HostConfig, client: C) -> Self {
        Self {
            config,
            client,
            extensions: Vec::new(),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Discover and load all enabled extensions
    ///
    /// Failures are logged per extension and don't stop the others.
    pub fn load_all(&mut self) -> Result<(), ExtensionHostError> {
        let registry = ExtensionRegistry::load(&self.config.registry_path)?;

        for found in loader::discover(&self.config.extension_dirs)? {
            if !registry.is_enabled(&found.name) {
                tracing::debug!(extension = %found.name, "Extension disabled, skipping");
                continue;
            }

            if let Err(e) = self.load_library(&found.library) {
                tracing::error!(extension = %found.name, error = %e, "Failed to load extension");
            }
        }

        Ok(())
    }

    /// Load a module, resolve its descriptor and start it.
    ///
    /// Returns the extension's name.
    pub fn load_library(&mut self, path: &Path) -> Result<String, ExtensionHostError> {
        let driver = ForeignDriver::open(path)?;
        tracing::debug!(
            extension = %driver.info().name,
            path = %path.display(),
            "Resolved extension descriptor"
        );
        self.register(Box::new(driver), Some(path.to_path_buf()))
    }

    /// Install an in-process driver and start it.
    pub fn install(&mut self, driver: Box<dyn ExtensionDriver>) -> Result<String, ExtensionHostError> {
        self.register(driver, None)
    }

    /// Install a Rust extension type under `name`.
    pub fn install_native<E: Extension + 'static>(&mut self, name: &str) -> Result<String, ExtensionHostError> {
        self.install(Box::new(NativeDriver::<E>::new(name)))
    }

    /// Install a C descriptor that is linked into this process.
    pub fn install_descriptor(
        &mut self,
        descriptor: &'static ExtensionDescriptor,
    ) -> Result<String, ExtensionHostError> {
        self.install(Box::new(ForeignDriver::from_static(descriptor)?))
    }

    fn register(
        &mut self,
        driver: Box<dyn ExtensionDriver>,
        path: Option<PathBuf>,
    ) -> Result<String, ExtensionHostError> {
        let info = driver.info().clone();

        if self.position(&info.name).is_some() {
            return Err(ExtensionHostError::Duplicate { name: info.name });
        }

        match self.config.required_major {
            Some(expected) if expected != info.major_version => {
                return Err(ExtensionHostError::ApiVersionMismatch {
                    expected,
                    found: info.major_version,
                });
            }
            None if info.major_version != glirc_extension_api::API_MAJOR_VERSION => {
                tracing::warn!(
                    extension = %info.name,
                    version = %info.version(),
                    "Extension built against a different API major version"
                );
            }
            _ => {}
        }

        let mut slot = ExtensionSlot::new(driver, path);
        let started = {
            let mut ctx = HostContext::new(&mut self.client);
            slot.start(&mut ctx)
        };
        // Failed extensions stay listed so their state is visible.
        self.extensions.push(slot);
        started.map(|()| info.name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.extensions.iter().position(|slot| slot.name() == name)
    }

    /// Offer a message to every started extension in load order.
    ///
    /// The verdict is `Drop` if any extension dropped the message. Under
    /// [`DropPolicy::FirstDrop`] later extensions don't see it at all.
    pub fn dispatch_message(&mut self, message: &Message<'_>) -> ProcessResult {
        let mut verdict = ProcessResult::Pass;

        for slot in &mut self.extensions {
            let mut ctx = HostContext::new(&mut self.client);
            let result = slot.process_message(&mut ctx, message);
            if result.is_drop() {
                tracing::debug!(
                    extension = %slot.name(),
                    command = %message.command_str(),
                    "Message dropped"
                );
            }
            verdict = verdict.and(result);

            if verdict.is_drop() && self.config.drop_policy == DropPolicy::FirstDrop {
                break;
            }
        }

        verdict
    }

    /// Dispatch an inbound message and hand it to the client unless an
    /// extension dropped it.
    pub fn process_inbound(&mut self, message: &Message<'_>) -> ProcessResult {
        let verdict = self.dispatch_message(message);
        if !verdict.is_drop() {
            self.client.deliver(message);
        }
        verdict
    }

    /// Offer a command to every started extension in load order.
    pub fn dispatch_command(&mut self, command: &Command<'_>) {
        for slot in &mut self.extensions {
            let mut ctx = HostContext::new(&mut self.client);
            slot.process_command(&mut ctx, command);
        }
    }

    /// Stop an extension and remove it.
    pub fn unload(&mut self, name: &str) -> Result<(), ExtensionHostError> {
        let index = self.position(name).ok_or_else(|| ExtensionHostError::NotFound {
            name: name.to_string(),
        })?;

        let mut slot = self.extensions.remove(index);
        let mut ctx = HostContext::new(&mut self.client);
        slot.stop(&mut ctx);
        Ok(())
    }

    /// Stop every started extension, newest first.
    ///
    /// Extensions stay listed as stopped; a second call does nothing.
    pub fn shutdown(&mut self) {
        for slot in self.extensions.iter_mut().rev() {
            let mut ctx = HostContext::new(&mut self.client);
            slot.stop(&mut ctx);
        }
    }

    /// All installed extensions in load order
    pub fn extensions(&self) -> Vec<ExtensionInfo> {
        self.extensions.iter().map(ExtensionInfo::of).collect()
    }

    pub fn get_extension_info(&self, name: &str) -> Option<ExtensionInfo> {
        self.position(name).map(|i| ExtensionInfo::of(&self.extensions[i]))
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Enable an extension in the registry
    pub fn enable_extension(&mut self, name: &str) -> Result<(), ExtensionHostError> {
        let mut registry = ExtensionRegistry::load(&self.config.registry_path)?;
        registry.enable(name);
        registry.save(&self.config.registry_path)?;
        Ok(())
    }

    /// Disable an extension in the registry, unloading it if loaded
    pub fn disable_extension(&mut self, name: &str) -> Result<(), ExtensionHostError> {
        let mut registry = ExtensionRegistry::load(&self.config.registry_path)?;
        registry.disable(name);
        registry.save(&self.config.registry_path)?;

        if self.position(name).is_some() {
            self.unload(name)?;
        }
        Ok(())
    }
}

impl<C: ClientState> Drop for ExtensionHost<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glirc_extension_api::{ExtensionError, Host, identifier_cmp};
    use std::cmp::Ordering;
    use tempfile::TempDir;

    fn host() -> ExtensionHost {
        let mut client = ClientModel::new();
        client
            .connect("freenode", "me")
            .join("freenode", "#test", ["alice", "bob", "carol"]);
        ExtensionHost::new(HostConfig::with_extension_dir("/nonexistent"), client)
    }

    fn printed(host: &ExtensionHost) -> Vec<String> {
        host.client().printed().iter().map(|l| l.text.clone()).collect()
    }

    fn privmsg<'a>(nick: &'a str, text: &'a str) -> Message<'a> {
        Message::new("freenode", "PRIVMSG")
            .with_prefix(nick, "user", "host")
            .with_param("#test")
            .with_param(text)
    }

    /// Drops everything from users in the `#test` member list that compare
    /// equal to "BOB".
    struct MuteBob;

    impl Extension for MuteBob {
        fn start(host: &mut dyn Host, _path: &Path) -> Result<Self, ExtensionError> {
            host.print_info("mute-bob start")?;
            Ok(MuteBob)
        }

        fn stop(self, host: &mut dyn Host) {
            let _ = host.print_info("mute-bob stop");
        }

        fn process_message(&mut self, _host: &mut dyn Host, message: &Message<'_>) -> ProcessResult {
            if identifier_cmp(message.prefix_nick, b"BOB") == Ordering::Equal {
                ProcessResult::Drop
            } else {
                ProcessResult::Pass
            }
        }
    }

    /// Counts messages and reports on stop.
    struct Counter(usize);

    impl Extension for Counter {
        fn start(host: &mut dyn Host, _path: &Path) -> Result<Self, ExtensionError> {
            host.print_info("counter start")?;
            Ok(Counter(0))
        }

        fn stop(self, host: &mut dyn Host) {
            let _ = host.print_info(&format!("counter stop {}", self.0));
        }

        fn process_message(&mut self, _host: &mut dyn Host, _message: &Message<'_>) -> ProcessResult {
            self.0 += 1;
            ProcessResult::Pass
        }

        fn process_command(&mut self, host: &mut dyn Host, command: &Command<'_>) {
            if command.name().as_deref() == Some("count") {
                let _ = host.print_info(&format!("count {}", self.0));
            }
        }
    }

    struct Refuses;

    impl Extension for Refuses {
        fn start(_host: &mut dyn Host, _path: &Path) -> Result<Self, ExtensionError> {
            Err(ExtensionError::custom("not today"))
        }

        fn stop(self, host: &mut dyn Host) {
            let _ = host.print_info("refuses stop");
        }

        fn process_message(&mut self, host: &mut dyn Host, _message: &Message<'_>) -> ProcessResult {
            let _ = host.print_info("refuses saw message");
            ProcessResult::Drop
        }
    }

    /// Answers greetings through the host.
    struct Greeter;

    impl Extension for Greeter {
        fn start(_host: &mut dyn Host, _path: &Path) -> Result<Self, ExtensionError> {
            Ok(Greeter)
        }

        fn process_command(&mut self, host: &mut dyn Host, command: &Command<'_>) {
            if command.name().as_deref() != Some("greet") {
                return;
            }
            let Some(network) = host.list_networks().into_iter().next() else {
                return;
            };
            for channel in host.list_channels(&network) {
                let users = host.list_channel_users(&network, &channel);
                let text = format!("hello {}", users.join(" "));
                let msg = Message::new(&network, "PRIVMSG")
                    .with_param(&channel)
                    .with_param(&text);
                let _ = host.send_message(&msg);
            }
        }
    }

    #[test]
    fn test_no_extensions_passes_and_delivers() {
        let mut host = host();
        assert_eq!(host.extension_count(), 0);

        let verdict = host.process_inbound(&privmsg("alice", "hi"));
        assert_eq!(verdict, ProcessResult::Pass);
        assert_eq!(host.client().delivered().len(), 1);
    }

    #[test]
    fn test_drop_suppresses_delivery() {
        let mut host = host();
        host.install_native::<MuteBob>("mute-bob").unwrap();

        assert_eq!(host.process_inbound(&privmsg("bob", "spam")), ProcessResult::Drop);
        assert_eq!(host.process_inbound(&privmsg("Bob", "spam")), ProcessResult::Drop);
        assert_eq!(host.process_inbound(&privmsg("alice", "hi")), ProcessResult::Pass);

        let delivered = host.client().delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].prefix_nick, "alice");
    }

    #[test]
    fn test_notify_all_lets_later_extensions_see_dropped_messages() {
        let mut host = host();
        host.install_native::<MuteBob>("mute-bob").unwrap();
        host.install_native::<Counter>("counter").unwrap();

        host.dispatch_message(&privmsg("bob", "one"));
        host.dispatch_message(&privmsg("alice", "two"));
        host.shutdown();

        assert!(printed(&host).contains(&"counter stop 2".to_string()));
    }

    #[test]
    fn test_first_drop_stops_dispatch() {
        let mut host = host();
        host.config.drop_policy = DropPolicy::FirstDrop;
        host.install_native::<MuteBob>("mute-bob").unwrap();
        host.install_native::<Counter>("counter").unwrap();

        assert_eq!(host.dispatch_message(&privmsg("bob", "one")), ProcessResult::Drop);
        assert_eq!(host.dispatch_message(&privmsg("alice", "two")), ProcessResult::Pass);
        host.shutdown();

        assert!(printed(&host).contains(&"counter stop 1".to_string()));
    }

    #[test]
    fn test_failed_start_gets_no_callbacks_and_no_stop() {
        let mut host = host();
        let err = host.install_native::<Refuses>("refuses").unwrap_err();
        assert!(matches!(err, ExtensionHostError::StartFailed { .. }));

        let info = host.get_extension_info("refuses").unwrap();
        assert!(matches!(info.state, ExtensionState::Failed { .. }));

        assert_eq!(host.process_inbound(&privmsg("alice", "hi")), ProcessResult::Pass);
        host.dispatch_command(&Command::new(&["anything"]));
        host.shutdown();

        let lines = printed(&host);
        assert_eq!(lines, vec!["refuses: failed to start: not today"]);
        assert_eq!(host.client().delivered().len(), 1);
    }

    #[test]
    fn test_shutdown_stops_in_reverse_order_once() {
        let mut host = host();
        host.install_native::<MuteBob>("mute-bob").unwrap();
        host.install_native::<Counter>("counter").unwrap();

        host.shutdown();
        host.shutdown();

        assert_eq!(
            printed(&host),
            vec!["mute-bob start", "counter start", "counter stop 0", "mute-bob stop"]
        );
        assert!(host
            .extensions()
            .iter()
            .all(|e| e.state == ExtensionState::Stopped));

        // Stopped extensions no longer see traffic.
        assert_eq!(host.process_inbound(&privmsg("bob", "late")), ProcessResult::Pass);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut host = host();
        host.install_native::<Counter>("counter").unwrap();
        let err = host.install_native::<MuteBob>("counter").unwrap_err();
        assert!(matches!(err, ExtensionHostError::Duplicate { ref name } if name == "counter"));
        assert_eq!(host.extension_count(), 1);
    }

    #[test]
    fn test_required_major_rejects_before_start() {
        let mut host = host();
        host.config.required_major = Some(0);
        let driver = NativeDriver::<Counter>::with_version("future", 1, 0);
        let err = host.install(Box::new(driver)).unwrap_err();
        assert!(matches!(
            err,
            ExtensionHostError::ApiVersionMismatch {
                expected: 0,
                found: 1
            }
        ));
        assert_eq!(host.extension_count(), 0);
        assert!(printed(&host).is_empty());
    }

    #[test]
    fn test_versions_advisory_by_default() {
        let mut host = host();
        let driver = NativeDriver::<Counter>::with_version("future", 1, 0);
        host.install(Box::new(driver)).unwrap();
        let info = host.get_extension_info("future").unwrap();
        assert_eq!(info.major_version, 1);
        assert_eq!(info.state, ExtensionState::Started);
    }

    #[test]
    fn test_unload_stops_and_removes() {
        let mut host = host();
        host.install_native::<Counter>("counter").unwrap();
        host.dispatch_message(&privmsg("alice", "hi"));
        host.unload("counter").unwrap();

        assert_eq!(host.extension_count(), 0);
        assert_eq!(printed(&host).last().map(String::as_str), Some("counter stop 1"));
        assert!(matches!(
            host.unload("counter"),
            Err(ExtensionHostError::NotFound { .. })
        ));
    }

    #[test]
    fn test_command_dispatch_reaches_host_surface() {
        let mut host = host();
        host.install_native::<Greeter>("greeter").unwrap();
        host.install_native::<Counter>("counter").unwrap();

        host.dispatch_message(&privmsg("alice", "hi"));
        host.dispatch_command(&Command::new(&["greet"]));
        host.dispatch_command(&Command::new(&["count"]));

        let outbox = host.client().outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].network, "freenode");
        assert_eq!(outbox[0].params, vec!["#test", "hello alice bob carol"]);
        assert!(printed(&host).contains(&"count 1".to_string()));
    }

    #[test]
    fn test_drop_runs_shutdown() {
        let mut host = host();
        host.install_native::<Counter>("counter").unwrap();
        let mut client = ClientModel::new();
        std::mem::swap(host.client_mut(), &mut client);
        drop(host);
        // The swapped-out model saw only the start.
        assert_eq!(client.printed().len(), 1);
    }

    #[test]
    fn test_enable_disable_updates_registry() {
        let dir = TempDir::new().unwrap();
        let mut host = ExtensionHost::new(
            HostConfig::with_extension_dir(dir.path()),
            ClientModel::new(),
        );

        host.enable_extension("auto-away").unwrap();
        let registry = ExtensionRegistry::load(&dir.path().join("registry.toml")).unwrap();
        assert!(registry.is_enabled("auto-away"));

        host.disable_extension("auto-away").unwrap();
        let registry = ExtensionRegistry::load(&dir.path().join("registry.toml")).unwrap();
        assert!(!registry.is_enabled("auto-away"));
    }

    #[test]
    fn test_disable_unloads_running_extension() {
        let dir = TempDir::new().unwrap();
        let mut host = ExtensionHost::new(
            HostConfig::with_extension_dir(dir.path()),
            ClientModel::new(),
        );
        host.install_native::<Counter>("counter").unwrap();
        host.disable_extension("counter").unwrap();
        assert_eq!(host.extension_count(), 0);
    }

    #[test]
    fn test_load_all_with_empty_dir() {
        let dir = TempDir::new().unwrap();
        let mut host = ExtensionHost::new(
            HostConfig::with_extension_dir(dir.path()),
            ClientModel::new(),
        );
        host.load_all().unwrap();
        assert_eq!(host.extension_count(), 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_load_all_skips_broken_library() {
        let dir = TempDir::new().unwrap();
        let ext_dir = dir.path().join("broken");
        std::fs::create_dir_all(&ext_dir).unwrap();
        std::fs::write(ext_dir.join("libbroken.so"), b"garbage").unwrap();

        let mut host = ExtensionHost::new(
            HostConfig::with_extension_dir(dir.path()),
            ClientModel::new(),
        );
        host.enable_extension("broken").unwrap();
        host.load_all().unwrap();
        assert_eq!(host.extension_count(), 0);
    }
}
