//! Hello Extension - A simple example extension for glirc
//!
//! This extension demonstrates:
//! - Basic extension structure with the `export_extension!` macro
//! - Implementing the `Extension` trait
//! - Calling back into the client (`send_message`, `print`, queries)
//! - Tracking state across messages
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Installing
//!
//! ```bash
//! mkdir -p ~/.config/glirc/extensions/hello
//! cp target/release/libhello_extension.so ~/.config/glirc/extensions/hello/hello.so
//! glirc-ext enable hello
//! ```

use std::path::Path;

use glirc_extension_api::{
    Command, Extension, ExtensionError, Host, Message, ProcessResult, export_extension,
};

/// Answers `!hello` in channels and counts what it sees.
#[derive(Default)]
pub struct HelloExtension {
    /// Messages seen since start
    seen: u32,
    /// Greetings sent since start
    greeted: u32,
}

impl HelloExtension {
    fn greet(&mut self, host: &mut dyn Host, message: &Message<'_>) {
        let (Some(channel), Ok(nick)) = (message.param(0), std::str::from_utf8(message.prefix_nick))
        else {
            return;
        };
        if !channel.starts_with(b"#") {
            return;
        }

        let me = host
            .my_nick(&message.network_str())
            .unwrap_or_else(|| "glirc".to_string());
        let text = format!("hello {nick}, I'm {me}");
        let reply = Message::new(message.network, "PRIVMSG")
            .with_param(channel)
            .with_param(&text);

        match host.send_message(&reply) {
            Ok(()) => self.greeted += 1,
            Err(e) => {
                let _ = host.print_error(&format!("hello: could not reply: {e}"));
            }
        }
    }
}

impl Extension for HelloExtension {
    fn start(host: &mut dyn Host, path: &Path) -> Result<Self, ExtensionError> {
        host.print_info(&format!("Hello extension loaded from {}", path.display()))?;
        Ok(Self::default())
    }

    fn stop(self, host: &mut dyn Host) {
        let _ = host.print_info(&format!(
            "Hello extension unloading: {} messages, {} greetings",
            self.seen, self.greeted
        ));
    }

    fn process_message(&mut self, host: &mut dyn Host, message: &Message<'_>) -> ProcessResult {
        self.seen += 1;

        if message.command.eq_ignore_ascii_case(b"PRIVMSG")
            && message.param(1).is_some_and(|text| text.starts_with(b"!hello"))
        {
            self.greet(host, message);
        }

        ProcessResult::Pass
    }

    fn process_command(&mut self, host: &mut dyn Host, command: &Command<'_>) {
        if command.name().as_deref() != Some("hello") {
            return;
        }

        let networks = host.list_networks();
        let channels: usize = networks.iter().map(|n| host.list_channels(n).len()).sum();
        let _ = host.print_info(&format!(
            "hello: {} networks, {} channels, {} messages seen, {} greetings",
            networks.len(),
            channels,
            self.seen,
            self.greeted
        ));
    }
}

// This macro generates the C ABI entry points for dynamic loading
export_extension!(HelloExtension, c"hello");
