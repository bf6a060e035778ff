use std::cell::{Cell, RefCell};

use crate::errors::ExecError;

/// Host-level effects requested by reserved actions and copy-text.
pub trait HostPort {
    fn open_settings(&self) -> Result<(), ExecError>;
    fn write_clipboard(&self, text: &str) -> Result<(), ExecError>;
}

/// Host that keeps the clipboard in memory; used by the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryHost {
    clipboard: RefCell<Option<String>>,
    settings_opened: Cell<usize>,
    clipboard_denied: Cell<bool>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent clipboard writes fail.
    pub fn deny_clipboard(&self) {
        self.clipboard_denied.set(true);
    }

    pub fn clipboard(&self) -> Option<String> {
        self.clipboard.borrow().clone()
    }

    pub fn settings_opened(&self) -> usize {
        self.settings_opened.get()
    }
}

impl HostPort for MemoryHost {
    fn open_settings(&self) -> Result<(), ExecError> {
        self.settings_opened.set(self.settings_opened.get() + 1);
        Ok(())
    }

    fn write_clipboard(&self, text: &str) -> Result<(), ExecError> {
        if self.clipboard_denied.get() {
            return Err(ExecError::Clipboard("permission denied".into()));
        }
        *self.clipboard.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}
