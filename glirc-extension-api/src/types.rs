//! Verdicts and message codes exchanged across the extension boundary

use std::ffi::c_int;

use crate::abi;

/// Outcome of `process_message` for one extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessResult {
    /// Deliver the message to the host's normal consumers
    #[default]
    Pass,
    /// Suppress delivery to the UI and logs
    Drop,
}

impl ProcessResult {
    /// Decode the value returned through the C ABI. Anything other than
    /// `PASS_MESSAGE` drops the message.
    pub fn from_raw(value: c_int) -> Self {
        if value == abi::PASS_MESSAGE {
            Self::Pass
        } else {
            Self::Drop
        }
    }

    pub fn to_raw(self) -> c_int {
        match self {
            Self::Pass => abi::PASS_MESSAGE,
            Self::Drop => abi::DROP_MESSAGE,
        }
    }

    pub fn is_drop(self) -> bool {
        self == Self::Drop
    }

    /// Combine two verdicts: the message passes only if both pass.
    pub fn and(self, other: Self) -> Self {
        if self.is_drop() || other.is_drop() {
            Self::Drop
        } else {
            Self::Pass
        }
    }
}

/// Severity of a line printed to the client UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageCode {
    #[default]
    Normal,
    Error,
}

impl MessageCode {
    /// Decode a code received through `glirc_print`. Unknown codes are rejected.
    pub fn from_raw(value: c_int) -> Option<Self> {
        match value {
            abi::NORMAL_MESSAGE => Some(Self::Normal),
            abi::ERROR_MESSAGE => Some(Self::Error),
            _ => None,
        }
    }

    pub fn to_raw(self) -> c_int {
        match self {
            Self::Normal => abi::NORMAL_MESSAGE,
            Self::Error => abi::ERROR_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_result_default_is_pass() {
        assert_eq!(ProcessResult::default(), ProcessResult::Pass);
    }

    #[test]
    fn test_process_result_from_raw() {
        assert_eq!(ProcessResult::from_raw(0), ProcessResult::Pass);
        assert_eq!(ProcessResult::from_raw(1), ProcessResult::Drop);
        assert_eq!(ProcessResult::from_raw(-7), ProcessResult::Drop);
    }

    #[test]
    fn test_process_result_and() {
        use ProcessResult::*;
        assert_eq!(Pass.and(Pass), Pass);
        assert_eq!(Pass.and(Drop), Drop);
        assert_eq!(Drop.and(Pass), Drop);
    }

    #[test]
    fn test_message_code_rejects_unknown_values() {
        assert_eq!(MessageCode::from_raw(0), Some(MessageCode::Normal));
        assert_eq!(MessageCode::from_raw(1), Some(MessageCode::Error));
        assert_eq!(MessageCode::from_raw(2), None);
    }

    #[test]
    fn test_message_code_raw_values_match_header() {
        assert_eq!(MessageCode::Normal.to_raw(), 0);
        assert_eq!(MessageCode::Error.to_raw(), 1);
    }
}
