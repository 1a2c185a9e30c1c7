//! Numeric prefix typed before a command (`3n`, `04Z`, `12g`).

use crate::error::{Result, ViewerError};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CountBuffer {
    digits: String,
}

impl CountBuffer {
    pub fn push(&mut self, digit: char) -> bool {
        if digit.is_ascii_digit() {
            self.digits.push(digit);
            true
        } else {
            false
        }
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    /// Takes the raw digits, leaving the buffer empty.
    pub fn take(&mut self) -> Option<String> {
        (!self.digits.is_empty()).then(|| std::mem::take(&mut self.digits))
    }

    /// Takes the digits as a count. The buffer is cleared even when the
    /// digits do not form a usable number.
    pub fn take_count(&mut self) -> Result<Option<usize>> {
        match self.take() {
            None => Ok(None),
            Some(digits) => digits
                .parse()
                .map(Some)
                .map_err(|_| ViewerError::Parse(digits)),
        }
    }
}
