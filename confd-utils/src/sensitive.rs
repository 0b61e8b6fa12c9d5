//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! A wrapper that keeps leaf values flagged as secret (YANG's de-facto
//! `password`/`secret` convention) from leaking into logs or `show` output
//! unless the caller explicitly asked to see them.

use std::fmt;

/// A value that carries its schema-derived "is this a secret" flag alongside
/// it, so callers that print configuration (logging, `Show`) have to
/// explicitly opt in to revealing it.
#[derive(Clone, Eq, PartialEq)]
pub struct Sensitive {
    value: String,
    secret: bool,
}

impl Sensitive {
    pub fn new(value: String, secret: bool) -> Self {
        Sensitive { value, secret }
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }

    pub fn reveal(&self) -> &str {
        &self.value
    }

    /// Renders the value, masking it unless the caller requested secrets.
    pub fn render(&self, show_secrets: bool) -> &str {
        if self.secret && !show_secrets {
            "********"
        } else {
            &self.value
        }
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secret {
            write!(f, "Sensitive(\"********\")")
        } else {
            write!(f, "Sensitive({:?})", self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_secret_by_default() {
        let s = Sensitive::new("hunter2".to_owned(), true);
        assert_eq!(s.render(false), "********");
        assert_eq!(s.render(true), "hunter2");
        assert_eq!(s.reveal(), "hunter2");
    }

    #[test]
    fn non_secret_always_visible() {
        let s = Sensitive::new("eth0".to_owned(), false);
        assert_eq!(s.render(false), "eth0");
        assert_eq!(s.render(true), "eth0");
    }
}
