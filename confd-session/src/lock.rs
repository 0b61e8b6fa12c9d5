//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Mutex;

use crate::error::Error;

/// A pid-scoped advisory lock on a single session. `None` means unlocked.
#[derive(Debug, Default)]
pub struct Lock(Mutex<Option<u32>>);

impl Lock {
    pub fn new() -> Self {
        Lock(Mutex::new(None))
    }

    /// Acquires the lock for `pid`. Idempotent when `pid` already holds it.
    pub fn acquire(&self, pid: u32) -> Result<(), Error> {
        let mut held = self.0.lock().unwrap();
        match *held {
            Some(holder) if holder != pid => Err(Error::LockDenied(holder)),
            _ => {
                *held = Some(pid);
                Ok(())
            }
        }
    }

    /// Releases the lock. Only the holder may release it; an unlock call
    /// against an already-unlocked session always succeeds, regardless of
    /// the caller's pid.
    pub fn release(&self, pid: u32) -> Result<(), Error> {
        let mut held = self.0.lock().unwrap();
        match *held {
            Some(holder) if holder == pid => {
                *held = None;
                Ok(())
            }
            Some(holder) => Err(Error::LockDenied(holder)),
            None => Ok(()),
        }
    }

    /// Releases the lock unconditionally if `pid` holds it, used by
    /// `UnlockAllPid` when a client process exits without explicitly
    /// unlocking.
    pub fn release_if_held_by(&self, pid: u32) {
        let mut held = self.0.lock().unwrap();
        if *held == Some(pid) {
            *held = None;
        }
    }

    /// Fails fast unless `pid` holds the lock or the session is unlocked.
    /// Called before every `Set`/`Delete`/edit-config/`Load`/`CopyConfig`/
    /// `Commit`.
    pub fn check(&self, pid: u32) -> Result<(), Error> {
        let held = self.0.lock().unwrap();
        match *held {
            Some(holder) if holder != pid => Err(Error::LockDenied(holder)),
            _ => Ok(()),
        }
    }

    pub fn holder(&self) -> Option<u32> {
        *self.0.lock().unwrap()
    }
}
