//! Street selections waiting for the caller to press a button.
//!
//! The pending state lives here, keyed by a token; the button only carries
//! `street:<token>:<street index>`.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use dashmap::DashMap;
use thiserror::Error;

use crate::{
    auth::Caller,
    location::{StallChanges, Street},
    resolve::StreetPrompt,
    strings,
};

const CHOICE_PREFIX: &str = "street";

#[derive(Clone, Debug, PartialEq)]
pub enum PendingAction {
    View,
    Edit(StallChanges),
}

#[derive(Clone, Debug)]
pub struct Pending {
    pub caller: Caller,
    pub prompt: StreetPrompt,
    pub action: PendingAction,
    opened: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{}", strings::SELECTION_EXPIRED)]
    Expired,

    #[error("{}", strings::SELECTION_NOT_YOURS)]
    NotOwner,
}

pub struct Sessions {
    next_token: AtomicU64,
    pending: DashMap<u64, Pending>,
    ttl: Duration,
}

impl Sessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            next_token: AtomicU64::new(1),
            pending: DashMap::new(),
            ttl,
        }
    }

    pub fn open(&self, caller: Caller, prompt: StreetPrompt, action: PendingAction) -> u64 {
        self.sweep();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.pending.insert(
            token,
            Pending {
                caller,
                prompt,
                action,
                opened: Instant::now(),
            },
        );
        token
    }

    /// Consumes the selection. Someone else's selection is left in place.
    pub fn take(&self, token: u64, user_id: i64) -> Result<Pending, SessionError> {
        let owner = self
            .pending
            .get(&token)
            .map(|entry| entry.caller.id)
            .ok_or(SessionError::Expired)?;
        if owner != user_id {
            return Err(SessionError::NotOwner);
        }

        let (_, pending) = self
            .pending
            .remove(&token)
            .ok_or(SessionError::Expired)?;
        if pending.opened.elapsed() >= self.ttl {
            return Err(SessionError::Expired);
        }
        Ok(pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    fn sweep(&self) {
        let ttl = self.ttl;
        self.pending
            .retain(|_, pending| pending.opened.elapsed() < ttl);
    }
}

pub fn encode_choice(token: u64, street: Street) -> String {
    format!("{CHOICE_PREFIX}:{token}:{}", street.index())
}

pub fn decode_choice(data: &str) -> Option<(u64, Street)> {
    let mut parts = data.split(':');
    if parts.next()? != CHOICE_PREFIX {
        return None;
    }
    let token = parts.next()?.parse().ok()?;
    let street = Street::from_index(parts.next()?.parse().ok()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((token, street))
}
