//! Instance registry
//!
//! Bounded table mapping a stop channel to the lane it silences. Bindings
//! are written from the foreground at setup and teardown and read from the
//! completion interrupt; the table itself sits behind a critical-section
//! mutex, while each slot's armed flag is a plain atomic so arming does not
//! need the lock.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use stepgen_hal::ChannelId;

use crate::error::RegistryError;

struct Binding<H> {
    channel: ChannelId,
    target: H,
}

/// Channel id to owning lane, at most `N` entries
pub struct InstanceRegistry<H, const N: usize> {
    bindings: Mutex<CriticalSectionRawMutex, RefCell<[Option<Binding<H>>; N]>>,
    armed: [AtomicBool; N],
}

impl<H, const N: usize> Default for InstanceRegistry<H, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, const N: usize> InstanceRegistry<H, N> {
    /// Create an empty registry (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            bindings: Mutex::new(RefCell::new([const { None }; N])),
            armed: [const { AtomicBool::new(false) }; N],
        }
    }

    /// Bind `channel` to `target`
    ///
    /// The binding starts disarmed.
    pub fn register(&self, channel: ChannelId, target: H) -> Result<Registration<'_>, RegistryError> {
        self.bindings.lock(|cell| {
            let mut slots = cell.borrow_mut();

            if slots.iter().flatten().any(|b| b.channel == channel) {
                return Err(RegistryError::ChannelTaken);
            }
            let slot = slots
                .iter()
                .position(Option::is_none)
                .ok_or(RegistryError::Full)?;

            self.armed[slot].store(false, Ordering::Release);
            slots[slot] = Some(Binding { channel, target });

            Ok(Registration {
                channel,
                slot,
                armed: &self.armed[slot],
            })
        })
    }

    /// Remove a binding
    ///
    /// A registration issued by another registry is refused and nothing is
    /// cleared.
    pub fn deregister(&self, registration: Registration<'_>) -> Result<(), RegistryError> {
        let slot = registration.slot;
        let owned = self
            .armed
            .get(slot)
            .is_some_and(|flag| core::ptr::eq(registration.armed, flag));
        if !owned {
            return Err(RegistryError::ForeignRegistration);
        }

        self.armed[slot].store(false, Ordering::Release);
        self.bindings.lock(|cell| {
            cell.borrow_mut()[slot] = None;
        });
        Ok(())
    }

    /// Check if `channel` is bound
    pub fn contains(&self, channel: ChannelId) -> bool {
        self.bindings
            .lock(|cell| cell.borrow().iter().flatten().any(|b| b.channel == channel))
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.lock(|cell| cell.borrow().iter().flatten().count())
    }

    /// Check if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every binding with its armed flag, under the lock
    pub(crate) fn for_each(&self, mut f: impl FnMut(ChannelId, &H, &AtomicBool)) {
        self.bindings.lock(|cell| {
            let slots = cell.borrow();
            for (slot, binding) in slots.iter().enumerate() {
                if let Some(binding) = binding {
                    f(binding.channel, &binding.target, &self.armed[slot]);
                }
            }
        });
    }
}

/// Proof of a binding, held by the instance that owns the channel
///
/// Arming marks the channel's next completion as a real end of stop;
/// completions seen while disarmed are dropped.
#[derive(Debug)]
pub struct Registration<'r> {
    channel: ChannelId,
    slot: usize,
    armed: &'r AtomicBool,
}

impl Registration<'_> {
    /// Bound channel
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}
