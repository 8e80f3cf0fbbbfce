use parking_lot::{Condvar, Mutex};

/// Token pool limiting how many fan-out task bodies run at once.
///
/// Scoped to a single [`FanOut::run`] call and never shared with an
/// [`AdmissionGate`], so fan-out throttling and pool admission are
/// independent.
///
/// [`FanOut::run`]: crate::FanOut::run
/// [`AdmissionGate`]: crate::AdmissionGate
pub(crate) struct Throttle {
    tokens: Mutex<usize>,
    returned: Condvar,
}

impl Throttle {
    pub(crate) const fn new(tokens: usize) -> Self {
        Self {
            tokens: Mutex::new(tokens),
            returned: Condvar::new(),
        }
    }

    /// Blocks until a token is free and holds it until the guard drops.
    pub(crate) fn take(&self) -> Token<'_> {
        let mut tokens = self.tokens.lock();
        while *tokens == 0 {
            self.returned.wait(&mut tokens);
        }
        *tokens -= 1;
        Token { throttle: self }
    }

    fn give_back(&self) {
        *self.tokens.lock() += 1;
        self.returned.notify_one();
    }
}

pub(crate) struct Token<'a> {
    throttle: &'a Throttle,
}

impl Drop for Token<'_> {
    fn drop(&mut self) {
        self.throttle.give_back();
    }
}
