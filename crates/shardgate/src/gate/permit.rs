use crate::gate::AdmissionGate;

/// A permit held against an [`AdmissionGate`].
///
/// The permit is returned to its gate exactly once: when the guard is
/// dropped, or earlier through [`Permit::release`].
#[must_use = "dropping a permit releases it immediately"]
#[derive(Debug)]
pub struct Permit<'a> {
    gate: &'a AdmissionGate,
}

impl<'a> Permit<'a> {
    pub(crate) const fn new(gate: &'a AdmissionGate) -> Self {
        Self { gate }
    }

    /// The gate this permit was taken from.
    pub const fn gate(&self) -> &'a AdmissionGate {
        self.gate
    }

    /// Returns the permit to the gate now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
