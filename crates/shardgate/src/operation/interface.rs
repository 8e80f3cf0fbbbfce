/// An operation sent to an external resource client.
///
/// The gate needs to know only three things about it: a name for
/// diagnostics, whether it mutates the backend (read-only pools reject those,
/// and statistics account reads and writes separately), and optionally a
/// normalised `action target` description for slow-operation reports.
pub trait Operation {
    /// Short command name, e.g. `GET` or `SELECT`.
    fn name(&self) -> &str;

    /// Returns `true` if the operation cannot modify the backend.
    fn is_read_only(&self) -> bool;

    /// Normalised action and target, e.g. `SELECT users`.
    fn describe(&self) -> Option<String> {
        None
    }
}
