/// What one dispatch cycle did with a suborder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not running or not dispatchable, left untouched.
    Skipped,
    /// Retry budget used up, suspended and terminated.
    RetryExhausted,
    /// Another attempt holds the lock.
    Contended,
    /// Generation ran.
    Generated {
        /// Devices bound to the suborder and not released.
        produced: u32,
        /// Whether the Generate step reached its total.
        step_done: bool,
    },
}
