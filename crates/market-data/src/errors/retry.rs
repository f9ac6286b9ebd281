/// Classification for retry policy.
///
/// The transformation core never retries. The class is surfaced so the
/// collector (or whichever caller owns the vendor connection) can decide.
///
/// | Class | Meaning |
/// |-------|---------|
/// | `Never` | Terminal for this request |
/// | `WithBackoff` | Transient, may succeed after waiting |
/// | `NextProvider` | This vendor cannot serve it, another one might |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Bad symbol, malformed expiration or validation failure.
    Never,

    /// Rate limiting (429) or timeout.
    WithBackoff,

    /// Vendor-side failure or missing capability.
    NextProvider,
}
