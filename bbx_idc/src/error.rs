//! IDC error taxonomy. Cross-core errors are never propagated onto the
//! audio path (spec §7): callers log these and surface a generic failure
//! to the host, or a catastrophic notification for a core crash.

pub type Result<T> = core::result::Result<T, IdcError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdcError {
    #[error("no core with that id is registered on this fabric")]
    UnknownCore,

    #[error("a BLOCKING send did not complete within IDC_TIMEOUT")]
    Timeout,

    #[error("a POWER_UP send's target did not report booted within the bound")]
    BootTimeout,
}
