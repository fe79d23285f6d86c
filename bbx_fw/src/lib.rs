//! Integration layer (spec §5-§8): ties the scheduler, IPC, IDC, and
//! platform facade crates into one per-core runtime, the boot sequence
//! that brings one up, and the fatal-error path that tears one down.

pub mod boot;
pub mod core_runtime;
pub mod panic;
pub mod topology_file;

pub use boot::{boot_core, DEFAULT_MAILBOX_CAPACITY};
pub use core_runtime::CoreRuntime;
pub use panic::{record_and_park, record_exception, ExceptionRecord};
pub use topology_file::{TopologyFile, TopologyFileError};
