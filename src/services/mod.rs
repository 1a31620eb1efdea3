//! Services module - subprocess-facing business logic.
//!
//! Everything that touches an external process lives behind the
//! [`ProcessRunner`] seam defined here:
//!
//! - [`transport`]: the [`CommandRequest`]/[`ProcessOutput`] value types,
//!   the [`ProcessRunner`] trait, and the tokio-backed [`SystemRunner`]
//! - [`remote`]: ssh argument construction for the reachability probe and
//!   the pre-transfer remote hook
//! - [`transfer`]: the transfer tool's argument list, composed from all
//!   three configuration layers
//!
//! The request types are plain values and the builders are pure, so tests
//! assert on complete argument vectors and drive whole runs through a
//! recording fake without ssh or rsync installed.

pub mod remote;
pub mod transfer;
pub mod transport;

pub use remote::{remote_shell_command, HookRequest, ProbeRequest, SSH_PROGRAM};
pub use transfer::{TransferRequest, RSYNC_PROGRAM};
pub use transport::{CommandRequest, ProcessOutput, ProcessRunner, SystemRunner, TransportError};
