//! [`ExportSink`]: the external collaborator a concrete writer (CSV,
//! NetCDF, Parquet, ...) implements.

use crate::error::ExportError;
use crate::snapshot::FrozenSnapshot;

/// One output destination for frozen timestep snapshots.
///
/// An external collaborator (`spec.md` §6): the core ships no concrete
/// CSV/NetCDF/Parquet writer, only this seam. Each attached sink runs on
/// its own writer thread and sees every snapshot the facade dispatches
/// to it, independent of what any other sink does with the same
/// snapshot.
pub trait ExportSink: Send {
    /// Write one frozen snapshot. Called from this sink's own writer
    /// thread, never concurrently with another call to `write` or
    /// `flush` on the same sink.
    fn write(&mut self, snapshot: &FrozenSnapshot) -> Result<(), ExportError>;

    /// Flush and close. Called once, after the last `write`, when the
    /// facade is joined.
    fn flush(&mut self) -> Result<(), ExportError>;
}
