//! Attendance recording.
//!
//! The collaborator ports ([`EmployeeDirectory`], [`AttendanceStore`],
//! [`AuditSink`]) with in-memory implementations, the daily state machine,
//! and the [`AttendanceService`] that runs a request end to end.

mod audit;
mod resolver;
mod service;
mod state_machine;
mod store;

pub use audit::{AuditSink, MemoryAuditSink, TracingAuditSink};
pub use resolver::{EmployeeDirectory, LocationAssignment, MemoryDirectory, WorkLocationResolver};
pub use service::{AttendanceAction, AttendanceDecision, AttendanceService, CheckRequest};
pub use state_machine::{AttendanceStateMachine, SupervisorCorrection, TransitionInput};
pub use store::{AttendanceStore, MemoryAttendanceStore, RecordVersion};
