//! Background worker for network and storage side effects.
//!
//! The event loop posts [`WorkerMessage`]s and receives [`WorkerResponse`]s
//! over a tokio channel. The worker carries distributed tracing context from
//! the event that posted a message into the tasks it spawns.
//!
//! # Architecture
//!
//! - `messages`: Request/response protocol types with trace context propagation
//! - `handler`: Worker implementation and message dispatch

pub mod handler;
pub mod messages;

pub use handler::RentAdminWorker;
pub use messages::{TraceContext, WorkerMessage, WorkerResponse};
