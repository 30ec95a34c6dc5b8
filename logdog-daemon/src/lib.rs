//! logdog daemon: handler supervisors, event dispatch, fleet monitor, lifecycle.

pub mod dispatch;
mod error;
pub mod history;
pub mod monitor;
mod runtime;
pub mod signals;
pub mod supervisor;

pub use dispatch::{DispatchSummary, Dispatcher};
pub use error::DaemonError;
pub use history::HistoryWindow;
pub use monitor::Fleet;
pub use runtime::{init_tracing, run, run_until, start_blocking, RuntimeOptions};
pub use supervisor::{Supervisor, SupervisorExit};
