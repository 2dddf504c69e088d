// Process management for pkos
pub mod context;
pub mod dispatch;
pub mod pcb;
pub mod scheduler;
pub mod table;

pub use context::{ExecutionContext, GPR_COUNT};
pub use pcb::{Pid, ProcessControlBlock, ProcessError, ProcessState};
pub use scheduler::{age_all, select_next};
pub use table::ProcessTable;
