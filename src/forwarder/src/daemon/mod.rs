mod initialization;
mod shutdown;

pub use initialization::run;
pub use shutdown::cancel_on_shutdown_signal;
