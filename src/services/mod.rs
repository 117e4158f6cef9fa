pub mod health;
pub mod keep_alive;
pub mod supervisor;

pub use supervisor::Supervisor;
