pub mod callback;
pub mod handlers;
pub mod render;
pub mod telegram;
pub mod traits;
pub mod types;

pub use handlers::CarBot;
pub use telegram::TelegramClient;
pub use traits::ChatApi;
