pub mod errors;
pub mod id;
pub mod notice;

pub use errors::{ConfigError, RouletteError};
pub use id::{new_correlation_id, new_id, UserId};
pub use notice::{Notice, NoticeKind};

pub type Result<T> = std::result::Result<T, RouletteError>;
