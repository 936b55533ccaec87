mod check;
mod hash;
mod publish;
mod status;

pub use check::cmd_check;
pub use hash::cmd_hash;
pub use publish::{PublishArgs, cmd_publish};
pub use status::cmd_status;
