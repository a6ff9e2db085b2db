pub mod guard;
pub mod handlers;
pub mod password;
pub mod session;

pub use guard::{require_admin, Access, Admin, ADMIN_USER_ID};
pub use session::{Identity, SessionManager};
