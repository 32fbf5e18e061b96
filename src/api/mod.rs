mod identity;
mod routes;

pub use identity::{CurrentUser, BACK_OFFICE_ROLE, ROLE_HEADER, USER_HEADER};
pub use routes::{app_data, configure, AppState};
