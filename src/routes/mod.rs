mod feedback;
mod health_check;
mod login;
mod profile;
mod send_email;
mod signup;
mod users;

pub use feedback::{list_feedback, submit_feedback};
pub use health_check::health_check;
pub use login::login;
pub use profile::update_profile;
pub use send_email::send_trip_forecast;
pub use signup::signup;
pub use users::{delete_user, get_user, list_users, update_user};
