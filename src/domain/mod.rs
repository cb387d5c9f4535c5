mod feedback;
mod password;
mod role;
mod user;
mod user_email;
mod user_name;
mod weather;

pub use feedback::{Feedback, NewFeedback};
pub use password::Password;
pub use role::Role;
pub use user::{NewUser, User, UserId, UserRecord};
pub use user_email::UserEmail;
pub use user_name::UserName;
pub use weather::{compose_forecast, Condition, MainReadings, WeatherEntry, WeatherReport};
