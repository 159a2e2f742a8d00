pub mod enums;

mod achievement;
mod admin;
mod appointment;
mod article;
mod calendar;
mod notification;
mod patient;
mod prosthesis;
mod rehabilitation;
mod service_request;
mod task;
mod user;

pub use achievement::*;
pub use admin::*;
pub use appointment::*;
pub use article::*;
pub use calendar::*;
pub use notification::*;
pub use patient::*;
pub use prosthesis::*;
pub use rehabilitation::*;
pub use service_request::*;
pub use task::*;
pub use user::*;
