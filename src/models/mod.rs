pub mod admin;
pub mod appointment;
pub mod center;
pub mod notification;
pub mod slot;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::admin::{self, Entity as Admin};
    pub use super::appointment::{self, Entity as Appointment};
    pub use super::center::{self, Entity as Center};
    pub use super::notification::{self, Entity as Notification};
    pub use super::slot::{self, Entity as Slot};
}
