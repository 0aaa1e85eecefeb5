pub mod appointments;
pub mod booking;
pub mod civil_time;
pub mod email;
pub mod notification;
pub mod reconciler;
pub mod reminder;
pub mod scheduler;
pub mod slots;

pub use appointments::{AppointmentStore, TransitionOutcome};
pub use booking::{BookingError, BookingService};
pub use notification::NotificationService;
pub use reconciler::StatusReconciler;
pub use reminder::ReminderDispatcher;
pub use slots::SlotService;
