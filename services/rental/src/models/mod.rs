//! Domain models for the rental service

pub mod catalog;
pub mod notice;
pub mod notification;
pub mod payment_method;
pub mod reservation;
pub mod user;

pub use catalog::{Car, Hotel, License, Location, NewLicense};
pub use notice::{Notice, NoticeInput};
pub use notification::{NewNotification, Notification, NotificationType};
pub use payment_method::{NewPaymentMethod, PaymentMethod};
pub use reservation::{NewReservation, Reservation, ReservationStatus};
pub use user::{NewUser, UpdateProfile, User};
