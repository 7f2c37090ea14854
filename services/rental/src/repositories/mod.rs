//! Database repositories for the rental service

pub mod catalog;
pub mod notice;
pub mod notification;
pub mod payment_method;
pub mod reservation;
pub mod user;

pub use catalog::CatalogRepository;
pub use notice::NoticeRepository;
pub use notification::NotificationRepository;
pub use payment_method::PaymentMethodRepository;
pub use reservation::ReservationRepository;
pub use user::UserRepository;
