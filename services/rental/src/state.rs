//! Shared application state

use sqlx::PgPool;

use common::cache::RedisPool;

use crate::jwt::JwtService;
use crate::notifier::NotificationService;
use crate::oauth::KakaoOAuthClient;
use crate::payments::KakaoPayService;
use crate::repositories::{
    CatalogRepository, NoticeRepository, NotificationRepository, PaymentMethodRepository,
    ReservationRepository, UserRepository,
};
use crate::stats::StatsService;
use crate::ws::NotificationHub;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_pool: RedisPool,
    pub jwt: JwtService,
    pub oauth: KakaoOAuthClient,
    pub users: UserRepository,
    pub reservations: ReservationRepository,
    pub notifications: NotificationRepository,
    pub catalog: CatalogRepository,
    pub payment_methods: PaymentMethodRepository,
    pub notices: NoticeRepository,
    pub notifier: NotificationService,
    pub payments: KakaoPayService,
    pub hub: NotificationHub,
    pub stats: StatsService,
}
