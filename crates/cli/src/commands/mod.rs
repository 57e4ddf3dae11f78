//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod order;

use std::sync::Arc;

use retailcloud_client::api::{
    ApiClient, AuthClient, CartClient, NotificationClient, OrdersClient, PaymentClient,
};
use retailcloud_client::cart::CartState;
use retailcloud_client::checkout::CheckoutOrchestrator;
use retailcloud_client::session::SessionStore;
use retailcloud_client::storage::FileStorage;
use retailcloud_client::{Config, ConfigError};

/// Wired-up client components shared by every command.
pub struct App {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub cart: Arc<CartState>,
    pub checkout: Arc<CheckoutOrchestrator>,
}

impl App {
    /// Load configuration and assemble the client components.
    ///
    /// Restores any persisted session before the command runs, mirroring a
    /// frontend's process-start behavior.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the environment is incomplete.
    pub fn init() -> Result<Self, ConfigError> {
        let config = Config::from_env()?;

        let api = ApiClient::new(&config.api_url);
        let storage = Arc::new(FileStorage::open(&config.session_file));
        let notifications = Arc::new(NotificationClient::new(api.clone()));

        let session = Arc::new(SessionStore::new(
            Arc::new(AuthClient::new(api.clone())),
            notifications.clone(),
            storage,
        ));
        session.restore_from_storage();

        let cart = Arc::new(CartState::new(Arc::new(CartClient::new(api.clone()))));

        let checkout = Arc::new(CheckoutOrchestrator::new(
            Arc::new(OrdersClient::new(api.clone())),
            Arc::new(PaymentClient::new(api)),
            notifications,
            session.clone(),
            cart.clone(),
            config.fallback_email.clone(),
        ));

        Ok(Self {
            config,
            session,
            cart,
            checkout,
        })
    }
}
