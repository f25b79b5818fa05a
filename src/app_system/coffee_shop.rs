use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::actor_framework::ResourceActor;
use crate::auth::{AccessGate, TokenSigner};
use crate::clients::{MenuClient, OrderClient, UserClient};
use crate::config::Config;
use crate::domain::{MenuItem, Order, User};
use crate::http::AppState;
use crate::images::DataUrlImageStore;
use crate::notify::{NotificationClient, NotificationHub};
use crate::payment::PaymentGateway;
use crate::user_actor::UserError;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

fn next_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// The running application: every actor plus the clients wired over them.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct CoffeeShop {
    pub user_client: UserClient,
    pub menu_client: MenuClient,
    pub order_client: OrderClient,
    pub notifier: NotificationClient,
    pub gate: AccessGate,
    pub payments: PaymentGateway,
    handles: Vec<JoinHandle<()>>,
}

impl CoffeeShop {
    pub async fn start(config: &Config) -> Result<Self, UserError> {
        let capacity = config.mailbox_capacity;

        // 1. Collections
        let (user_actor, user_resource_client) = ResourceActor::<User>::new(capacity, next_id);
        let (menu_actor, menu_resource_client) = ResourceActor::<MenuItem>::new(capacity, next_id);
        let (order_actor, order_resource_client) = ResourceActor::<Order>::new(capacity, next_id);

        // 2. Notification hub
        let (hub, notifier) = NotificationHub::new(capacity, config.session_queue_capacity);

        let handles = vec![
            tokio::spawn(user_actor.run()),
            tokio::spawn(menu_actor.run()),
            tokio::spawn(order_actor.run()),
            tokio::spawn(hub.run()),
        ];

        // 3. Clients
        let user_client = UserClient::new(user_resource_client);
        let images = Arc::new(DataUrlImageStore::new(config.image_max_bytes));
        let menu_client = MenuClient::new(menu_resource_client, images);
        let order_client = OrderClient::new(
            order_resource_client,
            user_client.clone(),
            menu_client.clone(),
            notifier.clone(),
            config.trust_client_prices,
        );
        let gate = AccessGate::new(
            TokenSigner::new(config.token_secret.as_bytes(), config.token_ttl),
            user_client.clone(),
        );

        if let Some(admin) = &config.admin {
            let account = user_client
                .ensure_admin(&admin.name, &admin.email, &admin.password)
                .await?;
            info!(user_id = %account.id, "Administrator account ready");
        } else {
            warn!("No administrator configured; admin routes are unreachable");
        }

        info!(trust_client_prices = config.trust_client_prices, "Coffee shop started");
        Ok(Self {
            user_client,
            menu_client,
            order_client,
            notifier,
            gate,
            payments: PaymentGateway::new(config.payment_key_id.clone()),
            handles,
        })
    }

    pub fn state(&self) -> AppState {
        AppState {
            users: self.user_client.clone(),
            menu: self.menu_client.clone(),
            orders: self.order_client.clone(),
            notifier: self.notifier.clone(),
            gate: self.gate.clone(),
            payments: self.payments.clone(),
        }
    }

    /// Drops this system's clients and waits for the actors to drain.
    /// Actors stop once every client clone is gone, so any `AppState` handed
    /// out must be dropped first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        let Self {
            user_client,
            menu_client,
            order_client,
            notifier,
            gate,
            handles,
            ..
        } = self;
        match notifier.session_count().await {
            Ok(open) => info!(open_sessions = open, "Closing notification hub"),
            Err(e) => warn!(error = %e, "Notification hub already stopped"),
        }
        drop((order_client, gate, menu_client, user_client, notifier));

        for handle in handles {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Actor task failed: {:?}", e);
                    return Err(format!("Actor task failed: {:?}", e));
                }
                Err(_) => {
                    warn!("Actor did not stop in time");
                    return Err("Actor did not stop in time".to_string());
                }
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
