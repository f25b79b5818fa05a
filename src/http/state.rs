use crate::auth::AccessGate;
use crate::clients::{MenuClient, OrderClient, UserClient};
use crate::notify::NotificationClient;
use crate::payment::PaymentGateway;

/// Handles shared by every request handler. All fields are cheap clones of
/// actor clients.
#[derive(Clone)]
pub struct AppState {
    pub users: UserClient,
    pub menu: MenuClient,
    pub orders: OrderClient,
    pub notifier: NotificationClient,
    pub gate: AccessGate,
    pub payments: PaymentGateway,
}
