use std::collections::HashMap;

use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::{MenuClient, UserClient};
use crate::domain::{
    CustomerSummary, Identity, LineRequest, MenuItem, MenuQuery, Order, OrderCreate, OrderFilter,
    OrderLine, OrderStatus, OrderType, OrderView,
};
use crate::notify::{order_topic, Audience, Event, NotificationClient, NEW_ORDER};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};

/// What a customer submits when placing an order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub items: Vec<LineRequest>,
    pub order_type: OrderType,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

/// Client for interacting with the Order actor.
///
/// This client handles the orchestration around an order: lines are checked
/// against the menu before creation, reads are access-checked and resolved
/// into [`OrderView`]s, and state changes are published to the hub.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    user_client: UserClient,
    menu_client: MenuClient,
    notifier: NotificationClient,
    trust_client_prices: bool,
}

impl OrderClient {
    pub fn new(
        inner: ResourceClient<Order>,
        user_client: UserClient,
        menu_client: MenuClient,
        notifier: NotificationClient,
        trust_client_prices: bool,
    ) -> Self {
        Self {
            inner,
            user_client,
            menu_client,
            notifier,
            trust_client_prices,
        }
    }

    #[instrument(skip(self, identity, request), fields(customer = %identity.user_id, lines = request.items.len()))]
    pub async fn create_order(&self, identity: &Identity, request: PlaceOrder) -> Result<OrderView, OrderError> {
        info!("Processing create_order request");

        let mut lines = Vec::with_capacity(request.items.len());
        for line in request.items {
            let item = match self.menu_client.get_menu_item(line.menu_item.clone()).await {
                Ok(Some(item)) => item,
                Ok(None) => {
                    warn!(menu_item = %line.menu_item, "Menu item not found");
                    return Err(OrderError::InvalidMenuItem(line.menu_item));
                }
                Err(e) => {
                    error!(error = %e, "Menu lookup failed");
                    return Err(OrderError::ActorCommunicationError(e.to_string()));
                }
            };
            let price = if self.trust_client_prices { line.price } else { item.price };
            lines.push(OrderLine {
                menu_item: line.menu_item,
                name: item.name,
                quantity: line.quantity,
                price,
            });
        }

        let payload = OrderCreate {
            customer: identity.user_id.clone(),
            items: lines,
            order_type: request.order_type,
            delivery_address: request.delivery_address,
            notes: request.notes,
        };
        let order = self.inner.create(payload).await.map_err(OrderError::from)?;
        info!(order_id = %order.id, total = order.total_amount, "Order created");

        let view = self.settled_view(order).await;
        match serde_json::to_value(&view) {
            Ok(payload) => self.notify(Audience::Admins, Event::new(NEW_ORDER, payload)).await,
            Err(e) => warn!(error = %e, "Could not encode new-order event"),
        }
        Ok(view)
    }

    /// Moves an order to `status`. Administrators only.
    #[instrument(skip(self, identity), fields(actor = %identity.user_id))]
    pub async fn transition_status(
        &self,
        identity: &Identity,
        id: String,
        status: OrderStatus,
    ) -> Result<OrderView, OrderError> {
        debug!("Sending request");
        if !identity.is_admin() {
            warn!("Non-admin attempted a status change");
            return Err(OrderError::Forbidden("Admin access required".to_string()));
        }

        let order = match self.inner.perform_action(id, OrderAction::TransitionStatus(status)).await {
            Ok(OrderActionResult::TransitionStatus { previous, order }) => {
                info!(order_id = %order.id, from = %previous, to = %status, "Order status changed");
                order
            }
            Ok(_) => return Err(OrderError::ActorCommunicationError("Unexpected result".to_string())),
            Err(e) => return Err(OrderError::from(e)),
        };

        let audience = Audience::Order {
            order_id: order.id.clone(),
            customer_id: order.customer.clone(),
        };
        self.notify(audience, Event::new(order_topic(&order.id), json!({ "status": status })))
            .await;
        Ok(self.settled_view(order).await)
    }

    /// The stored record, if the caller owns it or is an administrator.
    #[instrument(skip(self, identity), fields(actor = %identity.user_id))]
    pub async fn get_order_record(&self, identity: &Identity, id: String) -> Result<Order, OrderError> {
        debug!("Sending request");
        let order = self
            .inner
            .get(id.clone())
            .await
            .map_err(OrderError::from)?
            .ok_or(OrderError::NotFound(id))?;
        if !identity.can_access(&order.customer) {
            warn!(order_id = %order.id, "Order read denied");
            return Err(OrderError::Forbidden("Not authorized to view this order".to_string()));
        }
        Ok(order)
    }

    pub async fn get_order(&self, identity: &Identity, id: String) -> Result<OrderView, OrderError> {
        let order = self.get_order_record(identity, id).await?;
        self.view(order).await
    }

    /// The caller's own orders, newest first.
    #[instrument(skip(self, identity), fields(customer = %identity.user_id))]
    pub async fn list_my_orders(&self, identity: &Identity) -> Result<Vec<OrderView>, OrderError> {
        debug!("Sending request");
        let customer = identity.user_id.clone();
        let orders = self
            .inner
            .list_where(move |order: &Order| order.customer == customer)
            .await
            .map_err(OrderError::from)?;
        self.views(newest_first(orders)).await
    }

    /// Every order matching `filter`, newest first. Administrators only.
    #[instrument(skip(self, identity), fields(actor = %identity.user_id))]
    pub async fn list_orders(&self, identity: &Identity, filter: OrderFilter) -> Result<Vec<OrderView>, OrderError> {
        debug!("Sending request");
        if !identity.is_admin() {
            return Err(OrderError::Forbidden("Admin access required".to_string()));
        }
        let status = filter.status;
        let mut orders = newest_first(
            self.inner
                .list_where(move |order: &Order| status.map_or(true, |s| order.status == s))
                .await
                .map_err(OrderError::from)?,
        );
        if let Some(limit) = filter.limit {
            orders.truncate(limit);
        }
        self.views(orders).await
    }

    /// Raw records for reporting. Administrators only.
    #[instrument(skip(self, identity))]
    pub async fn all_orders(&self, identity: &Identity) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        if !identity.is_admin() {
            return Err(OrderError::Forbidden("Admin access required".to_string()));
        }
        self.inner.list().await.map_err(OrderError::from)
    }

    /// Marks the order paid. The gateway reference is not verified.
    #[instrument(skip(self, identity), fields(actor = %identity.user_id))]
    pub async fn record_payment(
        &self,
        identity: &Identity,
        id: String,
        payment_id: String,
    ) -> Result<OrderView, OrderError> {
        let order = self.get_order_record(identity, id).await?;
        match self
            .inner
            .perform_action(order.id, OrderAction::RecordPayment { payment_id })
            .await
        {
            Ok(OrderActionResult::RecordPayment(order)) => {
                info!(order_id = %order.id, "Payment recorded");
                Ok(self.settled_view(order).await)
            }
            Ok(_) => Err(OrderError::ActorCommunicationError("Unexpected result".to_string())),
            Err(e) => Err(OrderError::from(e)),
        }
    }

    async fn notify(&self, audience: Audience, event: Event) {
        match self.notifier.publish(audience, event).await {
            Ok(delivered) => debug!(delivered, "Notification published"),
            Err(e) => warn!(error = %e, "Notification dropped"),
        }
    }

    async fn view(&self, order: Order) -> Result<OrderView, OrderError> {
        let mut views = self.views(vec![order]).await?;
        views
            .pop()
            .ok_or_else(|| OrderError::ActorCommunicationError("Empty view".to_string()))
    }

    /// View of an order that has already been written. A failed lookup must
    /// not surface as an error, so the view falls back to the stored lines.
    async fn settled_view(&self, order: Order) -> OrderView {
        match self.view(order.clone()).await {
            Ok(view) => view,
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Could not resolve order view");
                OrderView::resolve(order, None, |_| None)
            }
        }
    }

    /// Resolves customers and menu items for a batch of orders. Items or
    /// customers that no longer exist resolve to `None`.
    async fn views(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, OrderError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let menu: HashMap<String, MenuItem> = self
            .menu_client
            .list_menu(MenuQuery::everything())
            .await
            .map_err(|e| OrderError::ActorCommunicationError(e.to_string()))?
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        let mut customers: HashMap<String, Option<CustomerSummary>> = HashMap::new();
        for order in &orders {
            if customers.contains_key(&order.customer) {
                continue;
            }
            let summary = self
                .user_client
                .get_user(order.customer.clone())
                .await
                .map_err(|e| OrderError::ActorCommunicationError(e.to_string()))?
                .as_ref()
                .map(CustomerSummary::from);
            customers.insert(order.customer.clone(), summary);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let customer = customers.get(&order.customer).cloned().flatten();
                OrderView::resolve(order, customer, |id| menu.get(id).cloned())
            })
            .collect())
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::clients::Registration;
    use crate::domain::{Category, MenuItemCreate, PaymentStatus, User};
    use crate::images::DataUrlImageStore;
    use crate::notify::{NotificationHub, Subscription};
    use std::sync::Arc;
    use tokio::sync::mpsc::error::TryRecvError;

    struct Shop {
        orders: OrderClient,
        users: UserClient,
        menu: MenuClient,
        hub: NotificationClient,
    }

    fn start(trust_client_prices: bool) -> Shop {
        let next_id = || uuid::Uuid::new_v4().to_string();
        let (user_actor, user_resource) = ResourceActor::<User>::new(10, next_id);
        let (menu_actor, menu_resource) = ResourceActor::<MenuItem>::new(10, next_id);
        let (order_actor, order_resource) = ResourceActor::<Order>::new(10, next_id);
        let (hub_actor, hub) = NotificationHub::new(10, 8);
        tokio::spawn(user_actor.run());
        tokio::spawn(menu_actor.run());
        tokio::spawn(order_actor.run());
        tokio::spawn(hub_actor.run());

        let users = UserClient::new(user_resource);
        let menu = MenuClient::new(menu_resource, Arc::new(DataUrlImageStore::new(1024)));
        let orders = OrderClient::new(order_resource, users.clone(), menu.clone(), hub.clone(), trust_client_prices);
        Shop { orders, users, menu, hub }
    }

    impl Shop {
        async fn customer(&self, email: &str) -> Identity {
            let form = Registration {
                name: "Dana".into(),
                email: email.into(),
                password: "password".into(),
                phone: None,
                address: None,
            };
            self.users.register(form).await.unwrap().identity()
        }

        async fn admin(&self) -> Identity {
            self.users
                .ensure_admin("Owner", "owner@example.com", "adminpass")
                .await
                .unwrap()
                .identity()
        }

        async fn item(&self, name: &str, price: f64) -> MenuItem {
            let payload = MenuItemCreate {
                name: name.into(),
                description: String::new(),
                price,
                category: Category::HotDrinks,
                image: None,
                available: true,
                ingredients: vec![],
                nutritional_info: None,
            };
            self.menu.create_menu_item(payload, None).await.unwrap()
        }

        async fn subscribe(&self, identity: &Identity) -> Subscription {
            self.hub.connect(Some(identity.clone())).await.unwrap()
        }
    }

    fn pickup(lines: Vec<(&MenuItem, u32, f64)>) -> PlaceOrder {
        PlaceOrder {
            items: lines
                .into_iter()
                .map(|(item, quantity, price)| LineRequest { menu_item: item.id.clone(), quantity, price })
                .collect(),
            order_type: OrderType::Pickup,
            delivery_address: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_order_totals_and_notifies_admins_once() {
        let shop = start(true);
        let latte = shop.item("Latte", 120.0).await;
        let mocha = shop.item("Mocha", 150.0).await;
        let customer = shop.customer("dana@example.com").await;
        let admin = shop.admin().await;

        let mut admin_session = shop.subscribe(&admin).await;
        shop.hub.join_admin(admin_session.session).await.unwrap();
        let mut customer_session = shop.subscribe(&customer).await;

        let view = shop
            .orders
            .create_order(&customer, pickup(vec![(&latte, 2, 120.0), (&mocha, 1, 150.0)]))
            .await
            .unwrap();
        assert_eq!(view.total_amount, 390.0);
        assert_eq!(view.status, OrderStatus::Pending);
        assert_eq!(view.payment_status, PaymentStatus::Pending);
        assert_eq!(view.items[0].name, "Latte");
        assert_eq!(view.customer.as_ref().unwrap().email, "dana@example.com");

        let event = admin_session.events.recv().await.unwrap();
        assert_eq!(event.event, NEW_ORDER);
        assert_eq!(event.payload["id"], view.id.as_str());
        assert_eq!(admin_session.events.try_recv().unwrap_err(), TryRecvError::Empty);
        assert_eq!(customer_session.events.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn test_unknown_menu_item_rejected() {
        let shop = start(true);
        let customer = shop.customer("dana@example.com").await;
        let request = PlaceOrder {
            items: vec![LineRequest { menu_item: "ghost".into(), quantity: 1, price: 10.0 }],
            order_type: OrderType::Pickup,
            delivery_address: None,
            notes: None,
        };
        assert_eq!(
            shop.orders.create_order(&customer, request).await.unwrap_err(),
            OrderError::InvalidMenuItem("ghost".into())
        );
    }

    #[tokio::test]
    async fn test_catalog_prices_used_when_client_prices_untrusted() {
        let shop = start(false);
        let latte = shop.item("Latte", 120.0).await;
        let customer = shop.customer("dana@example.com").await;
        let view = shop
            .orders
            .create_order(&customer, pickup(vec![(&latte, 2, 1.0)]))
            .await
            .unwrap();
        assert_eq!(view.total_amount, 240.0);
    }

    #[tokio::test]
    async fn test_status_change_requires_admin_and_publishes_topic() {
        let shop = start(true);
        let latte = shop.item("Latte", 120.0).await;
        let customer = shop.customer("dana@example.com").await;
        let admin = shop.admin().await;
        let order = shop.orders.create_order(&customer, pickup(vec![(&latte, 1, 120.0)])).await.unwrap();
        let mut owner_session = shop.subscribe(&customer).await;

        assert!(matches!(
            shop.orders.transition_status(&customer, order.id.clone(), OrderStatus::Preparing).await,
            Err(OrderError::Forbidden(_))
        ));
        let unchanged = shop.orders.get_order(&customer, order.id.clone()).await.unwrap();
        assert_eq!(unchanged.status, OrderStatus::Pending);

        let view = shop
            .orders
            .transition_status(&admin, order.id.clone(), OrderStatus::Preparing)
            .await
            .unwrap();
        assert_eq!(view.status, OrderStatus::Preparing);

        let event = owner_session.events.recv().await.unwrap();
        assert_eq!(event.event, format!("order-{}", order.id));
        assert_eq!(event.payload, json!({ "status": "Preparing" }));
        assert_eq!(owner_session.events.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn test_illegal_transition_is_rejected() {
        let shop = start(true);
        let latte = shop.item("Latte", 120.0).await;
        let customer = shop.customer("dana@example.com").await;
        let admin = shop.admin().await;
        let order = shop.orders.create_order(&customer, pickup(vec![(&latte, 1, 120.0)])).await.unwrap();

        let err = shop
            .orders
            .transition_status(&admin, order.id.clone(), OrderStatus::Completed)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition { from: OrderStatus::Pending, to: OrderStatus::Completed }
        );
        assert_eq!(
            shop.orders.transition_status(&admin, "missing".into(), OrderStatus::Ready).await.unwrap_err(),
            OrderError::NotFound("missing".into())
        );
    }

    #[tokio::test]
    async fn test_reads_are_owner_or_admin_only() {
        let shop = start(true);
        let latte = shop.item("Latte", 120.0).await;
        let owner = shop.customer("dana@example.com").await;
        let other = shop.customer("eve@example.com").await;
        let admin = shop.admin().await;
        let order = shop.orders.create_order(&owner, pickup(vec![(&latte, 1, 120.0)])).await.unwrap();

        assert!(matches!(
            shop.orders.get_order(&other, order.id.clone()).await,
            Err(OrderError::Forbidden(_))
        ));
        let first = shop.orders.get_order(&owner, order.id.clone()).await.unwrap();
        let second = shop.orders.get_order(&admin, order.id.clone()).await.unwrap();
        assert_eq!(first, second);
        assert!(shop.orders.list_my_orders(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_listing_filters_and_limits() {
        let shop = start(true);
        let latte = shop.item("Latte", 120.0).await;
        let customer = shop.customer("dana@example.com").await;
        let admin = shop.admin().await;
        let first = shop.orders.create_order(&customer, pickup(vec![(&latte, 1, 120.0)])).await.unwrap();
        shop.orders.create_order(&customer, pickup(vec![(&latte, 2, 120.0)])).await.unwrap();
        shop.orders
            .transition_status(&admin, first.id.clone(), OrderStatus::Cancelled)
            .await
            .unwrap();

        let all = shop.orders.list_orders(&admin, OrderFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].created_at >= all[1].created_at);

        let cancelled = OrderFilter { status: Some(OrderStatus::Cancelled), limit: None };
        let only = shop.orders.list_orders(&admin, cancelled).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].id, first.id);

        let limited = OrderFilter { status: None, limit: Some(1) };
        assert_eq!(shop.orders.list_orders(&admin, limited).await.unwrap().len(), 1);
        assert_eq!(shop.orders.list_my_orders(&customer).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_record_payment_by_owner() {
        let shop = start(true);
        let latte = shop.item("Latte", 120.0).await;
        let customer = shop.customer("dana@example.com").await;
        let order = shop.orders.create_order(&customer, pickup(vec![(&latte, 1, 120.0)])).await.unwrap();

        let paid = shop
            .orders
            .record_payment(&customer, order.id.clone(), "pay_123".into())
            .await
            .unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Completed);
        assert_eq!(paid.payment_id.as_deref(), Some("pay_123"));
        assert!(shop.orders.all_orders(&customer).await.is_err());
        assert_eq!(shop.orders.all_orders(&shop.admin().await).await.unwrap().len(), 1);
    }
}
