//! # Order Client
//!
//! Provides a high-level API for interacting with the `Order` actor.
//! It wraps a `ResourceClient<Order>` and exposes order placement, status recording and the
//! read side the tracking core consumes through [`TrackingBackend`].
use crate::backend::{BackendError, TrackingBackend};
use crate::directory::{self, OrderFilter, PageRequest, PagedResult};
use crate::model::{NewOrder, Order, OrderId, OrderSnapshot, OrderSummary, StatusEvent, StatusUpdate};
use crate::order_actor::{OrderAction, OrderError};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

/// Client for interacting with the Order actor.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    max_page_size: u32,
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.downcast_entity::<OrderError>() {
            Ok(order_error) => order_error,
            Err(FrameworkError::NotFound(id)) => OrderError::NotFound(id.into()),
            Err(other) => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>, max_page_size: u32) -> Self {
        Self {
            inner,
            max_page_size,
        }
    }

    #[instrument(skip(self, params), fields(recipient = %params.recipient))]
    pub async fn place_order(&self, params: NewOrder) -> Result<OrderId, OrderError> {
        debug!(?params, "place_order called");
        let id = self.inner.create(params).await.map_err(Self::map_error)?;
        info!(order_id = %id, "Order placed");
        Ok(id)
    }

    /// Appends the next milestone to an order's timeline.
    ///
    /// Returns the stored event, carrying the sequence the actor assigned.
    #[instrument(skip(self))]
    pub async fn record_status(
        &self,
        order_id: &OrderId,
        update: StatusUpdate,
    ) -> Result<StatusEvent, OrderError> {
        debug!("Sending request");
        self.inner
            .perform_action(order_id.clone(), OrderAction::RecordStatus(update))
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<StatusEvent, OrderError> {
        info!("Cancelling order");
        self.inner
            .perform_action(order_id.clone(), OrderAction::Cancel)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn order_snapshot(&self, order_id: &OrderId) -> Result<OrderSnapshot, OrderError> {
        self.get(order_id.clone())
            .await?
            .map(|order| order.snapshot())
            .ok_or_else(|| OrderError::NotFound(order_id.clone()))
    }

    /// Events with a sequence strictly greater than `since`, ascending.
    #[instrument(skip(self))]
    pub async fn events(
        &self,
        order_id: &OrderId,
        since: u64,
    ) -> Result<Vec<StatusEvent>, OrderError> {
        self.get(order_id.clone())
            .await?
            .map(|order| order.events_since(since))
            .ok_or_else(|| OrderError::NotFound(order_id.clone()))
    }

    /// Filtered, sorted and paginated order listing.
    ///
    /// The page is validated before the actor is asked for anything.
    #[instrument(skip(self))]
    pub async fn query_orders(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<PagedResult<OrderSummary>, OrderError> {
        page.validate(self.max_page_size)?;
        let rows = self
            .list(filter)
            .await?
            .iter()
            .map(Order::summary)
            .collect();
        let result = directory::paginate(rows, page, self.max_page_size)?;
        debug!(
            total = result.total_count,
            returned = result.items.len(),
            "Query answered"
        );
        Ok(result)
    }

    /// Receives every status event the actor accepts from now on, for all orders.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.inner.subscribe()
    }
}

impl From<OrderError> for BackendError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(id) => BackendError::NotFound(id),
            OrderError::Directory(e) => BackendError::InvalidQuery(e.to_string()),
            other => BackendError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl TrackingBackend for OrderClient {
    async fn snapshot(&self, order_id: &OrderId) -> Result<OrderSnapshot, BackendError> {
        Ok(self.order_snapshot(order_id).await?)
    }

    async fn events_since(
        &self,
        order_id: &OrderId,
        since: u64,
    ) -> Result<Vec<StatusEvent>, BackendError> {
        Ok(self.events(order_id, since).await?)
    }

    async fn query(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<PagedResult<OrderSummary>, BackendError> {
        Ok(self.query_orders(filter, page).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::TimelineError;
    use crate::model::OrderStatus;
    use actor_framework::mock::{create_mock_client, expect_action, expect_create, MockClient};
    use actor_framework::ActorEntity;
    use chrono::{TimeZone, Utc};

    fn new_order(recipient: &str, day: u32) -> NewOrder {
        NewOrder {
            recipient: recipient.to_string(),
            recipient_phone: "+44 20 7946 0000".to_string(),
            destination_address: "14 Quay Street, Bristol".to_string(),
            package_description: "Spare parts".to_string(),
            weight_kg: 1.2,
            declared_value: 30.0,
            special_instructions: None,
            estimated_delivery: None,
            created_at: Some(Utc.with_ymd_and_hms(2025, 8, day, 9, 0, 0).unwrap()),
        }
    }

    fn order(id: &str, recipient: &str, day: u32) -> Order {
        Order::from_create_params(id.into(), new_order(recipient, day)).unwrap()
    }

    #[tokio::test]
    async fn test_place_order_returns_assigned_id() {
        let (client, mut receiver) = create_mock_client::<Order>(10);
        let order_client = OrderClient::new(client, 100);

        let task =
            tokio::spawn(async move { order_client.place_order(new_order("Tom Reyes", 4)).await });

        let (params, responder) = expect_create(&mut receiver)
            .await
            .expect("Expected Create request");
        assert_eq!(params.recipient, "Tom Reyes");
        responder.send(Ok("ORD1200".into())).unwrap();

        assert_eq!(task.await.unwrap().unwrap(), OrderId::from("ORD1200"));
    }

    #[tokio::test]
    async fn test_record_status_recovers_timeline_error() {
        let (client, mut receiver) = create_mock_client::<Order>(10);
        let order_client = OrderClient::new(client, 100);

        let task = tokio::spawn(async move {
            order_client
                .record_status(&"ORD7".into(), StatusUpdate::new(OrderStatus::Delivered))
                .await
        });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, OrderId::from("ORD7"));
        assert!(matches!(
            action,
            OrderAction::RecordStatus(StatusUpdate {
                status: OrderStatus::Delivered,
                ..
            })
        ));

        let rejection = TimelineError::InvalidTransition {
            order_id: "ORD7".into(),
            from: OrderStatus::Confirmed,
            to: OrderStatus::Delivered,
            sequence: 2,
        };
        responder
            .send(Err(FrameworkError::EntityError(Box::new(
                OrderError::Timeline(rejection.clone()),
            ))))
            .unwrap();

        assert_eq!(
            task.await.unwrap().unwrap_err(),
            OrderError::Timeline(rejection)
        );
    }

    #[tokio::test]
    async fn test_missing_order_maps_to_not_found() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_get("ORD404".into()).return_ok(None);
        mock.expect_action("ORD404".into())
            .return_err(FrameworkError::NotFound("ORD404".into()));
        mock.expect_get("ORD404".into())
            .return_err(FrameworkError::ActorClosed);

        let client = OrderClient::new(mock.client(), 100);
        let id = OrderId::from("ORD404");

        assert_eq!(
            client.order_snapshot(&id).await.unwrap_err(),
            OrderError::NotFound(id.clone())
        );
        assert_eq!(
            client.cancel_order(&id).await.unwrap_err(),
            OrderError::NotFound(id.clone())
        );
        assert!(matches!(
            client.events(&id, 0).await.unwrap_err(),
            OrderError::ActorCommunicationError(_)
        ));
        mock.verify();
    }

    #[tokio::test]
    async fn test_query_orders_sorts_and_paginates() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_list().return_ok(vec![
            order("ORD1", "Ada", 2),
            order("ORD3", "Cyd", 5),
            order("ORD2", "Bea", 5),
        ]);

        let client = OrderClient::new(mock.client(), 100);
        let page = client
            .query_orders(OrderFilter::all(), PageRequest::new(1, 2))
            .await
            .unwrap();

        let ids: Vec<&str> = page.items.iter().map(|row| row.order_id.as_str()).collect();
        assert_eq!(ids, vec!["ORD2", "ORD3"]);
        assert_eq!(page.total_count, 3);
        assert!(page.has_next());
        mock.verify();
    }

    #[tokio::test]
    async fn test_invalid_page_never_reaches_actor() {
        let mock = MockClient::<Order>::new();
        let client = OrderClient::new(mock.client(), 25);

        let err = client
            .query(OrderFilter::all(), PageRequest::new(1, 26))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidQuery(_)));
        mock.verify();
    }

    #[tokio::test]
    async fn test_backend_events_since() {
        let mut mock = MockClient::<Order>::new();
        let mut stored = order("ORD9", "Noor", 1);
        for status in [OrderStatus::PickedUp, OrderStatus::InTransit] {
            stored
                .handle_action(OrderAction::RecordStatus(StatusUpdate::new(status)), &())
                .await
                .unwrap();
        }
        mock.expect_get("ORD9".into()).return_ok(Some(stored));

        let client = OrderClient::new(mock.client(), 100);
        let events = client.events_since(&"ORD9".into(), 1).await.unwrap();
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![2, 3]);
        mock.verify();
    }
}
