//! [`ActorEntity`] implementation for [`Order`].
//!
//! Placement validates the payload and opens the timeline with `Confirmed` at sequence 1.
//! Recording a status builds the next event and merges it through the same
//! [`Timeline::apply`](crate::aggregator::Timeline::apply) the tracking side uses, so the
//! backend can never store a timeline a client would reject. Every accepted event is queued for
//! the change feed.

use super::actions::OrderAction;
use super::error::OrderError;
use crate::aggregator::Timeline;
use crate::directory::OrderFilter;
use crate::model::{NewOrder, Order, OrderId, OrderStatus, StatusEvent, StatusUpdate};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = NewOrder;
    type Action = OrderAction;
    type ActionResult = StatusEvent;
    type Filter = OrderFilter;
    type Event = StatusEvent;
    type Context = ();
    type Error = OrderError;

    fn from_create_params(id: OrderId, params: NewOrder) -> Result<Self, OrderError> {
        validate(&params)?;

        let created_at = params.created_at.unwrap_or_else(Utc::now);
        let confirmed = StatusEvent::new(id.clone(), 1, OrderStatus::Confirmed).at(created_at);
        let timeline = Timeline::from_events(id.clone(), [confirmed.clone()])?;

        Ok(Self {
            id,
            created_at,
            recipient: params.recipient.trim().to_string(),
            recipient_phone: params.recipient_phone.trim().to_string(),
            destination_address: params.destination_address.trim().to_string(),
            package_description: params.package_description.trim().to_string(),
            weight_kg: params.weight_kg,
            declared_value: params.declared_value,
            special_instructions: params
                .special_instructions
                .filter(|text| !text.trim().is_empty()),
            estimated_delivery: params.estimated_delivery,
            timeline,
            unpublished: vec![confirmed],
        })
    }

    /// Handles custom actions for the Order entity.
    ///
    /// # Actions
    /// - `RecordStatus`: appends the update as the next event
    /// - `Cancel`: appends `Cancelled`
    async fn handle_action(
        &mut self,
        action: OrderAction,
        _ctx: &Self::Context,
    ) -> Result<StatusEvent, OrderError> {
        let update = match action {
            OrderAction::RecordStatus(update) => update,
            OrderAction::Cancel => StatusUpdate::new(OrderStatus::Cancelled).at(Utc::now()),
        };

        let mut event = StatusEvent::new(
            self.id.clone(),
            self.timeline.max_sequence() + 1,
            update.status,
        );
        event.occurred_at = update.occurred_at;
        event.location = update.location;

        self.timeline.apply(event.clone())?;
        debug!(order_id = %self.id, sequence = event.sequence, status = ?event.status, "Status recorded");
        self.unpublished.push(event.clone());
        Ok(event)
    }

    fn matches(&self, filter: &OrderFilter) -> bool {
        filter.matches(&self.summary())
    }

    fn take_events(&mut self) -> Vec<StatusEvent> {
        std::mem::take(&mut self.unpublished)
    }
}

fn validate(params: &NewOrder) -> Result<(), OrderError> {
    let required = [
        ("recipient", &params.recipient),
        ("recipient phone", &params.recipient_phone),
        ("destination address", &params.destination_address),
        ("package description", &params.package_description),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(OrderError::Validation(format!("{field} is required")));
    }
    if !(params.weight_kg > 0.0) {
        return Err(OrderError::Validation("weight must be positive".to_string()));
    }
    if !(params.declared_value >= 0.0) {
        return Err(OrderError::Validation(
            "declared value must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::TimelineError;

    fn new_order() -> NewOrder {
        NewOrder {
            recipient: "  Ines Duarte ".to_string(),
            recipient_phone: "+351 912 000 111".to_string(),
            destination_address: "Rua das Flores 12, Porto".to_string(),
            package_description: "Ceramic tiles".to_string(),
            weight_kg: 4.5,
            declared_value: 120.0,
            special_instructions: Some(" ".to_string()),
            estimated_delivery: None,
            created_at: None,
        }
    }

    #[test]
    fn placement_opens_confirmed_timeline() {
        let mut order = Order::from_create_params("ORD1".into(), new_order()).unwrap();
        assert_eq!(order.recipient, "Ines Duarte");
        assert_eq!(order.special_instructions, None);
        assert_eq!(order.current_status(), OrderStatus::Confirmed);
        assert_eq!(order.timeline.max_sequence(), 1);

        let events = order.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sequence, 1);
        assert!(order.take_events().is_empty());
    }

    #[test]
    fn placement_validation() {
        let cases: Vec<(fn(&mut NewOrder), &str)> = vec![
            (|o| o.recipient = " ".into(), "recipient"),
            (|o| o.recipient_phone.clear(), "recipient phone"),
            (|o| o.destination_address.clear(), "destination address"),
            (|o| o.package_description = "\t".into(), "package description"),
            (|o| o.weight_kg = 0.0, "weight"),
            (|o| o.weight_kg = f64::NAN, "weight"),
            (|o| o.declared_value = -1.0, "declared value"),
        ];
        for (mutate, field) in cases {
            let mut params = new_order();
            mutate(&mut params);
            match Order::from_create_params("ORD1".into(), params) {
                Err(OrderError::Validation(msg)) => assert!(msg.contains(field), "{msg}"),
                other => panic!("expected validation error for {field}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn record_status_assigns_next_sequence() {
        let mut order = Order::from_create_params("ORD1".into(), new_order()).unwrap();
        order.take_events();

        let event = order
            .handle_action(
                OrderAction::RecordStatus(
                    StatusUpdate::new(OrderStatus::PickedUp).located("Porto Depot"),
                ),
                &(),
            )
            .await
            .unwrap();
        assert_eq!(event.sequence, 2);
        assert_eq!(event.location.as_deref(), Some("Porto Depot"));
        assert_eq!(order.take_events(), vec![event]);
    }

    #[tokio::test]
    async fn rejected_status_publishes_nothing() {
        let mut order = Order::from_create_params("ORD1".into(), new_order()).unwrap();
        order.take_events();

        let err = order
            .handle_action(
                OrderAction::RecordStatus(StatusUpdate::new(OrderStatus::Delivered)),
                &(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::Timeline(TimelineError::InvalidTransition { .. })
        ));
        assert!(order.take_events().is_empty());
        assert_eq!(order.timeline.len(), 1);
    }

    #[tokio::test]
    async fn cancel_after_delivery_is_rejected() {
        let mut order = Order::from_create_params("ORD1".into(), new_order()).unwrap();
        for status in [
            OrderStatus::PickedUp,
            OrderStatus::InTransit,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            order
                .handle_action(OrderAction::RecordStatus(StatusUpdate::new(status)), &())
                .await
                .unwrap();
        }

        let err = order.handle_action(OrderAction::Cancel, &()).await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::Timeline(TimelineError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Cancelled,
                ..
            })
        ));
    }
}
