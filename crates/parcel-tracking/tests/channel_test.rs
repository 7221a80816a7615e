mod common;

use common::{events, FakeBackend, ScriptedTransport};
use parcel_tracking::aggregator::{IngestOutcome, TimelineAggregator};
use parcel_tracking::channel::{ChannelState, ChannelUpdate, LiveUpdateChannel, Subscription};
use parcel_tracking::config::ChannelConfig;
use parcel_tracking::model::{OrderId, OrderStatus, StatusEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use OrderStatus::*;

fn channel_config() -> ChannelConfig {
    ChannelConfig {
        backoff_base_ms: 100,
        backoff_max_ms: 1_000,
        max_reconnect_attempts: 3,
        update_buffer: 8,
    }
}

async fn next_event(subscription: &mut Subscription) -> StatusEvent {
    match subscription.next().await {
        Some(ChannelUpdate::Event(event)) => event,
        other => panic!("expected an event, got {other:?}"),
    }
}

/// The connection drops right after sequence 4. The reconnect backfills from 4, and neither the
/// backfill nor the replaying transport gets anything at or below 4 applied twice.
#[tokio::test(start_paused = true)]
async fn reconnect_backfills_from_last_delivered_sequence() {
    let backend = Arc::new(FakeBackend::new("ORD1", &[Confirmed, PickedUp]));
    let transport = Arc::new(ScriptedTransport::default());
    let first = transport.open_feed();
    let channel = LiveUpdateChannel::new(transport.clone(), backend.clone(), channel_config());

    let mut aggregator = TimelineAggregator::new("ORD1", 8);
    for event in backend.stored() {
        aggregator.ingest(event).unwrap();
    }
    let mut subscription = channel.subscribe(HashMap::from([(OrderId::from("ORD1"), 2)]));

    backend.record(&[InTransit, OutForDelivery]);
    for event in events("ORD1", 3, &[InTransit, OutForDelivery]) {
        first.send(Ok(event)).unwrap();
    }
    for expected in [3, 4] {
        let event = next_event(&mut subscription).await;
        assert_eq!(event.sequence, expected);
        assert_eq!(
            aggregator.ingest(event).unwrap(),
            IngestOutcome::Applied { count: 1 }
        );
    }

    // Connection lost; another milestone lands while disconnected.
    let second = transport.open_feed();
    drop(first);
    backend.record(&[Delivered]);

    let event = next_event(&mut subscription).await;
    assert_eq!(event.sequence, 5);
    aggregator.ingest(event).unwrap();

    // The new connection replays what it has buffered, including old sequences.
    for event in events("ORD1", 3, &[InTransit, OutForDelivery]) {
        second.send(Ok(event)).unwrap();
    }
    second
        .send(Ok(StatusEvent::new("ORD1", 5, Delivered)))
        .unwrap();
    second
        .send(Ok(StatusEvent::new("ORD9", 1, Confirmed)))
        .unwrap();
    drop(second);

    assert_eq!(
        backend.backfills(),
        vec![
            HashMap::from([(OrderId::from("ORD1"), 2)]),
            HashMap::from([(OrderId::from("ORD1"), 4)]),
        ]
    );
    assert_eq!(aggregator.timeline().max_sequence(), 5);
    assert_eq!(aggregator.timeline().current_status(), Some(Delivered));

    // Nothing else was forwarded; the next thing the subscriber sees is the drop to degraded.
    assert_eq!(
        subscription.next().await,
        Some(ChannelUpdate::Degraded { attempts: 3 })
    );
    assert_eq!(subscription.state(), ChannelState::Degraded);
}

#[tokio::test(start_paused = true)]
async fn one_connection_serves_several_orders() {
    let backend = Arc::new(FakeBackend::new("ORD1", &[Confirmed]));
    let transport = Arc::new(ScriptedTransport::default());
    let feed = transport.open_feed();
    let channel = LiveUpdateChannel::new(transport.clone(), backend.clone(), channel_config());

    let mut subscription = channel.subscribe(HashMap::from([
        (OrderId::from("ORD1"), 1),
        (OrderId::from("ORD2"), 3),
    ]));

    feed.send(Ok(StatusEvent::new("ORD2", 4, OutForDelivery))).unwrap();
    feed.send(Ok(StatusEvent::new("ORD1", 2, PickedUp))).unwrap();
    feed.send(Ok(StatusEvent::new("ORD2", 3, InTransit))).unwrap();

    let first = next_event(&mut subscription).await;
    let second = next_event(&mut subscription).await;
    assert_eq!((first.order_id.as_str(), first.sequence), ("ORD2", 4));
    assert_eq!((second.order_id.as_str(), second.sequence), ("ORD1", 2));

    assert_eq!(transport.connects(), 1);
    let backfill = backend.backfills().pop().unwrap();
    assert_eq!(backfill.len(), 2, "one batched backfill covers every order");

    subscription.cancel();
    assert_eq!(subscription.next().await, None);
    assert_eq!(subscription.state(), ChannelState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn parent_cancel_reaches_the_link_directly() {
    let backend = Arc::new(FakeBackend::new("ORD1", &[Confirmed]));
    let transport = Arc::new(ScriptedTransport::default());
    let feed = transport.open_feed();
    let channel = LiveUpdateChannel::new(transport.clone(), backend.clone(), channel_config());

    let parent = CancellationToken::new();
    let mut subscription =
        channel.subscribe_within(HashMap::from([(OrderId::from("ORD1"), 1)]), &parent);
    feed.send(Ok(StatusEvent::new("ORD1", 2, PickedUp))).unwrap();
    assert_eq!(next_event(&mut subscription).await.sequence, 2);

    // Only the parent is cancelled; the subscription itself is left alone.
    parent.cancel();
    tokio::time::timeout(Duration::from_secs(5), feed.closed())
        .await
        .expect("connection should be dropped");
    assert_eq!(subscription.next().await, None);
    assert_eq!(subscription.state(), ChannelState::Cancelled);
    assert!(subscription.handle().is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn channel_shutdown_reaches_parented_subscriptions() {
    let backend = Arc::new(FakeBackend::new("ORD1", &[Confirmed]));
    let transport = Arc::new(ScriptedTransport::default());
    let _feed = transport.open_feed();
    let channel = LiveUpdateChannel::new(transport.clone(), backend.clone(), channel_config());

    let parent = CancellationToken::new();
    let mut subscription =
        channel.subscribe_within(HashMap::from([(OrderId::from("ORD1"), 1)]), &parent);
    channel.shutdown();

    assert_eq!(subscription.next().await, None);
    assert_eq!(subscription.state(), ChannelState::Cancelled);
    assert!(!parent.is_cancelled());
    assert!(subscription.handle().is_cancelled());
}
