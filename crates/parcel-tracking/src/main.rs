//! # Parcel Tracking Demo
//!
//! Loads the sample orders into the in-process backend, runs a listing query, then tracks one
//! order while new milestones are recorded against it.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! PARCEL_TRACKING_CONFIG=tracking.toml RUST_LOG=debug cargo run
//! ```

use actor_framework::tracing::setup_tracing;
use parcel_tracking::config::TrackingConfig;
use parcel_tracking::directory::{OrderFilter, PageRequest};
use parcel_tracking::fixtures::load_sample_orders;
use parcel_tracking::lifecycle::TrackingSystem;
use parcel_tracking::model::{NewOrder, OrderStatus, StatusUpdate};
use parcel_tracking::session::SessionState;
use std::time::Duration;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = TrackingConfig::from_env().map_err(|e| e.to_string())?;
    let page_size = config.directory.max_page_size.min(10);
    let system = TrackingSystem::new(config);

    let span = tracing::info_span!("load_fixture");
    let ids = load_sample_orders(&system.order_client)
        .instrument(span)
        .await
        .map_err(|e| e.to_string())?;
    info!(count = ids.len(), "Sample data ready");

    let span = tracing::info_span!("listing");
    async {
        match system
            .order_client
            .query_orders(
                OrderFilter::all().with_status(OrderStatus::Delivered),
                PageRequest::first(page_size),
            )
            .await
        {
            Ok(page) => {
                for row in &page.items {
                    info!(order_id = %row.order_id, recipient = %row.recipient, "Delivered");
                }
                info!(
                    total = page.total_count,
                    pages = page.total_pages(),
                    "Delivered orders listed"
                );
            }
            Err(e) => error!(error = %e, "Listing failed"),
        }
    }
    .instrument(span)
    .await;

    let span = tracing::info_span!("tracking");
    async {
        let order_id = system
            .order_client
            .place_order(NewOrder {
                recipient: "Priya Natarajan".to_string(),
                recipient_phone: "+44 7700 900123".to_string(),
                destination_address: "27 Canal Walk, Leeds".to_string(),
                package_description: "Camera lens".to_string(),
                weight_kg: 0.9,
                declared_value: 650.0,
                special_instructions: Some("Signature required".to_string()),
                estimated_delivery: None,
                created_at: None,
            })
            .await
            .map_err(|e| e.to_string())?;

        let session = system.track(order_id.clone());
        let mut view = session.watch();
        view.wait_for(|v| v.session_state == SessionState::Live)
            .await
            .map_err(|e| e.to_string())?;

        for (status, location) in [
            (OrderStatus::PickedUp, "Leeds Sorting Centre"),
            (OrderStatus::InTransit, "Leeds Sorting Centre"),
            (OrderStatus::OutForDelivery, "Leeds"),
            (OrderStatus::Delivered, "Leeds"),
        ] {
            tokio::time::sleep(Duration::from_millis(200)).await;
            system
                .order_client
                .record_status(&order_id, StatusUpdate::new(status).located(location))
                .await
                .map_err(|e| e.to_string())?;
        }

        let final_view = view
            .wait_for(|v| v.status == Some(OrderStatus::Delivered))
            .await
            .map_err(|e| e.to_string())?
            .clone();
        for event in final_view.recent_updates(5) {
            info!(
                sequence = event.sequence,
                status = %event.status,
                location = event.location.as_deref().unwrap_or("-"),
                "Update"
            );
        }
        session.cancel();
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    system.shutdown().await?;
    info!("Demo completed");
    Ok(())
}
