//! Sample data set used by the demo binary and the tests.
//!
//! 42 orders placed through the public client API, so they get the actor's ids
//! (`ORD1200`..`ORD1241` with the default configuration) and real timelines. Each order's
//! progress is derived from its index:
//!
//! | index % 6 | final status |
//! |-----------|--------------|
//! | 0 | Confirmed |
//! | 1 | Picked Up |
//! | 2 | In Transit |
//! | 3 | Out for Delivery |
//! | 4 | Failed (after In Transit) |
//! | 5 | Delivered |
//!
//! Every tenth order (index % 10 == 9) is cancelled right after placement instead.

use crate::clients::OrderClient;
use crate::model::{NewOrder, OrderId, OrderStatus, StatusUpdate};
use crate::order_actor::OrderError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::info;

pub const SAMPLE_ORDER_COUNT: usize = 42;

const FIRST_NAMES: [&str; 12] = [
    "Amelia", "Bruno", "Chloe", "Dmitri", "Elena", "Farid", "Grace", "Hiro", "Isabel", "Jonas",
    "Keira", "Luis",
];

const LAST_NAMES: [&str; 10] = [
    "Almeida", "Baker", "Costa", "Dubois", "Evans", "Fischer", "Garcia", "Haddad", "Ivanova",
    "Jensen",
];

const STREETS: [&str; 8] = [
    "Harbour Road",
    "Mill Lane",
    "Station Street",
    "Orchard Way",
    "Kingsway",
    "Canal Walk",
    "Market Square",
    "Victoria Avenue",
];

const CITIES: [&str; 6] = ["Leeds", "Bristol", "Glasgow", "Cardiff", "Norwich", "York"];

const PACKAGES: [(&str, f64, f64); 6] = [
    ("Documents", 0.4, 15.0),
    ("Electronics", 2.1, 480.0),
    ("Clothing", 1.3, 95.0),
    ("Books", 3.2, 60.0),
    ("Kitchenware", 5.8, 140.0),
    ("Spare parts", 7.5, 220.0),
];

/// Placement payload and the milestones recorded afterwards, for one sample order.
#[derive(Debug, Clone)]
pub struct SampleOrder {
    pub order: NewOrder,
    pub milestones: Vec<StatusUpdate>,
    pub cancelled: bool,
}

pub fn sample_orders() -> Vec<SampleOrder> {
    (0..SAMPLE_ORDER_COUNT).map(sample_order).collect()
}

fn sample_order(i: usize) -> SampleOrder {
    let created_at = placed_at(i);
    let (description, weight_kg, declared_value) = PACKAGES[i % PACKAGES.len()];
    let city = CITIES[i % CITIES.len()];

    let order = NewOrder {
        recipient: format!(
            "{} {}",
            FIRST_NAMES[i % FIRST_NAMES.len()],
            LAST_NAMES[(i * 7) % LAST_NAMES.len()]
        ),
        recipient_phone: format!("+44 7700 9{:05}", 10_000 + i * 37),
        destination_address: format!(
            "{} {}, {}",
            3 + (i * 11) % 90,
            STREETS[i % STREETS.len()],
            city
        ),
        package_description: description.to_string(),
        weight_kg,
        declared_value,
        special_instructions: (i % 4 == 0).then(|| "Leave with neighbour if absent".to_string()),
        estimated_delivery: Some((created_at + Duration::days(3)).date_naive()),
        created_at: Some(created_at),
    };

    let cancelled = i % 10 == 9;
    let milestones = if cancelled {
        Vec::new()
    } else {
        path(i)
            .iter()
            .enumerate()
            .map(|(step, status)| {
                let occurred_at = created_at + Duration::hours(6 * (step as i64 + 1));
                let update = StatusUpdate::new(*status).at(occurred_at);
                match status {
                    OrderStatus::PickedUp | OrderStatus::InTransit => {
                        update.located(format!("{city} Sorting Centre"))
                    }
                    OrderStatus::OutForDelivery | OrderStatus::Delivered | OrderStatus::Failed => {
                        update.located(city)
                    }
                    _ => update,
                }
            })
            .collect()
    };

    SampleOrder {
        order,
        milestones,
        cancelled,
    }
}

fn placed_at(i: usize) -> DateTime<Utc> {
    let day = (i % 28) as u32 + 1;
    let hour = 8 + (i % 10) as u32;
    Utc.with_ymd_and_hms(2025, 8, day, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

fn path(i: usize) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match i % 6 {
        0 => &[],
        1 => &[PickedUp],
        2 => &[PickedUp, InTransit],
        3 => &[PickedUp, InTransit, OutForDelivery],
        4 => &[PickedUp, InTransit, Failed],
        _ => &[PickedUp, InTransit, OutForDelivery, Delivered],
    }
}

/// Places every sample order and records its milestones. Returns the ids in placement order.
pub async fn load_sample_orders(client: &OrderClient) -> Result<Vec<OrderId>, OrderError> {
    let mut ids = Vec::with_capacity(SAMPLE_ORDER_COUNT);
    for sample in sample_orders() {
        let id = client.place_order(sample.order).await?;
        for update in sample.milestones {
            client.record_status(&id, update).await?;
        }
        if sample.cancelled {
            client.cancel_order(&id).await?;
        }
        ids.push(id);
    }
    info!(count = ids.len(), "Sample orders loaded");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::is_valid_transition;

    #[test]
    fn every_sample_path_is_a_valid_lifecycle() {
        for sample in sample_orders() {
            let mut current = OrderStatus::INITIAL;
            for update in &sample.milestones {
                assert!(is_valid_transition(current, update.status));
                current = update.status;
            }
            if sample.cancelled {
                assert!(is_valid_transition(current, OrderStatus::Cancelled));
            }
        }
    }

    #[test]
    fn sample_35_ends_delivered() {
        let samples = sample_orders();
        assert_eq!(samples.len(), 42);
        let last = samples[35].milestones.last().map(|update| update.status);
        assert_eq!(last, Some(OrderStatus::Delivered));
        assert!(!samples[35].cancelled);
    }
}
