use farmware_core::decode_collection;
use farmware_core::decode_dispatch;
use farmware_core::Advisory;
use farmware_core::CollectionKind;
use farmware_core::DispatchCompletion;
use farmware_core::DispatchRequest;
use farmware_core::Farmer;
use farmware_core::LoadFailure;
use farmware_core::LoadOutcome;
use serde::de::DeserializeOwned;
use tracing::info;
use tracing::warn;

use crate::backend::DashboardBackend;

pub async fn load_farmers<B: DashboardBackend + ?Sized>(backend: &B) -> LoadOutcome<Farmer> {
    load_collection(backend, CollectionKind::Farmers).await
}

pub async fn load_advisories<B: DashboardBackend + ?Sized>(backend: &B) -> LoadOutcome<Advisory> {
    load_collection(backend, CollectionKind::Advisories).await
}

/// Fetches one collection and folds every failure mode into a
/// [`LoadOutcome`]. Never returns an error.
pub async fn load_collection<B, T>(backend: &B, kind: CollectionKind) -> LoadOutcome<T>
where
    B: DashboardBackend + ?Sized,
    T: DeserializeOwned,
{
    info!(event = "client.collection.fetch_started", collection = kind.label());
    let outcome = match backend.fetch_collection(kind).await {
        Ok(payload) => decode_collection(kind, payload),
        Err(error) => {
            warn!(
                event = "client.collection.fetch_failed",
                collection = kind.label(),
                error_code = error.error_code(),
                error = %error
            );
            LoadOutcome::LoadFailed(LoadFailure::Transport {
                detail: error.to_string(),
            })
        }
    };
    info!(
        event = "client.collection.fetch_completed",
        collection = kind.label(),
        loaded = outcome.is_loaded()
    );
    outcome
}

pub async fn dispatch_advisory<B: DashboardBackend + ?Sized>(
    backend: &B,
    request: &DispatchRequest,
) -> DispatchCompletion {
    info!(
        event = "client.dispatch.started",
        advisory_id = request.message_id.as_str(),
        phone = request.phone_number.as_str()
    );
    let completion = match backend.send_advisory(request).await {
        Ok(payload) => match decode_dispatch(payload) {
            Ok(report) => DispatchCompletion::Responded(report),
            Err(message) => DispatchCompletion::TransportFailed(message),
        },
        Err(error) => {
            warn!(
                event = "client.dispatch.failed",
                error_code = error.error_code(),
                error = %error
            );
            DispatchCompletion::TransportFailed(error.to_string())
        }
    };
    info!(
        event = "client.dispatch.completed",
        success = matches!(&completion, DispatchCompletion::Responded(report) if report.success)
    );
    completion
}
