/// Admin operations: registering teams and tables.
pub mod admin_service;
/// Wall-clock driven match transitions.
pub mod deadline;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Ready and done actions on a match.
pub mod lifecycle_service;
/// One-shot upcoming match notices.
pub mod notification;
/// Opponent pairing and availability toggling.
pub mod pairing;
/// Read-only projections with self-healing.
pub mod query_service;
/// Elo rating computation.
pub mod rating;
/// Dual-submission score reconciliation.
pub mod scoring;
/// Storage reconnection loop toggling degraded mode.
pub mod storage_supervisor;
