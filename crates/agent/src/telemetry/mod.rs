//! Structured logging and optional OpenTelemetry span export.
//!
//! Logs are always emitted as JSON on stdout. When `OTEL_EXPORTER_OTLP_ENDPOINT`
//! is set, spans are additionally exported via OTLP/gRPC.
//!
//! # Telemetry invariants
//!
//! - **No key material, nonces or protected attribute values** may appear in
//!   any span attribute or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

pub mod init;

pub use init::init_telemetry;
