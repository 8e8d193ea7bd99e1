//! # Configuration Management
//!
//! Layered configuration for envoy-extender: an optional YAML/TOML/JSON file
//! overlaid with `ENVOY_EXTENDER__*` environment variables, deserialized with
//! `serde` and validated with `validator`.
//!
//! ```yaml
//! observability:
//!   log_level: debug
//!   json_logging: true
//! service_defaults:
//!   lambda-fn:
//!     envoy_extensions:
//!       - name: builtin/aws/lambda
//!         required: true
//!         arguments:
//!           ARN: arn:aws:lambda:us-east-1:111111111111:function:lambda-1234
//! ```

pub mod settings;

pub use settings::{AppConfig, ObservabilityConfig, ServiceDefaults, ENV_PREFIX};
