pub mod clock;
pub mod config;
pub mod encoder;
pub mod encoder_pins;
pub mod error;
pub mod heading;
pub mod magnetometer;
pub mod motion;
pub mod motor;
pub mod qmc5883l;
pub mod scheduler;
pub mod status;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use encoder::{EncoderState, EncoderTracker};
pub use error::{Error, Result};
pub use scheduler::SamplingLoop;
pub use telemetry::{RecordFormat, TelemetryRecorder};

#[cfg(test)]
pub(crate) mod mocks;
