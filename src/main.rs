use std::convert::Infallible;
use std::io::Write;
use std::sync::Arc;

use roam_rs::clock::{Clock, SystemClock};
use roam_rs::config::{self, Config};
use roam_rs::encoder::EncoderTracker;
use roam_rs::encoder_pins::EncoderInputs;
use roam_rs::heading::HeadingEstimator;
use roam_rs::motion::MotionProfileGenerator;
use roam_rs::motor::PwmMotors;
use roam_rs::qmc5883l::Qmc5883l;
use roam_rs::scheduler::SamplingLoop;
use roam_rs::status::{self, StatusLed};
use roam_rs::telemetry::TelemetryRecorder;

// Drives the robot along a random plan and logs wheel travel and heading
// every tick until power-off. Any failure stops the motors, lights the
// status LED and halts.
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    log::info!("roam-rs starting");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => status::halt(&e, StatusLed::from_pin(Some(config::STATUS_LED_PIN))),
    };
    let led = StatusLed::from_pin(config.pins.status_led);

    match run(&config) {
        Ok(never) => match never {},
        Err(e) => status::halt(&e, led),
    }
}

fn run(config: &Config) -> roam_rs::Result<Infallible> {
    let clock = SystemClock::new();

    let motors = PwmMotors::new(&config.pins, &config.motor)?;

    let encoders = Arc::new(EncoderTracker::new());
    // Interrupts stay attached for as long as this is alive
    let _inputs = EncoderInputs::attach(Arc::clone(&encoders), &config.pins)?;

    let compass = Qmc5883l::new(&config.compass)?;
    let heading = HeadingEstimator::from_config(compass, &config.sampling);

    let recorder = TelemetryRecorder::create(&config.telemetry)?;

    let motion = MotionProfileGenerator::from_config(&config.motion, clock.now_ms());

    let mut sampling = SamplingLoop::new(
        clock,
        config.sampling.tick_period_ms,
        encoders,
        heading,
        motion,
        recorder,
        motors,
    );
    sampling.run()
}
