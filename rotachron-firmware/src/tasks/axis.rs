//! Axis task
//!
//! One instance per drum. Runs the controller one quantum at a time and
//! yields between quanta, so four axes share the core without any of them
//! holding it for longer than one pulse.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Delay, Instant, Timer};

use rotachron_core::motion::{AxisController, AxisEvent};
use rotachron_drivers::stepper::StepDirDriver;

use crate::channels::TARGET_BOARD;

/// Step/dir driver on RP2040 GPIOs with a busy-wait pulse delay
pub type ClockStepper = StepDirDriver<Output<'static>, Delay>;

/// Axis task - drives one drum towards its published target
#[embassy_executor::task(pool_size = 4)]
pub async fn axis_task(mut controller: AxisController<ClockStepper>) {
    info!("Axis task started: {}", controller.axis().name());

    let mut last = Instant::now();

    loop {
        let now = Instant::now();
        let elapsed_us = u32::try_from(now.duration_since(last).as_micros()).unwrap_or(u32::MAX);
        last = now;

        match controller.poll(&TARGET_BOARD, elapsed_us) {
            Some(AxisEvent::MoveStarted { digit, from, to }) => {
                debug!(
                    "{}: moving to {} ({} -> {})",
                    controller.axis().name(),
                    digit.value(),
                    from,
                    to
                );
            }
            Some(AxisEvent::MoveCompleted { digit, position }) => {
                debug!(
                    "{}: at {} (step {})",
                    controller.axis().name(),
                    digit.value(),
                    position
                );
            }
            None => {}
        }

        Timer::after_micros(u64::from(controller.next_poll_us())).await;
    }
}
