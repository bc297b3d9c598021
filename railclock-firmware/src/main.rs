//! Railclock - Linear Analog Clock Firmware
//!
//! Main firmware binary for RP2040-based linear clocks. Two belt-driven
//! carriages slide along a rail: the hour hand over twelve marks, the minute
//! hand over sixty. The wall-clock time arrives from a wireless bridge module
//! on UART0.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use railclock_core::clock::Hand;
use railclock_core::config::AxisHwConfig;
use railclock_core::motion::{AxisPins, Limit, StepGenerator, StepTiming};
use railclock_hal::Polarity;
use railclock_hal_rp2040::{AlarmArm, LimitInput, LimitLevel, RpOutput, TickAlarm};

use crate::channels::*;
use crate::tasks::limits::LimitWiring;
use crate::tasks::AxisStepper;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Railclock firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load();
    config::log_summary(&config);
    let timing = config.timing.step_timing();

    // Pin assignments are board-specific:
    //   hour   EN=GPIO2  STEP=GPIO3  DIR=GPIO4  LEFT=GPIO5  RIGHT=GPIO6
    //   minute EN=GPIO7  STEP=GPIO8  DIR=GPIO9  LEFT=GPIO10 RIGHT=GPIO11
    //   status LED=GPIO25, bridge UART0 TX=GPIO0 RX=GPIO1
    let hour = stepper(
        &config.hour_axis,
        timing,
        Output::new(p.PIN_2, disabled_level(&config.hour_axis)),
        Output::new(p.PIN_3, Level::Low),
        Output::new(p.PIN_4, Level::Low),
        &HOUR_ALARM,
        &HOUR_LEFT_LIMIT,
        &HOUR_RIGHT_LIMIT,
    );
    let minute = stepper(
        &config.minute_axis,
        timing,
        Output::new(p.PIN_7, disabled_level(&config.minute_axis)),
        Output::new(p.PIN_8, Level::Low),
        Output::new(p.PIN_9, Level::Low),
        &MINUTE_ALARM,
        &MINUTE_LEFT_LIMIT,
        &MINUTE_RIGHT_LIMIT,
    );

    if hour.resolution_hz() != config.drive.timer_resolution_hz {
        warn!(
            "Alarm runs at {} Hz but [drive] timer_resolution_hz is {}",
            hour.resolution_hz(),
            config.drive.timer_resolution_hz
        );
    }
    info!("Step generators initialized");

    let limit_pull = |axis: &AxisHwConfig| if axis.limit_active_low { Pull::Up } else { Pull::Down };
    let limits = [
        (
            Input::new(p.PIN_5, limit_pull(&config.hour_axis)),
            limit_wiring(Hand::Hour, Limit::Left, &config.hour_axis),
        ),
        (
            Input::new(p.PIN_6, limit_pull(&config.hour_axis)),
            limit_wiring(Hand::Hour, Limit::Right, &config.hour_axis),
        ),
        (
            Input::new(p.PIN_10, limit_pull(&config.minute_axis)),
            limit_wiring(Hand::Minute, Limit::Left, &config.minute_axis),
        ),
        (
            Input::new(p.PIN_11, limit_pull(&config.minute_axis)),
            limit_wiring(Hand::Minute, Limit::Right, &config.minute_axis),
        ),
    ];

    let status = RpOutput::new(Output::new(p.PIN_25, Level::Low));

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.bridge.baud_rate;

    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized for bridge at {} baud", config.bridge.baud_rate);

    // Limit watchers first so the levels are valid before the first move
    for (input, wiring) in limits {
        spawner.spawn(tasks::limit_task(input, wiring)).unwrap();
    }
    spawner
        .spawn(tasks::alarm_task(Hand::Hour, &HOUR_ALARM, &HOUR_AXIS))
        .unwrap();
    spawner
        .spawn(tasks::alarm_task(Hand::Minute, &MINUTE_ALARM, &MINUTE_AXIS))
        .unwrap();
    spawner
        .spawn(tasks::axis_task(Hand::Hour, &HOUR_AXIS, hour))
        .unwrap();
    spawner
        .spawn(tasks::axis_task(Hand::Minute, &MINUTE_AXIS, minute))
        .unwrap();
    spawner.spawn(tasks::bridge_task(rx, tx)).unwrap();
    spawner
        .spawn(tasks::orchestrator_task(config, status))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Enable line level that leaves the driver off
fn disabled_level(axis: &AxisHwConfig) -> Level {
    if axis.enable_active_low {
        Level::High
    } else {
        Level::Low
    }
}

/// Build one axis's step generator
#[allow(clippy::too_many_arguments)]
fn stepper(
    axis: &AxisHwConfig,
    timing: StepTiming,
    enable: Output<'static>,
    step: Output<'static>,
    dir: Output<'static>,
    alarm: &'static AlarmArm,
    left: &'static LimitLevel,
    right: &'static LimitLevel,
) -> AxisStepper {
    let pins = AxisPins {
        enable: Polarity::new(RpOutput::new(enable), axis.enable_active_low),
        step: RpOutput::new(step),
        dir: RpOutput::new(dir),
        left_limit: LimitInput::new(left),
        right_limit: LimitInput::new(right),
    };
    StepGenerator::new(pins, TickAlarm::new(alarm), Delay, timing, axis.forward_is_increasing)
}

/// Where one switch reports to
fn limit_wiring(hand: Hand, limit: Limit, axis: &AxisHwConfig) -> LimitWiring {
    let (level, link) = match (hand, limit) {
        (Hand::Hour, Limit::Left) => (&HOUR_LEFT_LIMIT, &HOUR_AXIS),
        (Hand::Hour, Limit::Right) => (&HOUR_RIGHT_LIMIT, &HOUR_AXIS),
        (Hand::Minute, Limit::Left) => (&MINUTE_LEFT_LIMIT, &MINUTE_AXIS),
        (Hand::Minute, Limit::Right) => (&MINUTE_RIGHT_LIMIT, &MINUTE_AXIS),
    };
    LimitWiring {
        hand,
        limit,
        active_low: axis.limit_active_low,
        level,
        link,
    }
}
