//! Cadence - Stepper Motor Controller Firmware
//!
//! Main firmware binary for RP2040-based stepper controller boards.
//! Drives a trapezoidal speed-ramp pulse generator with mid-motion
//! step-request merging, a register-based host link, and a per-variant
//! external serial control input.
//!
//! The original interrupt structure maps onto three executors: the stop
//! switch on the highest priority, the pulse generator below it, and
//! everything else cooperatively on the thread executor.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::*;
use embassy_executor::{Executor, InterruptExecutor};
use embassy_rp::adc::{Adc, Channel as AdcChannel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use cadence_core::config::{DeviceVariant, FW_VERSION, HW_VERSION};
use cadence_core::device::Device;

use crate::board::RpBoard;
use crate::channels::SharedDevice;

mod board;
mod channels;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

#[cfg(feature = "vestibular-vr-h2")]
const VARIANT: DeviceVariant = DeviceVariant::VestibularVrH2;
#[cfg(not(feature = "vestibular-vr-h2"))]
const VARIANT: DeviceVariant = DeviceVariant::FastStepper;

// Static cells for UART buffers (must live forever)
static HOST_TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static HOST_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static EXT_TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static EXT_RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

static DEVICE: StaticCell<SharedDevice> = StaticCell::new();

static EXECUTOR_ESTOP: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_PULSE: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_THREAD: StaticCell<Executor> = StaticCell::new();

#[interrupt]
unsafe fn SWI_IRQ_0() {
    EXECUTOR_ESTOP.on_interrupt()
}

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_PULSE.on_interrupt()
}

#[cortex_m_rt::entry]
fn main() -> ! {
    info!(
        "Cadence firmware starting: {} (whoAmI {}), fw {}.{}, hw {}.{}",
        VARIANT.name(),
        VARIANT.who_am_i(),
        FW_VERSION.0,
        FW_VERSION.1,
        HW_VERSION.0,
        HW_VERSION.1,
    );

    let p = embassy_rp::init(Default::default());

    // Motor outputs (STEP=GPIO11, DIR=GPIO10, ENABLE=GPIO12); the driver
    // enable input is active low, so boot with it held off
    let step = Output::new(p.PIN_11, Level::Low);
    let dir = Output::new(p.PIN_10, Level::Low);
    let enable = Output::new(p.PIN_12, Level::High);

    let device = DEVICE.init(Mutex::new(RefCell::new(Device::new(
        VARIANT,
        RpBoard::new(step, dir, enable),
    ))));
    info!("Device initialized");

    // Host register link on UART0 (GPIO0 TX, GPIO1 RX)
    let host_uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let host_uart = host_uart.into_buffered(
        Irqs,
        HOST_TX_BUF.init([0u8; 256]),
        HOST_RX_BUF.init([0u8; 256]),
    );
    let (host_tx, host_rx) = host_uart.split();

    // External motor control on UART1 (GPIO8 TX, GPIO9 RX); only RX is used
    let ext_uart = Uart::new_blocking(p.UART1, p.PIN_8, p.PIN_9, UartConfig::default());
    let ext_uart = ext_uart.into_buffered(
        Irqs,
        EXT_TX_BUF.init([0u8; 16]),
        EXT_RX_BUF.init([0u8; 64]),
    );
    let (_ext_tx, ext_rx) = ext_uart.split();

    info!("UARTs initialized");

    // Analog input on GPIO26 (ADC0)
    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let analog_in = AdcChannel::new_pin(p.PIN_26, Pull::None);

    // Stop switch on GPIO22, shorted to ground when pressed
    let estop_pin = Input::new(p.PIN_22, Pull::Up);

    // Quadrature encoder on GPIO3/GPIO4
    let encoder_a = Input::new(p.PIN_3, Pull::Up);
    let encoder_b = Input::new(p.PIN_4, Pull::Up);

    info!("Peripherals initialized");

    // Stop switch preempts everything, pulse generation preempts the
    // thread executor
    interrupt::SWI_IRQ_0.set_priority(Priority::P2);
    let estop_spawner = EXECUTOR_ESTOP.start(interrupt::SWI_IRQ_0);
    estop_spawner
        .spawn(tasks::estop_task(estop_pin, device))
        .unwrap();

    interrupt::SWI_IRQ_1.set_priority(Priority::P3);
    let pulse_spawner = EXECUTOR_PULSE.start(interrupt::SWI_IRQ_1);
    pulse_spawner.spawn(tasks::pulse_task(device)).unwrap();

    let executor = EXECUTOR_THREAD.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(tasks::tick_task(device)).unwrap();
        spawner.spawn(tasks::control_commit_task(device)).unwrap();
        spawner.spawn(tasks::host_rx_task(host_rx, device)).unwrap();
        spawner.spawn(tasks::host_tx_task(host_tx)).unwrap();
        spawner
            .spawn(tasks::external_rx_task(ext_rx, device))
            .unwrap();
        spawner
            .spawn(tasks::encoder_task(encoder_a, encoder_b))
            .unwrap();
        spawner
            .spawn(tasks::analog_task(adc, analog_in, device))
            .unwrap();
        info!("All tasks spawned, firmware running");
    })
}
