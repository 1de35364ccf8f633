//! Mosaic - Multi-panel bitmap display firmware
//!
//! Main firmware binary for RP2040-based boards driving up to eight
//! ST7735 color panels. Receives RGB565 bitmaps over the serial link and
//! supports live calibration of each panel's usable drawing area; see
//! `CMD:HELP` on the wire for the command catalog.

#![no_std]
#![no_main]

extern crate alloc;

use core::cell::RefCell;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{SPI0, UART0};
use embassy_rp::spi::{self, Spi};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Delay, Instant, Timer};
use embedded_alloc::LlffHeap as Heap;
use embedded_hal_bus::spi::RefCellDevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use mosaic_core::display::DisplayRegistry;
use mosaic_core::engine::ProtocolEngine;
use mosaic_core::traits::SerialPort;

mod displays;
mod serial;
mod st7735;

use crate::serial::UartPort;
use crate::st7735::St7735;

// Heap allocator for frame footprints and pixel snapshots
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: frame captures plus one pixel snapshot (up to 60 KiB)
const HEAP_SIZE: usize = 96 * 1024;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

// Shared SPI bus; each panel gets its own chip select
static SPI_BUS: StaticCell<RefCell<Spi<'static, SPI0, spi::Blocking>>> = StaticCell::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Mosaic firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());

    // Serial link to the host client
    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 512]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let mut port = UartPort::new(uart);

    port.write_line("");
    port.write_line("===========================================");
    port.write_line("Mosaic Multi-Display System");
    port.write_line("===========================================");

    // One SPI bus for every panel
    let mut spi_config = spi::Config::default();
    spi_config.frequency = 32_000_000;
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config);
    let spi_bus = SPI_BUS.init(RefCell::new(spi));

    // Panel drivers; pin objects must match displays::PANELS
    let left = St7735::new(
        RefCellDevice::new(spi_bus, Output::new(p.PIN_17, Level::High), Delay).unwrap(),
        Output::new(p.PIN_20, Level::Low),
        Output::new(p.PIN_21, Level::Low),
        Output::new(p.PIN_22, Level::Low),
        Delay,
    );
    let right = St7735::new(
        RefCellDevice::new(spi_bus, Output::new(p.PIN_13, Level::High), Delay).unwrap(),
        Output::new(p.PIN_14, Level::Low),
        Output::new(p.PIN_15, Level::Low),
        Output::new(p.PIN_26, Level::Low),
        Delay,
    );

    // Register all panels from the config table
    let mut registry = DisplayRegistry::new();
    for (def, driver) in displays::PANELS.iter().zip([left, right]) {
        if registry.add(displays::display_config(def), driver).is_err() {
            warn!("Failed to register display {}", def.name);
        }
    }
    info!("Registered {} display(s)", registry.len());

    if registry.initialize_all() {
        info!("All displays initialized");
    } else {
        warn!("Some displays failed to initialize");
    }

    registry.show_all_test_patterns();
    info!("Test patterns displayed");

    let mut engine = ProtocolEngine::new(&mut registry, port);
    engine.port_mut().write_line("System ready!");
    engine
        .port_mut()
        .write_line("Commands: CMD:HELP, CMD:LIST, DISPLAY:<name>");
    info!("System ready");

    loop {
        let now = Instant::now().as_millis();
        engine.process(now);
        engine.check_timeout(now);
        Timer::after_millis(1).await;
    }
}

fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    unsafe { HEAP.init(core::ptr::addr_of_mut!(HEAP_MEM) as usize, HEAP_SIZE) }
}
