use embassy_nrf::interrupt::Priority;
use embassy_nrf::peripherals::{self, P0_13, RNG, TIMER0, TWISPI0, WDT};
use embassy_nrf::Peri;

use crate::ble;

/// Single-wire data line of the DHT22.
pub struct SensorResources {
    pub data: Peri<'static, peripherals::P0_04>,
}

/// I2C bus of the SSD1306 panel.
pub struct DisplayResources {
    pub twim: Peri<'static, TWISPI0>,
    pub sda: Peri<'static, peripherals::P0_26>,
    pub scl: Peri<'static, peripherals::P0_27>,
}

/// Everything the thermometer firmware touches.
pub struct KdcThermo {
    /// Status LED, lit while the pipeline is up.
    pub led: Peri<'static, P0_13>,
    pub sensor: SensorResources,
    pub display: DisplayResources,
    /// Watchdog Timer.
    pub wdt: Peri<'static, WDT>,
    /// Random Number Generator, consumed by the BLE controller.
    pub rng: Peri<'static, RNG>,
    /// Timer 0, consumed by the MPSL.
    pub timer0: Peri<'static, TIMER0>,
    /// Bluetooth Low Energy controller
    pub ble: ble::BleControllerBuilder<'static>,
}

impl Default for KdcThermo {
    fn default() -> Self {
        let mut config = embassy_nrf::config::Config::default();
        config.gpiote_interrupt_priority = Priority::P2;
        config.time_interrupt_priority = Priority::P2;
        Self::new(config)
    }
}

impl KdcThermo {
    /// Create a new instance based on HAL configuration
    pub fn new(config: embassy_nrf::config::Config) -> Self {
        let p = embassy_nrf::init(config);

        Self {
            led: p.P0_13,
            sensor: SensorResources { data: p.P0_04 },
            display: DisplayResources {
                twim: p.TWISPI0,
                sda: p.P0_26,
                scl: p.P0_27,
            },
            wdt: p.WDT,
            rng: p.RNG,
            timer0: p.TIMER0,
            ble: ble::BleControllerBuilder::new(
                p.RTC0, p.TEMP, p.PPI_CH17, p.PPI_CH18, p.PPI_CH19,
                p.PPI_CH20, p.PPI_CH21, p.PPI_CH22, p.PPI_CH23, p.PPI_CH24,
                p.PPI_CH25, p.PPI_CH26, p.PPI_CH27, p.PPI_CH28, p.PPI_CH29,
                p.PPI_CH30, p.PPI_CH31,
            ),
        }
    }
}
