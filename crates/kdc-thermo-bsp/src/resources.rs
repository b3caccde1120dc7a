use crate::board::{DisplayResources, SensorResources};
use embassy_nrf::{
    bind_interrupts,
    gpio::{Flex, OutputDrive, Pull},
    interrupt::{self, InterruptExt},
    peripherals, twim,
};
use static_cell::StaticCell;

bind_interrupts!(struct TwimIrqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

/// SSD1306 default 7-bit address.
pub const DISPLAY_ADDRESS: u8 = 0x3C;

impl DisplayResources {
    /// Bring up TWIM0 at 400 kHz for the panel. Can only be called once.
    pub fn into_bus(self) -> twim::Twim<'static> {
        static TWIM0_TX_BUF: StaticCell<[u8; 32]> = StaticCell::new();

        let mut config = twim::Config::default();
        config.frequency = twim::Frequency::K400;
        config.sda_pullup = true;
        config.scl_pullup = true;
        interrupt::TWISPI0.set_priority(interrupt::Priority::P3);

        twim::Twim::new(
            self.twim,
            TwimIrqs,
            self.sda,
            self.scl,
            config,
            TWIM0_TX_BUF.init([0; 32]),
        )
    }
}

impl SensorResources {
    /// Open-drain data line: driving high releases it to the pull-up.
    pub fn into_data_pin(self) -> Flex<'static> {
        let mut pin = Flex::new(self.data);
        pin.set_high();
        pin.set_as_input_output(Pull::Up, OutputDrive::Standard0Disconnect1);
        pin
    }
}
