//! nRF SDC controller configured as a broadcaster.
//!
//! Used with `trouble-host` crate. The beacon never accepts connections, so
//! only the advertising state machine is linked in.

use embassy_nrf::mode::Async;
use embassy_nrf::peripherals;
use embassy_nrf::{bind_interrupts, rng, Peri};
use nrf_sdc::{self as sdc, mpsl};
pub use nrf_sdc::{
    mpsl::MultiprotocolServiceLayer, Error as SoftdeviceError,
    SoftdeviceController,
};
use static_cell::StaticCell;

/// Controller memory in bytes. Advertising alone needs no connection or
/// L2CAP buffers.
const SDC_MEMORY_SIZE: usize = 1536;

bind_interrupts!(pub struct BleIrqs {
    RNG => rng::InterruptHandler<peripherals::RNG>;
    EGU2_SWI2 => nrf_sdc::mpsl::LowPrioInterruptHandler;
    RADIO => nrf_sdc::mpsl::HighPrioInterruptHandler;
    TIMER0 => nrf_sdc::mpsl::HighPrioInterruptHandler;
    RTC0 => nrf_sdc::mpsl::HighPrioInterruptHandler;
    CLOCK_POWER => nrf_sdc::mpsl::ClockInterruptHandler;
});

/// Peripherals reserved for the MPSL and the controller, held until
/// [`init`](Self::init) hands them over.
pub struct BleControllerBuilder<'d> {
    sdc_peripherals: sdc::Peripherals<'d>,
    rtc0: Peri<'d, peripherals::RTC0>,
    temp: Peri<'d, peripherals::TEMP>,
    ppi_ch19: Peri<'d, peripherals::PPI_CH19>,
    ppi_ch30: Peri<'d, peripherals::PPI_CH30>,
    ppi_ch31: Peri<'d, peripherals::PPI_CH31>,
}

impl<'d> BleControllerBuilder<'d>
where
    'd: 'static,
{
    /// The board carries a 32.768 kHz crystal.
    const LF_CLOCK_CONFIG: mpsl::raw::mpsl_clock_lfclk_cfg_t =
        mpsl::raw::mpsl_clock_lfclk_cfg_t {
            source: mpsl::raw::MPSL_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy_ppm: mpsl::raw::MPSL_DEFAULT_CLOCK_ACCURACY_PPM as u16,
            skip_wait_lfclk_started:
                mpsl::raw::MPSL_DEFAULT_SKIP_WAIT_LFCLK_STARTED != 0,
        };

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        rtc0: Peri<'d, peripherals::RTC0>,
        temp: Peri<'d, peripherals::TEMP>,
        ppi_ch17: Peri<'d, peripherals::PPI_CH17>,
        ppi_ch18: Peri<'d, peripherals::PPI_CH18>,
        ppi_ch19: Peri<'d, peripherals::PPI_CH19>,
        ppi_ch20: Peri<'d, peripherals::PPI_CH20>,
        ppi_ch21: Peri<'d, peripherals::PPI_CH21>,
        ppi_ch22: Peri<'d, peripherals::PPI_CH22>,
        ppi_ch23: Peri<'d, peripherals::PPI_CH23>,
        ppi_ch24: Peri<'d, peripherals::PPI_CH24>,
        ppi_ch25: Peri<'d, peripherals::PPI_CH25>,
        ppi_ch26: Peri<'d, peripherals::PPI_CH26>,
        ppi_ch27: Peri<'d, peripherals::PPI_CH27>,
        ppi_ch28: Peri<'d, peripherals::PPI_CH28>,
        ppi_ch29: Peri<'d, peripherals::PPI_CH29>,
        ppi_ch30: Peri<'d, peripherals::PPI_CH30>,
        ppi_ch31: Peri<'d, peripherals::PPI_CH31>,
    ) -> Self {
        let sdc_peripherals = sdc::Peripherals::new(
            ppi_ch17, ppi_ch18, ppi_ch20, ppi_ch21, ppi_ch22, ppi_ch23,
            ppi_ch24, ppi_ch25, ppi_ch26, ppi_ch27, ppi_ch28, ppi_ch29,
        );
        Self { sdc_peripherals, rtc0, temp, ppi_ch19, ppi_ch30, ppi_ch31 }
    }

    /// Start the MPSL and build the controller. Both live for the rest of
    /// the program; calling this twice panics on the static cells.
    pub fn init(
        self,
        timer0: Peri<'d, peripherals::TIMER0>,
        rng: Peri<'d, peripherals::RNG>,
    ) -> Result<
        (SoftdeviceController<'d>, &'static MultiprotocolServiceLayer<'d>),
        SoftdeviceError,
    > {
        static SDC_RNG: StaticCell<rng::Rng<'static, Async>> =
            StaticCell::new();
        static SDC_MEM: StaticCell<sdc::Mem<SDC_MEMORY_SIZE>> =
            StaticCell::new();
        static MPSL: StaticCell<MultiprotocolServiceLayer> = StaticCell::new();

        let mpsl = mpsl::MultiprotocolServiceLayer::new(
            mpsl::Peripherals::new(
                self.rtc0,
                timer0,
                self.temp,
                self.ppi_ch19,
                self.ppi_ch30,
                self.ppi_ch31,
            ),
            BleIrqs,
            Self::LF_CLOCK_CONFIG,
        )?;
        let mpsl = MPSL.init(mpsl);
        let rng = SDC_RNG.init(rng::Rng::new(rng, BleIrqs));
        let mem = SDC_MEM.init(sdc::Mem::new());

        let sdc = sdc::Builder::new()?.support_adv().build(
            self.sdc_peripherals,
            rng,
            mpsl,
            mem,
        )?;
        Ok((sdc, mpsl))
    }
}
