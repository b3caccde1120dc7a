use crate::prelude::*;
use embassy_nrf::twim::Twim;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle, MonoTextStyleBuilder},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use ssd1306::mode::BufferedGraphicsModeAsync;
use ssd1306::{prelude::*, I2CDisplayInterface, Ssd1306Async};
use thermo_pipeline::{Display, ProcessorConfig, ProcessorTask};

type Panel = Ssd1306Async<
    I2CInterface<Twim<'static>>,
    DisplaySize128x64,
    BufferedGraphicsModeAsync<DisplaySize128x64>,
>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayFault {
    /// The panel never came up at boot.
    Offline,
    /// Text did not render into the frame buffer.
    Draw,
    /// The I2C transfer to the panel failed.
    Bus,
}

/// 128x64 SSD1306 over I2C, drawn with the 6x10 ASCII font.
///
/// A panel that fails to initialise is kept as `Offline`: every call then
/// reports a fault and the rest of the pipeline carries on without it.
pub struct OledDisplay {
    panel: Option<Panel>,
    normal: MonoTextStyle<'static, BinaryColor>,
    inverted: MonoTextStyle<'static, BinaryColor>,
}

impl OledDisplay {
    pub async fn new(bus: Twim<'static>) -> Self {
        let interface = I2CDisplayInterface::new(bus);
        let mut panel =
            Ssd1306Async::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
                .into_buffered_graphics_mode();

        let ready = panel.init().await.is_ok();
        let panel = if ready {
            info!("display ready");
            Some(panel)
        } else {
            error!("display init failed, running without it");
            None
        };

        Self {
            panel,
            normal: MonoTextStyle::new(&FONT_6X10, BinaryColor::On),
            inverted: MonoTextStyleBuilder::new()
                .font(&FONT_6X10)
                .text_color(BinaryColor::Off)
                .background_color(BinaryColor::On)
                .build(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.panel.is_some()
    }
}

impl Display for OledDisplay {
    type Error = DisplayFault;

    async fn draw_text(
        &mut self,
        x: u8,
        y: u8,
        text: &str,
        inverted: bool,
    ) -> Result<(), DisplayFault> {
        let panel = self.panel.as_mut().ok_or(DisplayFault::Offline)?;
        let style = if inverted { self.inverted } else { self.normal };
        Text::with_baseline(
            text,
            Point::new(x.into(), y.into()),
            style,
            Baseline::Top,
        )
        .draw(panel)
        .map_err(|_| DisplayFault::Draw)?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), DisplayFault> {
        let panel = self.panel.as_mut().ok_or(DisplayFault::Offline)?;
        let res = panel.flush().await.map_err(|_| DisplayFault::Bus);
        // Each frame is drawn from blank.
        panel.clear_buffer();
        res
    }
}

#[embassy_executor::task]
pub async fn processor_task(ctx: &'static AppContext, display: OledDisplay) {
    if !display.is_online() {
        warn!("processor running with the display offline");
    }
    ProcessorTask::new(ctx, display, ProcessorConfig::default()).run().await
}
