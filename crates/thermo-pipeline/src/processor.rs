use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;
use heapless::String;

use crate::config::HISTORY_WRITE_TIMEOUT;
use crate::context::Context;
use crate::fmt::LogFormat;
use crate::gate::InitBits;
use crate::sample::SensorSample;

/// A small text display. Coordinates are pixels from the top-left corner.
#[allow(async_fn_in_trait)]
pub trait Display {
    type Error: LogFormat;

    async fn draw_text(
        &mut self,
        x: u8,
        y: u8,
        text: &str,
        inverted: bool,
    ) -> Result<(), Self::Error>;

    /// Push everything drawn since the last flush to the panel.
    async fn flush(&mut self) -> Result<(), Self::Error>;
}

/// A fixed-position line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLine {
    pub x: u8,
    pub y: u8,
    pub text: &'static str,
}

pub const GREETING: TextLine = TextLine { x: 18, y: 0, text: "Hello KDC!" };
pub const FAREWELL: [TextLine; 2] = [
    TextLine { x: 38, y: 37, text: "Have a" },
    TextLine { x: 28, y: 47, text: "Good Day!" },
];
pub const HUMIDITY_POS: (u8, u8) = (18, 17);
pub const TEMPERATURE_POS: (u8, u8) = (28, 27);

const LINE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderError<E> {
    /// A reading did not fit in its text line.
    Format,
    Display(E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProcessorConfig {
    pub history_write_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self { history_write_timeout: HISTORY_WRITE_TIMEOUT }
    }
}

/// Formats `"Hum: 45.0"`.
pub fn humidity_line(sample: &SensorSample) -> Option<String<LINE_LEN>> {
    let mut line = String::new();
    write!(line, "Hum: {:.1}", sample.humidity).ok()?;
    Some(line)
}

/// Formats `"Tmp: 72.0"`.
pub fn temperature_line(sample: &SensorSample) -> Option<String<LINE_LEN>> {
    let mut line = String::new();
    write!(line, "Tmp: {:.1}", sample.temperature).ok()?;
    Some(line)
}

/// Sole consumer of the sample queue: records history, drives the display
/// and wakes the broadcaster.
pub struct ProcessorTask<'a, M: RawMutex, D: Display> {
    ctx: &'a Context<M>,
    display: D,
    config: ProcessorConfig,
}

impl<'a, M: RawMutex, D: Display> ProcessorTask<'a, M, D> {
    pub const REQUIRES: InitBits = InitBits::QUEUE_READY
        .union(InitBits::BUFFER_READY)
        .union(InitBits::SIGNAL_READY);

    pub fn new(
        ctx: &'a Context<M>,
        display: D,
        config: ProcessorConfig,
    ) -> Self {
        Self { ctx, display, config }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Wait indefinitely for the next sample, then process it.
    pub async fn step(&mut self) -> SensorSample {
        let sample = self.ctx.queue.receive().await;
        self.process(sample).await;
        sample
    }

    /// History write, display update, then one ready signal regardless of
    /// how the first two went.
    pub async fn process(&mut self, sample: SensorSample) {
        self.ctx.stats.record_sample_processed();

        match self
            .ctx
            .history
            .push(&sample, self.config.history_write_timeout)
            .await
        {
            Ok(evicted) => {
                for _ in 0..evicted {
                    self.ctx.stats.record_buffer_eviction();
                }
            }
            Err(e) => {
                warn!("history write failed: {:?}", e);
                self.ctx.stats.record_buffer_fault();
            }
        }

        if let Err(e) = self.render(&sample).await {
            warn!("display update failed: {:?}", e);
            self.ctx.stats.record_display_fault();
        }

        self.ctx.ready.raise();
        debug!("processed {:?}", sample);
    }

    pub async fn render(
        &mut self,
        sample: &SensorSample,
    ) -> Result<(), RenderError<D::Error>> {
        let humidity = humidity_line(sample).ok_or(RenderError::Format)?;
        let temperature =
            temperature_line(sample).ok_or(RenderError::Format)?;

        self.draw(GREETING.x, GREETING.y, GREETING.text).await?;
        self.draw(HUMIDITY_POS.0, HUMIDITY_POS.1, &humidity).await?;
        self.draw(TEMPERATURE_POS.0, TEMPERATURE_POS.1, &temperature).await?;
        for line in FAREWELL {
            self.draw(line.x, line.y, line.text).await?;
        }
        self.display.flush().await.map_err(RenderError::Display)
    }

    async fn draw(
        &mut self,
        x: u8,
        y: u8,
        text: &str,
    ) -> Result<(), RenderError<D::Error>> {
        self.display
            .draw_text(x, y, text, false)
            .await
            .map_err(RenderError::Display)
    }

    pub async fn run(mut self) -> ! {
        self.ctx.gate.wait(Self::REQUIRES).await;
        info!("processor task running");
        loop {
            self.step().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_use_one_decimal() {
        let sample = SensorSample::new(73.2, 44.06);
        assert_eq!(temperature_line(&sample).unwrap().as_str(), "Tmp: 73.2");
        assert_eq!(humidity_line(&sample).unwrap().as_str(), "Hum: 44.1");
    }

    #[test]
    fn oversized_reading_does_not_fit() {
        let sample = SensorSample::new(1.0e12, 50.0);
        assert!(temperature_line(&sample).is_none());
    }
}
