//! SSD1306 OLED status screen.
//!
//! Two layouts, picked by `ObservableState::screen`:
//!
//! ```text
//!   Motion                      Bridge
//!   MOUSE MOVER      *          KEYBRIDGE    LINK
//!   Next  00:12 / 00:45         Queue 12/4095
//!   [#######.........]          Keys  1234
//!   Moves 12                    > hello worl
//!   Up    01:02:03              Up    01:02:03
//! ```
//!
//! A full-frame flush takes a while over I²C, so the frame is only pushed
//! when something visible changed.

use core::fmt::Write;

use defmt::{info, warn};
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use heapless::String;
use keybridge::clock::hms;
use keybridge::dispatch::{ObservableState, Screen, StatusDisplay};
use keybridge::error::Error;
use keybridge::mode::OperatingMode;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use super::Preview;

/// Type alias for the concrete display driver.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

const BAR_WIDTH: u32 = 124;

/// What is actually visible, at display resolution (whole seconds).
#[derive(Clone, PartialEq, Eq)]
struct Frame {
    screen: Screen,
    linked: bool,
    uptime_s: u32,
    remaining_s: u32,
    total_s: u32,
    bar_px: u32,
    keys: u32,
    motions: u32,
    queue_len: usize,
    queue_capacity: usize,
    flash: bool,
    preview: Preview,
}

impl Frame {
    fn new(state: &ObservableState, preview: Preview) -> Self {
        let total = state.countdown_total_ms.max(1);
        let done = total - state.countdown_remaining_ms.min(total);
        Self {
            screen: state.screen,
            linked: state.mode == OperatingMode::BridgeActive,
            uptime_s: state.uptime_ms / 1000,
            remaining_s: state.countdown_remaining_ms.div_ceil(1000),
            total_s: state.countdown_total_ms / 1000,
            bar_px: (u64::from(done) * u64::from(BAR_WIDTH) / u64::from(total)) as u32,
            keys: state.keys_sent,
            motions: state.motions_performed,
            queue_len: state.queue_len,
            queue_capacity: state.queue_capacity,
            flash: state.motion_flash,
            preview,
        }
    }
}

pub struct StatusScreen<I2C> {
    display: Display<I2C>,
    last: Option<Frame>,
    online: bool,
}

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

fn line(row: i32) -> Point {
    Point::new(0, 10 + row * 12)
}

fn uptime(out: &mut String<24>, uptime_s: u32) {
    let (h, m, s) = hms(uptime_s.saturating_mul(1000));
    let _ = write!(out, "Up    {h:02}:{m:02}:{s:02}");
}

impl<I2C> StatusScreen<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Initialise the panel and clear it.
    pub fn new(i2c: I2C) -> Result<Self, Error> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init().map_err(|_| Error::Display)?;
        display.clear_buffer();
        display.flush().map_err(|_| Error::Display)?;
        info!("SSD1306 display initialised");
        Ok(Self {
            display,
            last: None,
            online: true,
        })
    }

    fn draw_text(&mut self, text: &str, at: Point) {
        let _ = Text::new(text, at, text_style()).draw(&mut self.display);
    }

    fn draw_motion(&mut self, frame: &Frame) {
        let mut buf: String<24> = String::new();

        self.draw_text("MOUSE MOVER", line(0));
        if frame.flash {
            self.draw_text("*", Point::new(120, 10));
        }

        let _ = write!(
            buf,
            "Next  {:02}:{:02} / {:02}:{:02}",
            frame.remaining_s / 60,
            frame.remaining_s % 60,
            frame.total_s / 60,
            frame.total_s % 60
        );
        self.draw_text(&buf, line(1));

        let outline = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
        let _ = Rectangle::new(Point::new(0, 28), Size::new(BAR_WIDTH + 4, 8))
            .into_styled(outline)
            .draw(&mut self.display);
        let _ = Rectangle::new(Point::new(2, 30), Size::new(frame.bar_px, 4))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut self.display);

        buf.clear();
        let _ = write!(buf, "Moves {}", frame.motions);
        self.draw_text(&buf, line(3));

        buf.clear();
        uptime(&mut buf, frame.uptime_s);
        self.draw_text(&buf, line(4));
    }

    fn draw_bridge(&mut self, frame: &Frame) {
        let mut buf: String<24> = String::new();

        self.draw_text("KEYBRIDGE", line(0));
        self.draw_text(if frame.linked { "LINK" } else { "----" }, Point::new(104, 10));

        let _ = write!(buf, "Queue {}/{}", frame.queue_len, frame.queue_capacity);
        self.draw_text(&buf, line(1));

        buf.clear();
        let _ = write!(buf, "Keys  {}", frame.keys);
        self.draw_text(&buf, line(2));

        buf.clear();
        let _ = write!(buf, "> ");
        for c in frame.preview.chars() {
            let _ = buf.push(if c.is_ascii_graphic() || c == ' ' { c } else { ' ' });
        }
        self.draw_text(&buf, line(3));

        buf.clear();
        uptime(&mut buf, frame.uptime_s);
        self.draw_text(&buf, line(4));
    }
}

impl<I2C> StatusDisplay for StatusScreen<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn render(&mut self, state: &ObservableState) {
        if !self.online {
            return;
        }

        let frame = Frame::new(state, super::last_text());
        if self.last.as_ref() == Some(&frame) {
            return;
        }

        self.display.clear_buffer();
        match frame.screen {
            Screen::Motion => self.draw_motion(&frame),
            Screen::Bridge => self.draw_bridge(&frame),
        }

        if self.display.flush().is_err() {
            warn!("Display flush failed - display disabled");
            self.online = false;
            return;
        }
        self.last = Some(frame);
    }
}
