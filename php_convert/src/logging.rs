//! Provides a simple console logger.
//!
//! While [`log4rs`] already provides something like this, it doesn't buffer
//! `stderr` output.

use std::io::{self, IsTerminal as _, Write as _};

use arrayvec::ArrayVec;
use log::{LevelFilter, Record};
use log4rs::append::Append;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::encode::{self, Color, Encode, Style};

use crate::config::LogConfig;

const WRITE_BUF_SIZE: usize = 0x400;

const APPENDER: &str = "stderr";

/// Installs the global logger.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let pattern = if config.time {
        "[{d(%Y-%m-%d %H:%M:%S)(utc)} {h({l:<5})} {t}] {m}{n}"
    } else {
        "[{h({l:<5})} {t}] {m}{n}"
    };

    let appender = StderrAppender {
        encoder: Box::new(PatternEncoder::new(pattern)),
        color: config
            .color
            .unwrap_or_else(|| io::stderr().is_terminal()),
    };

    let loggers = config
        .modules
        .iter()
        .map(|(name, &level)| Logger::builder().build(name.as_str(), level));

    let root = Root::builder()
        .appender(APPENDER)
        .build(config.default.unwrap_or(LevelFilter::Warn));

    let config = log4rs::Config::builder()
        .appender(Appender::builder().build(APPENDER, Box::new(appender)))
        .loggers(loggers)
        .build(root)?;

    log4rs::init_config(config)?;
    Ok(())
}

#[derive(Debug)]
struct StderrAppender {
    encoder: Box<dyn Encode>,
    color: bool,
}

impl Append for StderrAppender {
    fn append(&self, record: &Record<'_>) -> anyhow::Result<()> {
        let mut writer = ConsoleWriter {
            color: self.color,
            buf: ArrayVec::new_const(),
        };
        self.encoder.encode(&mut writer, record)?;
        Ok(writer.flush()?)
    }

    fn flush(&self) {
        _ = io::stderr().flush();
    }
}

/// Stack-buffered writer.
///
/// If a write exceeds the capacity, its buffer is flushed to stderr first.
#[derive(Debug)]
struct ConsoleWriter {
    color: bool,
    buf: ArrayVec<u8, WRITE_BUF_SIZE>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.buf.remaining_capacity() < buf.len() {
            self.flush()?;
        }

        if buf.len() > self.buf.capacity() {
            io::stderr().write(buf)
        } else {
            self.buf.write(buf)
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.buf.remaining_capacity() < buf.len() {
            self.flush()?;
        }

        if buf.len() > self.buf.capacity() {
            io::stderr().write_all(buf)
        } else {
            self.buf.write_all(buf)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        stderr.write_all(&self.buf)?;
        self.buf.clear();
        stderr.flush()?;
        Ok(())
    }
}

impl encode::Write for ConsoleWriter {
    fn set_style(&mut self, style: &Style) -> io::Result<()> {
        if self.color {
            self.write_all(b"\x1b[0m")?;

            if let Some(text) = style.text {
                write!(self, "\x1b[{}m", 30 + color_offset(text))?;
            }

            if let Some(background) = style.background {
                write!(self, "\x1b[{}m", 40 + color_offset(background))?;
            }

            if style.intense == Some(true) {
                self.write_all(b"\x1b[1m")?;
            }
        }

        Ok(())
    }
}

/// Offset of the color from the first ANSI color code.
fn color_offset(color: Color) -> u8 {
    match color {
        Color::Black => 0,
        Color::Red => 1,
        Color::Green => 2,
        Color::Yellow => 3,
        Color::Blue => 4,
        Color::Magenta => 5,
        Color::Cyan => 6,
        Color::White => 7,
    }
}
