//! Log line formatting with the simulation tick in every line.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use time::macros::format_description;
use time::{format_description::FormatItem, OffsetDateTime};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// Ticks simulated so far, across every session in the process.
static TICK_COUNTER: AtomicU64 = AtomicU64::new(0);

const TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second].[subsecond digits:3]");

/// Formats events as `time tick LEVEL span{fields}: target: fields`.
///
/// The tick column makes it possible to line log output up with a replayed run.
pub struct TickFormatter;

impl<S, N> FormatEvent<S, N> for TickFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        let now = OffsetDateTime::now_utc().format(&TIMESTAMP_FORMAT).map_err(|_| fmt::Error)?;
        write_styled(&mut writer, ansi, DIM, now)?;
        writer.write_char(' ')?;
        write_styled(&mut writer, ansi, DIM, format_args!("t{:<6}", tick_count()))?;
        writer.write_char(' ')?;

        let (color, label) = level_style(meta.level());
        write_styled(&mut writer, ansi, color, format_args!("{label:>5}"))?;
        writer.write_char(' ')?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write_styled(&mut writer, ansi, BOLD, span.metadata().name())?;
                if let Some(fields) = span.extensions().get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                writer.write_str(": ")?;
            }
        }

        write_styled(&mut writer, ansi, DIM, format_args!("{}:", meta.target()))?;
        writer.write_char(' ')?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";

fn level_style(level: &Level) -> (&'static str, &'static str) {
    match *level {
        Level::TRACE => ("\x1b[35m", "TRACE"),
        Level::DEBUG => ("\x1b[34m", "DEBUG"),
        Level::INFO => ("\x1b[32m", "INFO"),
        Level::WARN => ("\x1b[33m", "WARN"),
        Level::ERROR => ("\x1b[31m", "ERROR"),
    }
}

fn write_styled(writer: &mut Writer<'_>, ansi: bool, style: &str, value: impl fmt::Display) -> fmt::Result {
    if ansi {
        write!(writer, "{style}{value}\x1b[0m")
    } else {
        write!(writer, "{value}")
    }
}

/// Advances the tick shown in log lines. Called once per simulated tick.
pub fn increment_tick() {
    TICK_COUNTER.fetch_add(1, Ordering::Relaxed);
}

pub fn tick_count() -> u64 {
    TICK_COUNTER.load(Ordering::Relaxed)
}
