use nu_ansi_term::Color::{Blue, Magenta, Red, Yellow};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields,
    },
    registry::LookupSpan,
};

use crate::{cli::Args, utils::Colored};

/// Pulls the `message` field out of an event, leaving the structured
/// fields to the journal; the terminal line is the message alone.
#[derive(Default)]
struct MessageOnly {
    message: Option<String>,
}

impl tracing::field::Visit for MessageOnly {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}

/// Terminal formatter: info lines print bare, every other level gets a
/// colored prefix.
struct LevelPrefixFormatter;

impl<S, N> FormatEvent<S, N> for LevelPrefixFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = MessageOnly::default();
        event.record(&mut visitor);

        match *event.metadata().level() {
            Level::INFO => {}
            Level::TRACE => write!(writer, "{} ", Colored(Magenta, "trace:"))?,
            Level::DEBUG => write!(writer, "{} ", Colored(Blue, "debug:"))?,
            Level::WARN => write!(writer, "{} ", Colored(Yellow, "warning:"))?,
            Level::ERROR => write!(writer, "{} ", Colored(Red, "error:"))?,
        }

        match visitor.message {
            Some(message) => writeln!(writer, "{message}"),
            None => writeln!(writer),
        }
    }
}

pub fn setup_logging(args: &Args) {
    let filter_level = if args.quiet {
        Level::ERROR
    } else if args.verbose >= 2 {
        Level::TRACE
    } else if args.verbose == 1 {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(format!("perk={filter_level}"))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .without_time()
        .event_format(LevelPrefixFormatter)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
