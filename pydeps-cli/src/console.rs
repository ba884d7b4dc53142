use std::env;
use std::io::{self, IsTerminal};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Dim,
    Title,
    Warning,
    Failure,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Dim => "2",
            Style::Title => "36",
            Style::Warning => "33",
            Style::Failure => "31",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Colour is used only on a terminal and only while `NO_COLOR` is unset.
fn color_enabled(stream: Stream) -> bool {
    static NO_COLOR: OnceLock<bool> = OnceLock::new();
    static STDOUT_TTY: OnceLock<bool> = OnceLock::new();
    static STDERR_TTY: OnceLock<bool> = OnceLock::new();

    if *NO_COLOR.get_or_init(|| env::var_os("NO_COLOR").is_some()) {
        return false;
    }

    match stream {
        Stream::Stdout => *STDOUT_TTY.get_or_init(|| io::stdout().is_terminal()),
        Stream::Stderr => *STDERR_TTY.get_or_init(|| io::stderr().is_terminal()),
    }
}

fn styled(enabled: bool, style: Style, text: &str) -> String {
    if enabled {
        format!("\u{1b}[{}m{}\u{1b}[0m", style.code(), text)
    } else {
        text.to_string()
    }
}

/// Dimmed text for lines written to stdout.
pub fn dim(text: &str) -> String {
    styled(color_enabled(Stream::Stdout), Style::Dim, text)
}

pub fn header(command: &str) {
    let banner = format!("pydeps {} v{}", command, env!("CARGO_PKG_VERSION"));
    eprintln!("{}", styled(color_enabled(Stream::Stderr), Style::Dim, &banner));
    eprintln!();
}

pub fn section(title: &str) {
    println!();
    println!("{}", styled(color_enabled(Stream::Stdout), Style::Title, title));
}

pub fn warn(message: &str) {
    tagged(Style::Warning, "warn", message);
}

pub fn error(message: &str) {
    tagged(Style::Failure, "error", message);
}

fn tagged(style: Style, tag: &str, message: &str) {
    let tag = styled(color_enabled(Stream::Stderr), style, tag);
    eprintln!("{} {}", tag, message);
}

pub fn info(message: &str) {
    println!("{}", message);
}
