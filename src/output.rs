//! Coloured terminal output
//!
//! All termcolor operations use `let _ =` to deliberately ignore errors.
//! Colour and status lines are decorative; if stdout/stderr is a broken pipe
//! or not a TTY the program carries on without them. The JSON printer is the
//! exception: its output is the command result, so write errors propagate.

use std::io::{self, Write};
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Print a green `✓` line on stdout
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {{
        use std::io::Write as _;
        use termcolor::WriteColor as _;
        let bufwtr = termcolor::BufferWriter::stdout(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Green)));
        let _ = write!(&mut buffer, "✓ ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print a red `✗` line on stderr
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        use std::io::Write as _;
        use termcolor::WriteColor as _;
        let bufwtr = termcolor::BufferWriter::stderr(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Red)));
        let _ = write!(&mut buffer, "✗ ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print an indented cyan command suggestion on stderr
#[macro_export]
macro_rules! hint {
    ($($arg:tt)*) => {{
        use std::io::Write as _;
        use termcolor::WriteColor as _;
        let bufwtr = termcolor::BufferWriter::stderr(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = write!(&mut buffer, "  ");
        let _ = buffer.set_color(termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Cyan)));
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = buffer.reset();
        let _ = bufwtr.print(&buffer);
    }};
}

/// Bold heading surrounded by blank lines.
pub fn heading(text: &str) {
    let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    let _ = writeln!(&mut buffer);
    let _ = buffer.set_color(ColorSpec::new().set_bold(true));
    let _ = writeln!(&mut buffer, "{text}");
    let _ = buffer.reset();
    let _ = writeln!(&mut buffer);
    let _ = bufwtr.print(&buffer);
}

pub fn dim(text: &str) {
    let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    let _ = buffer.set_color(ColorSpec::new().set_dimmed(true));
    let _ = writeln!(&mut buffer, "{text}");
    let _ = buffer.reset();
    let _ = bufwtr.print(&buffer);
}

pub fn notice(text: &str) {
    let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
    let _ = writeln!(&mut buffer, "{text}");
    let _ = buffer.reset();
    let _ = bufwtr.print(&buffer);
}

/// `label` followed by `value` in green, or `not set` in red.
pub fn setting_line(label: &str, value: Option<&str>) {
    let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    let _ = write!(&mut buffer, "{label:<11}");
    match value {
        Some(v) => {
            let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
            let _ = write!(&mut buffer, "{v}");
        }
        None => {
            let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
            let _ = write!(&mut buffer, "not set");
        }
    }
    let _ = buffer.reset();
    let _ = writeln!(&mut buffer);
    let _ = bufwtr.print(&buffer);
}

/// Progress line on stderr so stdout stays machine-readable.
pub fn progress(text: &str) {
    let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    let _ = buffer.set_color(ColorSpec::new().set_dimmed(true));
    let _ = writeln!(&mut buffer, "{text}");
    let _ = buffer.reset();
    let _ = bufwtr.print(&buffer);
}

/// Pretty-print `value` as two-space indented JSON on stdout.
pub fn print_json(value: &serde_json::Value) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write_json(&mut stdout, value)?;
    stdout.flush()
}

pub fn write_json<W: Write>(out: &mut W, value: &serde_json::Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_indented_with_two_spaces() {
        let mut out = Vec::new();
        write_json(&mut out, &serde_json::json!({"status": "VALID"})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"status\": \"VALID\"\n}\n");
    }
}
