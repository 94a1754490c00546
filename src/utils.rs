use std::borrow::Cow;
use std::io::Write;

/// Stderr counter that repaints itself every `interval` increments.
pub struct ProgressCounter {
    label: &'static str,
    interval: u64,
    count: u64,
    enabled: bool,
}

impl ProgressCounter {
    pub fn new(label: &'static str, interval: u64, enabled: bool) -> Self {
        let counter = Self {
            label,
            interval: interval.max(1),
            count: 0,
            enabled,
        };
        counter.print();
        counter
    }

    pub fn inc(&mut self) {
        self.count += 1;
        if self.count % self.interval == 0 {
            self.print();
        }
    }

    pub fn finish(&self) {
        if self.enabled {
            self.print();
            eprintln!();
        }
    }

    fn print(&self) {
        if !self.enabled {
            return;
        }
        eprint!("\r{}: {}", self.label, self.count);
        let _ = std::io::stderr().flush();
    }
}

/// Escape text for an XML attribute value.
///
/// The five XML special characters become entities. Tab, line feed and
/// carriage return become character references so readers do not normalize
/// them to spaces; other C0 control characters are not allowed in XML 1.0
/// and are dropped.
pub fn escape_xml(value: &str) -> Cow<'_, str> {
    if !value.chars().any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'') || c.is_ascii_control()) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' => escaped.push_str("&#9;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            c if c < ' ' => {}
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}
