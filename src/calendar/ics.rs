//! Minimal iCalendar (RFC 5545) writer.
//!
//! Lines end in CRLF, text values are escaped, and content lines longer
//! than 75 octets are folded without splitting a UTF-8 sequence.

use chrono::NaiveDateTime;

const MAX_LINE_OCTETS: usize = 75;
pub const PRODID: &str = "-//Ortho Portal//Patient Calendar//EN";

/// Escape a TEXT property value.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// Fold a content line to at most 75 octets per physical line.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            // The leading space of a continuation line counts toward the limit.
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out
}

/// UTC timestamp in basic format, e.g. `20260310T120000Z`.
pub fn format_utc(at: NaiveDateTime) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsAlarm {
    pub trigger: &'static str,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct IcsEvent {
    pub uid: String,
    pub stamp: NaiveDateTime,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub cancelled: bool,
    pub last_modified: Option<NaiveDateTime>,
    pub alarms: Vec<IcsAlarm>,
}

/// A VCALENDAR document under construction.
#[derive(Debug, Default)]
pub struct IcsCalendar {
    name: Option<String>,
    refresh_interval: Option<&'static str>,
    events: Vec<IcsEvent>,
}

impl IcsCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name (`X-WR-CALNAME`) for subscribed feeds.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Polling hint for subscribers, an RFC 5545 duration like `PT1H`.
    pub fn refresh_every(mut self, duration: &'static str) -> Self {
        self.refresh_interval = Some(duration);
        self
    }

    pub fn push(&mut self, event: IcsEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[IcsEvent] {
        &self.events
    }

    pub fn render(&self) -> String {
        let mut w = Writer::default();
        w.line("BEGIN:VCALENDAR");
        w.line("VERSION:2.0");
        w.line(&format!("PRODID:{PRODID}"));
        w.line("CALSCALE:GREGORIAN");
        w.line("METHOD:PUBLISH");
        if let Some(name) = &self.name {
            w.line(&format!("X-WR-CALNAME:{}", escape_text(name)));
        }
        if let Some(interval) = self.refresh_interval {
            w.line(&format!("REFRESH-INTERVAL;VALUE=DURATION:{interval}"));
            w.line(&format!("X-PUBLISHED-TTL:{interval}"));
        }
        for event in &self.events {
            write_event(&mut w, event);
        }
        w.line("END:VCALENDAR");
        w.finish()
    }
}

fn write_event(w: &mut Writer, event: &IcsEvent) {
    w.line("BEGIN:VEVENT");
    w.line(&format!("UID:{}", event.uid));
    w.line(&format!("DTSTAMP:{}", format_utc(event.stamp)));
    w.line(&format!("DTSTART:{}", format_utc(event.start)));
    w.line(&format!("DTEND:{}", format_utc(event.end)));
    if let Some(modified) = event.last_modified {
        w.line(&format!("LAST-MODIFIED:{}", format_utc(modified)));
    }
    w.line(&format!("SUMMARY:{}", escape_text(&event.summary)));
    if let Some(description) = &event.description {
        w.line(&format!("DESCRIPTION:{}", escape_text(description)));
    }
    if let Some(location) = &event.location {
        w.line(&format!("LOCATION:{}", escape_text(location)));
    }
    w.line(if event.cancelled {
        "STATUS:CANCELLED"
    } else {
        "STATUS:CONFIRMED"
    });
    if !event.cancelled {
        for alarm in &event.alarms {
            w.line("BEGIN:VALARM");
            w.line(&format!("TRIGGER:{}", alarm.trigger));
            w.line("ACTION:DISPLAY");
            w.line(&format!("DESCRIPTION:{}", escape_text(&alarm.description)));
            w.line("END:VALARM");
        }
    }
    w.line("END:VEVENT");
}

#[derive(Default)]
struct Writer {
    buf: String,
}

impl Writer {
    fn line(&mut self, content: &str) {
        self.buf.push_str(&fold_line(content));
        self.buf.push_str("\r\n");
    }

    fn finish(self) -> String {
        self.buf
    }
}
