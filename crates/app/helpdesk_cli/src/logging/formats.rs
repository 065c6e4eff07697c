use std::io::Write;

use flexi_logger::{DeferredNow, TS_DASHES_BLANK_COLONS_DOT_BLANK, style};
use log::Record;

/// `2026-01-01 12:00:00.000 +00:00 INFO [helpdesk_core::db] message`
pub fn cli_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    write!(
        w,
        "{} {} [{}] {}",
        now.format(TS_DASHES_BLANK_COLONS_DOT_BLANK),
        style(level).paint(level.to_string()),
        record.module_path().unwrap_or("<unnamed>"),
        record.args()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_module_and_message() {
        let mut out = Vec::new();
        let mut now = DeferredNow::new();
        let record = Record::builder()
            .args(format_args!("pool closed"))
            .level(log::Level::Info)
            .module_path(Some("helpdesk_core::db"))
            .build();

        cli_format(&mut out, &mut now, &record).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.contains("[helpdesk_core::db] pool closed"));
    }
}
