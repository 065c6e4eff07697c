pub mod formats;

use flexi_logger::Logger;

use crate::Error;

/// Used when `RUST_LOG` is unset. Pool chatter stays at warn.
pub const DEFAULT_SPEC: &str = "info, sqlx=warn";

/// Logs go to stderr; stdout carries command output such as new ids.
pub fn init() -> Result<(), Error> {
    Logger::try_with_env_or_str(DEFAULT_SPEC)?
        .format(formats::cli_format)
        .log_to_stderr()
        .start()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use flexi_logger::LogSpecification;

    use super::*;

    #[test]
    fn default_spec_parses() {
        let spec = LogSpecification::parse(DEFAULT_SPEC).unwrap();
        assert!(
            spec.module_filters()
                .iter()
                .any(|f| f.module_name.as_deref() == Some("sqlx"))
        );
    }
}
