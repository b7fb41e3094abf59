use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod admin;
pub mod health;
pub mod matches;
pub mod public;
pub mod team;

/// Render a UTC instant as RFC 3339 with a trailing `Z`.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn timestamps_use_zulu_suffix() {
        assert_eq!(
            format_timestamp(datetime!(2025-05-10 20:15 UTC)),
            "2025-05-10T20:15:00Z"
        );
        assert_eq!(
            format_timestamp(datetime!(2025-05-10 22:15 +2)),
            "2025-05-10T20:15:00Z"
        );
    }
}
