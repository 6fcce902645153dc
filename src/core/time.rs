use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Backend timestamps are nanoseconds since the Unix epoch.
pub(crate) fn from_backend_nanos(nanos: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos)).ok()
}

pub(crate) fn format_offset(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

/// RFC 3339 rendering of a backend timestamp.
pub(crate) fn format_backend_nanos(nanos: i64) -> Option<String> {
    from_backend_nanos(nanos).map(format_offset)
}
