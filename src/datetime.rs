//! Timestamps stored in `TIMESTAMP` columns and rendered as `YYYY-MM-DD HH:MM:SS`.

use time::{OffsetDateTime, PrimitiveDateTime, Time};

pub mod sql_datetime {
    use serde::{ser::Error as _, Serializer};
    use time::{macros::format_description, PrimitiveDateTime};

    pub fn serialize<S: Serializer>(
        value: &PrimitiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let text = value
            .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
            .map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub mod option {
        use serde::Serializer;
        use time::PrimitiveDateTime;

        pub fn serialize<S: Serializer>(
            value: &Option<PrimitiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// Current UTC wall-clock time truncated to whole seconds.
pub fn now_seconds() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    let time = Time::from_hms(now.hour(), now.minute(), now.second()).unwrap_or(Time::MIDNIGHT);
    PrimitiveDateTime::new(now.date(), time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use time::macros::datetime;

    #[derive(Serialize)]
    struct Stamp {
        #[serde(with = "sql_datetime")]
        at: PrimitiveDateTime,
        #[serde(with = "sql_datetime::option")]
        maybe: Option<PrimitiveDateTime>,
    }

    #[test]
    fn now_has_no_subsecond_part() {
        assert_eq!(now_seconds().nanosecond(), 0);
    }

    #[test]
    fn renders_sql_shape() {
        let stamp = Stamp {
            at: datetime!(2024-01-15 10:30:05),
            maybe: None,
        };
        let json = serde_json::to_value(&stamp).unwrap();
        assert_eq!(json["at"], "2024-01-15 10:30:05");
        assert!(json["maybe"].is_null());
    }
}
