//! Audit timestamps filled automatically on insert and update.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Creation and modification timestamps of a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditFields {
    /// Set once on insert
    #[serde(default, with = "super::local_datetime")]
    pub created_time: Option<NaiveDateTime>,
    /// Refreshed on every write
    #[serde(default, with = "super::local_datetime")]
    pub updated_time: Option<NaiveDateTime>,
}

impl AuditFields {
    /// Fill both timestamps where they are still empty.
    pub fn fill_on_insert(&mut self, now: NaiveDateTime) {
        self.created_time.get_or_insert(now);
        self.updated_time.get_or_insert(now);
    }

    /// Refresh the modification timestamp.
    pub fn fill_on_update(&mut self, now: NaiveDateTime) {
        self.updated_time = Some(now);
    }
}

/// Entity carrying [`AuditFields`].
///
/// Repositories call [`Auditable::touch_insert`] and [`Auditable::touch_update`]
/// right before writing.
pub trait Auditable {
    /// Mutable access to the entity's audit fields.
    fn audit_fields_mut(&mut self) -> &mut AuditFields;

    /// Fill audit fields for an insert at the current local time.
    fn touch_insert(&mut self) {
        self.audit_fields_mut().fill_on_insert(Local::now().naive_local());
    }

    /// Fill audit fields for an update at the current local time.
    fn touch_update(&mut self) {
        self.audit_fields_mut().fill_on_update(Local::now().naive_local());
    }
}

impl Auditable for AuditFields {
    fn audit_fields_mut(&mut self) -> &mut AuditFields {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn test_insert_fills_only_empty_fields() {
        let mut fields = AuditFields {
            created_time: Some(day(1)),
            updated_time: None,
        };
        fields.fill_on_insert(day(2));
        assert_eq!(fields.created_time, Some(day(1)));
        assert_eq!(fields.updated_time, Some(day(2)));
    }

    #[test]
    fn test_update_always_refreshes() {
        let mut fields = AuditFields::default();
        fields.fill_on_insert(day(1));
        fields.fill_on_update(day(3));
        assert_eq!(fields.created_time, Some(day(1)));
        assert_eq!(fields.updated_time, Some(day(3)));
    }

    #[test]
    fn test_wire_format_drops_fractional_seconds() {
        let moment = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 5, 250)
            .unwrap();
        let fields = AuditFields {
            created_time: Some(moment),
            updated_time: None,
        };

        let json = serde_json::to_value(fields).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "createdTime": "2024-03-01T12:00:05", "updatedTime": null })
        );
    }

    #[test]
    fn test_wire_format_is_read_back() {
        let fields: AuditFields =
            serde_json::from_str(r#"{"createdTime":"2024-01-01T08:00:00","updatedTime":"2024-01-02T08:00:00.5"}"#)
                .unwrap();
        assert_eq!(fields.created_time, Some(day(1)));
        assert_eq!(
            fields.updated_time,
            Some(day(2) + chrono::Duration::milliseconds(500))
        );

        let empty: AuditFields = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, AuditFields::default());
    }

    #[test]
    fn test_touch_uses_current_time() {
        let mut fields = AuditFields::default();
        fields.touch_insert();
        assert!(fields.created_time.is_some());
        assert_eq!(fields.created_time, fields.updated_time);
    }
}
