use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{utc, utc_or_now};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeStatus {
    Pending,
    Paid,
    Overdue,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
}

impl FeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeStatus::Pending => "Pending",
            FeeStatus::Paid => "Paid",
            FeeStatus::Overdue => "Overdue",
            FeeStatus::PartiallyPaid => "Partially Paid",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "Pending" => Ok(FeeStatus::Pending),
            "Paid" => Ok(FeeStatus::Paid),
            "Overdue" => Ok(FeeStatus::Overdue),
            "Partially Paid" => Ok(FeeStatus::PartiallyPaid),
            _ => Err(AppError::Validation(format!("Unknown fee status: {}", s))),
        }
    }
}

impl fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fee {
    pub id: String,
    pub student_id: String,
    pub student_name: String, // Denormalized at write time, never re-synced
    pub fee_title: String,
    pub amount_due: f64,
    pub amount_paid: f64,
    pub due_date: String,
    pub status: FeeStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbFee {
    pub id: Option<String>,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub fee_title: Option<String>,
    pub amount_due: Option<f64>,
    pub amount_paid: Option<f64>,
    pub due_date: Option<String>,
    pub status: Option<String>,
    pub payment_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbFee> for Fee {
    fn from(db: DbFee) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            student_id: db.student_id.unwrap_or_default(),
            student_name: db.student_name.unwrap_or_default(),
            fee_title: db.fee_title.unwrap_or_default(),
            amount_due: db.amount_due.unwrap_or_default(),
            amount_paid: db.amount_paid.unwrap_or_default(),
            due_date: db.due_date.unwrap_or_default(),
            // Unknown stored statuses read back as Pending rather than failing the listing.
            status: db
                .status
                .as_deref()
                .and_then(|s| FeeStatus::parse(s).ok())
                .unwrap_or(FeeStatus::Pending),
            payment_date: utc(db.payment_date),
            notes: db.notes,
            created_at: utc_or_now(db.created_at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewFee {
    pub student_id: String,
    pub fee_title: String,
    pub amount_due: f64,
    pub amount_paid: Option<f64>,
    pub due_date: String,
    pub status: FeeStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FeePatch {
    pub fee_title: Option<String>,
    pub amount_due: Option<f64>,
    pub amount_paid: Option<f64>,
    pub due_date: Option<String>,
    pub status: Option<FeeStatus>,
    pub notes: Option<String>,
}

/// Amount and payment date a fee is stored with, after the status rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub amount_paid: f64,
    pub payment_date: Option<NaiveDateTime>,
}

/// Rules for a freshly created fee. The same rules as an edit apply, with
/// nothing paid when no amount is given: `Paid` is raised to `amount_due`
/// and dated, other statuses are undated, and overpayment is rejected.
pub fn settle_new_fee(
    status: FeeStatus,
    amount_due: f64,
    amount_paid: Option<f64>,
    now: NaiveDateTime,
) -> Result<Settlement, AppError> {
    settle_updated_fee(status, amount_due, amount_paid.unwrap_or(0.0), None, now)
}

/// Rules for an edited fee, applied to the merged record. `Paid` raises
/// `amount_paid` to `amount_due` and keeps or stamps a payment date; every
/// other status clears the payment date. Overpayment is rejected.
pub fn settle_updated_fee(
    status: FeeStatus,
    amount_due: f64,
    amount_paid: f64,
    payment_date: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Result<Settlement, AppError> {
    let settlement = match status {
        FeeStatus::Paid => Settlement {
            amount_paid: if amount_paid < amount_due {
                amount_due
            } else {
                amount_paid
            },
            payment_date: Some(payment_date.unwrap_or(now)),
        },
        _ => Settlement {
            amount_paid,
            payment_date: None,
        },
    };

    if settlement.amount_paid > amount_due {
        return Err(AppError::Validation(
            "Amount paid cannot exceed amount due".to_string(),
        ));
    }

    Ok(settlement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn paid_without_amount_is_paid_in_full() {
        let s = settle_new_fee(FeeStatus::Paid, 1500.0, None, now()).unwrap();
        assert_eq!(s.amount_paid, 1500.0);
        assert_eq!(s.payment_date, Some(now()));
    }

    #[test]
    fn paid_on_create_is_raised_to_amount_due() {
        let s = settle_new_fee(FeeStatus::Paid, 1000.0, Some(0.0), now()).unwrap();
        assert_eq!(s.amount_paid, 1000.0);
    }

    #[test]
    fn overpayment_is_rejected_on_create() {
        let err = settle_new_fee(FeeStatus::Pending, 1000.0, Some(5000.0), now());
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn other_statuses_have_no_payment_date() {
        for status in [
            FeeStatus::Pending,
            FeeStatus::Overdue,
            FeeStatus::PartiallyPaid,
        ] {
            let s = settle_new_fee(status, 1500.0, None, now()).unwrap();
            assert_eq!(s.amount_paid, 0.0);
            assert!(s.payment_date.is_none(), "{} should not be dated", status);
        }

        let partial = settle_new_fee(FeeStatus::PartiallyPaid, 1500.0, Some(500.0), now()).unwrap();
        assert_eq!(partial.amount_paid, 500.0);
    }

    #[test]
    fn marking_paid_on_update_tops_up_and_keeps_existing_date() {
        let earlier = now() - chrono::Duration::days(3);
        let s = settle_updated_fee(FeeStatus::Paid, 1000.0, 400.0, Some(earlier), now()).unwrap();
        assert_eq!(s.amount_paid, 1000.0);
        assert_eq!(s.payment_date, Some(earlier));
    }

    #[test]
    fn leaving_paid_clears_the_payment_date() {
        let s = settle_updated_fee(FeeStatus::Overdue, 1000.0, 0.0, Some(now()), now()).unwrap();
        assert!(s.payment_date.is_none());
    }

    #[test]
    fn overpayment_is_rejected() {
        let err = settle_updated_fee(FeeStatus::PartiallyPaid, 1000.0, 1200.0, None, now());
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn status_labels_round_trip_through_storage_text() {
        assert_eq!(
            FeeStatus::parse("Partially Paid").unwrap(),
            FeeStatus::PartiallyPaid
        );
        assert!(FeeStatus::parse("paid").is_err());
    }
}
