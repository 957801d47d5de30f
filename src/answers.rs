use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::datetime::sql_datetime;

/// Row of `user_answer`. Lives independently of its user; nothing cascades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Answer {
    pub id: i64,
    pub user_id: String,
    pub question_id: i64,
    pub body: String,
    #[serde(with = "sql_datetime")]
    pub created_at: PrimitiveDateTime,
}
