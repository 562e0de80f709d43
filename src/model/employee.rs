use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Employee {
    pub id: u64,
    pub employee_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[schema(format = "email", value_type = String)]
    pub email: String,
    pub job_role: Option<String>,
    pub organization: Option<String>,
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    pub status: Option<String>,
}
