use chrono::{Duration, NaiveDate};
use sea_orm::entity::prelude::*;

/// Supported pay frequencies. Only biweekly pay is modelled today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum PayFrequency {
    #[sea_orm(string_value = "Biweekly")]
    Biweekly,
}

/// The singleton pay schedule (always row id 1): a biweekly anchor payday
/// used to project income windows. It is not a bill and generates no
/// occurrences of its own.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pay_schedule")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub frequency: PayFrequency,
    /// A known payday; every other payday is a whole number of 14-day steps
    /// away from it.
    pub anchor_date: NaiveDate,
}

impl Model {
    /// The 14-day pay window `[payday, payday + 13]` containing `today`.
    ///
    /// Uses euclidean division so days before the anchor still land in the
    /// window of the payday at or before them.
    pub fn pay_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let step = 14i64;
        let days = (today - self.anchor_date).num_days();
        let cycles = days.div_euclid(step);
        let start = self.anchor_date + Duration::days(step * cycles);
        (start, start + Duration::days(step - 1))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
