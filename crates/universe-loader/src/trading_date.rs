use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};

/// The most recent trading date to request data for: today's intraday session isn't
/// final yet, so this always steps back at least one day. Monday steps back to the prior
/// Friday (3 days) and Sunday steps back to Friday (2 days); every other day steps back 1.
pub fn most_recent_trading_date() -> NaiveDate {
    trading_date_for(Utc::now().date_naive())
}

fn trading_date_for(today: NaiveDate) -> NaiveDate {
    let days_back = match today.weekday() {
        Weekday::Sun => 2,
        Weekday::Mon => 3,
        _ => 1,
    };
    today - Duration::days(days_back)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunday_rolls_back_to_friday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(trading_date_for(sunday).weekday(), Weekday::Fri);
    }

    #[test]
    fn monday_rolls_back_to_prior_friday() {
        let monday = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let resolved = trading_date_for(monday);
        assert_eq!(resolved.weekday(), Weekday::Fri);
        assert_eq!(monday - resolved, Duration::days(3));
    }

    #[test]
    fn ordinary_weekday_steps_back_one_day() {
        let tuesday = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        assert_eq!(trading_date_for(tuesday), tuesday - Duration::days(1));
    }

    #[test]
    fn saturday_steps_back_one_day() {
        let saturday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(trading_date_for(saturday), saturday - Duration::days(1));
    }
}
