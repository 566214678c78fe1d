use calorie_trend::models::MealRecord;
use calorie_trend::trend::{compute_trend, daily_totals};
use chrono::NaiveDate;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn record(day: &str, calories: f64) -> MealRecord {
    MealRecord::new("user-1", date(day), calories)
}

#[test]
fn empty_input_gives_seven_zero_points() {
    for reference in ["2024-01-05", "2023-03-01", "2024-12-31", "2000-02-29"] {
        let reference = date(reference);
        let trend = compute_trend(&[], "user-1", reference).unwrap();

        assert_eq!(trend.len(), 7);
        assert!(trend.iter().all(|p| p.calories == 0.0));
        assert_eq!(trend.last().unwrap().date, reference);
        assert!(trend.windows(2).all(|w| w[0].date.succ_opt() == Some(w[1].date)));
    }
}

#[test]
fn window_sum_matches_in_window_records() {
    let records = vec![
        record("2024-01-01", 320.0),
        record("2024-01-03", 410.5),
        record("2024-01-03", 89.5),
        record("2023-12-29", 999.0), // one day before the window
        record("2024-01-06", 555.0), // after the reference date
        record("2024-01-05", 1200.0),
    ];
    let trend = compute_trend(&records, "user-1", date("2024-01-05")).unwrap();

    let output: f64 = trend.iter().map(|p| p.calories).sum();
    assert_eq!(output, 320.0 + 410.5 + 89.5 + 1200.0);
}

#[test]
fn identical_inputs_give_identical_output() {
    let records = vec![record("2024-01-04", 300.0), record("2024-01-05", 700.0)];
    let first = compute_trend(&records, "user-1", date("2024-01-05")).unwrap();
    let second = compute_trend(&records, "user-1", date("2024-01-05")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn month_boundary_in_leap_and_common_years() {
    let leap = compute_trend(&[], "user-1", date("2024-03-02")).unwrap();
    assert_eq!(leap[0].date, date("2024-02-25"));
    assert!(leap.iter().any(|p| p.date == date("2024-02-29")));

    let common = compute_trend(&[], "user-1", date("2023-03-02")).unwrap();
    assert_eq!(common[0].date, date("2023-02-24"));
}

#[test]
fn duplicate_dates_are_summed() {
    let records = vec![record("2024-05-10", 300.0), record("2024-05-10", 450.0)];
    let trend = compute_trend(&records, "user-1", date("2024-05-12")).unwrap();

    let day = trend.iter().find(|p| p.date == date("2024-05-10")).unwrap();
    assert_eq!(day.calories, 750.0);
    assert_eq!(trend.iter().filter(|p| p.calories > 0.0).count(), 1);
}

#[test]
fn new_year_example() {
    let records = vec![
        record("2024-01-05", 500.0),
        record("2024-01-05", 200.0),
        record("2023-12-31", 1000.0),
    ];
    let trend = compute_trend(&records, "user-1", date("2024-01-05")).unwrap();

    assert_eq!(trend.len(), 7);
    let last = trend.last().unwrap();
    assert_eq!(last.label, "Fri");
    assert_eq!(last.calories, 700.0);

    let dec31 = trend.iter().find(|p| p.date == date("2023-12-31")).unwrap();
    assert_eq!(dec31.label, "Sun");
    assert_eq!(dec31.calories, 1000.0);

    let others: f64 = trend
        .iter()
        .filter(|p| p.date != date("2024-01-05") && p.date != date("2023-12-31"))
        .map(|p| p.calories)
        .sum();
    assert_eq!(others, 0.0);
}

#[test]
fn totals_and_trend_agree() {
    let records = vec![record("2024-01-02", 640.0), record("2024-01-04", 380.0)];
    let totals = daily_totals(&records, "user-1", date("2024-01-05")).unwrap();
    let trend = compute_trend(&records, "user-1", date("2024-01-05")).unwrap();

    for (total, point) in totals.iter().zip(&trend) {
        assert_eq!(total.date, point.date);
        assert_eq!(total.total_calories, point.calories);
    }
}
