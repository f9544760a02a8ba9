//! Generate a deep work report for validation testing

use chrono::{Duration, TimeZone, Utc};
use synheart_deepwork::pipeline::activity_to_report_json;
use synheart_deepwork::{ActivityRecord, ActivityType};

fn main() {
    let mut records = Vec::new();

    for day in 8..=19 {
        let Some(morning) = Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).single() else {
            continue;
        };
        records.push(ActivityRecord::new(morning, 5400, ActivityType::Code, "Code"));
        records.push(ActivityRecord::new(
            morning + Duration::minutes(90),
            900,
            ActivityType::Communication,
            "Slack",
        ));
        records.push(ActivityRecord::new(
            morning + Duration::hours(5),
            3600,
            ActivityType::Meeting,
            "Zoom",
        ));
        records.push(ActivityRecord::new(
            morning + Duration::hours(6) + Duration::minutes(5),
            2700,
            ActivityType::Review,
            "GitHub",
        ));
    }

    let Some(now) = Utc.with_ymd_and_hms(2024, 1, 19, 18, 0, 0).single() else {
        return;
    };

    match activity_to_report_json(&records, now) {
        Ok(report) => print!("{report}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
