//! End of support life dates for the OS families the OSV detector covers.

use chrono::{DateTime, NaiveDate, Utc};

use super::ospkg::normalize_os_version;

type EolEntry = (&'static str, (i32, u32, u32));

const ALPINE: &[EolEntry] = &[
    ("2.0", (2012, 4, 1)),
    ("2.1", (2012, 11, 1)),
    ("2.2", (2013, 5, 1)),
    ("2.3", (2013, 11, 1)),
    ("2.4", (2014, 5, 1)),
    ("2.5", (2014, 11, 1)),
    ("2.6", (2015, 5, 1)),
    ("2.7", (2015, 11, 1)),
    ("3.0", (2016, 5, 1)),
    ("3.1", (2016, 11, 1)),
    ("3.2", (2017, 5, 1)),
    ("3.3", (2017, 11, 1)),
    ("3.4", (2018, 5, 1)),
    ("3.5", (2018, 11, 1)),
    ("3.6", (2019, 5, 1)),
    ("3.7", (2019, 11, 1)),
    ("3.8", (2020, 5, 1)),
    ("3.9", (2020, 11, 1)),
    ("3.10", (2021, 5, 1)),
    ("3.11", (2021, 11, 1)),
    ("3.12", (2022, 5, 1)),
    ("3.13", (2022, 11, 1)),
    ("3.14", (2023, 5, 1)),
    ("3.15", (2023, 11, 1)),
    ("3.16", (2024, 5, 23)),
    ("3.17", (2024, 11, 22)),
    ("3.18", (2025, 5, 9)),
    ("3.19", (2025, 11, 1)),
    ("3.20", (2026, 4, 1)),
    ("3.21", (2026, 11, 1)),
    ("3.22", (2027, 5, 1)),
];

const DEBIAN: &[EolEntry] = &[
    ("7", (2018, 5, 31)),
    ("8", (2020, 6, 30)),
    ("9", (2022, 6, 30)),
    ("10", (2024, 6, 30)),
    ("11", (2026, 8, 31)),
    ("12", (2028, 6, 30)),
    ("13", (2030, 6, 30)),
];

const UBUNTU: &[EolEntry] = &[
    ("14.04", (2019, 4, 25)),
    ("16.04", (2021, 4, 30)),
    ("18.04", (2023, 5, 31)),
    ("19.10", (2020, 7, 17)),
    ("20.04", (2025, 5, 31)),
    ("20.10", (2021, 7, 22)),
    ("21.04", (2022, 1, 20)),
    ("21.10", (2022, 7, 14)),
    ("22.04", (2027, 6, 1)),
    ("22.10", (2023, 7, 20)),
    ("23.04", (2024, 1, 25)),
    ("23.10", (2024, 7, 11)),
    ("24.04", (2029, 6, 1)),
    ("24.10", (2025, 7, 10)),
];

/// Returns the end of support life date for an OS version, if known.
pub fn end_of_life_date(os_family: &str, os_name: &str) -> Option<NaiveDate> {
    let table = match os_family {
        "alpine" => ALPINE,
        "debian" => DEBIAN,
        "ubuntu" => UBUNTU,
        _ => return None,
    };
    let version = normalize_os_version(os_family, os_name);
    let (_, (y, m, d)) = table.iter().find(|(v, _)| *v == version)?;
    NaiveDate::from_ymd_opt(*y, *m, *d)
}

/// Whether the OS version has passed its end of support life at `now`.
///
/// Versions missing from the table are treated as supported.
pub fn is_end_of_life(os_family: &str, os_name: &str, now: DateTime<Utc>) -> bool {
    end_of_life_date(os_family, os_name)
        .map(|eol| now.date_naive() > eol)
        .unwrap_or(false)
}
