/// Day names indexed by `day_of_week` (0 = Sunday).
pub const DAYS_OF_WEEK: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Highest valid `day_of_week` value.
pub const MAX_DAY_OF_WEEK: u8 = 6;

/// Months are stored 1-based.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Display name for a `day_of_week` value.
pub fn day_name(day_of_week: u8) -> &'static str {
    DAYS_OF_WEEK
        .get(usize::from(day_of_week))
        .copied()
        .unwrap_or("unknown day")
}
