//! Property-based tests for rule parsing, the date codec and occurrence
//! generation using proptest.
//!
//! These tests verify invariants that should hold for *any* valid input, not
//! just the specific scenarios in `generator_tests.rs`.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use proptest::prelude::*;
use recurrence_engine::{
    decode, encode, generate_dates, is_valid_rule, parse_rule, serialize_rule,
    FixedOffsetMinutes, GenerationRequest, RecurrenceSettings,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_freq() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("HOURLY"),
        Just("DAILY"),
        Just("WEEKLY"),
        Just("MONTHLY"),
        Just("YEARLY"),
    ]
}

fn arb_byday() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        Just(None),
        Just(Some("MO")),
        Just(Some("TU,TH")),
        Just(Some("MO,WE,FR")),
        Just(Some("SA,SU")),
        Just(Some("-1FR")),
        Just(Some("1MO,3WE")),
    ]
}

fn arb_bymonthday() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        Just(None),
        Just(Some("1")),
        Just(Some("-1")),
        Just(Some("15,31")),
        Just(Some("29")),
    ]
}

fn arb_setpos() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![Just(None), Just(Some("1")), Just(Some("-1")), Just(Some("2,-2"))]
}

/// A rule in canonical minimal form.
fn arb_rule() -> impl Strategy<Value = String> {
    (
        arb_freq(),
        1u32..=3,
        proptest::option::of(1u32..=30),
        arb_bymonthday(),
        arb_byday(),
        arb_setpos(),
    )
        .prop_map(|(freq, interval, count, bymonthday, byday, setpos)| {
            let mut rule = format!("FREQ={freq}");
            if interval > 1 {
                rule.push_str(&format!(";INTERVAL={interval}"));
            }
            if let Some(count) = count {
                rule.push_str(&format!(";COUNT={count}"));
            }
            if let Some(days) = bymonthday {
                rule.push_str(&format!(";BYMONTHDAY={days}"));
            }
            if let Some(days) = byday {
                rule.push_str(&format!(";BYDAY={days}"));
            }
            if let Some(positions) = setpos {
                rule.push_str(&format!(";BYSETPOS={positions}"));
            }
            rule
        })
}

/// A seed in 2015-2017 on a whole minute.
fn arb_seed() -> impl Strategy<Value = NaiveDateTime> {
    (2015i32..=2017, 1u32..=12, 1u32..=31, 0u32..=23, 0u32..=59).prop_filter_map(
        "valid calendar date",
        |(y, m, d, h, min)| NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(h, min, 0),
    )
}

fn arb_datetime() -> impl Strategy<Value = NaiveDateTime> {
    (1900i32..=2100, 1u32..=12, 1u32..=28, 0u32..=23, 0u32..=59, 0u32..=59).prop_filter_map(
        "valid date-time",
        |(y, m, d, h, min, s)| NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(h, min, s),
    )
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: output is strictly ascending and inside the effective window
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn output_is_ascending_unique_and_in_window(
        rule in arb_rule(),
        seed in arb_seed(),
        lead in 0i64..=400,
        span in 0i64..=60,
        duration_hours in 0i64..=72,
    ) {
        let min = seed + TimeDelta::days(lead);
        let max = min + TimeDelta::days(span);
        let end = seed + TimeDelta::hours(duration_hours);
        let request = GenerationRequest::new(rule.as_str(), seed, min, max).with_end(end);
        let dates = generate_dates(&request);

        for pair in dates.windows(2) {
            prop_assert!(pair[0] < pair[1], "not strictly ascending: {:?}", pair);
        }
        let window_start = min - TimeDelta::hours(duration_hours);
        for d in &dates {
            prop_assert!(*d >= window_start && *d <= max, "{} outside window", d);
            prop_assert!(*d >= seed, "{} before seed", d);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: invalid rules expand to nothing
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn invalid_rules_expand_to_nothing(
        source in "[A-Z=;,0-9-]{0,40}",
        seed in arb_seed(),
    ) {
        prop_assume!(!is_valid_rule(&source));
        let request = GenerationRequest::new(source, seed, seed, seed + TimeDelta::days(365));
        prop_assert!(generate_dates(&request).is_empty());
    }
}

// ---------------------------------------------------------------------------
// Property 3: decode(encode(dt)) == dt for a consistent offset
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn codec_round_trip(dt in arb_datetime(), offset in -720i32..=840) {
        let offsets = FixedOffsetMinutes(offset);
        let token = encode(dt, &offsets).expect("years 1900-2100 stay in range");
        prop_assert_eq!(decode(&token, &offsets), Ok(dt));
    }
}

// ---------------------------------------------------------------------------
// Property 4: serialize(parse(s)) == s for canonical rules
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn parse_serialize_is_idempotent(rule in arb_rule()) {
        let parsed = parse_rule(&rule).expect("generated rules are valid");
        let settings = RecurrenceSettings::from(&parsed);
        let written = serialize_rule(&settings, &FixedOffsetMinutes::UTC)
            .expect("generated UNTIL values fit a token")
            .expect("parsed rules have a frequency");
        prop_assert_eq!(&written, &rule);
        prop_assert_eq!(parse_rule(&written), Ok(parsed));
    }
}

// ---------------------------------------------------------------------------
// Property 5: COUNT keeps exactly the first N occurrences from the seed
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn count_keeps_first_occurrences(
        freq in prop_oneof![Just("DAILY"), Just("WEEKLY"), Just("MONTHLY")],
        byday in arb_byday(),
        count in 0u32..=20,
        seed in arb_seed(),
    ) {
        let mut base = format!("FREQ={freq}");
        if let Some(days) = byday {
            base.push_str(&format!(";BYDAY={days}"));
        }
        let max = seed + TimeDelta::days(3 * 365);
        let all = generate_dates(&GenerationRequest::new(base.as_str(), seed, seed, max));
        let counted = generate_dates(&GenerationRequest::new(
            format!("{base};COUNT={count}"),
            seed,
            seed,
            max,
        ));
        let expected: Vec<_> = all.into_iter().take(count as usize).collect();
        prop_assert_eq!(counted, expected);
    }
}

// ---------------------------------------------------------------------------
// Property 6: a far window sees the same counted occurrences as stepping
// every period from the seed
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn far_counted_window_matches_full_walk(
        freq in arb_freq(),
        interval in 1u32..=3,
        byday in arb_byday(),
        count in 0u32..=2000,
        seed in arb_seed(),
        lead in 0i64..=400,
        width in 1i64..=30,
    ) {
        let mut source = format!("FREQ={freq};COUNT={count}");
        if interval > 1 {
            source.push_str(&format!(";INTERVAL={interval}"));
        }
        if let Some(days) = byday {
            source.push_str(&format!(";BYDAY={days}"));
        }
        let min = seed + TimeDelta::days(lead);
        let max = min + TimeDelta::days(width);

        let rule = parse_rule(&source).expect("generated rules are valid");
        let walked: Vec<_> = rule
            .occurrences(seed, &FixedOffsetMinutes::UTC)
            .take_while(|dt| *dt <= max)
            .filter(|dt| *dt >= min)
            .collect();
        let windowed = generate_dates(&GenerationRequest::new(source.as_str(), seed, min, max));
        prop_assert_eq!(windowed, walked);
    }
}
