//! Fuzz testing for input validation.
//!
//! Every validator must return `Ok` or `Err` for any input and never panic,
//! including on multi-byte characters at length boundaries.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_validation -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use mirror_of_dreams::models::ReflectionAnswers;
use mirror_of_dreams::validation::{
    validate_dream_description, validate_dream_title, validate_email, validate_name,
    validate_password, validate_reflection_answers,
};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let _ = validate_email(s);
    let _ = validate_password(s);
    let _ = validate_name(s);
    let _ = validate_dream_title(s);
    let _ = validate_dream_description(s);

    // Split the input across the four answers
    let mut parts = s.splitn(4, '\n').map(str::to_string);
    let answers = ReflectionAnswers {
        dream: parts.next().unwrap_or_default(),
        plan: parts.next().unwrap_or_default(),
        relationship: parts.next().unwrap_or_default(),
        offering: parts.next().unwrap_or_default(),
    };
    let _ = validate_reflection_answers(&answers);
});
