//! Built-in helpers available to every template.
//!
//! Timestamps are passed around as RFC 3339 strings, so date helpers chain:
//! `{{ timeToYear(addYear(now())) }}`. String helpers are registered both as
//! functions and as filters (`{{ kebabCase(name) }}` or `{{ name | kebabCase }}`).

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Datelike, FixedOffset, Local, Months, TimeDelta, Timelike};
use cruet::Inflector;
use minijinja::value::Rest;
use minijinja::{Environment, Error, ErrorKind};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt::Write;

const LOWER_LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER_LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
/// Password symbols; backslash and double quote are left out so generated
/// passwords can be pasted into quoted strings.
const SYMBOLS: &str = "~!@#$%^&*()_+`-={}|[]:<>?,./";
/// Upper bound, in bytes, on what a generating helper may produce.
const MAX_OUTPUT_LEN: usize = 16 * 1024 * 1024;

fn invalid(msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, msg.into())
}

/// Registers every helper into `env`.
pub fn register(env: &mut Environment<'_>) {
    env.add_function("env", env_var);
    env.add_function("hostname", hostname);
    env.add_function("username", username);

    env.add_function("time", time);
    env.add_function("now", now);
    env.add_function("addYear", add_year);
    env.add_function("addMonth", add_month);
    env.add_function("addDay", add_day);
    env.add_function("modifyYear", modify_year);
    env.add_function("modifyMonth", modify_month);
    env.add_function("modifyDay", modify_day);
    env.add_function("timeToRfc3339", time_to_rfc3339);
    env.add_function("timeToDay", |t: String| time_field(&t, |t| t.day()));
    env.add_function("timeToHour", |t: String| time_field(&t, |t| t.hour()));
    env.add_function("timeToMinute", |t: String| time_field(&t, |t| t.minute()));
    env.add_function("timeToMonth", |t: String| time_field(&t, |t| t.month()));
    env.add_function("timeToSecond", |t: String| time_field(&t, |t| t.second()));
    env.add_function("timeToYear", |t: String| time_field(&t, |t| t.year()));

    env.add_function("formatFilesize", format_filesize);
    env.add_function("password", password);
    env.add_function("randomBase64", random_base64);

    env.add_function("trimPrefix", trim_prefix);
    env.add_function("trimSuffix", trim_suffix);
    env.add_function("repeat", repeat);
    env.add_function("replace", replace);
    env.add_function("replaceAll", replace_all);

    let string_helpers: [(&'static str, fn(String) -> String); 10] = [
        ("toLower", to_lower),
        ("toUpper", to_upper),
        ("toTitle", to_upper),
        ("title", title_case),
        ("trimSpace", trim_space),
        ("kebabCase", kebab_case),
        ("snakeCase", snake_case),
        ("camelCase", camel_case),
        ("pascalCase", pascal_case),
        ("toBinary", to_binary),
    ];
    for (name, helper) in string_helpers {
        env.add_function(name, helper);
        env.add_filter(name, helper);
    }
}

fn to_lower(s: String) -> String {
    s.to_lowercase()
}

fn to_upper(s: String) -> String {
    s.to_uppercase()
}

fn title_case(s: String) -> String {
    title(&s)
}

fn trim_space(s: String) -> String {
    s.trim().to_string()
}

fn kebab_case(s: String) -> String {
    s.to_kebab_case()
}

fn snake_case(s: String) -> String {
    s.to_snake_case()
}

fn camel_case(s: String) -> String {
    s.to_camel_case()
}

fn pascal_case(s: String) -> String {
    s.to_pascal_case()
}

fn env_var(name: String) -> String {
    std::env::var(name).unwrap_or_default()
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_default()
}

fn username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "Unknown".to_string())
}

/// Current local time in a strftime format.
fn time(format: String) -> Result<String, Error> {
    let mut out = String::new();
    write!(out, "{}", Local::now().format(&format))
        .map_err(|_| invalid(format!("invalid time format '{format}'")))?;
    Ok(out)
}

fn now() -> String {
    Local::now().to_rfc3339()
}

fn parse_time(t: &str) -> Result<DateTime<FixedOffset>, Error> {
    DateTime::parse_from_rfc3339(t.trim())
        .map_err(|e| invalid(format!("'{t}' is not an RFC 3339 timestamp: {e}")))
}

fn shift_months(t: &str, months: i64) -> Result<String, Error> {
    let t = parse_time(t)?;
    let delta = u32::try_from(months.unsigned_abs())
        .map_err(|_| invalid(format!("cannot shift by {months} months")))?;
    let shifted = if months >= 0 {
        t.checked_add_months(Months::new(delta))
    } else {
        t.checked_sub_months(Months::new(delta))
    };
    shifted
        .map(|t| t.to_rfc3339())
        .ok_or_else(|| invalid(format!("shifting by {months} months is out of range")))
}

fn shift_days(t: &str, days: i64) -> Result<String, Error> {
    let t = parse_time(t)?;
    TimeDelta::try_days(days)
        .and_then(|delta| t.checked_add_signed(delta))
        .map(|t| t.to_rfc3339())
        .ok_or_else(|| invalid(format!("shifting by {days} days is out of range")))
}

fn add_year(t: String) -> Result<String, Error> {
    shift_months(&t, 12)
}

fn add_month(t: String) -> Result<String, Error> {
    shift_months(&t, 1)
}

fn add_day(t: String) -> Result<String, Error> {
    shift_days(&t, 1)
}

fn modify_year(count: i64, t: String) -> Result<String, Error> {
    let months = count.checked_mul(12).ok_or_else(|| invalid("year count is out of range"))?;
    shift_months(&t, months)
}

fn modify_month(count: i64, t: String) -> Result<String, Error> {
    shift_months(&t, count)
}

fn modify_day(count: i64, t: String) -> Result<String, Error> {
    shift_days(&t, count)
}

fn time_to_rfc3339(t: String) -> Result<String, Error> {
    parse_time(&t).map(|t| t.to_rfc3339())
}

fn time_field<T: ToString>(
    t: &str,
    field: impl Fn(&DateTime<FixedOffset>) -> T,
) -> Result<String, Error> {
    parse_time(t).map(|t| field(&t).to_string())
}

/// Binary representation of a decimal string; other input is returned as is.
pub fn to_binary(s: String) -> String {
    match s.trim().parse::<i64>() {
        Ok(n) => format!("{n:b}"),
        Err(_) => s,
    }
}

/// Human readable size, e.g. `1536` → `1.5 KB`.
pub fn format_filesize(size: f64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    let (mut value, mut unit) = (size, "bytes");
    for next in UNITS {
        if value.abs() < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}").replace(".0 ", " ")
}

/// Uppercases the first letter of every word.
pub fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if in_word {
                out.push(c);
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn trim_prefix(s: String, prefix: String) -> String {
    s.strip_prefix(prefix.as_str()).map(str::to_string).unwrap_or(s)
}

fn trim_suffix(s: String, suffix: String) -> String {
    s.strip_suffix(suffix.as_str()).map(str::to_string).unwrap_or(s)
}

fn repeat(s: String, count: usize) -> Result<String, Error> {
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_OUTPUT_LEN => Ok(s.repeat(count)),
        _ => Err(invalid(format!("repeat would produce more than {MAX_OUTPUT_LEN} bytes"))),
    }
}

/// Replaces the first `n` occurrences, all of them when `n` is negative.
fn replace(s: String, old: String, new: String, n: i64) -> String {
    match usize::try_from(n) {
        Ok(n) => s.replacen(old.as_str(), &new, n),
        Err(_) => s.replace(old.as_str(), &new),
    }
}

fn replace_all(s: String, old: String, new: String) -> String {
    s.replace(old.as_str(), &new)
}

/// `password(length, digits, symbols, [no_upper], [allow_repeat])`
fn password(length: usize, digits: usize, symbols: usize, flags: Rest<bool>) -> Result<String, Error> {
    let no_upper = flags.0.first().copied().unwrap_or(false);
    let allow_repeat = flags.0.get(1).copied().unwrap_or(false);
    generate_password(&mut rand::thread_rng(), length, digits, symbols, no_upper, allow_repeat)
        .map_err(invalid)
}

fn draw<R: Rng + ?Sized>(rng: &mut R, pool: &[char], count: usize, allow_repeat: bool, out: &mut Vec<char>) {
    if allow_repeat {
        out.extend((0..count).filter_map(|_| pool.choose(rng).copied()));
    } else {
        out.extend(pool.choose_multiple(rng, count).copied());
    }
}

/// Generates a password of `length` characters holding exactly `digits`
/// digits and `symbols` symbols; the rest are letters.
pub fn generate_password<R: Rng + ?Sized>(
    rng: &mut R,
    length: usize,
    digits: usize,
    symbols: usize,
    no_upper: bool,
    allow_repeat: bool,
) -> Result<String, String> {
    if length > MAX_OUTPUT_LEN {
        return Err(format!("password length exceeds {MAX_OUTPUT_LEN}"));
    }
    let letters = digits
        .checked_add(symbols)
        .and_then(|n| length.checked_sub(n))
        .ok_or("number of digits and symbols exceeds the password length")?;

    let mut letter_pool: Vec<char> = LOWER_LETTERS.chars().collect();
    if !no_upper {
        letter_pool.extend(UPPER_LETTERS.chars());
    }
    let digit_pool: Vec<char> = DIGITS.chars().collect();
    let symbol_pool: Vec<char> = SYMBOLS.chars().collect();

    if !allow_repeat {
        if letters > letter_pool.len() {
            return Err("not enough letters to avoid repeats".to_string());
        }
        if digits > digit_pool.len() {
            return Err("not enough digits to avoid repeats".to_string());
        }
        if symbols > symbol_pool.len() {
            return Err("not enough symbols to avoid repeats".to_string());
        }
    }

    let mut chars = Vec::with_capacity(length);
    draw(rng, &letter_pool, letters, allow_repeat, &mut chars);
    draw(rng, &digit_pool, digits, allow_repeat, &mut chars);
    draw(rng, &symbol_pool, symbols, allow_repeat, &mut chars);
    chars.shuffle(rng);

    Ok(chars.into_iter().collect())
}

/// Base64 encoding of `length` random bytes.
fn random_base64(length: usize) -> Result<String, Error> {
    if length > MAX_OUTPUT_LEN {
        return Err(invalid(format!("randomBase64 length exceeds {MAX_OUTPUT_LEN}")));
    }
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill(&mut bytes[..]);
    Ok(STANDARD.encode(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn render(source: &str) -> String {
        let mut env = Environment::new();
        register(&mut env);
        env.render_str(source, context! {}).unwrap()
    }

    #[test]
    fn case_helpers() {
        assert_eq!(render(r#"{{ kebabCase("MyProject") }}"#), "my-project");
        assert_eq!(render(r#"{{ "my-project" | snakeCase }}"#), "my_project");
        assert_eq!(render(r#"{{ toUpper("acme") }}"#), "ACME");
        assert_eq!(render(r#"{{ "hello big world" | title }}"#), "Hello Big World");
    }

    #[test]
    fn string_helpers() {
        assert_eq!(render(r#"{{ trimPrefix("v1.2", "v") }}"#), "1.2");
        assert_eq!(render(r#"{{ trimSuffix("main.rs", ".rs") }}"#), "main");
        assert_eq!(render(r#"{{ repeat("ab", 3) }}"#), "ababab");
        assert_eq!(render(r#"{{ replace("aaa", "a", "b", 2) }}"#), "bba");
        assert_eq!(render(r#"{{ replace("aaa", "a", "b", -1) }}"#), "bbb");
        assert_eq!(render(r#"{{ replaceAll("a-b-c", "-", "_") }}"#), "a_b_c");
    }

    #[test]
    fn date_helpers() {
        let t = "2024-01-31T10:20:30+00:00";
        assert_eq!(render(&format!(r#"{{{{ timeToYear(addYear("{t}")) }}}}"#)), "2025");
        assert_eq!(render(&format!(r#"{{{{ timeToMonth(modifyMonth(-2, "{t}")) }}}}"#)), "11");
        assert_eq!(render(&format!(r#"{{{{ timeToDay(addDay("{t}")) }}}}"#)), "1");
        assert_eq!(render(&format!(r#"{{{{ timeToMinute("{t}") }}}}"#)), "20");
    }

    #[test]
    fn date_helpers_reject_garbage() {
        let mut env = Environment::new();
        register(&mut env);
        assert!(env.render_str(r#"{{ addDay("yesterday") }}"#, context! {}).is_err());
    }

    #[test]
    fn binary_and_filesize() {
        assert_eq!(to_binary("5".to_string()), "101");
        assert_eq!(to_binary("five".to_string()), "five");
        assert_eq!(format_filesize(512.0), "512 bytes");
        assert_eq!(format_filesize(1536.0), "1.5 KB");
        assert_eq!(format_filesize(1048576.0), "1 MB");
    }

    #[test]
    fn password_composition() {
        let mut rng = rand::thread_rng();
        let password = generate_password(&mut rng, 16, 4, 2, false, false).unwrap();
        assert_eq!(password.chars().count(), 16);
        assert_eq!(password.chars().filter(char::is_ascii_digit).count(), 4);
        assert_eq!(password.chars().filter(|c| SYMBOLS.contains(*c)).count(), 2);

        let lower = generate_password(&mut rng, 10, 0, 0, true, true).unwrap();
        assert!(lower.chars().all(|c| c.is_ascii_lowercase()));

        assert!(generate_password(&mut rng, 4, 3, 3, false, false).is_err());
        assert!(generate_password(&mut rng, 20, 11, 0, false, false).is_err());
    }

    #[test]
    fn random_base64_length() {
        assert_eq!(random_base64(12).unwrap().len(), 16);
        assert_eq!(render("{{ randomBase64(3) | length }}"), "4");
    }

    #[test]
    fn oversized_output_is_a_render_error() {
        let mut env = Environment::new();
        register(&mut env);
        let huge = MAX_OUTPUT_LEN + 1;
        for source in [
            format!(r#"{{{{ repeat("ab", {huge}) }}}}"#),
            format!("{{{{ randomBase64({huge}) }}}}"),
            format!("{{{{ password({huge}, 0, 0, false, true) }}}}"),
        ] {
            let err = env.render_str(&source, context! {}).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidOperation, "{source}");
        }
        assert!(repeat("ab".to_string(), usize::MAX).is_err());
        assert!(generate_password(&mut rand::thread_rng(), 8, usize::MAX, 1, false, true).is_err());
    }
}
