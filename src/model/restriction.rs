//! `range`, `length` and `pattern` restrictions of built-in types.
//!
//! Interval bounds are kept as `i128`. Decimal64 values are scaled by
//! `10^fraction-digits`, so every built-in numeric type fits.

use regex::Regex;

/// Closed interval of allowed values.
pub type Interval = (i128, i128);

/// Values a built-in numeric type can hold. `decimal64` bounds are in
/// units of its fraction digits.
pub fn numeric_bounds(builtin: &str) -> Option<Interval> {
    let bounds: Interval = match builtin {
        "int8" => (i8::MIN.into(), i8::MAX.into()),
        "int16" => (i16::MIN.into(), i16::MAX.into()),
        "int32" => (i32::MIN.into(), i32::MAX.into()),
        "int64" | "decimal64" => (i64::MIN.into(), i64::MAX.into()),
        "uint8" => (0, u8::MAX.into()),
        "uint16" => (0, u16::MAX.into()),
        "uint32" => (0, u32::MAX.into()),
        "uint64" => (0, u64::MAX.into()),
        _ => return None,
    };
    Some(bounds)
}

/// Lengths a `string` or `binary` can have.
pub const LENGTH_BOUNDS: Interval = (0, u64::MAX as i128);

/// Which restriction statements a built-in type accepts.
pub fn accepts_range(builtin: &str) -> bool {
    numeric_bounds(builtin).is_some()
}

pub fn accepts_length(builtin: &str) -> bool {
    matches!(builtin, "string" | "binary")
}

pub fn accepts_pattern(builtin: &str) -> bool {
    builtin == "string"
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bound {
    Min,
    Max,
    Value(i128),
}

#[derive(Debug)]
struct Part<'a> {
    text: &'a str,
    low: Bound,
    high: Bound,
}

fn parse_number(text: &str, scale: u32) -> Result<i128, String> {
    let invalid = || format!("'{text}' is not a valid number");
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) if scale > 0 => (whole, fraction),
        Some(_) => return Err(invalid()),
        None => (digits, ""),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || (digits.contains('.') && !all_digits(fraction)) {
        return Err(invalid());
    }
    if fraction.len() > scale as usize {
        return Err(format!("'{text}' has more than {scale} fraction digits"));
    }

    let too_large = || format!("'{text}' is out of range");
    let mut value: i128 = 0;
    for b in whole.bytes().chain(fraction.bytes()) {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(i128::from(b - b'0')))
            .ok_or_else(too_large)?;
    }
    let padding = scale as usize - fraction.len();
    for _ in 0..padding {
        value = value.checked_mul(10).ok_or_else(too_large)?;
    }
    Ok(if negative { -value } else { value })
}

fn parse_bound(text: &str, scale: u32) -> Result<Bound, String> {
    match text {
        "min" => Ok(Bound::Min),
        "max" => Ok(Bound::Max),
        _ => parse_number(text, scale).map(Bound::Value),
    }
}

fn parse_parts(text: &str, scale: u32) -> Result<Vec<Part<'_>>, String> {
    text.split('|')
        .map(|part| {
            let part = part.trim();
            let (low, high) = match part.split_once("..") {
                Some((low, high)) => (parse_bound(low.trim(), scale)?, parse_bound(high.trim(), scale)?),
                None => {
                    let single = parse_bound(part, scale)?;
                    (single, single)
                }
            };
            Ok(Part { text: part, low, high })
        })
        .collect()
}

/// Parses a `range` or `length` argument and narrows `parent` with it.
///
/// `min` and `max` stand for the lowest and highest value `parent`
/// allows. The parts must be ascending and disjoint, and each must lie
/// within one interval of `parent`.
pub fn narrow(text: &str, scale: u32, parent: &[Interval]) -> Result<Vec<Interval>, String> {
    let (Some(&(lowest, _)), Some(&(_, highest))) = (parent.first(), parent.last()) else {
        return Err("base type allows no values".to_string());
    };
    let value = |bound: Bound| match bound {
        Bound::Min => lowest,
        Bound::Max => highest,
        Bound::Value(v) => v,
    };

    let mut intervals: Vec<Interval> = Vec::new();
    for part in parse_parts(text, scale)? {
        let (low, high) = (value(part.low), value(part.high));
        if low > high {
            return Err(format!("'{}' is descending", part.text));
        }
        if intervals.last().is_some_and(|&(_, previous)| low <= previous) {
            return Err(format!("'{}' does not follow the previous part in ascending order", part.text));
        }
        if !parent.iter().any(|&(pl, ph)| pl <= low && high <= ph) {
            return Err(format!("'{}' is outside of what the base type allows", part.text));
        }
        intervals.push((low, high));
    }
    Ok(intervals)
}

// ============================================================================
// PATTERNS
// ============================================================================

/// Code point ranges of the Unicode blocks XSD `\p{Is...}` escapes most
/// commonly name. The regex engine knows scripts, not blocks.
const BLOCKS: [(&str, u32, u32); 16] = [
    ("BasicLatin", 0x0000, 0x007F),
    ("Latin-1Supplement", 0x0080, 0x00FF),
    ("LatinExtended-A", 0x0100, 0x017F),
    ("LatinExtended-B", 0x0180, 0x024F),
    ("IPAExtensions", 0x0250, 0x02AF),
    ("GreekandCoptic", 0x0370, 0x03FF),
    ("Cyrillic", 0x0400, 0x04FF),
    ("Hebrew", 0x0590, 0x05FF),
    ("Arabic", 0x0600, 0x06FF),
    ("GeneralPunctuation", 0x2000, 0x206F),
    ("CJKUnifiedIdeographs", 0x4E00, 0x9FFF),
    ("HangulSyllables", 0xAC00, 0xD7AF),
    ("PrivateUseArea", 0xE000, 0xF8FF),
    ("AlphabeticPresentationForms", 0xFB00, 0xFB4F),
    ("HalfwidthandFullwidthForms", 0xFF00, 0xFFEF),
    ("Specials", 0xFFF0, 0xFFFF),
];

const NAME_START: &str = r"_:A-Za-z\x{C0}-\x{D6}\x{D8}-\x{F6}\x{F8}-\x{2FF}\x{370}-\x{37D}\x{37F}-\x{1FFF}";
const NAME_CHAR: &str = r"\-.0-9\x{B7}_:A-Za-z\x{C0}-\x{D6}\x{D8}-\x{F6}\x{F8}-\x{37D}\x{37F}-\x{1FFF}";

/// Translates an XSD regular expression to the host regex dialect.
///
/// XSD patterns are implicitly anchored, treat `^` and `$` outside
/// classes as literals, write class subtraction as `[a-z-[aeiou]]` and
/// have the `\i`/`\c` name escapes and `\p{Is...}` block escapes.
pub fn translate_pattern(xsd: &str) -> Result<String, String> {
    let mut out = String::with_capacity(xsd.len() + 8);
    out.push_str("^(?:");
    let mut depth = 0usize;
    let mut chars = xsd.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(escaped) = chars.next() else {
                    return Err("pattern ends with a lone '\\'".to_string());
                };
                let inside = depth > 0;
                match escaped {
                    'i' | 'c' => {
                        let set = if escaped == 'i' { NAME_START } else { NAME_CHAR };
                        if inside {
                            out.push_str(set);
                        } else {
                            out.push('[');
                            out.push_str(set);
                            out.push(']');
                        }
                    }
                    'I' | 'C' if inside => {
                        return Err(format!("'\\{escaped}' inside a character class is not supported"));
                    }
                    'I' | 'C' => {
                        let set = if escaped == 'I' { NAME_START } else { NAME_CHAR };
                        out.push_str("[^");
                        out.push_str(set);
                        out.push(']');
                    }
                    'p' | 'P' if chars.peek() == Some(&'{') => {
                        let mut name = String::new();
                        chars.next();
                        for n in chars.by_ref() {
                            if n == '}' {
                                break;
                            }
                            name.push(n);
                        }
                        out.push_str(&property(escaped == 'P', &name, inside)?);
                    }
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            '[' => {
                depth += 1;
                out.push('[');
            }
            ']' if depth > 0 => {
                depth -= 1;
                out.push(']');
            }
            '-' if depth > 0 && chars.peek() == Some(&'[') => out.push_str("--"),
            '&' | '~' if depth > 0 => {
                out.push('\\');
                out.push(c);
            }
            '^' | '$' if depth == 0 => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out.push_str(")$");
    Ok(out)
}

fn property(negated: bool, name: &str, inside: bool) -> Result<String, String> {
    let block = name
        .strip_prefix("Is")
        .and_then(|block| BLOCKS.iter().find(|(known, _, _)| *known == block));
    let Some(&(_, start, end)) = block else {
        let escape = if negated { 'P' } else { 'p' };
        return Ok(format!("\\{escape}{{{name}}}"));
    };
    let range = format!("\\x{{{start:X}}}-\\x{{{end:X}}}");
    match (negated, inside) {
        (false, true) => Ok(range),
        (false, false) => Ok(format!("[{range}]")),
        (true, false) => Ok(format!("[^{range}]")),
        (true, true) => Err(format!("'\\P{{{name}}}' inside a character class is not supported")),
    }
}

/// Compiles an XSD pattern, reporting why it is not a valid regex.
pub fn compile_pattern(xsd: &str) -> Result<Regex, String> {
    let translated = translate_pattern(xsd)?;
    Regex::new(&translated).map_err(|e| e.to_string())
}
