//! A minimal `printf`-style formatter and the append-only [`OutputBuffer`]
//! it writes into. This is the in-scope realization of spec §4.2/§6: the
//! exact placeholder set `%c %s %S %d %u %b %<n>f %%`, nothing more.
//!
//! C's `va_list` becomes a typed `&[FormatArg]` slice — an explicit stand-in
//! for varargs that the type system can check, instead of trusting the
//! format string to describe the argument types correctly.

/// One formatter argument. Each placeholder in a format string consumes
/// exactly one of these, left to right.
#[derive(Debug, Clone, Copy)]
pub enum FormatArg<'a> {
    /// `%c` — a single byte, emitted as one char.
    Char(u8),
    /// `%s` — a string, emitted up to the first embedded NUL (if any),
    /// mirroring a C null-terminated string.
    Str(&'a str),
    /// `%S` — a length-delimited slice, emitted verbatim regardless of any
    /// embedded NUL. Combines the original's `(length, pointer)` pair into
    /// one typed argument.
    Slice(&'a str),
    /// `%d` — signed 32-bit decimal.
    Int(i32),
    /// `%u` — unsigned 32-bit decimal.
    UInt(u32),
    /// `%b` — boolean, emits `"true"`/`"false"`.
    Bool(bool),
    /// `%<n>f` / `%f` — 64-bit float, fixed-point.
    Float(f64),
}

/// An append-only textual sink with a fixed byte capacity. Writing past
/// capacity is a fatal internal error (spec §3, §7 tier 3), matching "it is
/// a fatal error if the cursor would exceed capacity."
pub struct OutputBuffer {
    data: String,
    capacity: usize,
}

impl OutputBuffer {
    pub fn new(capacity: usize) -> Self {
        OutputBuffer {
            data: String::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Formats `format` against `args` and appends the result.
    pub fn write(&mut self, format: &str, args: &[FormatArg<'_>]) {
        let mut rendered = String::new();
        format_into(&mut rendered, format, args);
        self.append(&rendered);
    }

    /// Appends a literal string with no formatting, for the large chunks of
    /// fixed generator boilerplate that have no placeholders to fill.
    pub fn write_str(&mut self, text: &str) {
        self.append(text);
    }

    fn append(&mut self, text: &str) {
        let new_len = self.data.len() + text.len();
        if new_len > self.capacity {
            panic!(
                "reflectc_fmt: output buffer overflow (index {} + {} bytes > capacity {})",
                self.data.len(),
                text.len(),
                self.capacity
            );
        }
        self.data.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data.into_bytes()
    }
}

/// Renders `format` against `args` into `out`. Exposed standalone (in
/// addition to [`OutputBuffer::write`]) so the generator can build a piece
/// of text before deciding how much buffer capacity it will need.
pub fn format_into(out: &mut String, format: &str, args: &[FormatArg<'_>]) {
    let mut chars = format.chars();
    let mut arg_index = 0usize;

    macro_rules! next_arg {
        () => {{
            let arg = args.get(arg_index).unwrap_or_else(|| {
                panic!(
                    "reflectc_fmt: ran out of arguments formatting `{format}` (wanted index {arg_index})"
                )
            });
            arg_index += 1;
            arg
        }};
    }

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('c') => match next_arg!() {
                FormatArg::Char(b) => out.push(*b as char),
                other => panic!("reflectc_fmt: %c requires FormatArg::Char, got {other:?}"),
            },
            Some('s') => match next_arg!() {
                FormatArg::Str(s) => {
                    let end = s.find('\0').unwrap_or(s.len());
                    out.push_str(&s[..end]);
                }
                other => panic!("reflectc_fmt: %s requires FormatArg::Str, got {other:?}"),
            },
            Some('S') => match next_arg!() {
                FormatArg::Slice(s) => out.push_str(s),
                other => panic!("reflectc_fmt: %S requires FormatArg::Slice, got {other:?}"),
            },
            Some('d') => match next_arg!() {
                FormatArg::Int(v) => out.push_str(&v.to_string()),
                other => panic!("reflectc_fmt: %d requires FormatArg::Int, got {other:?}"),
            },
            Some('u') => match next_arg!() {
                FormatArg::UInt(v) => out.push_str(&v.to_string()),
                other => panic!("reflectc_fmt: %u requires FormatArg::UInt, got {other:?}"),
            },
            Some('b') => match next_arg!() {
                FormatArg::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
                other => panic!("reflectc_fmt: %b requires FormatArg::Bool, got {other:?}"),
            },
            Some('f') => match next_arg!() {
                FormatArg::Float(v) => out.push_str(&format_fixed(*v, 1)),
                other => panic!("reflectc_fmt: %f requires FormatArg::Float, got {other:?}"),
            },
            Some(d) if d.is_ascii_digit() => {
                let digits = d.to_digit(10).expect("ascii digit") as usize;
                match chars.next() {
                    Some('f') => match next_arg!() {
                        FormatArg::Float(v) => out.push_str(&format_fixed(*v, digits)),
                        other => {
                            panic!("reflectc_fmt: %{digits}f requires FormatArg::Float, got {other:?}")
                        }
                    },
                    other => panic!("reflectc_fmt: malformed placeholder %{d}{other:?}"),
                }
            }
            Some(other) => panic!("reflectc_fmt: unknown placeholder %{other}"),
            None => panic!("reflectc_fmt: dangling % at end of format string"),
        }
    }
}

/// Renders `value` truncated (not rounded) to `digits` fractional digits,
/// matching `original_source/preprocessor/utils.cpp`'s
/// `float_to_string`, which casts `abs_value * 10^digits` to an integer.
/// Unlike the original, the fractional part is always zero-padded to
/// `digits` width, since spec.md's placeholder contract is "fixed-point
/// with n fractional digits" and a non-padded fraction would silently
/// drop leading zeros (e.g. `3.05` rendered as `3.5`).
fn format_fixed(value: f64, digits: usize) -> String {
    let is_neg = value.is_sign_negative() && value != 0.0;
    let abs_value = value.abs();
    let mul = 10i64.pow(digits as u32);
    let num_as_whole = (abs_value * mul as f64) as i64;
    let whole = num_as_whole / mul;
    let frac = num_as_whole % mul;
    let sign = if is_neg { "-" } else { "" };
    if digits == 0 {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}.{frac:0width$}", width = digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(format: &str, args: &[FormatArg<'_>]) -> String {
        let mut out = String::new();
        format_into(&mut out, format, args);
        out
    }

    #[test]
    fn literal_percent() {
        assert_eq!(render("100%%", &[]), "100%");
    }

    #[test]
    fn primitives() {
        assert_eq!(render("%d", &[FormatArg::Int(-7)]), "-7");
        assert_eq!(render("%u", &[FormatArg::UInt(7)]), "7");
        assert_eq!(render("%c", &[FormatArg::Char(b'x')]), "x");
        assert_eq!(render("%b", &[FormatArg::Bool(true)]), "true");
        assert_eq!(render("%b", &[FormatArg::Bool(false)]), "false");
    }

    #[test]
    fn strings() {
        assert_eq!(render("%s", &[FormatArg::Str("abc\0def")]), "abc");
        assert_eq!(render("%S", &[FormatArg::Slice("abc\0def")]), "abc\0def");
    }

    #[test]
    fn floats_default_precision_is_one() {
        assert_eq!(render("%f", &[FormatArg::Float(3.14)]), "3.1");
    }

    #[test]
    fn floats_explicit_precision_zero_pads() {
        assert_eq!(render("%2f", &[FormatArg::Float(3.25)]), "3.25");
        assert_eq!(render("%0f", &[FormatArg::Float(3.9)]), "3");
        assert_eq!(render("%3f", &[FormatArg::Float(-1.5)]), "-1.500");
    }

    #[test]
    #[should_panic(expected = "output buffer overflow")]
    fn overflow_is_fatal() {
        let mut buf = OutputBuffer::new(4);
        buf.write_str("12345");
    }
}
