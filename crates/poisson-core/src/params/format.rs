use crate::domain::{SweepError, SweepResult};

/// Display format used to turn a swept value into an artifact-name segment.
///
/// Accepts one printf-style directive (`%.1f`, `%+08.3e`, `%g`, `%d`) or one
/// brace-style directive (`{:.2f}`, `{:>6.1f}`, `{}`), optionally surrounded
/// by literal text. `%%`, `{{` and `}}` are literal escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFormat {
    source: String,
    prefix: String,
    suffix: String,
    spec: NumberSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct NumberSpec {
    plus_sign: bool,
    space_sign: bool,
    zero_pad: bool,
    left_align: bool,
    alternate: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: Conversion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Conversion {
    #[default]
    Display,
    Fixed {
        upper: bool,
    },
    Exponent {
        upper: bool,
    },
    General {
        upper: bool,
        keep_point: bool,
    },
    Integer,
}

impl ValueFormat {
    pub fn parse(source: &str) -> SweepResult<Self> {
        let chars = source.chars().collect::<Vec<_>>();
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut spec: Option<NumberSpec> = None;
        let mut index = 0;

        while index < chars.len() {
            let current = chars[index];
            let next = chars.get(index + 1).copied();
            let literal = match (current, next) {
                ('%', Some('%')) | ('{', Some('{')) | ('}', Some('}')) => {
                    index += 2;
                    Some(current)
                }
                ('%', _) | ('{', _) => {
                    if spec.is_some() {
                        return Err(format_error(source, "only one value directive is allowed"));
                    }
                    let (parsed, consumed) = if current == '%' {
                        parse_printf(&chars[index + 1..], source)?
                    } else {
                        parse_brace(&chars[index + 1..], source)?
                    };
                    spec = Some(parsed);
                    index += consumed + 1;
                    None
                }
                ('}', _) => return Err(format_error(source, "unmatched '}'")),
                _ => {
                    index += 1;
                    Some(current)
                }
            };

            if let Some(character) = literal {
                if spec.is_some() {
                    suffix.push(character);
                } else {
                    prefix.push(character);
                }
            }
        }

        let spec = spec.ok_or_else(|| format_error(source, "no value directive found"))?;
        Ok(Self {
            source: source.to_string(),
            prefix,
            suffix,
            spec,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn apply(&self, value: f64) -> String {
        format!("{}{}{}", self.prefix, self.spec.render(value), self.suffix)
    }

    /// Fallback used when a variable declares no format: the shortest
    /// round-trip decimal, always with a fractional part (`0.0`, `0.5`, `1e-7`).
    pub fn default_display(value: f64) -> String {
        format!("{value:?}")
    }
}

impl NumberSpec {
    fn render(&self, value: f64) -> String {
        let (negative, body) = self.body(value);
        let sign = if negative {
            "-"
        } else if self.plus_sign {
            "+"
        } else if self.space_sign {
            " "
        } else {
            ""
        };

        let length = sign.len() + body.chars().count();
        let Some(width) = self.width.filter(|width| *width > length) else {
            return format!("{sign}{body}");
        };
        let padding = width - length;

        if self.left_align {
            format!("{sign}{body}{}", " ".repeat(padding))
        } else if self.zero_pad && value.is_finite() {
            format!("{sign}{}{body}", "0".repeat(padding))
        } else {
            format!("{}{sign}{body}", " ".repeat(padding))
        }
    }

    fn body(&self, value: f64) -> (bool, String) {
        if value.is_nan() {
            return (false, self.cased("nan"));
        }

        let magnitude = value.abs();
        let negative = value.is_sign_negative();
        if value.is_infinite() {
            return (negative, self.cased("inf"));
        }

        let body = match self.conversion {
            Conversion::Display => ValueFormat::default_display(magnitude),
            Conversion::Fixed { .. } => {
                let mut fixed = format!("{:.*}", self.precision.unwrap_or(6), magnitude);
                if self.alternate && !fixed.contains('.') {
                    fixed.push('.');
                }
                fixed
            }
            Conversion::Exponent { .. } => {
                exponent_notation(magnitude, self.precision.unwrap_or(6))
            }
            Conversion::General { keep_point, .. } => {
                let mut general =
                    general_notation(magnitude, self.precision.unwrap_or(6), self.alternate);
                if keep_point && !general.contains(['.', 'e']) {
                    general.push_str(".0");
                }
                general
            }
            Conversion::Integer => {
                let truncated = value.trunc();
                return (truncated < 0.0, format!("{}", truncated.abs() as u64));
            }
        };

        (negative, self.cased(&body))
    }

    fn cased(&self, body: &str) -> String {
        let upper = matches!(
            self.conversion,
            Conversion::Fixed { upper: true }
                | Conversion::Exponent { upper: true }
                | Conversion::General { upper: true, .. }
        );
        if upper {
            body.to_ascii_uppercase()
        } else {
            body.to_string()
        }
    }
}

fn exponent_notation(magnitude: f64, precision: usize) -> String {
    let (mantissa, exponent) = split_exponent(magnitude, precision);
    join_exponent(&mantissa, exponent)
}

fn general_notation(magnitude: f64, precision: usize, alternate: bool) -> String {
    let significant = precision.max(1);
    let (mantissa, exponent) = split_exponent(magnitude, significant - 1);

    if exponent >= -4 && exponent < significant as i32 {
        let decimals = (significant as i32 - 1 - exponent).max(0) as usize;
        let fixed = format!("{:.*}", decimals, magnitude);
        if alternate { fixed } else { strip_fraction_zeros(&fixed) }
    } else {
        let mantissa = if alternate {
            mantissa
        } else {
            strip_fraction_zeros(&mantissa)
        };
        join_exponent(&mantissa, exponent)
    }
}

fn split_exponent(magnitude: f64, precision: usize) -> (String, i32) {
    let rendered = format!("{:.*e}", precision, magnitude);
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => (mantissa.to_string(), exponent.parse().unwrap_or(0)),
        None => (rendered, 0),
    }
}

fn join_exponent(mantissa: &str, exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.abs())
}

fn strip_fraction_zeros(number: &str) -> String {
    if !number.contains('.') {
        return number.to_string();
    }
    number
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn parse_printf(chars: &[char], source: &str) -> SweepResult<(NumberSpec, usize)> {
    let mut spec = NumberSpec::default();
    let mut index = 0;

    while let Some(flag) = chars.get(index) {
        match flag {
            '-' => spec.left_align = true,
            '+' => spec.plus_sign = true,
            ' ' => spec.space_sign = true,
            '0' => spec.zero_pad = true,
            '#' => spec.alternate = true,
            _ => break,
        }
        index += 1;
    }

    let (width, consumed) = take_number(&chars[index..]);
    spec.width = width;
    index += consumed;

    if chars.get(index) == Some(&'.') {
        index += 1;
        let (precision, consumed) = take_number(&chars[index..]);
        spec.precision = Some(precision.unwrap_or(0));
        index += consumed;
    }

    while matches!(chars.get(index), Some('l' | 'h' | 'L')) {
        index += 1;
    }

    spec.conversion = match chars.get(index) {
        Some('f') => Conversion::Fixed { upper: false },
        Some('F') => Conversion::Fixed { upper: true },
        Some('e') => Conversion::Exponent { upper: false },
        Some('E') => Conversion::Exponent { upper: true },
        Some('g') => Conversion::General {
            upper: false,
            keep_point: false,
        },
        Some('G') => Conversion::General {
            upper: true,
            keep_point: false,
        },
        Some('d' | 'i') => Conversion::Integer,
        Some(other) => {
            return Err(format_error(
                source,
                format!("unsupported conversion '%{other}'"),
            ));
        }
        None => return Err(format_error(source, "incomplete '%' directive")),
    };

    Ok((spec, index + 1))
}

fn parse_brace(chars: &[char], source: &str) -> SweepResult<(NumberSpec, usize)> {
    let close = chars
        .iter()
        .position(|character| *character == '}')
        .ok_or_else(|| format_error(source, "unterminated '{' directive"))?;
    let inner = &chars[..close];

    let field_end = inner
        .iter()
        .position(|character| *character == ':')
        .unwrap_or(inner.len());
    if !inner[..field_end]
        .iter()
        .all(|character| character.is_ascii_digit())
    {
        return Err(format_error(source, "named fields are not supported"));
    }

    let mut spec = NumberSpec::default();
    let Some(format_spec) = inner.get(field_end + 1..) else {
        return Ok((spec, close + 1));
    };

    let mut index = 0;
    match format_spec.get(index) {
        Some('<') => {
            spec.left_align = true;
            index += 1;
        }
        Some('>') => index += 1,
        _ => {}
    }
    match format_spec.get(index) {
        Some('+') => {
            spec.plus_sign = true;
            index += 1;
        }
        Some(' ') => {
            spec.space_sign = true;
            index += 1;
        }
        Some('-') => index += 1,
        _ => {}
    }
    if format_spec.get(index) == Some(&'#') {
        spec.alternate = true;
        index += 1;
    }
    if format_spec.get(index) == Some(&'0') {
        spec.zero_pad = true;
        index += 1;
    }

    let (width, consumed) = take_number(&format_spec[index..]);
    spec.width = width;
    index += consumed;

    if format_spec.get(index) == Some(&'.') {
        index += 1;
        let (precision, consumed) = take_number(&format_spec[index..]);
        if precision.is_none() {
            return Err(format_error(source, "missing precision after '.'"));
        }
        spec.precision = precision;
        index += consumed;
    }

    spec.conversion = match (&format_spec[index..], spec.precision) {
        ([], None) => Conversion::Display,
        ([], Some(_)) => Conversion::General {
            upper: false,
            keep_point: true,
        },
        (['f'], _) => Conversion::Fixed { upper: false },
        (['F'], _) => Conversion::Fixed { upper: true },
        (['e'], _) => Conversion::Exponent { upper: false },
        (['E'], _) => Conversion::Exponent { upper: true },
        (['g'], _) => Conversion::General {
            upper: false,
            keep_point: false,
        },
        (['G'], _) => Conversion::General {
            upper: true,
            keep_point: false,
        },
        (['d'], _) => Conversion::Integer,
        (rest, _) => {
            return Err(format_error(
                source,
                format!(
                    "unsupported format type '{}'",
                    rest.iter().collect::<String>()
                ),
            ));
        }
    };

    Ok((spec, close + 1))
}

fn take_number(chars: &[char]) -> (Option<usize>, usize) {
    let digits = chars
        .iter()
        .take_while(|character| character.is_ascii_digit())
        .collect::<String>();
    (digits.parse().ok(), digits.len())
}

fn format_error(source: &str, message: impl Into<String>) -> SweepError {
    SweepError::config(
        "CONFIG.VALUE_FORMAT",
        format!("invalid value format '{}': {}", source, message.into()),
    )
}

#[cfg(test)]
mod tests {
    use super::ValueFormat;
    use crate::domain::SweepErrorCategory;

    fn render(format: &str, value: f64) -> String {
        ValueFormat::parse(format)
            .unwrap_or_else(|error| panic!("format '{format}' should parse: {error}"))
            .apply(value)
    }

    #[test]
    fn printf_fixed_point_directives() {
        assert_eq!(render("%.1f", 0.0), "0.0");
        assert_eq!(render("%.1f", 0.5), "0.5");
        assert_eq!(render("%.3f", -1.25), "-1.250");
        assert_eq!(render("%f", 1.5), "1.500000");
        assert_eq!(render("%5.1f", 1.0), "  1.0");
        assert_eq!(render("%-5.1f|", 1.0), "1.0  |");
        assert_eq!(render("%06.2f", -2.5), "-02.50");
        assert_eq!(render("%+.1f", 2.0), "+2.0");
        assert_eq!(render("%.0f", 2.0), "2");
        assert_eq!(render("%#.0f", 2.0), "2.");
        assert_eq!(render("%.2lf", 0.126), "0.13");
    }

    #[test]
    fn printf_exponent_and_general_directives() {
        assert_eq!(render("%.2e", 1500.0), "1.50e+03");
        assert_eq!(render("%+.1E", 0.00012), "+1.2E-04");
        assert_eq!(render("%e", 0.0), "0.000000e+00");
        assert_eq!(render("%g", 100.0), "100");
        assert_eq!(render("%g", 0.0001), "0.0001");
        assert_eq!(render("%g", 0.00001), "1e-05");
        assert_eq!(render("%g", 123456789.0), "1.23457e+08");
        assert_eq!(render("%.3g", 2.5), "2.5");
        assert_eq!(render("%G", 1.0e-10), "1E-10");
    }

    #[test]
    fn printf_integer_directive_truncates() {
        assert_eq!(render("%d", 2.7), "2");
        assert_eq!(render("%d", -2.7), "-2");
        assert_eq!(render("%03d", 7.0), "007");
    }

    #[test]
    fn brace_directives() {
        assert_eq!(render("{:.1f}", 0.5), "0.5");
        assert_eq!(render("{0:.3f}", 1.0), "1.000");
        assert_eq!(render("{}", 0.5), "0.5");
        assert_eq!(render("{}", 300.0), "300.0");
        assert_eq!(render("{:>6.2f}", 1.0), "  1.00");
        assert_eq!(render("{:<6.2f}|", 1.0), "1.00  |");
        assert_eq!(render("{:+.1e}", 1500.0), "+1.5e+03");
        assert_eq!(render("{:.2}", 1.0), "1.0");
        assert_eq!(render("{:.2}", 0.5), "0.5");
        assert_eq!(render("{:.2}", 100.0), "1e+02");
        assert_eq!(render("{:g}", 0.25), "0.25");
    }

    #[test]
    fn literal_text_and_escapes_surround_the_directive() {
        assert_eq!(render("x=%.1f nm", 2.0), "x=2.0 nm");
        assert_eq!(render("%%%.1f", 0.5), "%0.5");
        assert_eq!(render("{{{:.1f}}}", 0.5), "{0.5}");
    }

    #[test]
    fn non_finite_values_render_as_words() {
        assert_eq!(render("%.1f", f64::NAN), "nan");
        assert_eq!(render("%.1f", f64::NEG_INFINITY), "-inf");
        assert_eq!(render("%.1E", f64::INFINITY), "INF");
    }

    #[test]
    fn default_display_keeps_a_fractional_part() {
        assert_eq!(ValueFormat::default_display(0.0), "0.0");
        assert_eq!(ValueFormat::default_display(0.5), "0.5");
        assert_eq!(ValueFormat::default_display(300.0), "300.0");
        assert_eq!(ValueFormat::default_display(-1.25), "-1.25");
    }

    #[test]
    fn malformed_formats_are_config_errors() {
        for source in [
            "plain", "%", "%q", "%.1f_%.1f", "{:.1f", "{name}", "{:x}", "}", "{:.f}",
        ] {
            let error = ValueFormat::parse(source).expect_err("format should be rejected");
            assert_eq!(error.category(), SweepErrorCategory::ConfigError, "{source}");
            assert_eq!(error.placeholder(), "CONFIG.VALUE_FORMAT");
        }
    }
}
