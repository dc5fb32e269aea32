/// Decode bytes as ISO-8859-1, one character per byte.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decode the body of a PDF string literal (the text between the outer
/// parentheses).
///
/// Handles `\(`, `\)`, `\\`, the control escapes `\n \r \t \b \f` and octal
/// escapes of up to three digits. Any other escaped character is kept as-is.
pub fn decode_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        // A trailing lone backslash is dropped
        let Some(esc) = chars.next() else { break };
        match esc {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '0'..='7' => {
                let mut code = octal_value(esc);
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&next @ '0'..='7') => {
                            code = code * 8 + octal_value(next);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                if let Some(decoded) = char::from_u32(code) {
                    out.push(decoded);
                }
            }
            // `(`, `)`, `\` and unknown escapes all pass through
            other => out.push(other),
        }
    }

    out
}

fn octal_value(digit: char) -> u32 {
    digit.to_digit(8).unwrap_or(0)
}
